use crate::models::application::ApplicationStatus;
use crate::models::jaf::{JafStatus, JobStatus};
use crate::models::otp::OtpPurpose;
use crate::services::mailer::OutgoingEmail;

const SIGNATURE: &str = "\n\nTraining & Placement Cell";

fn email(to: &str, subject: impl Into<String>, body: impl Into<String>) -> OutgoingEmail {
    let mut body = body.into();
    body.push_str(SIGNATURE);
    OutgoingEmail {
        to: to.to_string(),
        subject: subject.into(),
        body,
    }
}

pub fn otp(to: &str, purpose: OtpPurpose, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    let (subject, intro) = match purpose {
        OtpPurpose::Registration => (
            "Verify your email address",
            "Use the code below to complete your registration.",
        ),
        OtpPurpose::PasswordReset => (
            "Password reset code",
            "Use the code below to reset your password.",
        ),
    };
    email(
        to,
        subject,
        format!(
            "{}\n\nVerification code: {}\n\nThe code expires in {} minutes. If you did not request it, ignore this message.",
            intro, code, ttl_minutes
        ),
    )
}

pub fn account_verified(to: &str, name: &str) -> OutgoingEmail {
    email(
        to,
        "Your account has been verified",
        format!(
            "Hello {},\n\nYour account has been verified by the placement office. You can now log in.",
            name
        ),
    )
}

pub fn account_rejected(to: &str, name: &str, remarks: Option<&str>) -> OutgoingEmail {
    let mut body = format!(
        "Hello {},\n\nYour registration was not approved by the placement office.",
        name
    );
    if let Some(remarks) = remarks.filter(|r| !r.trim().is_empty()) {
        body.push_str(&format!("\n\nRemarks: {}", remarks.trim()));
    }
    email(to, "Your registration was not approved", body)
}

pub fn jaf_submitted(to: &str, company_name: &str, job_title: &str) -> OutgoingEmail {
    email(
        to,
        format!("New JAF submitted: {}", job_title),
        format!(
            "{} submitted a job announcement \"{}\". It is waiting for moderation.",
            company_name, job_title
        ),
    )
}

pub fn jaf_moderated(
    to: &str,
    job_title: &str,
    status: JafStatus,
    remarks: Option<&str>,
) -> OutgoingEmail {
    let mut body = format!(
        "Your job announcement \"{}\" has been {} by the placement office.",
        job_title, status
    );
    if let Some(remarks) = remarks.filter(|r| !r.trim().is_empty()) {
        body.push_str(&format!("\n\nRemarks: {}", remarks.trim()));
    }
    email(to, format!("JAF {}: {}", status, job_title), body)
}

pub fn job_status_changed(to: &str, job_title: &str, job_status: JobStatus) -> OutgoingEmail {
    email(
        to,
        format!("Job status updated: {}", job_title),
        format!(
            "The job status of \"{}\" is now {}.",
            job_title, job_status
        ),
    )
}

pub fn application_received(to: &str, student_name: &str, job_title: &str, company_name: &str) -> OutgoingEmail {
    email(
        to,
        format!("Application submitted: {}", job_title),
        format!(
            "Hello {},\n\nYour application for \"{}\" at {} has been received.",
            student_name, job_title, company_name
        ),
    )
}

pub fn application_status_changed(
    to: &str,
    student_name: &str,
    job_title: &str,
    status: ApplicationStatus,
    remarks: Option<&str>,
) -> OutgoingEmail {
    let mut body = format!(
        "Hello {},\n\nYour application for \"{}\" is now at: {}.",
        student_name,
        job_title,
        status.label()
    );
    if let Some(remarks) = remarks.filter(|r| !r.trim().is_empty()) {
        body.push_str(&format!("\n\nRemarks: {}", remarks.trim()));
    }
    email(to, format!("Application update: {}", job_title), body)
}
