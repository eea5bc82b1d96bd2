mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};

use common::{company_body, spawn_app, student_body, unique, TestApp};

fn jaf_body() -> JsonValue {
    json!({
        "job_title": "Graduate Engineer",
        "job_description": "Backend services in Rust",
        "job_location": "Pune",
        "ctc": "1200000",
        "eligible_batches": ["2025"],
        "eligible_branches": ["CSE", " IT "],
        "eligible_degrees": ["UG"],
        "selection_process": "Aptitude, technical interview, HR interview",
        "total_rounds": 3,
        "last_date_to_apply": (Utc::now() + Duration::days(14)).to_rfc3339()
    })
}

/// Registers, verifies and approves an account, returning its token.
async fn onboard(app: &TestApp, admin: &str, kind: &str, body: JsonValue) -> String {
    let email = body["email"].as_str().unwrap().to_string();
    app.register(body).await;
    app.approve(admin, kind, &email).await;
    app.token(&email, "Passw0rd!").await
}

#[tokio::test]
async fn jaf_moderation_application_and_rounds() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let (admin_email, admin_password) = app.seed_admin("admin").await;
    let admin = app.token(&admin_email, &admin_password).await;

    let company = onboard(
        &app,
        &admin,
        "company",
        company_body(&format!("{}@acme.test", unique("hr"))),
    )
    .await;
    let student = onboard(
        &app,
        &admin,
        "student",
        student_body(&format!("{}@college.test", unique("cse")), "CSE", 2025),
    )
    .await;
    let outsider = onboard(
        &app,
        &admin,
        "student",
        student_body(&format!("{}@college.test", unique("ece")), "ECE", 2025),
    )
    .await;

    let (status, jaf) = app
        .call(Method::POST, "/company/JAF", Some(&company), Some(jaf_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", jaf);
    assert_eq!(jaf["status"], "pending");
    assert_eq!(jaf["job_status"], "open");
    assert_eq!(jaf["eligible_branches"], json!(["CSE", "IT"]));
    let jaf_id = jaf["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/student/jobs/apply",
            Some(&student),
            Some(json!({ "jaf_id": jaf_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "jaf_not_approved");

    let (status, jobs) = app
        .call(Method::GET, "/student/jobs", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(jobs["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|j| j["id"] != jaf_id.as_str()));

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/admin/jaf/{}", jaf_id),
            Some(&admin),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "approved");

    let (status, body) = app
        .call(
            Method::PUT,
            "/admin/jaf",
            Some(&admin),
            Some(json!({ "jaf_id": jaf_id, "status": "rejected", "remarks": "late" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "jaf_already_moderated");

    let (_, jobs) = app
        .call(Method::GET, "/student/jobs", Some(&outsider), None)
        .await;
    let listed = jobs["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|j| j["id"] == jaf_id.as_str())
        .cloned()
        .unwrap();
    assert_eq!(listed["eligible"], false);
    assert_eq!(listed["ineligible_reason"], "branch");

    let (status, body) = app
        .call(
            Method::POST,
            "/student/jobs/apply",
            Some(&outsider),
            Some(json!({ "jaf_id": jaf_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ineligible_branch");

    let (status, application) = app
        .call(
            Method::POST,
            "/student/jobs/apply",
            Some(&student),
            Some(json!({ "jaf_id": jaf_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", application);
    assert_eq!(application["status"], "applied");
    assert_eq!(application["current_round"], 1);
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/student/jobs/apply",
            Some(&student),
            Some(json!({ "jaf_id": jaf_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "duplicate_application");

    let applications_uri = format!("/company/JAF/{}/applications", jaf_id);
    let (status, list) = app
        .call(Method::GET, &applications_uri, Some(&company), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .call(
            Method::PUT,
            &applications_uri,
            Some(&company),
            Some(json!({
                "application_id": application_id,
                "status": "written_test",
                "round": { "round_number": 2, "round_type": "Aptitude", "status": "cleared" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["current_round"], 2);

    let (status, body) = app
        .call(
            Method::PUT,
            &applications_uri,
            Some(&company),
            Some(json!({ "application_id": application_id, "status": "applied" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "application_status_regression");

    let (status, body) = app
        .call(
            Method::PUT,
            &applications_uri,
            Some(&company),
            Some(json!({
                "application_id": application_id,
                "status": "technical_interview",
                "current_round": 4
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, body) = app
        .call(
            Method::PUT,
            &applications_uri,
            Some(&admin),
            Some(json!({ "application_id": application_id, "status": "selected", "remarks": "Offer letter sent" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status_label"], "Selected");

    let (status, body) = app
        .call(
            Method::PUT,
            &applications_uri,
            Some(&company),
            Some(json!({ "application_id": application_id, "status": "rejected" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "application_terminal");

    let (status, mine) = app
        .call(Method::GET, "/student/applications", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &mine["items"][0];
    assert_eq!(entry["status"], "selected");
    assert_eq!(entry["rounds_cleared"], 1);
    assert_eq!(entry["job_title"], "Graduate Engineer");

    let (status, body) = app
        .call(
            Method::PUT,
            "/admin/jaf/status",
            Some(&admin),
            Some(json!({ "jaf_id": jaf_id, "job_status": "closed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["job_status"], "closed");

    let (status, body) = app
        .call(
            Method::POST,
            "/student/jobs/apply",
            Some(&outsider),
            Some(json!({ "jaf_id": jaf_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "jaf_not_open");
}

#[tokio::test]
async fn role_groups_are_enforced() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let (admin_email, admin_password) = app.seed_admin("admin").await;
    let admin = app.token(&admin_email, &admin_password).await;

    let company_a = onboard(
        &app,
        &admin,
        "company",
        company_body(&format!("{}@a.test", unique("hr"))),
    )
    .await;
    let company_b = onboard(
        &app,
        &admin,
        "company",
        company_body(&format!("{}@b.test", unique("hr"))),
    )
    .await;
    let student = onboard(
        &app,
        &admin,
        "student",
        student_body(&format!("{}@college.test", unique("cse")), "CSE", 2025),
    )
    .await;

    let (_, jaf) = app
        .call(Method::POST, "/company/JAF", Some(&company_a), Some(jaf_body()))
        .await;
    let jaf_id = jaf["id"].as_str().unwrap().to_string();

    let (status, _) = app.call(Method::GET, "/company/JAF", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::POST, "/company/JAF", Some(&student), Some(jaf_body()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = app
        .call(Method::GET, "/admin/jaf", Some(&company_a), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::GET, "/admin/settings/smtp", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/company/JAF/{}/applications", jaf_id),
            Some(&company_b),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_owner");

    let (status, list) = app
        .call(Method::GET, "/company/JAF", Some(&company_b), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list["items"].as_array().unwrap().is_empty());

    let (status, _) = app
        .call(Method::GET, "/admin/jaf?status=pending", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Job status only moves once the announcement is approved.
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/company/JAF/{}/status", jaf_id),
            Some(&company_a),
            Some(json!({ "job_status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "jaf_not_approved");

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/company/JAF/{}/status", jaf_id),
            Some(&company_b),
            Some(json!({ "job_status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_owner");
}

#[tokio::test]
async fn health_reports_database() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    let (status, doc) = app
        .call(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/student/jobs/apply"].is_object());
}
