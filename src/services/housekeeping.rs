use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::error::{Error, Result};
use crate::services::{notification_service::NotificationService, otp_service::OtpService};

/// Top of every hour.
const HOURLY: &str = "0 0 * * * *";
const OTP_GRACE_DAYS: i32 = 1;
const SENT_MAIL_RETENTION_DAYS: i32 = 30;

fn scheduler_error(err: JobSchedulerError) -> Error {
    Error::Internal(format!("scheduler: {:?}", err))
}

/// Starts the hourly purge of stale OTP rows and delivered outbox mail. The
/// caller owns the returned scheduler and shuts it down.
pub async fn start(otp: OtpService, notifier: NotificationService) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

    let job = Job::new_async(HOURLY, move |_id, _scheduler| {
        let otp = otp.clone();
        let notifier = notifier.clone();
        Box::pin(async move {
            purge(&otp, &notifier).await;
        })
    })
    .map_err(scheduler_error)?;

    scheduler.add(job).await.map_err(scheduler_error)?;
    scheduler.start().await.map_err(scheduler_error)?;
    tracing::info!(schedule = HOURLY, "housekeeping scheduled");
    Ok(scheduler)
}

pub async fn purge(otp: &OtpService, notifier: &NotificationService) {
    match otp.purge_expired(OTP_GRACE_DAYS).await {
        Ok(removed) => tracing::info!(removed, "purged expired otps"),
        Err(err) => tracing::error!(error = %err, "otp purge failed"),
    }
    match notifier.purge_sent(SENT_MAIL_RETENTION_DAYS).await {
        Ok(removed) => tracing::info!(removed, "purged delivered outbox mail"),
        Err(err) => tracing::error!(error = %err, "outbox purge failed"),
    }
}
