pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shutdown;
pub mod telemetry;
pub mod utils;

use crate::config::{Config, MailTransport};
use crate::services::{
    account_service::AccountService,
    activity_service::ActivityService,
    application_service::ApplicationService,
    auth_service::AuthService,
    jaf_service::JafService,
    mailer::{LogMailer, Mailer, SmtpMailer},
    notification_service::NotificationService,
    otp_service::OtpService,
    registration_service::RegistrationService,
    settings_service::SettingsService,
    verification_service::VerificationService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub activity: ActivityService,
    pub notifications: NotificationService,
    pub otp: OtpService,
    pub registration: RegistrationService,
    pub auth: AuthService,
    pub verification: VerificationService,
    pub jaf: JafService,
    pub applications: ApplicationService,
    pub settings: SettingsService,
    pub accounts: AccountService,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub services: Services,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let mailer: Arc<dyn Mailer> = match config.mail_transport {
            MailTransport::Smtp => Arc::new(SmtpMailer::new(pool.clone())),
            MailTransport::Log => Arc::new(LogMailer),
        };
        Self::with_mailer(pool, config, mailer)
    }

    pub fn with_mailer(pool: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let activity = ActivityService::new(pool.clone());
        let notifications = NotificationService::new(pool.clone(), mailer);
        let otp = OtpService::new(
            pool.clone(),
            notifications.clone(),
            config.otp_secret.clone(),
            config.otp_ttl_minutes,
        );

        let services = Services {
            registration: RegistrationService::new(pool.clone(), otp.clone(), activity.clone()),
            auth: AuthService::new(
                pool.clone(),
                otp.clone(),
                activity.clone(),
                config.jwt_secret.clone(),
                config.jwt_ttl_hours,
            ),
            verification: VerificationService::new(
                pool.clone(),
                notifications.clone(),
                activity.clone(),
            ),
            jaf: JafService::new(
                pool.clone(),
                notifications.clone(),
                activity.clone(),
                config.admin_notification_email.clone(),
            ),
            applications: ApplicationService::new(
                pool.clone(),
                notifications.clone(),
                activity.clone(),
            ),
            settings: SettingsService::new(pool.clone(), activity.clone()),
            accounts: AccountService::new(pool.clone(), activity.clone()),
            activity,
            notifications,
            otp,
        };

        Self {
            pool,
            config: Arc::new(config),
            services,
        }
    }
}
