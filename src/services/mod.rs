pub mod account_service;
pub mod activity_service;
pub mod application_service;
pub mod auth_service;
pub mod housekeeping;
pub mod jaf_service;
pub mod mail_templates;
pub mod mailer;
pub mod notification_service;
pub mod otp_service;
pub mod registration_service;
pub mod settings_service;
pub mod verification_service;
