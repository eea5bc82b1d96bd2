pub mod activity_log;
pub mod application;
pub mod company;
pub mod email_outbox;
pub mod jaf;
pub mod otp;
pub mod pending_registration;
pub mod role;
pub mod smtp_settings;
pub mod student;
pub mod transition;
pub mod user;
