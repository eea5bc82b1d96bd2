use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    Smtp,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub otp_secret: String,
    pub otp_ttl_minutes: i64,
    pub mail_transport: MailTransport,
    pub admin_notification_email: Option<String>,
    pub auth_rps: u32,
    pub cors_allowed_origin: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = get_env("JWT_SECRET")?;
        let otp_secret = env::var("OTP_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_ttl_hours: get_env_parse_or("JWT_TTL_HOURS", 24)?,
            otp_secret,
            otp_ttl_minutes: get_env_parse_or("OTP_TTL_MINUTES", 10)?,
            mail_transport: parse_mail_transport(env::var("MAIL_TRANSPORT").ok().as_deref())?,
            admin_notification_email: non_empty_env("ADMIN_NOTIFICATION_EMAIL"),
            auth_rps: get_env_parse_or("AUTH_RPS", 5)?,
            cors_allowed_origin: non_empty_env("CORS_ALLOWED_ORIGIN"),
            log_format: parse_log_format(env::var("LOG_FORMAT").ok().as_deref())?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_mail_transport(raw: Option<&str>) -> Result<MailTransport> {
    match raw.map(str::trim) {
        None | Some("") | Some("smtp") => Ok(MailTransport::Smtp),
        Some("log") => Ok(MailTransport::Log),
        Some(other) => Err(Error::Config(format!(
            "Invalid value for MAIL_TRANSPORT: {} (expected smtp or log)",
            other
        ))),
    }
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat> {
    match raw.map(str::trim) {
        None | Some("") | Some("compact") => Ok(LogFormat::Compact),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(Error::Config(format!(
            "Invalid value for LOG_FORMAT: {} (expected compact or json)",
            other
        ))),
    }
}
