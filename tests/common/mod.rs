#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use placement_backend::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    error::Result,
    routes,
    services::mailer::{Mailer, OutgoingEmail},
    utils::crypto::hash_password,
    AppState,
};

/// Keeps every message so tests can read the codes a user would receive.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

impl CapturingMailer {
    pub fn last_code(&self, to: &str) -> String {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .filter(|m| m.to == to)
            .find_map(|m| {
                m.body
                    .split("Verification code: ")
                    .nth(1)
                    .map(|rest| rest.chars().take(6).collect::<String>())
            })
            .expect("no verification code was mailed")
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub mailer: Arc<CapturingMailer>,
}

/// Returns `None` when no database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("OTP_SECRET", "test_otp_secret");
    env::set_var("MAIL_TRANSPORT", "log");
    env::set_var("AUTH_RPS", "10000");

    let config = Config::from_env().expect("config");
    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::with_mailer(pool.clone(), config, mailer.clone());
    let router = routes::router(state).expect("router");
    Some(TestApp {
        router,
        pool,
        mailer,
    })
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, JsonValue) {
        self.call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Inserts an active admin directly; admins never self-register.
    pub async fn seed_admin(&self, role: &str) -> (String, String) {
        let email = format!("admin_{}@placement.test", Uuid::new_v4().simple());
        let password = "AdminPass123".to_string();
        sqlx::query(
            r#"INSERT INTO users (email, password_hash, role, is_verified, is_active)
               VALUES ($1, $2, $3, TRUE, TRUE)"#,
        )
        .bind(&email)
        .bind(hash_password(&password).unwrap())
        .bind(role)
        .execute(&self.pool)
        .await
        .expect("seed admin");
        (email, password)
    }

    /// Runs register then verify-registration with the mailed code.
    pub async fn register(&self, body: JsonValue) {
        let email = body["email"].as_str().unwrap().to_string();
        let (status, resp) = self
            .call(Method::POST, "/auth/register", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", resp);

        let code = self.mailer.last_code(&email);
        let (status, resp) = self
            .call(
                Method::POST,
                "/auth/verify-registration",
                None,
                Some(json!({ "email": email, "otp": code })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "verify failed: {}", resp);
    }

    /// Finds the pending profile id for `email` and approves it.
    pub async fn approve(&self, admin_token: &str, kind: &str, email: &str) -> String {
        let uri = format!("/admin/verify-{}", kind);
        let (status, pending) = self.call(Method::GET, &uri, Some(admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let id = pending
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["email"] == email)
            .map(|p| p["id"].as_str().unwrap().to_string())
            .expect("profile is not pending");

        let mut decision = json!({ "action": "verify" });
        decision[format!("{}_id", kind).as_str()] = json!(id);
        let (status, resp) = self
            .call(Method::POST, &uri, Some(admin_token), Some(decision))
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {}", resp);
        id
    }
}

impl TestApp {
    pub async fn user_exists(&self, email: &str) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// `used` flag of the newest registration code for `email`.
    pub async fn registration_code_used(&self, email: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT used FROM otps
               WHERE email = $1 AND purpose = 'registration'
               ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

pub fn student_body(email: &str, branch: &str, passing_year: i32) -> JsonValue {
    json!({
        "type": "student",
        "email": email,
        "password": "Passw0rd!",
        "full_name": "Asha Rao",
        "roll_number": unique("ROLL"),
        "phone": "9876543210",
        "branch": branch,
        "year": 4,
        "cgpa": 8.4,
        "passing_year": passing_year,
        "degree_type": "UG"
    })
}

pub fn company_body(email: &str) -> JsonValue {
    json!({
        "type": "company",
        "email": email,
        "password": "Passw0rd!",
        "company_name": "Acme Systems",
        "website": "https://acme.test",
        "description": "Industrial widgets",
        "contact_person": "Wile Coyote",
        "phone": "9876543210"
    })
}
