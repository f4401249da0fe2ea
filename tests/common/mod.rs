use std::sync::{Arc, Mutex};
use std::net::SocketAddr;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use ewaiter::auth::password;
use ewaiter::config::{Config, Environment};
use ewaiter::db;
use ewaiter::db::users::NewUser;
use ewaiter::email::Mailer;
use ewaiter::models::Role;
use ewaiter::uploads::LocalImageStore;

pub const PASSWORD: &str = "password123";

/// One email the app asked to send.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: &'static str,
    pub to: String,
    pub token: Option<String>,
}

/// Records outgoing mail so tests can pick up verification and reset tokens.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl CapturingMailer {
    fn record(&self, kind: &'static str, to: &str, token: Option<&str>) {
        self.sent.lock().unwrap().push(SentMail {
            kind,
            to: to.to_string(),
            token: token.map(str::to_string),
        });
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Most recent token of `kind` mailed to `to`.
    pub fn last_token(&self, kind: &str, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.kind == kind && m.to == to)
            .and_then(|m| m.token)
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_verification(
        &self,
        to_email: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.record("verification", to_email, Some(token));
        Ok(())
    }

    async fn send_welcome(
        &self,
        to_email: &str,
        _name: &str,
        _restaurant_name: &str,
    ) -> Result<(), String> {
        self.record("welcome", to_email, None);
        Ok(())
    }

    async fn send_password_reset(
        &self,
        to_email: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.record("password_reset", to_email, Some(token));
        Ok(())
    }

    async fn send_staff_added(
        &self,
        to_email: &str,
        _name: &str,
        _restaurant_name: &str,
        _role: Role,
    ) -> Result<(), String> {
        self.record("staff_added", to_email, None);
        Ok(())
    }
}

/// A verified restaurant admin with a live credential.
pub struct Admin {
    pub token: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub email: String,
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub mailer: Arc<CapturingMailer>,
    pub upload_dir: std::path::PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        pw: &str,
        restaurant_name: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/auth/register",
            &json!({
                "name": name,
                "email": email,
                "password": pw,
                "restaurant_name": restaurant_name,
            }),
        )
        .await
    }

    pub async fn verify_email(&self, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url("/auth/verify-email"))
            .query(&[("token", token)])
            .send()
            .await
            .expect("verify request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, pw: &str) -> (Value, StatusCode) {
        self.post("/auth/login", &json!({ "email": email, "password": pw }))
            .await
    }

    /// Register, verify and log in a restaurant admin.
    pub async fn admin(&self, email: &str, restaurant_name: &str) -> Admin {
        let (body, status) = self.register("Owner", email, PASSWORD, restaurant_name).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let token = self
            .mailer
            .last_token("verification", email)
            .expect("verification email captured");
        let (body, status) = self.verify_email(&token).await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");

        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        Admin {
            token: body["access_token"].as_str().unwrap().to_string(),
            user_id: body["user"]["id"].as_str().unwrap().to_string(),
            restaurant_id: body["user"]["restaurant"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
        }
    }

    /// Add a staff member through the API and return their credential.
    pub async fn staff(&self, admin: &Admin, email: &str, role: &str) -> String {
        let (body, status) = self
            .post_auth(
                "/users/staff",
                &admin.token,
                &json!({ "name": "Staff", "email": email, "password": PASSWORD, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create staff failed: {body}");

        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "staff login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Super admins are provisioned out of band; insert one directly.
    pub async fn super_admin(&self, email: &str) -> String {
        let hash = password::hash(PASSWORD).unwrap();
        db::users::create(
            &self.pool,
            &NewUser {
                restaurant_id: None,
                name: "Platform",
                email,
                password_hash: &hash,
                role: Role::SuperAdmin,
                is_email_verified: true,
                verification: None,
                phone: None,
            },
        )
        .await
        .expect("insert super admin");

        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "super admin login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_menu_item(
        &self,
        admin: &Admin,
        name: &str,
        category: &str,
        price: f64,
    ) -> Value {
        let (body, status) = self
            .post_auth(
                "/menu-items",
                &admin.token,
                &json!({
                    "name": name,
                    "description": "",
                    "price": price,
                    "category": category,
                    "preparation_time": 15,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create menu item failed: {body}");
        body
    }

    /// Place a guest order of `(menu item, quantity)` lines.
    pub async fn place_order(
        &self,
        restaurant_id: &str,
        lines: &[(&Value, i64)],
    ) -> (Value, StatusCode) {
        let items: Vec<Value> = lines
            .iter()
            .map(|(item, qty)| {
                json!({
                    "menu_item_id": item["id"],
                    "name": item["name"],
                    "price": item["price"],
                    "quantity": qty,
                })
            })
            .collect();
        self.post(
            "/orders",
            &json!({
                "restaurant_id": restaurant_id,
                "customer_name": "Guest",
                "location_type": "lodge",
                "room_number": "101",
                "payment_method": "room-charge",
                "items": items,
            }),
        )
        .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PATCH request with JSON body.
    pub async fn patch_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn database_url_for(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("ewaiter_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url_for(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let upload_dir = std::env::temp_dir().join(&db_name);

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        jwt_expiration: chrono::Duration::hours(1),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        environment: Environment::Development,
        client_url: "http://localhost:5173".to_string(),
        public_url: "http://localhost:0".to_string(),
        upload_dir: upload_dir.clone(),
        max_upload_size: 64 * 1024,
        log_level: "warn".to_string(),
        smtp: None,
    };

    let mailer = Arc::new(CapturingMailer::default());
    let images = Arc::new(LocalImageStore::new(upload_dir.clone(), &config.public_url));
    let app = ewaiter::build_app_with(pool.clone(), config, mailer.clone(), images);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
        mailer,
        upload_dir,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;
    let _ = tokio::fs::remove_dir_all(&app.upload_dir).await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
