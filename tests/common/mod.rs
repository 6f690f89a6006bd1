#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use caixa_api::config::AppConfig;
use caixa_api::services::registry::{columns, hash_secret};
use caixa_api::services::{bootstrap, SeedUser};
use caixa_api::store::{MemoryRecordStore, RecordStore, Row};
use caixa_api::{app, AppState};

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "s3nha";
pub const INACTIVE_EMAIL: &str = "bia@example.com";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryRecordStore>,
    pub config: AppConfig,
}

/// In-memory app with one active user, one user with a lapsed license and
/// a template holding the two sample transactions.
pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(AppConfig::development()).await
}

pub async fn spawn_app_with(config: AppConfig) -> Result<TestApp> {
    let store = Arc::new(MemoryRecordStore::new());
    let seed = SeedUser { email: EMAIL.into(), password: PASSWORD.into() };
    bootstrap(store.as_ref(), &config.store, Some(&seed)).await?;

    add_user(&store, &config, INACTIVE_EMAIL, PASSWORD, "inativo").await?;

    for row in sample_rows() {
        store.append_row(&config.store.template_table, &row).await?;
    }

    let router = app(AppState::build(&config, store.clone()));
    Ok(TestApp { router, store, config })
}

pub async fn add_user(store: &MemoryRecordStore, config: &AppConfig, email: &str, password: &str, license: &str) -> Result<()> {
    let user = Row::from_iter([
        (columns::EMAIL.to_string(), json!(email)),
        (columns::PASSWORD.to_string(), json!(hash_secret(password))),
    ]);
    let status = Row::from_iter([
        (columns::EMAIL.to_string(), json!(email)),
        (columns::STATUS.to_string(), json!(license)),
    ]);
    store.append_row(&config.store.users_table, &user).await?;
    store.append_row(&config.store.licenses_table, &status).await?;
    Ok(())
}

pub fn sample_rows() -> Vec<Row> {
    let row = |date: &str, desc: &str, value: &str, kind: &str, category: &str| -> Row {
        Row::from_iter([
            ("Data".to_string(), json!(date)),
            ("Descrição".to_string(), json!(desc)),
            ("Valor Total".to_string(), json!(value)),
            ("Tipo".to_string(), json!(kind)),
            ("Categoria".to_string(), json!(category)),
            ("Status".to_string(), json!("sim")),
        ])
    };
    vec![
        row("01/01/2024", "Salário", "5000,00", "entrada", "Salário"),
        row("02/01/2024", "Aluguel", "1500,00", "saida", "Moradia"),
    ]
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&b)?))?,
            None => builder.body(Body::empty())?,
        };

        let res = self.router.clone().oneshot(req).await?;
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).context("response is not JSON")? };
        Ok((status, json))
    }

    pub async fn login(&self) -> Result<String> {
        self.login_as(EMAIL, PASSWORD).await
    }

    pub async fn login_as(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .request(Method::POST, "/auth/login", None, Some(json!({ "email": email, "password": password })))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"].as_str().map(str::to_string).context("missing token")
    }

    pub async fn tenant_rows(&self, tenant: &str) -> Result<Vec<Row>> {
        Ok(self.store.read_table(tenant).await?.rows)
    }
}
