//! Example Routes
//!
//! Read-only demo endpoints backed by the `examples` table.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use kernel::error::app_error::AppResult;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Example {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HelloQuery {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub greeting: String,
}

pub fn examples_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_examples))
        .route("/hello", get(hello))
        .with_state(pool)
}

/// GET /api/examples
async fn list_examples(State(pool): State<PgPool>) -> AppResult<Json<Vec<Example>>> {
    let examples = sqlx::query_as::<_, Example>("SELECT message FROM examples")
        .fetch_all(&pool)
        .await?;

    Ok(Json(examples))
}

/// GET /api/examples/hello?text=
async fn hello(Query(query): Query<HelloQuery>) -> Json<HelloResponse> {
    Json(HelloResponse {
        greeting: greeting(query.text.as_deref()),
    })
}

fn greeting(text: Option<&str>) -> String {
    format!("Hello {}", text.unwrap_or("world"))
}
