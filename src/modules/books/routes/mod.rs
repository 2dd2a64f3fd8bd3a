//! HTTP handlers for the books module.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;
use shelf_http::error::AppError;

use super::error::CatalogError;
use super::models::{Book, RatingUpdate};
use super::query::{parse_threshold, CatalogQuery, Combinator, FieldFilter, SortField};
use super::stats::{compute_statistics, Statistics};
use super::store::Store;
use super::validation::{validate_for_create, validate_rating};

/// Query keys with a fixed meaning on the search endpoint; every other key is a
/// field condition.
const SEARCH_RESERVED: [&str; 2] = ["operator", "sort"];

pub fn router(store: Arc<Store>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search", get(search_books))
        .route("/statistics", get(statistics))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book))
        .route("/{id}/rating", put(update_rating))
        .with_state(store)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

/// `GET /?genre=&min_rating=&sort=`
async fn list_books(
    State(store): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let params = single_valued(params)?;
    let query = CatalogQuery {
        genre: params.get("genre").filter(|g| !g.trim().is_empty()).cloned(),
        min_rating: params
            .get("min_rating")
            .map(|raw| parse_threshold("min_rating", raw))
            .transpose()?,
        fields: None,
        sort: params.get("sort").map(|s| s.parse::<SortField>()).transpose()?,
    };

    Ok(Json(query.run(&store.all())))
}

/// `GET /search?operator=AND|OR&sort=&<field>=<threshold>...`
async fn search_books(
    State(store): State<Arc<Store>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let params = single_valued(params)?;
    let combinator = match params.get("operator") {
        Some(raw) => raw.parse::<Combinator>()?,
        None => Combinator::default(),
    };

    let mut conditions = params
        .iter()
        .filter(|(key, _)| !SEARCH_RESERVED.contains(&key.as_str()))
        .map(|(key, raw)| Ok((key.clone(), parse_threshold(key, raw)?)))
        .collect::<Result<Vec<_>, CatalogError>>()?;
    conditions.sort_by(|a, b| a.0.cmp(&b.0));

    let query = CatalogQuery {
        fields: Some(FieldFilter::new(conditions, combinator)?),
        sort: params.get("sort").map(|s| s.parse::<SortField>()).transpose()?,
        ..CatalogQuery::default()
    };

    Ok(Json(query.run(&store.all())))
}

async fn get_book(
    State(store): State<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(store.get(&id)?))
}

async fn create_book(
    State(store): State<Arc<Store>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let validated = validate_for_create(&input).map_err(CatalogError::from)?;

    let book = run_blocking(move || store.insert(validated)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_rating(
    State(store): State<Arc<Store>>,
    Path(id): Path<String>,
    payload: Result<Json<RatingUpdate>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(update) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let rating = validate_rating(&update.rating).map_err(CatalogError::from)?;

    let book = run_blocking(move || store.update_rating(&id, rating)).await?;
    Ok(Json(book))
}

async fn statistics(State(store): State<Arc<Store>>) -> Json<Statistics> {
    Json(compute_statistics(&store.all()))
}

/// Each query key may appear once; a repeated key is ambiguous.
fn single_valued(pairs: Vec<(String, String)>) -> Result<HashMap<String, String>, CatalogError> {
    let mut params = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        if params.contains_key(&key) {
            return Err(CatalogError::invalid_query(format!(
                "query parameter '{key}' given more than once"
            )));
        }
        params.insert(key, value);
    }
    Ok(params)
}

/// Mutations persist synchronously; keep them off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("catalog task failed: {e}")))?;
    Ok(result?)
}
