//! Resource CRUD handlers, generic over the resource type.

use crate::error::AppError;
use crate::query::QueryMap;
use crate::resources::Resource;
use crate::response::{success_one, success_one_ok, success_page};
use crate::service::ResourceService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

pub fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("invalid id: '{}'", id_str)))
}

fn payload<P: DeserializeOwned>(body: Value) -> Result<P, AppError> {
    if !body.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(format!("invalid body: {}", e)))
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = R::parameters(&QueryMap::from_pairs(params))?;
    let page = ResourceService::list::<R>(state.store.as_ref(), &params).await?;
    Ok(success_page(page))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let record = ResourceService::create::<R>(state.store.as_ref(), payload(body)?).await?;
    Ok(success_one(record))
}

pub async fn read<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let record = ResourceService::get::<R>(state.store.as_ref(), id).await?;
    Ok(success_one_ok(record))
}

pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let record = ResourceService::update::<R>(state.store.as_ref(), id, payload(body)?).await?;
    Ok(success_one_ok(record))
}

pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let message = ResourceService::delete::<R>(state.store.as_ref(), id).await?;
    Ok(success_one_ok(message))
}
