//! Request handlers for the HTTP/JSON API.
//!
//! Each handler deserializes one request shape, invokes a single engine
//! operation, and serializes the result; no business logic lives here. Error
//! responses come from the [`ApiError`](super::errors::ApiError) mapping.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Query as QueryParams, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiState, errors::ApiError};
use crate::{
    engine::{Mutation, Record},
    field::FieldPath,
    query::{Expr, Query},
};

#[derive(Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
}

#[derive(Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

#[derive(Deserialize)]
pub struct GetPartialRequest {
    pub key: String,
    #[serde(default)]
    pub fields: Vec<FieldPath>,
}

#[derive(Deserialize)]
pub struct ClearPrefixRequest {
    pub prefix: String,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub ast: Expr,
    #[serde(default)]
    pub projection: Vec<FieldPath>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Deserialize)]
pub struct RadiusRequest {
    pub field: FieldPath,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
}

#[derive(Deserialize)]
pub struct BoxRequest {
    pub field: FieldPath,
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Deserialize)]
pub struct EventsParams {
    pub key: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn set(
    State(state): State<ApiState>,
    Json(request): Json<SetRequest>,
) -> Result<StatusCode, ApiError> {
    state.engine.set(request.key, request.value).await?;
    Ok(StatusCode::OK)
}

pub async fn get(
    State(state): State<ApiState>,
    Json(request): Json<KeyRequest>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.engine.get(&request.key).await?))
}

pub async fn get_partial(
    State(state): State<ApiState>,
    Json(request): Json<GetPartialRequest>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        state.engine.get_partial(&request.key, &request.fields).await?,
    ))
}

pub async fn delete(
    State(state): State<ApiState>,
    Json(request): Json<KeyRequest>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete(request.key).await?;
    Ok(StatusCode::OK)
}

pub async fn batch_set(
    State(state): State<ApiState>,
    Json(items): Json<Vec<Record>>,
) -> Result<StatusCode, ApiError> {
    state.engine.batch_set(items).await?;
    Ok(StatusCode::OK)
}

pub async fn transaction(
    State(state): State<ApiState>,
    Json(ops): Json<Vec<Mutation>>,
) -> Result<StatusCode, ApiError> {
    state.engine.transaction(ops).await?;
    Ok(StatusCode::OK)
}

pub async fn clear_prefix(
    State(state): State<ApiState>,
    Json(request): Json<ClearPrefixRequest>,
) -> Result<Json<Value>, ApiError> {
    let count = state.engine.clear_prefix(&request.prefix).await?;
    Ok(Json(json!({"count": count})))
}

pub async fn drop_database(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let count = state.engine.drop_database().await?;
    Ok(Json(json!({"count": count})))
}

pub async fn query_ast(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let query = Query {
        filter: request.ast,
        projection: request.projection,
        limit: request.limit,
        offset: request.offset,
    };
    Ok(Json(state.engine.query(&query).await?))
}

pub async fn query_radius(
    State(state): State<ApiState>,
    Json(request): Json<RadiusRequest>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(
        state
            .engine
            .query_radius(request.field, request.lat, request.lon, request.radius)
            .await?,
    ))
}

pub async fn query_box(
    State(state): State<ApiState>,
    Json(request): Json<BoxRequest>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(
        state
            .engine
            .query_box(
                request.field,
                request.min_lat,
                request.min_lon,
                request.max_lat,
                request.max_lon,
            )
            .await?,
    ))
}

/// Export responds with a JSON string containing the serialized snapshot
/// array, not the array itself.
pub async fn export(State(state): State<ApiState>) -> Result<Json<String>, ApiError> {
    let snapshot = state.engine.export().await?;
    let serialized = serde_json::to_string(&snapshot).map_err(crate::Error::from)?;
    Ok(Json(serialized))
}

pub async fn import(
    State(state): State<ApiState>,
    Json(items): Json<Vec<Record>>,
) -> Result<StatusCode, ApiError> {
    state.engine.import(items).await?;
    Ok(StatusCode::CREATED)
}

/// Long-lived server-sent event stream of committed changes.
///
/// `?key=` narrows the stream to one key; without it the stream carries every
/// commit. The stream ends when the hub drops this subscriber (overflow) or
/// the client disconnects.
pub async fn events(
    State(state): State<ApiState>,
    QueryParams(params): QueryParams<EventsParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = match params.key {
        Some(key) => state.engine.subscribe(key),
        None => state.engine.subscribe_all(),
    };

    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let change = subscription.recv().await?;
        let event = Event::default()
            .event("update")
            .data(serde_json::to_string(&change).unwrap_or_default());
        Some((Ok(event), subscription))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
