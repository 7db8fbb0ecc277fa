use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::OpenApi;
use uuid::Uuid;

use super::{
    dto::{
        BuildingDto, BuildingReadingDto, DeriveRequest, DerivedFieldsDto, RecordReadingRequest,
        SeedFailureDto, SeedHistoricalDataRequest, SeedHistoricalDataResponse, UserResponseDto,
    },
    errors::AppError,
    AppState,
};
use crate::{
    errors::Error,
    weather::models::{WeatherCondition, WeatherSnapshot, Wind},
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TimeRangeParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// List every known building with its thermal parameters.
#[utoipa::path(
    get,
    path = "/buildings",
    responses(
        (status = 200, description = "Buildings", body = Vec<BuildingDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "buildings"
)]
pub async fn list_buildings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BuildingDto>>, AppError> {
    let rows = state.store.buildings().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Fetch readings for a building, ordered by timestamp ascending.
/// Optionally filter by time range with `?from=<RFC3339>&to=<RFC3339>`.
#[utoipa::path(
    get,
    path = "/buildings/{building_id}/readings",
    params(
        ("building_id" = Uuid, Path, description = "Building ID"),
        ("from" = Option<DateTime<Utc>>, Query, description = "Start of time range (RFC3339)"),
        ("to"   = Option<DateTime<Utc>>, Query, description = "End of time range (RFC3339)"),
    ),
    responses(
        (status = 200, description = "Building readings", body = Vec<BuildingReadingDto>),
        (status = 400, description = "Range end precedes range start"),
        (status = 404, description = "Unknown building"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn get_building_readings(
    State(state): State<AppState>,
    Path(building_id): Path<Uuid>,
    Query(params): Query<TimeRangeParams>,
) -> Result<Json<Vec<BuildingReadingDto>>, AppError> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if to < from {
            return Err(Error::invalid("`to` must not precede `from`").into());
        }
    }
    if state.store.building(building_id).await?.is_none() {
        return Err(Error::not_found("Building", building_id).into());
    }

    let rows = state
        .store
        .readings_for_building(building_id, params.from, params.to)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Record a raw sample: derive every field, persist, and return the reading.
#[utoipa::path(
    post,
    path = "/buildings/{building_id}/readings",
    params(("building_id" = Uuid, Path, description = "Building ID")),
    request_body = RecordReadingRequest,
    responses(
        (status = 201, description = "Reading recorded", body = BuildingReadingDto),
        (status = 400, description = "Implausible input"),
        (status = 404, description = "Unknown building"),
        (status = 422, description = "Building parameters or weather source missing"),
        (status = 502, description = "Weather source unavailable"),
    ),
    tag = "readings"
)]
pub async fn record_reading(
    State(state): State<AppState>,
    Path(building_id): Path<Uuid>,
    Json(body): Json<RecordReadingRequest>,
) -> Result<(StatusCode, Json<BuildingReadingDto>), AppError> {
    let reading = state.readings.record(building_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(reading.into())))
}

/// Current weather at a building's location.
#[utoipa::path(
    get,
    path = "/buildings/{building_id}/weather",
    params(("building_id" = Uuid, Path, description = "Building ID")),
    responses(
        (status = 200, description = "Current weather", body = WeatherSnapshot),
        (status = 404, description = "Unknown building"),
        (status = 422, description = "Coordinates or weather source missing"),
        (status = 502, description = "Weather source unavailable"),
    ),
    tag = "buildings"
)]
pub async fn get_building_weather(
    State(state): State<AppState>,
    Path(building_id): Path<Uuid>,
) -> Result<Json<WeatherSnapshot>, AppError> {
    Ok(Json(state.readings.current_weather(building_id).await?))
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Fetch a single reading by ID.
#[utoipa::path(
    get,
    path = "/readings/{reading_id}",
    params(("reading_id" = Uuid, Path, description = "Reading ID")),
    responses(
        (status = 200, description = "Reading", body = BuildingReadingDto),
        (status = 404, description = "No such reading"),
    ),
    tag = "readings"
)]
pub async fn get_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<Uuid>,
) -> Result<Json<BuildingReadingDto>, AppError> {
    let reading = state
        .store
        .reading(reading_id)
        .await?
        .ok_or_else(|| Error::not_found("Reading", reading_id))?;
    Ok(Json(reading.into()))
}

/// Derive the computed fields for arbitrary inputs without persisting.
#[utoipa::path(
    post,
    path = "/readings/derive",
    request_body = DeriveRequest,
    responses(
        (status = 200, description = "Derived fields", body = DerivedFieldsDto),
        (status = 400, description = "Implausible input"),
        (status = 422, description = "No tariff given and none configured"),
    ),
    tag = "readings"
)]
pub async fn derive_preview(
    State(state): State<AppState>,
    Json(body): Json<DeriveRequest>,
) -> Result<Json<DerivedFieldsDto>, AppError> {
    let tariff = body
        .tariff_eur_per_kwh
        .or(state.deriver.default_tariff_eur_per_kwh)
        .ok_or_else(|| Error::missing("no tariff given and no default tariff is configured"))?;
    let inputs = body.into_inputs(tariff, state.deriver.window_hours);
    Ok(Json(state.deriver.derive(&inputs)?.into()))
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Generate synthetic historical readings. Individual failures are reported
/// in the response; the batch itself always completes.
#[utoipa::path(
    post,
    path = "/seed",
    request_body = SeedHistoricalDataRequest,
    responses(
        (status = 200, description = "Seeding summary", body = SeedHistoricalDataResponse),
        (status = 400, description = "Invalid day count, interval or end date"),
    ),
    tag = "seeding"
)]
pub async fn seed_historical_data(
    State(state): State<AppState>,
    Json(body): Json<SeedHistoricalDataRequest>,
) -> Result<Json<SeedHistoricalDataResponse>, AppError> {
    let summary = state.seeder.seed(&body.into()).await?;
    Ok(Json(summary.into()))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// List user accounts with their boiler counts.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = Vec<UserResponseDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponseDto>>, AppError> {
    let rows = state.store.users().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponseDto),
        (status = 404, description = "No such user"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponseDto>, AppError> {
    let user = state
        .store
        .user(user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    Ok(Json(user.into()))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        list_buildings,
        get_building_readings,
        record_reading,
        get_building_weather,
        get_reading,
        derive_preview,
        seed_historical_data,
        list_users,
        get_user,
        health,
    ),
    components(schemas(
        BuildingDto,
        BuildingReadingDto,
        RecordReadingRequest,
        DeriveRequest,
        DerivedFieldsDto,
        SeedHistoricalDataRequest,
        SeedHistoricalDataResponse,
        SeedFailureDto,
        UserResponseDto,
        WeatherSnapshot,
        WeatherCondition,
        Wind,
    )),
    tags(
        (name = "buildings", description = "Building endpoints"),
        (name = "readings",  description = "Derived reading endpoints"),
        (name = "seeding",   description = "Historical data seeding"),
        (name = "users",     description = "User account views"),
        (name = "system",    description = "System endpoints"),
    ),
    info(
        title = "Boiler Monitor API",
        version = "0.1.0",
        description = "REST API for building heat-loss and boiler capacity readings"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
