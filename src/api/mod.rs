pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{
    readings::ReadingService, seeding::SeedService, store::Store, thermal::Deriver,
    weather::WeatherSource,
};

/// Everything a handler needs, passed explicitly through `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub readings: Arc<ReadingService>,
    pub seeder: Arc<SeedService>,
    pub deriver: Deriver,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        weather: Option<Arc<dyn WeatherSource>>,
        deriver: Deriver,
        seed_max_days: u32,
    ) -> Self {
        Self {
            readings: Arc::new(ReadingService::new(Arc::clone(&store), weather, deriver)),
            seeder: Arc::new(SeedService::new(Arc::clone(&store), deriver, seed_max_days)),
            store,
            deriver,
        }
    }
}

fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/buildings", get(handlers::list_buildings))
        .route(
            "/buildings/{building_id}/readings",
            get(handlers::get_building_readings).post(handlers::record_reading),
        )
        .route(
            "/buildings/{building_id}/weather",
            get(handlers::get_building_weather),
        )
        .route("/readings/derive", post(handlers::derive_preview))
        .route("/readings/{reading_id}", get(handlers::get_reading))
        .route("/seed", post(handlers::seed_historical_data))
        .route("/users", get(handlers::list_users))
        .route("/users/{user_id}", get(handlers::get_user))
}

/// The OpenAPI document served at `/api-docs/openapi.json`.
pub fn openapi() -> utoipa::openapi::OpenApi {
    routes().split_for_parts().1
}

pub fn router(state: AppState) -> Router {
    let (router, api) = routes().split_for_parts();

    router
        .with_state(state)
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
