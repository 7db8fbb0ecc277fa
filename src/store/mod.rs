mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{Building, BuildingReading, UserAccount};

/// Persistence for buildings, derived readings and account views.
///
/// Writes are idempotent on the reading id so bulk seeding can be replayed.
#[async_trait]
pub trait Store: Send + Sync {
    async fn buildings(&self) -> Result<Vec<Building>>;

    async fn building(&self, id: Uuid) -> Result<Option<Building>>;

    /// Persist `reading`. Returns `false` when a reading with the same id
    /// already exists, in which case nothing is written.
    async fn save_reading(&self, reading: &BuildingReading) -> Result<bool>;

    async fn reading(&self, id: Uuid) -> Result<Option<BuildingReading>>;

    /// Readings for one building with inclusive optional bounds, ordered by
    /// `recorded_at` ascending.
    async fn readings_for_building(
        &self,
        building_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<BuildingReading>>;

    async fn users(&self) -> Result<Vec<UserAccount>>;

    async fn user(&self, id: Uuid) -> Result<Option<UserAccount>>;
}
