use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::db::models::{Building, BuildingReading, UserAccount};

/// In-memory `Store` for running without Postgres and for tests.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Uses `tokio::sync::RwLock` so concurrent readers never block each other.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    buildings: HashMap<Uuid, Building>,
    readings: HashMap<Uuid, BuildingReading>,
    users: HashMap<Uuid, UserAccount>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a building.
    pub async fn put_building(&self, building: Building) {
        self.inner
            .write()
            .await
            .buildings
            .insert(building.id, building);
    }

    /// Insert or replace a user account view.
    pub async fn put_user(&self, user: UserAccount) {
        self.inner.write().await.users.insert(user.id, user);
    }

    pub async fn reading_count(&self) -> usize {
        self.inner.read().await.readings.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn buildings(&self) -> Result<Vec<Building>> {
        let mut all: Vec<_> = self.inner.read().await.buildings.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn building(&self, id: Uuid) -> Result<Option<Building>> {
        Ok(self.inner.read().await.buildings.get(&id).cloned())
    }

    async fn save_reading(&self, reading: &BuildingReading) -> Result<bool> {
        let mut guard = self.inner.write().await;
        if guard.readings.contains_key(&reading.id) {
            return Ok(false);
        }
        guard.readings.insert(reading.id, reading.clone());
        Ok(true)
    }

    async fn reading(&self, id: Uuid) -> Result<Option<BuildingReading>> {
        Ok(self.inner.read().await.readings.get(&id).cloned())
    }

    async fn readings_for_building(
        &self,
        building_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<BuildingReading>> {
        let mut rows: Vec<_> = self
            .inner
            .read()
            .await
            .readings
            .values()
            .filter(|r| r.building_id == building_id)
            .filter(|r| from.map_or(true, |f| r.recorded_at >= f))
            .filter(|r| to.map_or(true, |t| r.recorded_at <= t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn users(&self) -> Result<Vec<UserAccount>> {
        let mut all: Vec<_> = self.inner.read().await.users.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    async fn user(&self, id: Uuid) -> Result<Option<UserAccount>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn building(name: &str) -> Building {
        Building {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            latitude: None,
            longitude: None,
            loss_coefficient_w_per_k: Some(150.0),
            installed_capacity_kw: Some(8.0),
            tariff_eur_per_kwh: Some(0.12),
            target_indoor_c: 21.0,
        }
    }

    fn make_reading(building: &Building, recorded_at: DateTime<Utc>) -> BuildingReading {
        BuildingReading {
            id: Uuid::new_v4(),
            building_id: building.id,
            building_name: building.name.clone(),
            recorded_at,
            indoor_temperature: 21.0,
            outdoor_temperature: 5.0,
            temperature_difference: 16.0,
            heat_loss_watts: 2400.0,
            required_power_kw: 2.4,
            available_power_kw: 8.0,
            has_sufficient_capacity: true,
            daily_cost_eur: 6.912,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = MemoryStore::new();
        assert!(store.buildings().await.unwrap().is_empty());
        assert!(store.reading(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.users().await.unwrap().is_empty());
        assert_eq!(store.reading_count().await, 0);
    }

    #[tokio::test]
    async fn buildings_are_listed_by_name() {
        let store = MemoryStore::new();
        store.put_building(building("School")).await;
        store.put_building(building("Annex")).await;

        let names: Vec<_> = store
            .buildings()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["Annex", "School"]);
    }

    #[tokio::test]
    async fn save_is_idempotent_on_id() {
        let store = MemoryStore::new();
        let b = building("Annex");
        let r = make_reading(&b, at(3));

        assert!(store.save_reading(&r).await.unwrap());
        assert!(!store.save_reading(&r).await.unwrap());
        assert_eq!(store.reading_count().await, 1);
        assert_eq!(store.reading(r.id).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn range_query_filters_by_building_and_bounds() {
        let store = MemoryStore::new();
        let a = building("A");
        let b = building("B");

        for hour in [5, 1, 3, 7] {
            store.save_reading(&make_reading(&a, at(hour))).await.unwrap();
        }
        store.save_reading(&make_reading(&b, at(3))).await.unwrap();

        let all = store.readings_for_building(a.id, None, None).await.unwrap();
        let hours: Vec<_> = all.iter().map(|r| r.recorded_at).collect();
        assert_eq!(hours, [at(1), at(3), at(5), at(7)]);

        let window = store
            .readings_for_building(a.id, Some(at(3)), Some(at(5)))
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|r| r.building_id == a.id));

        let after = store
            .readings_for_building(a.id, Some(at(7) + Duration::seconds(1)), None)
            .await
            .unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        let b = building("Shared");
        store.put_building(b.clone()).await;

        assert_eq!(clone.building(b.id).await.unwrap(), Some(b));
    }
}
