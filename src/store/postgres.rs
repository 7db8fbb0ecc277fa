use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::db::models::{Building, BuildingReading, UserAccount};

const BUILDING_COLUMNS: &str = r#"
    id, name, latitude, longitude,
    loss_coefficient_w_per_k, installed_capacity_kw, tariff_eur_per_kwh,
    target_indoor_c
"#;

const READING_SELECT: &str = r#"
    SELECT r.id,
           r.building_id,
           b.name AS building_name,
           r.recorded_at,
           r.indoor_temperature,
           r.outdoor_temperature,
           r.temperature_difference,
           r.heat_loss_watts,
           r.required_power_kw,
           r.available_power_kw,
           r.has_sufficient_capacity,
           r.daily_cost_eur
    FROM building_readings r
    JOIN buildings b ON b.id = r.building_id
"#;

const USER_SELECT: &str = r#"
    SELECT u.id,
           u.username,
           u.email,
           u.role,
           u.created_at,
           COUNT(bo.id) AS boiler_count,
           u.is_blocked
    FROM users u
    LEFT JOIN boilers bo ON bo.owner_id = u.id
"#;

/// Postgres-backed `Store`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn buildings(&self) -> Result<Vec<Building>> {
        let sql = format!("SELECT {BUILDING_COLUMNS} FROM buildings ORDER BY name, id");
        sqlx::query_as::<_, Building>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list buildings")
    }

    async fn building(&self, id: Uuid) -> Result<Option<Building>> {
        let sql = format!("SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = $1");
        sqlx::query_as::<_, Building>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load building {id}"))
    }

    async fn save_reading(&self, reading: &BuildingReading) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO building_readings (
                id, building_id, recorded_at,
                indoor_temperature, outdoor_temperature, temperature_difference,
                heat_loss_watts, required_power_kw, available_power_kw,
                has_sufficient_capacity, daily_cost_eur
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(reading.id)
        .bind(reading.building_id)
        .bind(reading.recorded_at)
        .bind(reading.indoor_temperature)
        .bind(reading.outdoor_temperature)
        .bind(reading.temperature_difference)
        .bind(reading.heat_loss_watts)
        .bind(reading.required_power_kw)
        .bind(reading.available_power_kw)
        .bind(reading.has_sufficient_capacity)
        .bind(reading.daily_cost_eur)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert reading {}", reading.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn reading(&self, id: Uuid) -> Result<Option<BuildingReading>> {
        let sql = format!("{READING_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, BuildingReading>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load reading {id}"))
    }

    async fn readings_for_building(
        &self,
        building_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<BuildingReading>> {
        let sql = format!(
            r#"{READING_SELECT}
            WHERE r.building_id = $1
              AND ($2::timestamptz IS NULL OR r.recorded_at >= $2)
              AND ($3::timestamptz IS NULL OR r.recorded_at <= $3)
            ORDER BY r.recorded_at ASC, r.id ASC"#
        );
        sqlx::query_as::<_, BuildingReading>(&sql)
            .bind(building_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to load readings for building {building_id}"))
    }

    async fn users(&self) -> Result<Vec<UserAccount>> {
        let sql = format!("{USER_SELECT} GROUP BY u.id ORDER BY u.username");
        sqlx::query_as::<_, UserAccount>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list users")
    }

    async fn user(&self, id: Uuid) -> Result<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE u.id = $1 GROUP BY u.id");
        sqlx::query_as::<_, UserAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load user {id}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::thermal::Deriver;

    fn surveyed(name: &str) -> Building {
        Building {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            latitude: Some(50.09),
            longitude: Some(14.42),
            loss_coefficient_w_per_k: Some(200.0),
            installed_capacity_kw: Some(5.0),
            tariff_eur_per_kwh: Some(0.10),
            target_indoor_c: 21.0,
        }
    }

    async fn insert_building(pool: &PgPool, b: &Building) {
        sqlx::query(
            r#"
            INSERT INTO buildings (
                id, name, latitude, longitude,
                loss_coefficient_w_per_k, installed_capacity_kw, tariff_eur_per_kwh,
                target_indoor_c
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(b.id)
        .bind(&b.name)
        .bind(b.latitude)
        .bind(b.longitude)
        .bind(b.loss_coefficient_w_per_k)
        .bind(b.installed_capacity_kw)
        .bind(b.tariff_eur_per_kwh)
        .bind(b.target_indoor_c)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_user(pool: &PgPool, username: &str, boilers: usize) -> Uuid {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .fetch_one(pool)
        .await
        .unwrap();

        for n in 0..boilers {
            sqlx::query("INSERT INTO boilers (owner_id, serial_number) VALUES ($1, $2)")
                .bind(id)
                .bind(format!("{username}-{n}"))
                .execute(pool)
                .await
                .unwrap();
        }
        id
    }

    fn reading_at(b: &Building, recorded_at: DateTime<Utc>, outdoor_c: f64) -> BuildingReading {
        Deriver::default()
            .derive_reading(Uuid::new_v4(), b, recorded_at, 21.0, outdoor_c)
            .unwrap()
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn buildings_keep_missing_parameters_as_null(pool: PgPool) {
        let mut bare = surveyed("Annex");
        bare.loss_coefficient_w_per_k = None;
        bare.tariff_eur_per_kwh = None;
        let full = surveyed("Town Hall");
        insert_building(&pool, &bare).await;
        insert_building(&pool, &full).await;

        let store = PgStore::new(pool);
        let all = store.buildings().await.unwrap();
        assert_eq!(all, vec![bare.clone(), full]);
        assert_eq!(store.building(bare.id).await.unwrap(), Some(bare));
        assert_eq!(store.building(Uuid::new_v4()).await.unwrap(), None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn saving_the_same_id_twice_writes_once(pool: PgPool) {
        let b = surveyed("Town Hall");
        insert_building(&pool, &b).await;
        let store = PgStore::new(pool);

        let reading = reading_at(&b, noon(1), 5.0);
        assert!(store.save_reading(&reading).await.unwrap());
        assert!(!store.save_reading(&reading).await.unwrap());

        let mut changed = reading_at(&b, noon(2), -5.0);
        changed.id = reading.id;
        assert!(!store.save_reading(&changed).await.unwrap());

        let stored = store.reading(reading.id).await.unwrap().unwrap();
        assert_eq!(stored, reading);
        assert_eq!(stored.building_name, "Town Hall");
        assert_eq!(
            store.readings_for_building(b.id, None, None).await.unwrap().len(),
            1
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reading_rows_carry_the_current_building_name(pool: PgPool) {
        let b = surveyed("Town Hall");
        insert_building(&pool, &b).await;
        let mut reading = reading_at(&b, noon(1), 5.0);
        reading.building_name = "stale".to_owned();

        let store = PgStore::new(pool.clone());
        store.save_reading(&reading).await.unwrap();

        sqlx::query("UPDATE buildings SET name = 'City Hall' WHERE id = $1")
            .bind(b.id)
            .execute(&pool)
            .await
            .unwrap();

        let stored = store.reading(reading.id).await.unwrap().unwrap();
        assert_eq!(stored.building_name, "City Hall");
        assert_eq!(store.reading(Uuid::new_v4()).await.unwrap(), None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn range_bounds_are_inclusive(pool: PgPool) {
        let b = surveyed("Town Hall");
        let other = surveyed("Library");
        insert_building(&pool, &b).await;
        insert_building(&pool, &other).await;
        let store = PgStore::new(pool);

        for day in [3, 1, 2] {
            store.save_reading(&reading_at(&b, noon(day), 0.0)).await.unwrap();
        }
        store.save_reading(&reading_at(&other, noon(2), 0.0)).await.unwrap();

        let all = store.readings_for_building(b.id, None, None).await.unwrap();
        let times: Vec<_> = all.iter().map(|r| r.recorded_at).collect();
        assert_eq!(times, vec![noon(1), noon(2), noon(3)]);

        let bounded = store
            .readings_for_building(b.id, Some(noon(1)), Some(noon(2)))
            .await
            .unwrap();
        assert_eq!(bounded.len(), 2);

        let from_only = store
            .readings_for_building(b.id, Some(noon(2) + Duration::seconds(1)), None)
            .await
            .unwrap();
        assert_eq!(from_only.len(), 1);
        assert_eq!(from_only[0].recorded_at, noon(3));

        let to_only = store
            .readings_for_building(b.id, None, Some(noon(1)))
            .await
            .unwrap();
        assert_eq!(to_only.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn users_count_owned_boilers(pool: PgPool) {
        let owner = insert_user(&pool, "marta", 2).await;
        let newcomer = insert_user(&pool, "adam", 0).await;
        let store = PgStore::new(pool);

        let users = store.users().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["adam", "marta"]);
        assert_eq!(users[0].boiler_count, 0);
        assert_eq!(users[1].boiler_count, 2);
        assert_eq!(users[1].role, "user");
        assert!(!users[1].is_blocked);

        assert_eq!(store.user(owner).await.unwrap().unwrap().boiler_count, 2);
        assert_eq!(store.user(newcomer).await.unwrap().unwrap().boiler_count, 0);
        assert_eq!(store.user(Uuid::new_v4()).await.unwrap(), None);
    }
}
