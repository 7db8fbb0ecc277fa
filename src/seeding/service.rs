use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};
use uuid::Uuid;

use super::profile::{indoor_temperature_at, outdoor_temperature_at};
use crate::{
    db::models::Building,
    errors::{Error, Result},
    store::Store,
    thermal::Deriver,
};

const MINUTES_PER_DAY: u32 = 24 * 60;
/// Failures beyond this many are counted but not itemised.
pub const MAX_REPORTED_FAILURES: usize = 50;
/// Units allowed to run at once; the rest wait for a slot.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;
/// Accepted `end_date` years.
const END_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

#[derive(Debug, Clone, PartialEq)]
pub struct SeedRequest {
    /// Buildings to seed; all known buildings when `None`.
    pub building_ids: Option<Vec<Uuid>>,
    pub days: u32,
    pub interval_minutes: u32,
    /// Exclusive end of the seeded range. Defaults to today (UTC).
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedFailure {
    pub building_id: Option<Uuid>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub error: String,
}

type UnitOutcome = Result<(), SeedFailure>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSummary {
    pub readings_generated: u64,
    pub buildings_processed: u64,
    pub days_generated: u32,
    pub failed: u64,
    pub failures: Vec<SeedFailure>,
}

impl SeedSummary {
    fn fail(&mut self, units: u64, failure: SeedFailure) {
        self.failed += units;
        if self.failures.len() < MAX_REPORTED_FAILURES {
            self.failures.push(failure);
        }
    }

    fn record(&mut self, joined: Result<UnitOutcome, JoinError>) {
        match joined {
            Ok(Ok(())) => self.readings_generated += 1,
            Ok(Err(failure)) => {
                warn!(
                    building_id = ?failure.building_id,
                    recorded_at = ?failure.recorded_at,
                    error = %failure.error,
                    "Seed unit failed"
                );
                self.fail(1, failure);
            }
            Err(e) => self.fail(
                1,
                SeedFailure {
                    building_id: None,
                    recorded_at: None,
                    error: format!("seed task aborted: {e}"),
                },
            ),
        }
    }
}

/// Bulk generator of synthetic historical readings.
pub struct SeedService {
    store: Arc<dyn Store>,
    deriver: Deriver,
    max_days: u32,
    max_in_flight: usize,
}

impl SeedService {
    pub fn new(store: Arc<dyn Store>, deriver: Deriver, max_days: u32) -> Self {
        Self {
            store,
            deriver,
            max_days,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Generates one reading per (building, day, sample) and persists each
    /// independently.
    ///
    /// Request-level problems (bad `days`, `interval_minutes` or `end_date`)
    /// reject the whole request. Everything after that is fail-soft: an
    /// unknown or unconfigured building fails its own units, a failed
    /// derivation or write fails one unit, and the rest of the batch still
    /// runs. At most `max_in_flight` units are spawned at any time.
    pub async fn seed(&self, req: &SeedRequest) -> Result<SeedSummary> {
        let samples_per_day = self.validate(req)?;
        let start = range_start(req)?;
        let units_per_building = u64::from(req.days) * u64::from(samples_per_day);

        let mut summary = SeedSummary::default();
        let buildings = self.resolve_buildings(req, units_per_building, &mut summary).await?;

        let mut tasks = JoinSet::new();
        for building in buildings {
            if let Err(e) = self
                .deriver
                .inputs_for(&building, building.target_indoor_c, 0.0)
            {
                warn!(building_id = %building.id, error = %e, "Skipping building");
                summary.fail(
                    units_per_building,
                    SeedFailure {
                        building_id: Some(building.id),
                        recorded_at: None,
                        error: e.to_string(),
                    },
                );
                continue;
            }

            summary.buildings_processed += 1;
            let building = Arc::new(building);

            for unit in 0..units_per_building {
                let offset = Duration::minutes(unit as i64 * i64::from(req.interval_minutes));
                let recorded_at = start
                    .checked_add_signed(offset)
                    .ok_or_else(|| Error::invalid("seed range is out of bounds"))?;

                while tasks.len() >= self.max_in_flight {
                    if let Some(joined) = tasks.join_next().await {
                        summary.record(joined);
                    }
                }

                let store = Arc::clone(&self.store);
                let building = Arc::clone(&building);
                let deriver = self.deriver;
                tasks.spawn(async move {
                    seed_one(store.as_ref(), &deriver, &building, recorded_at)
                        .await
                        .map_err(|e| SeedFailure {
                            building_id: Some(building.id),
                            recorded_at: Some(recorded_at),
                            error: e.to_string(),
                        })
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            summary.record(joined);
        }

        if summary.buildings_processed > 0 {
            summary.days_generated = req.days;
        }

        info!(
            readings = summary.readings_generated,
            buildings = summary.buildings_processed,
            days = summary.days_generated,
            failed = summary.failed,
            "Historical seeding finished"
        );
        Ok(summary)
    }

    /// Returns the number of samples per day.
    fn validate(&self, req: &SeedRequest) -> Result<u32> {
        if req.days == 0 || req.days > self.max_days {
            return Err(Error::invalid(format!(
                "days must be between 1 and {}, got {}",
                self.max_days, req.days
            )));
        }
        if req.interval_minutes == 0 || MINUTES_PER_DAY % req.interval_minutes != 0 {
            return Err(Error::invalid(format!(
                "interval_minutes must divide a day evenly, got {}",
                req.interval_minutes
            )));
        }
        Ok(MINUTES_PER_DAY / req.interval_minutes)
    }

    async fn resolve_buildings(
        &self,
        req: &SeedRequest,
        units_per_building: u64,
        summary: &mut SeedSummary,
    ) -> Result<Vec<Building>> {
        let Some(ids) = &req.building_ids else {
            return Ok(self.store.buildings().await?);
        };

        let mut found = Vec::new();
        for id in ids.iter().copied().collect::<BTreeSet<_>>() {
            match self.store.building(id).await? {
                Some(b) => found.push(b),
                None => summary.fail(
                    units_per_building,
                    SeedFailure {
                        building_id: Some(id),
                        recorded_at: None,
                        error: Error::not_found("Building", id).to_string(),
                    },
                ),
            }
        }
        Ok(found)
    }
}

/// First instant of the seeded range: `days` whole UTC days before `end_date`.
fn range_start(req: &SeedRequest) -> Result<DateTime<Utc>> {
    let end_date = req.end_date.unwrap_or_else(|| Utc::now().date_naive());
    if !END_YEARS.contains(&end_date.year()) {
        return Err(Error::invalid(format!(
            "end_date must fall in the years {} to {}, got {end_date}",
            END_YEARS.start(),
            END_YEARS.end()
        )));
    }
    end_date
        .and_time(NaiveTime::MIN)
        .and_utc()
        .checked_sub_signed(Duration::days(i64::from(req.days)))
        .ok_or_else(|| {
            Error::invalid(format!("{} days before {end_date} is out of range", req.days))
        })
}

/// Stable id so that re-seeding the same window rewrites nothing.
pub fn seeded_reading_id(building_id: Uuid, recorded_at: DateTime<Utc>) -> Uuid {
    Uuid::new_v5(&building_id, &recorded_at.timestamp().to_be_bytes())
}

async fn seed_one(
    store: &dyn Store,
    deriver: &Deriver,
    building: &Building,
    recorded_at: DateTime<Utc>,
) -> Result<()> {
    let reading = deriver.derive_reading(
        seeded_reading_id(building.id, recorded_at),
        building,
        recorded_at,
        indoor_temperature_at(recorded_at, building.target_indoor_c),
        outdoor_temperature_at(recorded_at),
    )?;
    store.save_reading(&reading).await?;
    Ok(())
}
