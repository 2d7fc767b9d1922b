//! Dashboard statistics read model
//!
//! `maintenanceHours` and `dieselUsage` are simulated figures, not
//! measurements. Diesel comes from a [`TelemetryFeed`] so a real sensor
//! source can replace the simulation.

use rand::Rng;
use serde::Serialize;

use crate::alert::SecurityAlert;
use crate::maintenance::MaintenanceSchedule;
use crate::production::{ProductionActivity, ProductionStatus};

/// Hours of workload attributed to each maintenance schedule.
pub const HOURS_PER_MAINTENANCE: u64 = 4;

pub const DIESEL_BASELINE: u64 = 15_247;
pub const DIESEL_JITTER: u64 = 1_000;

/// Source of the diesel consumption reading.
pub trait TelemetryFeed: Send + Sync {
    fn diesel_usage(&self) -> u64;
}

/// Baseline plus uniform jitter in `0..DIESEL_JITTER`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedTelemetry;

impl TelemetryFeed for SimulatedTelemetry {
    fn diesel_usage(&self) -> u64 {
        DIESEL_BASELINE + rand::thread_rng().gen_range(0..DIESEL_JITTER)
    }
}

/// A feed that always reports the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedTelemetry(pub u64);

impl TelemetryFeed for FixedTelemetry {
    fn diesel_usage(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub production_active: u64,
    pub maintenance_hours: u64,
    pub diesel_usage: u64,
    pub security_alerts: u64,
}

impl DashboardStats {
    pub fn compute(
        activities: &[ProductionActivity],
        schedules: &[MaintenanceSchedule],
        alerts: &[SecurityAlert],
        diesel_usage: u64,
    ) -> Self {
        let production_active = activities
            .iter()
            .filter(|a| a.status == ProductionStatus::InProgress)
            .count() as u64;
        let security_alerts = alerts.iter().filter(|a| !a.resolved).count() as u64;

        Self {
            production_active,
            maintenance_hours: schedules.len() as u64 * HOURS_PER_MAINTENANCE,
            diesel_usage,
            security_alerts,
        }
    }
}
