//! Dayflux - Aggregation engine for a daily-activity dashboard
//!
//! Dayflux turns per-day lists of hour intervals into the statistics a
//! dashboard renders, through a deterministic pipeline: dataset parsing →
//! normalization → per-day derivation → multi-day aggregation → snapshot
//! encoding.
//!
//! ## Modules
//!
//! - **Per-day statistics**: sleep hours, outdoor minutes and category totals
//!   reconciled to 24 hours
//! - **Aggregation**: weekly averages, hourly distributions, weekday vs.
//!   weekend comparison, correlations between categories
//! - **Daily context**: a selected day compared with the previous one
//! - **Calendar**: per-day markers for a month view

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod context;
pub mod correlation;
pub mod encoder;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod sample;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregate::{
    compute_activity_stats, compute_hourly_distribution, compute_weekday_weekend_split,
    compute_weekly_aggregate, TimeRange,
};
pub use calendar::{CalendarDay, CalendarEvent, SleepStatus};
pub use config::{Category, CategoryId, CategoryTemplate, DashboardConfig};
pub use context::DailyContext;
pub use correlation::compute_correlations;
pub use encoder::{DashboardSnapshot, SnapshotEncoder};
pub use error::ComputeError;
pub use features::compute_day_derived;
pub use pipeline::{load_dataset, DashboardProcessor};

// Schema exports
pub use schema::{DatasetFormat, RawDay, RawDayAdapter, RawInterval, SCHEMA_VERSION};

/// Dayflux version embedded in every snapshot
pub const DAYFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshots
pub const PRODUCER_NAME: &str = "dayflux";
