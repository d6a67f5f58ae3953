//! dayflux.raw_day.v1 input schema
//!
//! This module defines the raw per-day interval records the dashboard is fed
//! with, the parsers for the supported file layouts, and dataset validation.

mod adapter;
mod raw_day;

pub use adapter::*;
pub use raw_day::*;
