#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard page handlers.
//!
//! Each page in [`pages`] turns the shared [`DashboardContext`] plus its
//! user inputs into a [`PageRender`]. Handlers never fail: missing data
//! becomes an error notice and a halted page, degraded inputs become
//! warnings with a fallback rendering.
//!
//! [`PageRender`]: yield_risk_dashboard_models::PageRender

pub mod context;
pub mod filters;
pub mod format;
pub mod pages;
pub mod stats;

pub use context::DashboardContext;
