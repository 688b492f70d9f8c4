pub mod coerce;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod observability;
pub mod schedule;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
