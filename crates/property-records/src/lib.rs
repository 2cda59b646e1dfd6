//! Assessor property records: storage, filtered listings, and the HTTP surface over them.

pub mod auth;
pub mod config;
pub mod error;
pub mod import;
pub mod records;
pub mod telemetry;
