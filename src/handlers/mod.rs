//! HTTP handlers for resource CRUD and reports.

pub mod reports;
pub mod resource;
