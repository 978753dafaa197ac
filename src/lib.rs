//! Payroll Engine for a small organisation's HR backend
//!
//! This crate provides salary calculation from attendance, leave and
//! configurable rule sets, the payroll record lifecycle, the leave approval
//! workflow, the salary rule store, the attendance ledger and the REST API
//! that exposes them.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod store;
