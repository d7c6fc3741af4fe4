//! Scheduling and billing for a small professional practice.
//!
//! The two computational cores are [`recurrence`] (turning a task and its
//! repeat rule into dated occurrences) and [`billing`] (turning elapsed time
//! into a rounded billable amount). Everything else stores, tracks and
//! reports around them.

pub mod billing;
pub mod commands;
pub mod config;
pub mod format;
pub mod models;
pub mod recurrence;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod tui;
