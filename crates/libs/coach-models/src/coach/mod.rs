//! Per-coach data owned by the tasks API.

pub mod coach_data;
