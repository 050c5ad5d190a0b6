//! Kylo Status Tool
//!
//! Runtime status of the service, plus the usage guide for assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::state::SessionSnapshot;

/// Usage guide for AI assistants driving the Kylo tools
pub const DIET_INSTRUCTIONS: &str = r#"
# Kylo Usage Instructions

## Session

Most tools act on the active user. Call `select_user` with the user's id
once, or pass `user_id` explicitly to any tool. `clear_session` signs out.
`get_session` shows who is active.

New users: validate the form with `register_profile` (email, full name,
password, confirmation). Passwords need at least 8 characters.

## Diet setup

1. `list_diet_presets` shows Balanced (30/45/25), High Protein (40/35/25),
   Keto (25/5/70) and Low Carb (35/25/40) as protein/carb/fat percent.
2. `preview_diet_targets` computes gram targets without saving. The
   percentages must add up to exactly 100.
3. `save_diet_targets` stores them. Saving again replaces the old set.

Grams are derived from calories: protein and carbs 4 kcal/g, fat 9 kcal/g,
rounded to whole grams. The re-derived calories may differ from the
budget by a few kcal; `drift` reports the difference.

## Logging food

1. `search_foods` by name. Catalog values are per 100 g.
2. `log_foods` with a meal (breakfast, lunch, dinner, snack), a date
   (YYYY-MM-DD, defaults to today) and the selected food ids. Amount
   defaults to 100 g.
3. `get_dashboard` shows calories remaining, macro progress and meals.

Use `update_food_log` to change an amount (nutrition is rescaled) and
`delete_food_log` to remove an entry.
"#;

/// Runtime status of the Kylo service
#[derive(Debug, Clone, Serialize)]
pub struct KyloStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Session information
    pub initialized: bool,
    pub active_user: Option<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, session: &SessionSnapshot) -> KyloStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        KyloStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            initialized: session.initialized,
            active_user: session.session_user.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
