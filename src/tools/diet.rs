//! Diet setup tools
//!
//! Presets, target previews and persisting a user's target set.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::db::Database;
use crate::models::{DietTargets, DietTargetsUpsert};
use crate::nutrition::{DietPreset, MacroError, MacroSplit, MacroTargets, DEFAULT_DAILY_CALORIES};

/// One preset in list_diet_presets
#[derive(Debug, Serialize)]
pub struct PresetSummary {
    pub key: DietPreset,
    pub name: &'static str,
    pub protein_percent: u32,
    pub carb_percent: u32,
    pub fat_percent: u32,
}

impl From<DietPreset> for PresetSummary {
    fn from(preset: DietPreset) -> Self {
        let split = preset.split();
        Self {
            key: preset,
            name: preset.name(),
            protein_percent: split.protein_percent,
            carb_percent: split.carb_percent,
            fat_percent: split.fat_percent,
        }
    }
}

/// Response for list_diet_presets
#[derive(Debug, Serialize)]
pub struct ListPresetsResponse {
    pub presets: Vec<PresetSummary>,
    pub default_preset: DietPreset,
    pub default_calories: u32,
}

/// Response for preview_diet_targets
#[derive(Debug, Serialize)]
pub struct PreviewTargetsResponse {
    pub target_calories: u32,
    pub split: MacroSplit,
    pub targets: MacroTargets,
    pub derived_calories: u64,
    pub drift: i64,
}

/// Why save_diet_targets failed: rejected input or a store failure
#[derive(Debug, Error)]
pub enum SaveTargetsError {
    #[error(transparent)]
    Calculation(#[from] MacroError),

    #[error("{0}")]
    Store(String),
}

/// Response for save_diet_targets
#[derive(Debug, Serialize)]
pub struct SaveTargetsResponse {
    pub success: bool,
    pub split: MacroSplit,
    pub drift: i64,
    pub diet_targets: DietTargets,
}

pub fn list_diet_presets() -> ListPresetsResponse {
    ListPresetsResponse {
        presets: DietPreset::ALL.into_iter().map(PresetSummary::from).collect(),
        default_preset: DietPreset::default(),
        default_calories: DEFAULT_DAILY_CALORIES,
    }
}

/// Start from a preset (Balanced if none) and apply any explicit percentages
pub fn resolve_split(
    preset: Option<&str>,
    protein_percent: Option<u32>,
    carb_percent: Option<u32>,
    fat_percent: Option<u32>,
) -> Result<MacroSplit, String> {
    let base = match preset {
        Some(name) => DietPreset::parse(name).ok_or_else(|| {
            format!("Unknown diet preset '{}': expected Balanced, High Protein, Keto or Low Carb", name)
        })?,
        None => DietPreset::default(),
    };

    let mut split = base.split();
    if let Some(p) = protein_percent {
        split.protein_percent = p;
    }
    if let Some(c) = carb_percent {
        split.carb_percent = c;
    }
    if let Some(f) = fat_percent {
        split.fat_percent = f;
    }
    Ok(split)
}

/// Compute targets without storing them
pub fn preview_diet_targets(target_calories: u32, split: MacroSplit) -> Result<PreviewTargetsResponse, String> {
    let targets = split.targets_for(target_calories).map_err(|e| e.to_string())?;

    Ok(PreviewTargetsResponse {
        target_calories,
        split,
        targets,
        derived_calories: targets.calories(),
        drift: targets.drift(target_calories),
    })
}

/// Compute and store a user's targets. An invalid split leaves the store untouched.
pub fn save_diet_targets(
    db: &Database,
    user_id: &str,
    target_calories: u32,
    split: MacroSplit,
    effective_from: NaiveDate,
) -> Result<SaveTargetsResponse, SaveTargetsError> {
    let data = DietTargetsUpsert::compute(user_id, target_calories, split, effective_from)?;
    let drift = data.targets().drift(data.target_calories());

    let conn = db
        .get_conn()
        .map_err(|e| SaveTargetsError::Store(format!("Database error: {}", e)))?;
    let diet_targets = DietTargets::upsert(&conn, &data)
        .map_err(|e| SaveTargetsError::Store(format!("Failed to save diet targets: {}", e)))?;

    Ok(SaveTargetsResponse {
        success: true,
        split,
        drift,
        diet_targets,
    })
}

/// Get a user's stored targets
pub fn get_diet_targets(db: &Database, user_id: &str) -> Result<Option<DietTargets>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    DietTargets::get(&conn, user_id).map_err(|e| format!("Failed to get diet targets: {}", e))
}
