//! Diet targets model
//!
//! Daily calorie and macro gram goals, one row per user.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::{MacroError, MacroSplit, MacroTargets};
use super::validation::{invalid_column, parse_date, require_non_empty, ValidationError, DATE_FORMAT};

/// A user's persisted diet target set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietTargets {
    pub id: String,
    pub target_calories: u32,
    pub target_protein_grams: u32,
    pub target_carb_grams: u32,
    pub target_fat_grams: u32,
    pub effective_from: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

/// A target set ready to be stored.
///
/// Only constructed through the calculator, so the split behind it always
/// summed to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct DietTargetsUpsert {
    id: String,
    target_calories: u32,
    targets: MacroTargets,
    effective_from: NaiveDate,
}

impl DietTargetsUpsert {
    /// Run the calculator and prepare the record
    pub fn compute(
        id: &str,
        target_calories: u32,
        split: MacroSplit,
        effective_from: NaiveDate,
    ) -> Result<Self, MacroError> {
        let targets = split.targets_for(target_calories)?;
        Ok(Self {
            id: id.trim().to_string(),
            target_calories,
            targets,
            effective_from,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target_calories(&self) -> u32 {
        self.target_calories
    }

    pub fn targets(&self) -> MacroTargets {
        self.targets
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }
}

impl DietTargets {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let target_calories: u32 = row.get("target_calories")?;
        if target_calories == 0 {
            return Err(invalid_column(1, ValidationError::NotPositive {
                field: "target_calories",
                value: 0.0,
            }));
        }
        let effective_from: String = row.get("effective_from")?;
        let effective_from = parse_date(&effective_from).map_err(|e| invalid_column(5, e))?;

        Ok(Self {
            id: row.get("id")?,
            target_calories,
            target_protein_grams: row.get("target_protein_grams")?,
            target_carb_grams: row.get("target_carb_grams")?,
            target_fat_grams: row.get("target_fat_grams")?,
            effective_from,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Gram targets as a calculator triple
    pub fn macro_targets(&self) -> MacroTargets {
        MacroTargets {
            protein_grams: self.target_protein_grams,
            carb_grams: self.target_carb_grams,
            fat_grams: self.target_fat_grams,
        }
    }

    /// Get the target set for a user
    pub fn get(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM diet_targets WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(targets) => Ok(Some(targets)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a target set, replacing any earlier one for the same user
    pub fn upsert(conn: &Connection, data: &DietTargetsUpsert) -> DbResult<Self> {
        require_non_empty("id", &data.id)?;

        conn.execute(
            r#"
            INSERT INTO diet_targets (
                id, target_calories, target_protein_grams, target_carb_grams,
                target_fat_grams, effective_from
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                target_calories = excluded.target_calories,
                target_protein_grams = excluded.target_protein_grams,
                target_carb_grams = excluded.target_carb_grams,
                target_fat_grams = excluded.target_fat_grams,
                effective_from = excluded.effective_from,
                updated_at = datetime('now')
            "#,
            params![
                data.id,
                data.target_calories,
                data.targets.protein_grams,
                data.targets.carb_grams,
                data.targets.fat_grams,
                data.effective_from.format(DATE_FORMAT).to_string(),
            ],
        )?;

        tracing::info!(user = %data.id, calories = data.target_calories, "diet targets stored");

        Self::get(conn, &data.id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }
}
