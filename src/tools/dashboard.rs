//! Daily nutrition dashboard
//!
//! Calories remaining, macro progress and meals for one day, plus the strip
//! of selectable dates since the current targets took effect.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::models::{DietTargets, FoodLog, MealType, Nutrition, Profile, DATE_FORMAT};

/// Consumption of one macro against its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroProgress {
    pub consumed_grams: f64,
    pub target_grams: u32,
    pub percent: f64,
}

impl MacroProgress {
    fn new(consumed_grams: f64, target_grams: u32) -> Self {
        Self {
            consumed_grams,
            target_grams,
            percent: progress_percent(consumed_grams, f64::from(target_grams)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroProgressSet {
    pub protein: MacroProgress,
    pub carbs: MacroProgress,
    pub fat: MacroProgress,
}

/// Entries logged to one meal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSection {
    pub meal_type: MealType,
    pub calories: f64,
    pub items: Vec<FoodLog>,
}

/// One selectable day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateChip {
    pub date: NaiveDate,
    pub label: String,
}

/// Response for get_dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub user_id: String,
    pub display_name: String,
    pub date: NaiveDate,
    pub date_label: String,
    pub goal_calories: u32,
    pub consumed_calories: f64,
    pub remaining_calories: f64,
    pub progress_percent: f64,
    pub totals: Nutrition,
    pub macros: MacroProgressSet,
    pub meals: Vec<MealSection>,
    pub dates: Vec<DateChip>,
}

/// consumed / target * 100, clamped to [0, 100]
fn progress_percent(consumed: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return if consumed > 0.0 { 100.0 } else { 0.0 };
    }
    (consumed / target * 100.0).clamp(0.0, 100.0)
}

/// Relative label for a day
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        n @ 2..=6 => format!("{} days ago", n),
        _ => date.format(DATE_FORMAT).to_string(),
    }
}

/// Longest date strip returned, ending at today
pub const MAX_DATE_STRIP_DAYS: u64 = 366;

/// Every day from `effective_from` through `today`, capped to the most recent
/// `MAX_DATE_STRIP_DAYS`; just today if the targets start in the future
pub fn date_strip(effective_from: NaiveDate, today: NaiveDate) -> Vec<DateChip> {
    let earliest = today
        .checked_sub_days(Days::new(MAX_DATE_STRIP_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    let start = effective_from.clamp(earliest, today);
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| DateChip {
            date,
            label: date_label(date, today),
        })
        .collect()
}

/// Assemble the dashboard for `date` from targets and that day's entries
pub fn build_dashboard(
    profile: Option<&Profile>,
    targets: &DietTargets,
    entries: Vec<FoodLog>,
    date: NaiveDate,
    today: NaiveDate,
) -> DashboardResponse {
    let totals: Nutrition = entries.iter().map(|e| e.nutrition).sum();
    let goal = f64::from(targets.target_calories);

    let mut meals: Vec<MealSection> = MealType::ALL
        .into_iter()
        .map(|meal_type| MealSection {
            meal_type,
            calories: 0.0,
            items: Vec::new(),
        })
        .collect();
    for entry in entries {
        if let Some(section) = meals.iter_mut().find(|s| s.meal_type == entry.meal_type) {
            section.calories += entry.nutrition.calories;
            section.items.push(entry);
        }
    }
    for section in &mut meals {
        section.calories = (section.calories * 10.0).round() / 10.0;
    }

    let totals = totals.rounded();

    DashboardResponse {
        user_id: targets.id.clone(),
        display_name: profile.map(Profile::display_name).unwrap_or("Athlete").to_string(),
        date,
        date_label: date_label(date, today),
        goal_calories: targets.target_calories,
        consumed_calories: totals.calories,
        remaining_calories: ((goal - totals.calories) * 10.0).round() / 10.0,
        progress_percent: progress_percent(totals.calories, goal),
        totals,
        macros: MacroProgressSet {
            protein: MacroProgress::new(totals.protein, targets.target_protein_grams),
            carbs: MacroProgress::new(totals.carbs, targets.target_carb_grams),
            fat: MacroProgress::new(totals.fat, targets.target_fat_grams),
        },
        meals,
        dates: date_strip(targets.effective_from, today),
    }
}

/// Dashboard for a user and day; `None` until the user has saved targets
pub fn get_dashboard(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Option<DashboardResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(targets) = DietTargets::get(&conn, user_id)
        .map_err(|e| format!("Failed to get diet targets: {}", e))?
    else {
        return Ok(None);
    };

    let profile = Profile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))?;
    let entries = FoodLog::list_for_user(&conn, user_id, Some(date))
        .map_err(|e| format!("Failed to get food logs: {}", e))?;

    tracing::debug!(user = user_id, %date, entries = entries.len(), "dashboard built");
    Ok(Some(build_dashboard(profile.as_ref(), &targets, entries, date, today)))
}
