//! Food log model
//!
//! What a user ate, on which day and in which meal.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::validation::{
    invalid_column, parse_date, require_non_empty, require_non_negative, require_positive,
    ValidationError, DATE_FORMAT,
};
use super::{FoodItem, Nutrition};

/// Default portion when a food is logged from search
pub const DEFAULT_AMOUNT_GRAMS: f64 = 100.0;

/// Meal type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Display order on the dashboard
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" | "colazione" => Ok(MealType::Breakfast),
            "lunch" | "pranzo" => Ok(MealType::Lunch),
            "dinner" | "cena" => Ok(MealType::Dinner),
            "snack" | "snacks" | "spuntino" | "spuntini" => Ok(MealType::Snack),
            _ => Err(ValidationError::UnknownMealType(s.to_string())),
        }
    }
}

/// A logged food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: i64,
    pub user_id: String,
    pub food_item_id: Option<i64>,
    pub food_name: String,
    pub meal_type: MealType,
    pub amount: f64, // grams
    pub logged_on: NaiveDate,
    pub nutrition: Nutrition,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for logging a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLogCreate {
    pub user_id: String,
    pub food_item_id: Option<i64>,
    pub food_name: String,
    pub meal_type: MealType,
    pub amount: f64,
    pub logged_on: NaiveDate,
    pub nutrition: Nutrition,
}

impl FoodLogCreate {
    /// Log `amount` grams of a catalog item
    pub fn from_food_item(
        user_id: &str,
        item: &FoodItem,
        meal_type: MealType,
        amount: f64,
        logged_on: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            food_item_id: Some(item.id),
            food_name: item.name.clone(),
            meal_type,
            amount,
            logged_on,
            nutrition: item.per_100g.for_grams(amount),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("food_name", &self.food_name)?;
        require_positive("amount", self.amount)?;
        validate_nutrition(&self.nutrition)
    }
}

/// Data for editing a logged food
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodLogUpdate {
    pub food_name: Option<String>,
    pub meal_type: Option<MealType>,
    pub amount: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl FoodLogUpdate {
    fn overrides_nutrition(&self) -> bool {
        self.calories.is_some() || self.protein.is_some() || self.carbs.is_some() || self.fat.is_some()
    }

    /// Apply the edit to an existing entry.
    ///
    /// A new amount rescales the stored nutrition unless explicit values
    /// are given; explicit values always win.
    pub fn apply(&self, entry: &FoodLog) -> Result<FoodLog, ValidationError> {
        let mut updated = entry.clone();

        if let Some(ref name) = self.food_name {
            updated.food_name = require_non_empty("food_name", name)?.to_string();
        }
        if let Some(meal_type) = self.meal_type {
            updated.meal_type = meal_type;
        }
        if let Some(amount) = self.amount {
            require_positive("amount", amount)?;
            if !self.overrides_nutrition() {
                updated.nutrition = entry.nutrition.scale(amount / entry.amount);
            }
            updated.amount = amount;
        }

        if let Some(v) = self.calories {
            updated.nutrition.calories = v;
        }
        if let Some(v) = self.protein {
            updated.nutrition.protein = v;
        }
        if let Some(v) = self.carbs {
            updated.nutrition.carbs = v;
        }
        if let Some(v) = self.fat {
            updated.nutrition.fat = v;
        }
        validate_nutrition(&updated.nutrition)?;

        Ok(updated)
    }
}

fn validate_nutrition(n: &Nutrition) -> Result<(), ValidationError> {
    require_non_negative("calories", n.calories)?;
    require_non_negative("protein", n.protein)?;
    require_non_negative("carbs", n.carbs)?;
    require_non_negative("fat", n.fat)?;
    Ok(())
}

impl FoodLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type: String = row.get("meal_type")?;
        let meal_type = meal_type.parse().map_err(|e| invalid_column(4, e))?;
        let logged_on: String = row.get("logged_on")?;
        let logged_on = parse_date(&logged_on).map_err(|e| invalid_column(6, e))?;

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            food_item_id: row.get("food_item_id")?,
            food_name: row.get("food_name")?,
            meal_type,
            amount: row.get("amount")?,
            logged_on,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a food log entry
    pub fn create(conn: &Connection, data: &FoodLogCreate) -> DbResult<Self> {
        data.validate()?;

        conn.execute(
            r#"
            INSERT INTO food_logs (
                user_id, food_item_id, food_name, meal_type, amount, logged_on,
                calories, protein, carbs, fat
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.user_id.trim(),
                data.food_item_id,
                data.food_name.trim(),
                data.meal_type.as_str(),
                data.amount,
                data.logged_on.format(DATE_FORMAT).to_string(),
                data.nutrition.calories,
                data.nutrition.protein,
                data.nutrition.carbs,
                data.nutrition.fat,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food log entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_logs WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries for a user, optionally restricted to one day, oldest first
    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        date: Option<NaiveDate>,
    ) -> DbResult<Vec<Self>> {
        let entries = match date {
            Some(date) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM food_logs WHERE user_id = ?1 AND logged_on = ?2 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(
                    params![user_id, date.format(DATE_FORMAT).to_string()],
                    Self::from_row,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM food_logs WHERE user_id = ?1 ORDER BY logged_on ASC, id ASC",
                )?;
                let rows = stmt.query_map([user_id], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(entries)
    }

    /// Persist an edited entry
    pub fn update(conn: &Connection, id: i64, data: &FoodLogUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let updated = data.apply(&existing)?;

        conn.execute(
            r#"
            UPDATE food_logs SET
                food_name = ?1,
                meal_type = ?2,
                amount = ?3,
                calories = ?4,
                protein = ?5,
                carbs = ?6,
                fat = ?7,
                updated_at = datetime('now')
            WHERE id = ?8
            "#,
            params![
                updated.food_name,
                updated.meal_type.as_str(),
                updated.amount,
                updated.nutrition.calories,
                updated.nutrition.protein,
                updated.nutrition.carbs,
                updated.nutrition.fat,
                id,
            ],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Delete a food log entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM food_logs WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn oats(conn: &Connection) -> FoodItem {
        FoodItem::search(conn, "oats", 1).unwrap().remove(0)
    }

    #[test]
    fn test_meal_type_aliases() {
        assert_eq!("colazione".parse::<MealType>(), Ok(MealType::Breakfast));
        assert_eq!("Pranzo".parse::<MealType>(), Ok(MealType::Lunch));
        assert_eq!("cena".parse::<MealType>(), Ok(MealType::Dinner));
        assert_eq!("Spuntini".parse::<MealType>(), Ok(MealType::Snack));
        assert_eq!("snack".parse::<MealType>(), Ok(MealType::Snack));
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn test_log_scales_catalog_values() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);

        let data = FoodLogCreate::from_food_item("user-1", &item, MealType::Breakfast, 50.0, day("2025-01-09"));
        let entry = FoodLog::create(&conn, &data).unwrap();

        assert_eq!(entry.food_name, "Oats");
        assert_eq!(entry.food_item_id, Some(item.id));
        assert!((entry.nutrition.calories - 194.5).abs() < 1e-9);
        assert!((entry.nutrition.protein - 8.45).abs() < 1e-9);
    }

    #[test]
    fn test_list_for_user_by_day() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);

        for (user, date) in [("user-1", "2025-01-09"), ("user-1", "2025-01-10"), ("user-2", "2025-01-09")] {
            let data = FoodLogCreate::from_food_item(user, &item, MealType::Snack, 100.0, day(date));
            FoodLog::create(&conn, &data).unwrap();
        }

        assert_eq!(FoodLog::list_for_user(&conn, "user-1", None).unwrap().len(), 2);
        let one_day = FoodLog::list_for_user(&conn, "user-1", Some(day("2025-01-09"))).unwrap();
        assert_eq!(one_day.len(), 1);
        assert_eq!(one_day[0].user_id, "user-1");
    }

    #[test]
    fn test_update_amount_rescales() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);
        let data = FoodLogCreate::from_food_item("user-1", &item, MealType::Breakfast, 100.0, day("2025-01-09"));
        let entry = FoodLog::create(&conn, &data).unwrap();

        let updated = FoodLog::update(&conn, entry.id, &FoodLogUpdate {
            amount: Some(200.0),
            ..Default::default()
        })
        .unwrap()
        .unwrap();
        assert!((updated.nutrition.calories - 778.0).abs() < 1e-9);
        assert_eq!(updated.amount, 200.0);
    }

    #[test]
    fn test_update_explicit_values_win() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);
        let data = FoodLogCreate::from_food_item("user-1", &item, MealType::Breakfast, 100.0, day("2025-01-09"));
        let entry = FoodLog::create(&conn, &data).unwrap();

        let updated = FoodLog::update(&conn, entry.id, &FoodLogUpdate {
            food_name: Some("Porridge".into()),
            meal_type: Some(MealType::Snack),
            amount: Some(150.0),
            calories: Some(300.0),
            ..Default::default()
        })
        .unwrap()
        .unwrap();
        assert_eq!(updated.food_name, "Porridge");
        assert_eq!(updated.meal_type, MealType::Snack);
        assert_eq!(updated.nutrition.calories, 300.0);
        // untouched fields keep their stored values
        assert!((updated.nutrition.protein - 16.9).abs() < 1e-9);
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);
        let data = FoodLogCreate::from_food_item("user-1", &item, MealType::Breakfast, 100.0, day("2025-01-09"));
        let entry = FoodLog::create(&conn, &data).unwrap();

        let result = FoodLog::update(&conn, entry.id, &FoodLogUpdate { fat: Some(-2.0), ..Default::default() });
        assert!(result.is_err());
        let result = FoodLog::update(&conn, entry.id, &FoodLogUpdate { amount: Some(0.0), ..Default::default() });
        assert!(result.is_err());
        assert!(FoodLog::update(&conn, 9999, &FoodLogUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let item = oats(&conn);
        let data = FoodLogCreate::from_food_item("user-1", &item, MealType::Lunch, 100.0, day("2025-01-09"));
        let entry = FoodLog::create(&conn, &data).unwrap();

        assert!(FoodLog::delete(&conn, entry.id).unwrap());
        assert!(!FoodLog::delete(&conn, entry.id).unwrap());
    }

    #[test]
    fn test_unknown_meal_type_row_rejected() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute(
            "INSERT INTO food_logs (user_id, food_name, meal_type, amount, logged_on) VALUES ('u', 'X', 'brunch', 100, '2025-01-09')",
            [],
        )
        .unwrap();
        assert!(FoodLog::list_for_user(&conn, "u", None).is_err());
    }
}
