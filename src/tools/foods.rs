//! Food MCP Tools
//!
//! Catalog search and the per-day food log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{
    FoodItem, FoodItemCreate, FoodLog, FoodLogCreate, FoodLogUpdate, MealType, Nutrition,
    ValidationError, DEFAULT_AMOUNT_GRAMS,
};

/// Why log_foods failed
#[derive(Debug, Error)]
pub enum LogFoodsError {
    #[error("Select at least one food to log")]
    EmptySelection,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to log foods: {0}")]
    Store(DbError),
}

impl LogFoodsError {
    /// The request itself was bad, as opposed to the store failing
    pub fn is_rejected_input(&self) -> bool {
        !matches!(self, LogFoodsError::Store(_))
    }
}

impl From<DbError> for LogFoodsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => LogFoodsError::NotFound(what),
            DbError::Validation(e) => LogFoodsError::Invalid(e),
            other => LogFoodsError::Store(other),
        }
    }
}

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodItem>,
    pub total: usize,
}

/// Response for add_food_item
#[derive(Debug, Serialize)]
pub struct AddFoodItemResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// One selected food in a log_foods request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogFoodItem {
    pub food_item_id: i64,
    /// Grams, 100 when absent
    pub amount: Option<f64>,
}

/// Response for log_foods
#[derive(Debug, Serialize)]
pub struct LogFoodsResponse {
    pub success: bool,
    pub meal_type: MealType,
    pub logged_on: NaiveDate,
    pub entries: Vec<FoodLog>,
    pub added: Nutrition,
}

/// Response for list_food_logs
#[derive(Debug, Serialize)]
pub struct ListFoodLogsResponse {
    pub user_id: String,
    pub date: Option<NaiveDate>,
    pub entries: Vec<FoodLog>,
    pub totals: Nutrition,
}

/// Response for delete_food_log
#[derive(Debug, Serialize)]
pub struct DeleteFoodLogResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Search the food catalog by name
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;
    let total = items.len();

    Ok(SearchFoodsResponse { items, total })
}

/// Add a food to the catalog (values per 100 g)
pub fn add_food_item(db: &Database, data: FoodItemCreate) -> Result<AddFoodItemResponse, String> {
    data.validate().map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let item = FoodItem::create(&conn, &data)
        .map_err(|e| format!("Failed to create food item: {}", e))?;

    Ok(AddFoodItemResponse {
        id: item.id,
        name: item.name,
        created_at: item.created_at,
    })
}

/// Log selected catalog foods to one meal. All entries are written or none are.
pub fn log_foods(
    db: &Database,
    user_id: &str,
    meal_type: MealType,
    logged_on: NaiveDate,
    items: &[LogFoodItem],
) -> Result<LogFoodsResponse, LogFoodsError> {
    if items.is_empty() {
        return Err(LogFoodsError::EmptySelection);
    }

    let entries = db
        .with_transaction(|tx| {
            let mut entries = Vec::with_capacity(items.len());
            for selected in items {
                let item = FoodItem::get_by_id(tx, selected.food_item_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Food item {}", selected.food_item_id)))?;
                let amount = selected.amount.unwrap_or(DEFAULT_AMOUNT_GRAMS);
                let data = FoodLogCreate::from_food_item(user_id, &item, meal_type, amount, logged_on);
                entries.push(FoodLog::create(tx, &data)?);
            }
            Ok(entries)
        })?;

    tracing::info!(user = user_id, meal = meal_type.as_str(), count = entries.len(), "foods logged");

    let added = entries.iter().map(|e| e.nutrition).sum::<Nutrition>().rounded();
    Ok(LogFoodsResponse {
        success: true,
        meal_type,
        logged_on,
        entries,
        added,
    })
}

/// A user's log entries, optionally for one day, with totals
pub fn list_food_logs(
    db: &Database,
    user_id: &str,
    date: Option<NaiveDate>,
) -> Result<ListFoodLogsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entries = FoodLog::list_for_user(&conn, user_id, date)
        .map_err(|e| format!("Failed to get food logs: {}", e))?;
    let totals = entries.iter().map(|e| e.nutrition).sum::<Nutrition>().rounded();

    Ok(ListFoodLogsResponse {
        user_id: user_id.to_string(),
        date,
        entries,
        totals,
    })
}

fn owned_entry(conn: &rusqlite::Connection, user_id: &str, id: i64) -> Result<Option<FoodLog>, String> {
    let entry = FoodLog::get_by_id(conn, id)
        .map_err(|e| format!("Failed to get food log: {}", e))?;
    Ok(entry.filter(|e| e.user_id == user_id))
}

/// Edit one of the user's entries; `None` if it does not exist or belongs to someone else
pub fn update_food_log(
    db: &Database,
    user_id: &str,
    id: i64,
    data: FoodLogUpdate,
) -> Result<Option<FoodLog>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    if owned_entry(&conn, user_id, id)?.is_none() {
        return Ok(None);
    }

    FoodLog::update(&conn, id, &data).map_err(|e| format!("Failed to update food log: {}", e))
}

/// Delete one of the user's entries; `None` if it does not exist or belongs to someone else
pub fn delete_food_log(
    db: &Database,
    user_id: &str,
    id: i64,
) -> Result<Option<DeleteFoodLogResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    if owned_entry(&conn, user_id, id)?.is_none() {
        return Ok(None);
    }

    let deleted = FoodLog::delete(&conn, id)
        .map_err(|e| format!("Failed to delete food log: {}", e))?;
    Ok(Some(DeleteFoodLogResponse {
        success: deleted,
        deleted_id: id,
    }))
}
