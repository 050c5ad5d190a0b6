//! Food Item model
//!
//! Catalog entries with nutrition per 100 g.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::validation::{require_non_empty, require_non_negative, ValidationError};
use super::Nutrition;

/// A catalog food with nutrition per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub per_100g: Nutrition,
    pub created_at: String,
}

/// Data for creating a new food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl FoodItemCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_negative("calories", self.calories)?;
        require_non_negative("protein", self.protein)?;
        require_non_negative("carbs", self.carbs)?;
        require_non_negative("fat", self.fat)?;
        Ok(())
    }
}

impl FoodItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            per_100g: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new food item into the catalog
    pub fn create(conn: &Connection, data: &FoodItemCreate) -> DbResult<Self> {
        data.validate()?;

        conn.execute(
            "INSERT INTO food_items (name, calories, protein, carbs, fat) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![data.name.trim(), data.calories, data.protein, data.carbs, data.fat],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive substring search on name. A blank query matches nothing.
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_items
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count catalog items
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM food_items", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let results = FoodItem::search(&conn, "ban", 20).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Banana");

        let results = FoodItem::search(&conn, "RICE", 20).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Basmati Rice");

        let results = FoodItem::search(&conn, "a", 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        assert!(FoodItem::search(&conn, "", 20).unwrap().is_empty());
        assert!(FoodItem::search(&conn, "   ", 20).unwrap().is_empty());
    }

    #[test]
    fn test_wildcards_are_literal() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        assert!(FoodItem::search(&conn, "%", 20).unwrap().is_empty());
        assert!(FoodItem::search(&conn, "_", 20).unwrap().is_empty());
    }

    #[test]
    fn test_create_validates() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let item = FoodItem::create(&conn, &FoodItemCreate {
            name: " Greek Yogurt ".into(),
            calories: 97.0,
            protein: 9.0,
            carbs: 3.9,
            fat: 5.0,
        })
        .unwrap();
        assert_eq!(item.name, "Greek Yogurt");
        assert_eq!(FoodItem::count(&conn).unwrap(), 7);

        let bad = FoodItem::create(&conn, &FoodItemCreate {
            name: "Broken".into(),
            calories: -1.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        });
        assert!(bad.is_err());
        assert_eq!(FoodItem::count(&conn).unwrap(), 7);
    }
}
