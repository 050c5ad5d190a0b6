//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        tracing::info!("applying schema migration v1");
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema and seeded food catalog
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PROFILES
        -- One row per user account
        -- ============================================
        CREATE TABLE profiles (
            id TEXT PRIMARY KEY,                 -- user id issued by the auth provider
            full_name TEXT,
            username TEXT,
            avatar_url TEXT,
            role TEXT CHECK(role IN ('athlete', 'coach')),
            coach_id TEXT,
            email TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- DIET TARGETS
        -- Daily calorie and macro goals, one-to-one with a user
        -- ============================================
        CREATE TABLE diet_targets (
            id TEXT PRIMARY KEY,
            target_calories INTEGER NOT NULL CHECK(target_calories > 0),
            target_protein_grams INTEGER NOT NULL CHECK(target_protein_grams >= 0),
            target_carb_grams INTEGER NOT NULL CHECK(target_carb_grams >= 0),
            target_fat_grams INTEGER NOT NULL CHECK(target_fat_grams >= 0),
            effective_from TEXT NOT NULL,        -- ISO date: "2025-01-09"
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- FOOD ITEMS
        -- Searchable catalog, nutrition per 100 g
        -- ============================================
        CREATE TABLE food_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_items_name ON food_items(name);

        -- ============================================
        -- FOOD LOGS
        -- What a user ate, grouped by day and meal
        -- ============================================
        CREATE TABLE food_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            food_item_id INTEGER REFERENCES food_items(id) ON DELETE SET NULL,
            food_name TEXT NOT NULL,
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            amount REAL NOT NULL CHECK(amount > 0),  -- grams
            logged_on TEXT NOT NULL,             -- ISO date

            -- Nutrition consumed, fixed at log time
            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_logs_user_day ON food_logs(user_id, logged_on);

        INSERT INTO food_items (name, calories, protein, carbs, fat) VALUES
            ('Banana', 89, 1.1, 22, 0.3),
            ('Chicken Breast', 165, 31, 0, 3.6),
            ('Basmati Rice', 130, 2.7, 28, 0.3),
            ('Egg', 155, 13, 1.1, 11),
            ('Avocado', 160, 2, 8.5, 14.7),
            ('Oats', 389, 16.9, 66, 6.9);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_catalog_is_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM food_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 6);
    }
}
