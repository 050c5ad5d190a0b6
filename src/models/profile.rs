//! Profile model
//!
//! Per-user account details shown across the app.

use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::validation::{invalid_column, require_non_empty, ValidationError};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Athlete,
    Coach,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Athlete => "athlete",
            Role::Coach => "coach",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "athlete" | "atleta" => Ok(Role::Athlete),
            "coach" => Ok(Role::Coach),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// A user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub coach_id: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Athlete")
    }
}

/// Partial profile payload; absent fields keep their stored values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpsert {
    pub id: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub coach_id: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpsert {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        Ok(())
    }
}

impl Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let role = match row.get::<_, Option<String>>("role")? {
            Some(raw) => Some(raw.parse().map_err(|e| invalid_column(4, e))?),
            None => None,
        };

        Ok(Self {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            username: row.get("username")?,
            avatar_url: row.get("avatar_url")?,
            role,
            coach_id: row.get("coach_id")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get a profile by user id
    pub fn get(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM profiles WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or update a profile
    pub fn upsert(conn: &Connection, data: &ProfileUpsert) -> DbResult<Self> {
        data.validate()?;
        let id = data.id.trim();

        conn.execute(
            r#"
            INSERT INTO profiles (id, full_name, username, avatar_url, role, coach_id, email)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                full_name = COALESCE(excluded.full_name, profiles.full_name),
                username = COALESCE(excluded.username, profiles.username),
                avatar_url = COALESCE(excluded.avatar_url, profiles.avatar_url),
                role = COALESCE(excluded.role, profiles.role),
                coach_id = COALESCE(excluded.coach_id, profiles.coach_id),
                email = COALESCE(excluded.email, profiles.email),
                updated_at = datetime('now')
            "#,
            params![
                id,
                data.full_name,
                data.username,
                data.avatar_url,
                data.role.map(|r| r.as_str()),
                data.coach_id,
                data.email,
            ],
        )?;

        Self::get(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_upsert_creates_then_merges() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let created = Profile::upsert(&conn, &ProfileUpsert {
            id: "user-1".into(),
            full_name: Some("Jon Doe".into()),
            email: Some("jon.doe@example.com".into()),
            role: Some(Role::Athlete),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(created.display_name(), "Jon Doe");
        assert_eq!(created.role, Some(Role::Athlete));

        let merged = Profile::upsert(&conn, &ProfileUpsert {
            id: "user-1".into(),
            username: Some("jon.doe".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(merged.full_name.as_deref(), Some("Jon Doe"));
        assert_eq!(merged.username.as_deref(), Some("jon.doe"));
        assert_eq!(merged.email.as_deref(), Some("jon.doe@example.com"));
    }

    #[test]
    fn test_upsert_rejects_blank_id() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let result = Profile::upsert(&conn, &ProfileUpsert { id: "  ".into(), ..Default::default() });
        assert!(matches!(result, Err(crate::db::DbError::Validation(_))));
    }

    #[test]
    fn test_get_missing_profile() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        assert!(Profile::get(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("atleta".parse::<Role>(), Ok(Role::Athlete));
        assert_eq!("Coach".parse::<Role>(), Ok(Role::Coach));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_display_name_fallback() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let profile = Profile::upsert(&conn, &ProfileUpsert { id: "u".into(), ..Default::default() }).unwrap();
        assert_eq!(profile.display_name(), "Athlete");
    }
}
