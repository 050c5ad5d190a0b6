//! Profile MCP Tools
//!
//! Profile reads and writes, and sign-up / sign-in form checks.

use serde::Serialize;

use crate::auth::{SignInForm, SignUpForm};
use crate::db::Database;
use crate::models::{Profile, ProfileUpsert, Role};

/// Response for validate_sign_in
#[derive(Debug, Serialize)]
pub struct SignInCheckResponse {
    pub valid: bool,
    pub email: String,
}

/// Get a user's profile
pub fn get_profile(db: &Database, user_id: &str) -> Result<Option<Profile>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Profile::get(&conn, user_id).map_err(|e| format!("Failed to get profile: {}", e))
}

/// Create or partially update a profile
pub fn upsert_profile(db: &Database, data: ProfileUpsert) -> Result<Profile, String> {
    data.validate().map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Profile::upsert(&conn, &data).map_err(|e| format!("Failed to save profile: {}", e))
}

/// Validate a sign-up form and create the athlete profile for an
/// externally issued user id
pub fn register_profile(db: &Database, user_id: &str, form: &SignUpForm) -> Result<Profile, String> {
    let valid = form.validate().map_err(|e| e.to_string())?;

    let profile = upsert_profile(db, ProfileUpsert {
        id: user_id.to_string(),
        full_name: Some(valid.full_name),
        username: Some(valid.username),
        email: Some(valid.email),
        role: Some(Role::Athlete),
        ..Default::default()
    })?;

    tracing::info!(user = %profile.id, "profile registered");
    Ok(profile)
}

/// Check a sign-in form before it is handed to the auth provider
pub fn validate_sign_in(form: &SignInForm) -> Result<SignInCheckResponse, String> {
    let email = form.validate().map_err(|e| e.to_string())?;
    Ok(SignInCheckResponse { valid: true, email })
}
