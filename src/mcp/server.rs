//! Kylo MCP Server Implementation
//!
//! Implements the MCP server with all Kylo tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::auth::{SignInForm, SignUpForm};
use crate::db::Database;
use crate::models::{parse_date, FoodItemCreate, FoodLogUpdate, MealType, ProfileUpsert, Role};
use crate::state::AppState;
use crate::tools::dashboard;
use crate::tools::diet::{self, SaveTargetsError};
use crate::tools::foods::{self, LogFoodItem, LogFoodsError};
use crate::tools::profiles;
use crate::tools::status::StatusTracker;

/// Kylo MCP Service
#[derive(Clone)]
pub struct KyloService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    state: AppState,
    tool_router: ToolRouter<KyloService>,
}

impl KyloService {
    pub fn new(database_path: PathBuf, database: Database, state: AppState) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            state,
            tool_router: Self::tool_router(),
        }
    }

    fn user(&self, explicit: Option<&str>) -> Result<String, McpError> {
        self.state
            .resolve_user(explicit)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    /// Publish a freshly written profile if it belongs to the active user
    fn publish_profile(&self, profile: &crate::models::Profile) {
        if self.state.snapshot().session_user.as_deref() == Some(profile.id.as_str()) {
            self.state.set_profile(Some(profile.clone()));
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse an optional YYYY-MM-DD date, defaulting to today
fn date_or_today(date: Option<&str>) -> Result<NaiveDate, McpError> {
    match date {
        Some(s) => parse_date(s).map_err(|e| McpError::invalid_params(e.to_string(), None)),
        None => Ok(today()),
    }
}

fn parse_meal_type(meal_type: &str) -> Result<MealType, McpError> {
    meal_type
        .parse::<MealType>()
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

fn save_targets_error(err: SaveTargetsError) -> McpError {
    match err {
        SaveTargetsError::Calculation(e) => McpError::invalid_params(e.to_string(), None),
        SaveTargetsError::Store(e) => McpError::internal_error(e, None),
    }
}

fn log_foods_error(err: LogFoodsError) -> McpError {
    if err.is_rejected_input() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        McpError::internal_error(err.to_string(), None)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, key: impl std::fmt::Display) -> Result<CallToolResult, McpError> {
    let json = serde_json::json!({ "error": format!("{} not found", what), "id": key.to_string() });
    to_json(&json)
}

// ============================================================================
// Session & Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectUserParams {
    /// User id issued by the auth provider
    pub user_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserParams {
    /// Defaults to the active session user
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterProfileParams {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateSignInParams {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpsertProfileParams {
    pub user_id: Option<String>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    /// athlete or coach
    pub role: Option<String>,
    pub coach_id: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// Diet Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PreviewDietTargetsParams {
    #[serde(default = "default_calories")]
    pub target_calories: u32,
    /// Balanced, High Protein, Keto or Low Carb
    pub preset: Option<String>,
    pub protein_percent: Option<u32>,
    pub carb_percent: Option<u32>,
    pub fat_percent: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveDietTargetsParams {
    pub user_id: Option<String>,
    #[serde(default = "default_calories")]
    pub target_calories: u32,
    pub preset: Option<String>,
    pub protein_percent: Option<u32>,
    pub carb_percent: Option<u32>,
    pub fat_percent: Option<u32>,
    /// YYYY-MM-DD, defaults to today
    pub effective_from: Option<String>,
}

fn default_calories() -> u32 { crate::nutrition::DEFAULT_DAILY_CALORIES }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDashboardParams {
    pub user_id: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodItemParams {
    pub name: String,
    /// Per 100 g
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodItemParams {
    pub food_item_id: i64,
    /// Grams, defaults to 100
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodsParams {
    pub user_id: Option<String>,
    /// breakfast, lunch, dinner or snack
    pub meal_type: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    pub items: Vec<LogFoodItemParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodLogsParams {
    pub user_id: Option<String>,
    /// YYYY-MM-DD; all days when absent
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodLogParams {
    pub user_id: Option<String>,
    pub id: i64,
    pub food_name: Option<String>,
    pub meal_type: Option<String>,
    /// New amount in grams; nutrition is rescaled unless given explicitly
    pub amount: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteFoodLogParams {
    pub user_id: Option<String>,
    pub id: i64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl KyloService {
    // --- Status ---

    #[tool(description = "Get the current status of the Kylo service including build info, database status, active session and process information")]
    async fn kylo_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.state.snapshot());
        to_json(&status)
    }

    #[tool(description = "Get step-by-step instructions for diet setup and food logging. Call this when starting a session or when unsure how to use the tools.")]
    fn diet_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::DIET_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(DIET_INSTRUCTIONS)]))
    }

    // --- Session ---

    #[tool(description = "Make a user the active session user. Loads their profile into the session.")]
    fn select_user(&self, Parameters(p): Parameters<SelectUserParams>) -> Result<CallToolResult, McpError> {
        let user_id = p.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(McpError::invalid_params("user_id cannot be empty", None));
        }
        let profile = profiles::get_profile(&self.database, &user_id).map_err(|e| McpError::internal_error(e, None))?;

        self.state.set_session(Some(user_id));
        self.state.set_profile(profile);
        to_json(&self.state.snapshot())
    }

    #[tool(description = "Sign out: clear the active user and their cached profile")]
    fn clear_session(&self) -> Result<CallToolResult, McpError> {
        self.state.set_session(None);
        to_json(&self.state.snapshot())
    }

    #[tool(description = "Get the active session user and cached profile")]
    fn get_session(&self) -> Result<CallToolResult, McpError> {
        to_json(&self.state.snapshot())
    }

    // --- Profiles ---

    #[tool(description = "Validate a sign-up form (email, full name, password of at least 8 characters, matching confirmation) and create the athlete profile for a user id issued by the auth provider")]
    fn register_profile(&self, Parameters(p): Parameters<RegisterProfileParams>) -> Result<CallToolResult, McpError> {
        let form = SignUpForm {
            email: p.email,
            full_name: p.full_name,
            password: p.password,
            confirm_password: p.confirm_password,
        };
        let profile = profiles::register_profile(&self.database, p.user_id.trim(), &form)
            .map_err(|e| McpError::invalid_params(e, None))?;
        self.publish_profile(&profile);
        to_json(&profile)
    }

    #[tool(description = "Check a sign-in form before handing it to the auth provider")]
    fn validate_sign_in(&self, Parameters(p): Parameters<ValidateSignInParams>) -> Result<CallToolResult, McpError> {
        let form = SignInForm { email: p.email, password: p.password };
        let result = profiles::validate_sign_in(&form).map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Create or update a profile. Fields left out keep their stored values.")]
    fn upsert_profile(&self, Parameters(p): Parameters<UpsertProfileParams>) -> Result<CallToolResult, McpError> {
        let id = self.user(p.user_id.as_deref())?;
        let role = p
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let data = ProfileUpsert {
            id,
            full_name: p.full_name,
            username: p.username,
            avatar_url: p.avatar_url,
            role,
            coach_id: p.coach_id,
            email: p.email,
        };
        let profile = profiles::upsert_profile(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        self.publish_profile(&profile);
        to_json(&profile)
    }

    #[tool(description = "Get a user's profile")]
    fn get_profile(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        match profiles::get_profile(&self.database, &user_id).map_err(|e| McpError::internal_error(e, None))? {
            Some(profile) => to_json(&profile),
            None => not_found("Profile", user_id),
        }
    }

    // --- Diet setup ---

    #[tool(description = "List the diet presets (protein/carb/fat percentages) and the default calorie budget")]
    fn list_diet_presets(&self) -> Result<CallToolResult, McpError> {
        to_json(&diet::list_diet_presets())
    }

    #[tool(description = "Compute daily gram targets for a calorie budget and macro split without saving. Start from a preset (default Balanced) and override any percentage; the three must add up to 100.")]
    fn preview_diet_targets(&self, Parameters(p): Parameters<PreviewDietTargetsParams>) -> Result<CallToolResult, McpError> {
        let split = diet::resolve_split(p.preset.as_deref(), p.protein_percent, p.carb_percent, p.fat_percent)
            .map_err(|e| McpError::invalid_params(e, None))?;
        let result = diet::preview_diet_targets(p.target_calories, split).map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Compute and save a user's daily targets, replacing any previous set. Nothing is saved if the split does not add up to 100.")]
    fn save_diet_targets(&self, Parameters(p): Parameters<SaveDietTargetsParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        let effective_from = date_or_today(p.effective_from.as_deref())?;
        let split = diet::resolve_split(p.preset.as_deref(), p.protein_percent, p.carb_percent, p.fat_percent)
            .map_err(|e| McpError::invalid_params(e, None))?;
        let result = diet::save_diet_targets(&self.database, &user_id, p.target_calories, split, effective_from)
            .map_err(save_targets_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a user's saved daily targets")]
    fn get_diet_targets(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        match diet::get_diet_targets(&self.database, &user_id).map_err(|e| McpError::internal_error(e, None))? {
            Some(targets) => to_json(&targets),
            None => not_found("Diet targets", user_id),
        }
    }

    #[tool(description = "Get the dashboard for a day: calories remaining, macro progress, meals and the selectable date strip")]
    fn get_dashboard(&self, Parameters(p): Parameters<GetDashboardParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        let date = date_or_today(p.date.as_deref())?;
        match dashboard::get_dashboard(&self.database, &user_id, date, today()).map_err(|e| McpError::internal_error(e, None))? {
            Some(result) => to_json(&result),
            None => to_json(&serde_json::json!({
                "error": "No diet targets yet. Run save_diet_targets first.",
                "id": user_id,
            })),
        }
    }

    // --- Foods ---

    #[tool(description = "Search the food catalog by name. Values are per 100 g.")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Add a food to the catalog with nutrition per 100 g")]
    fn add_food_item(&self, Parameters(p): Parameters<AddFoodItemParams>) -> Result<CallToolResult, McpError> {
        let data = FoodItemCreate {
            name: p.name, calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
        };
        let result = foods::add_food_item(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Log selected catalog foods to a meal (breakfast, lunch, dinner, snack). Either every food is logged or none is.")]
    fn log_foods(&self, Parameters(p): Parameters<LogFoodsParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        let date = date_or_today(p.date.as_deref())?;
        let meal_type = parse_meal_type(&p.meal_type)?;
        let items: Vec<LogFoodItem> = p
            .items
            .into_iter()
            .map(|i| LogFoodItem { food_item_id: i.food_item_id, amount: i.amount })
            .collect();
        let result = foods::log_foods(&self.database, &user_id, meal_type, date, &items)
            .map_err(log_foods_error)?;
        to_json(&result)
    }

    #[tool(description = "List a user's logged foods with totals, for one day or all days")]
    fn list_food_logs(&self, Parameters(p): Parameters<ListFoodLogsParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        let date = p
            .date
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let result = foods::list_food_logs(&self.database, &user_id, date).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Edit a logged food. A new amount rescales its nutrition unless values are given explicitly.")]
    fn update_food_log(&self, Parameters(p): Parameters<UpdateFoodLogParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        let meal_type = p.meal_type.as_deref().map(parse_meal_type).transpose()?;

        let data = FoodLogUpdate {
            food_name: p.food_name, meal_type, amount: p.amount,
            calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
        };
        match foods::update_food_log(&self.database, &user_id, p.id, data).map_err(|e| McpError::internal_error(e, None))? {
            Some(entry) => to_json(&entry),
            None => not_found("Food log", p.id),
        }
    }

    #[tool(description = "Delete a logged food")]
    fn delete_food_log(&self, Parameters(p): Parameters<DeleteFoodLogParams>) -> Result<CallToolResult, McpError> {
        let user_id = self.user(p.user_id.as_deref())?;
        match foods::delete_food_log(&self.database, &user_id, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(result) => to_json(&result),
            None => not_found("Food log", p.id),
        }
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for KyloService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "kylo".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Kylo nutrition tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Kylo - daily calorie and macro targets with a food log. \
                 IMPORTANT: Call diet_instructions first. \
                 Session: select_user/clear_session/get_session; tools default to the active user. \
                 Profiles: register_profile, validate_sign_in, upsert_profile, get_profile. \
                 Diet: list_diet_presets, preview_diet_targets, save_diet_targets, get_diet_targets, get_dashboard. \
                 Foods: search_foods, add_food_item, log_foods, list_food_logs, update_food_log, delete_food_log."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    fn service() -> KyloService {
        let database = Database::in_memory().unwrap();
        KyloService::new(PathBuf::from(":memory:"), database, AppState::new())
    }

    fn log_params(meal_type: &str, items: Vec<LogFoodItemParams>) -> LogFoodsParams {
        LogFoodsParams {
            user_id: Some("user-1".into()),
            meal_type: meal_type.into(),
            date: Some("2025-01-09".into()),
            items,
        }
    }

    fn save_params(target_calories: u32, protein: u32, carbs: u32, fat: u32) -> SaveDietTargetsParams {
        SaveDietTargetsParams {
            user_id: Some("user-1".into()),
            target_calories,
            preset: None,
            protein_percent: Some(protein),
            carb_percent: Some(carbs),
            fat_percent: Some(fat),
            effective_from: Some("2025-01-09".into()),
        }
    }

    #[test]
    fn test_log_foods_rejects_bad_input_as_invalid_params() {
        let service = service();
        let banana = LogFoodItemParams { food_item_id: 1, amount: None };

        let err = service.log_foods(Parameters(log_params("brunch", vec![banana]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = service.log_foods(Parameters(log_params("lunch", Vec::new()))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let unknown = LogFoodItemParams { food_item_id: 9999, amount: None };
        let err = service.log_foods(Parameters(log_params("lunch", vec![unknown]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_save_diet_targets_rejects_bad_split_as_invalid_params() {
        let service = service();

        let err = service.save_diet_targets(Parameters(save_params(2400, 30, 45, 30))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = service.save_diet_targets(Parameters(save_params(0, 30, 45, 25))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        assert!(service.save_diet_targets(Parameters(save_params(2400, 30, 45, 25))).is_ok());
    }

    #[test]
    fn test_store_failures_stay_internal() {
        let err = save_targets_error(SaveTargetsError::Store("Database error: closed".into()));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);

        let err = log_foods_error(LogFoodsError::Store(crate::db::DbError::Sqlite(
            rusqlite::Error::QueryReturnedNoRows,
        )));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}
