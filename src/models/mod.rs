//! Data models
//!
//! Typed records for the store. Rows that do not satisfy their schema are
//! rejected when read.

mod diet_targets;
mod food_item;
mod food_log;
mod nutrition;
mod profile;
mod validation;

pub use diet_targets::{DietTargets, DietTargetsUpsert};
pub use food_item::{FoodItem, FoodItemCreate};
pub use food_log::{FoodLog, FoodLogCreate, FoodLogUpdate, MealType, DEFAULT_AMOUNT_GRAMS};
pub use nutrition::Nutrition;
pub use profile::{Profile, ProfileUpsert, Role};
pub use validation::{parse_date, ValidationError, DATE_FORMAT};
