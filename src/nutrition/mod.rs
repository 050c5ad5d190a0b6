//! Nutrition calculation module
//!
//! Macro target calculation and diet presets.

pub mod macros;

pub use macros::{
    compute_macro_targets, parse_calorie_target, DietPreset, MacroError, MacroSplit,
    MacroTargets, CARB_KCAL_PER_GRAM, DEFAULT_DAILY_CALORIES, FAT_KCAL_PER_GRAM,
    PROTEIN_KCAL_PER_GRAM,
};
