//! Macro target calculator
//!
//! Converts a daily calorie budget and a percentage split across protein,
//! carbohydrate and fat into daily gram targets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Energy density of protein (kcal per gram)
pub const PROTEIN_KCAL_PER_GRAM: u32 = 4;
/// Energy density of carbohydrate (kcal per gram)
pub const CARB_KCAL_PER_GRAM: u32 = 4;
/// Energy density of fat (kcal per gram)
pub const FAT_KCAL_PER_GRAM: u32 = 9;

/// Daily target offered before the user types one
pub const DEFAULT_DAILY_CALORIES: u32 = 2400;

/// Calculator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    #[error("The sum of macros must equal 100% (got {total}%). Adjust the split before saving.")]
    InvalidSplit { total: u32 },

    #[error("Daily calorie target must be a positive number of kcal")]
    NonPositiveCalories,

    #[error("Invalid calorie target '{0}': expected a whole number of kcal")]
    InvalidCalorieInput(String),
}

/// Percentage allocation of daily calories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein_percent: u32,
    pub carb_percent: u32,
    pub fat_percent: u32,
}

impl MacroSplit {
    pub const fn new(protein_percent: u32, carb_percent: u32, fat_percent: u32) -> Self {
        Self {
            protein_percent,
            carb_percent,
            fat_percent,
        }
    }

    /// Sum of the three percentages
    pub fn total(&self) -> u32 {
        self.protein_percent
            .saturating_add(self.carb_percent)
            .saturating_add(self.fat_percent)
    }

    /// Fails with `InvalidSplit` unless the percentages sum to exactly 100
    pub fn validate(&self) -> Result<(), MacroError> {
        let total = self.total();
        if total != 100 {
            return Err(MacroError::InvalidSplit { total });
        }
        Ok(())
    }

    /// Gram targets for a daily calorie budget
    pub fn targets_for(&self, total_calories: u32) -> Result<MacroTargets, MacroError> {
        if total_calories == 0 {
            return Err(MacroError::NonPositiveCalories);
        }
        self.validate()?;

        Ok(MacroTargets {
            protein_grams: grams_for(total_calories, self.protein_percent, PROTEIN_KCAL_PER_GRAM),
            carb_grams: grams_for(total_calories, self.carb_percent, CARB_KCAL_PER_GRAM),
            fat_grams: grams_for(total_calories, self.fat_percent, FAT_KCAL_PER_GRAM),
        })
    }
}

impl Default for MacroSplit {
    fn default() -> Self {
        DietPreset::default().split()
    }
}

/// Daily gram targets per macro-nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein_grams: u32,
    pub carb_grams: u32,
    pub fat_grams: u32,
}

impl MacroTargets {
    /// Calories re-derived from the rounded gram targets
    ///
    /// Widened to `u64`: grams for a budget near `u32::MAX` times their
    /// energy density do not fit in `u32`.
    pub fn calories(&self) -> u64 {
        u64::from(self.protein_grams) * u64::from(PROTEIN_KCAL_PER_GRAM)
            + u64::from(self.carb_grams) * u64::from(CARB_KCAL_PER_GRAM)
            + u64::from(self.fat_grams) * u64::from(FAT_KCAL_PER_GRAM)
    }

    /// Difference between re-derived calories and the requested budget
    pub fn drift(&self, total_calories: u32) -> i64 {
        // calories() tops out near 4.3e9, well inside i64
        self.calories() as i64 - i64::from(total_calories)
    }
}

/// Compute gram targets from a calorie budget and a percentage split.
///
/// Each category is rounded half away from zero on its own; the results are
/// not re-normalised, so `calories()` may differ from `total_calories` by a
/// few kcal.
///
/// # Errors
///
/// `InvalidSplit` if the percentages do not sum to 100,
/// `NonPositiveCalories` if `total_calories` is zero.
pub fn compute_macro_targets(
    total_calories: u32,
    protein_percent: u32,
    carb_percent: u32,
    fat_percent: u32,
) -> Result<MacroTargets, MacroError> {
    MacroSplit::new(protein_percent, carb_percent, fat_percent).targets_for(total_calories)
}

/// round(total * percent / 100 / density) in exact integer arithmetic
fn grams_for(total_calories: u32, percent: u32, kcal_per_gram: u32) -> u32 {
    let numerator = u64::from(total_calories) * u64::from(percent);
    let denominator = 100 * u64::from(kcal_per_gram);
    ((2 * numerator + denominator) / (2 * denominator)) as u32
}

/// Parse a daily calorie target typed as text
pub fn parse_calorie_target(input: &str) -> Result<u32, MacroError> {
    let trimmed = input.trim();
    let value: u32 = trimmed
        .parse()
        .map_err(|_| MacroError::InvalidCalorieInput(trimmed.to_string()))?;
    if value == 0 {
        return Err(MacroError::NonPositiveCalories);
    }
    Ok(value)
}

/// Named starting points for the macro split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietPreset {
    #[default]
    Balanced,
    HighProtein,
    Keto,
    LowCarb,
}

impl DietPreset {
    pub const ALL: [DietPreset; 4] = [
        DietPreset::Balanced,
        DietPreset::HighProtein,
        DietPreset::Keto,
        DietPreset::LowCarb,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            DietPreset::Balanced => "Balanced",
            DietPreset::HighProtein => "High Protein",
            DietPreset::Keto => "Keto",
            DietPreset::LowCarb => "Low Carb",
        }
    }

    pub fn split(&self) -> MacroSplit {
        match self {
            DietPreset::Balanced => MacroSplit::new(30, 45, 25),
            DietPreset::HighProtein => MacroSplit::new(40, 35, 25),
            DietPreset::Keto => MacroSplit::new(25, 5, 70),
            DietPreset::LowCarb => MacroSplit::new(35, 25, 40),
        }
    }

    /// Accepts display names and snake_case keys, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', '_'], " ");
        match key.as_str() {
            "balanced" => Some(DietPreset::Balanced),
            "high protein" => Some(DietPreset::HighProtein),
            "keto" => Some(DietPreset::Keto),
            "low carb" => Some(DietPreset::LowCarb),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_2400() {
        let targets = compute_macro_targets(2400, 30, 45, 25).unwrap();
        assert_eq!(targets.protein_grams, 180);
        assert_eq!(targets.carb_grams, 270);
        assert_eq!(targets.fat_grams, 67);
    }

    #[test]
    fn test_keto_2000() {
        let targets = DietPreset::Keto.split().targets_for(2000).unwrap();
        assert_eq!(targets.protein_grams, 125);
        assert_eq!(targets.carb_grams, 25);
        assert_eq!(targets.fat_grams, 156);
    }

    #[test]
    fn test_all_protein_boundary() {
        let targets = compute_macro_targets(2001, 100, 0, 0).unwrap();
        assert_eq!(targets.carb_grams, 0);
        assert_eq!(targets.fat_grams, 0);
        // 2001 / 4 = 500.25
        assert_eq!(targets.protein_grams, 500);

        let targets = compute_macro_targets(2002, 100, 0, 0).unwrap();
        // 500.5 rounds away from zero
        assert_eq!(targets.protein_grams, 501);
    }

    #[test]
    fn test_invalid_split_rejected() {
        assert_eq!(
            compute_macro_targets(2400, 30, 45, 20),
            Err(MacroError::InvalidSplit { total: 95 })
        );
        assert_eq!(
            compute_macro_targets(2400, 50, 50, 1),
            Err(MacroError::InvalidSplit { total: 101 })
        );
        assert_eq!(
            compute_macro_targets(2400, 0, 0, 0),
            Err(MacroError::InvalidSplit { total: 0 })
        );
    }

    #[test]
    fn test_zero_calories_rejected() {
        assert_eq!(
            compute_macro_targets(0, 30, 45, 25),
            Err(MacroError::NonPositiveCalories)
        );
    }

    #[test]
    fn test_same_inputs_same_output() {
        let first = compute_macro_targets(1850, 35, 25, 40).unwrap();
        let second = compute_macro_targets(1850, 35, 25, 40).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rederived_calories_stay_within_rounding_tolerance() {
        for total in [1200u32, 1777, 2000, 2400, 3150, 4999] {
            for protein in 0..=100u32 {
                for carbs in 0..=(100 - protein) {
                    let fats = 100 - protein - carbs;
                    let targets = compute_macro_targets(total, protein, carbs, fats).unwrap();
                    assert!(
                        targets.drift(total).abs() <= 9,
                        "{} kcal at {}/{}/{} drifted by {}",
                        total,
                        protein,
                        carbs,
                        fats,
                        targets.drift(total)
                    );
                }
            }
        }
    }

    #[test]
    fn test_largest_budget_does_not_overflow() {
        let targets = compute_macro_targets(u32::MAX, 100, 0, 0).unwrap();
        assert_eq!(targets.protein_grams, 1_073_741_824);
        assert_eq!(targets.calories(), 4_294_967_296);
        assert_eq!(targets.drift(u32::MAX), 1);

        let targets = compute_macro_targets(u32::MAX, 0, 0, 100).unwrap();
        assert!(targets.drift(u32::MAX).abs() <= 9);
    }

    #[test]
    fn test_presets_sum_to_100() {
        for preset in DietPreset::ALL {
            assert!(preset.split().validate().is_ok(), "{}", preset.name());
        }
        assert_eq!(MacroSplit::default(), MacroSplit::new(30, 45, 25));
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(DietPreset::parse("High Protein"), Some(DietPreset::HighProtein));
        assert_eq!(DietPreset::parse("high_protein"), Some(DietPreset::HighProtein));
        assert_eq!(DietPreset::parse(" KETO "), Some(DietPreset::Keto));
        assert_eq!(DietPreset::parse("low-carb"), Some(DietPreset::LowCarb));
        assert_eq!(DietPreset::parse("paleo"), None);
    }

    #[test]
    fn test_parse_calorie_target() {
        assert_eq!(parse_calorie_target(" 2400 "), Ok(2400));
        assert_eq!(parse_calorie_target("0"), Err(MacroError::NonPositiveCalories));
        assert!(matches!(
            parse_calorie_target("2400kcal"),
            Err(MacroError::InvalidCalorieInput(_))
        ));
        assert!(matches!(parse_calorie_target(""), Err(MacroError::InvalidCalorieInput(_))));
        assert!(matches!(parse_calorie_target("-5"), Err(MacroError::InvalidCalorieInput(_))));
    }
}
