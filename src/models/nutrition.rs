//! Shared nutrition data structure
//!
//! Used by food items, food logs and daily totals.

use serde::{Deserialize, Serialize};

/// Energy and macro-nutrient amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
}

impl Nutrition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    /// Amount eaten of a food whose values are given per 100 g
    pub fn for_grams(&self, grams: f64) -> Self {
        self.scale(grams / 100.0)
    }

    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }

    /// Round every field to one decimal place for display
    pub fn rounded(&self) -> Self {
        let r = |v: f64| (v * 10.0).round() / 10.0;
        Self {
            calories: r(self.calories),
            protein: r(self.protein),
            carbs: r(self.carbs),
            fat: r(self.fat),
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_grams() {
        let oats = Nutrition { calories: 389.0, protein: 16.9, carbs: 66.0, fat: 6.9 };
        let half = oats.for_grams(50.0);
        assert!((half.calories - 194.5).abs() < 1e-9);
        assert!((half.carbs - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum() {
        let items = vec![
            Nutrition { calories: 100.0, protein: 1.0, carbs: 2.0, fat: 3.0 },
            Nutrition { calories: 50.0, protein: 4.0, carbs: 5.0, fat: 6.0 },
        ];
        let total: Nutrition = items.into_iter().sum();
        assert_eq!(total, Nutrition { calories: 150.0, protein: 5.0, carbs: 7.0, fat: 9.0 });
    }

    #[test]
    fn test_rounded() {
        let n = Nutrition { calories: 12.345, protein: 0.06, carbs: 1.0, fat: 2.449 };
        assert_eq!(n.rounded(), Nutrition { calories: 12.3, protein: 0.1, carbs: 1.0, fat: 2.4 });
    }
}
