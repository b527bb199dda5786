use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DayPlan, Dish, Meal, MealType, NutritionalValues, YearMonth};

// Atwater factors, kcal per gram.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

pub fn sum_dishes(dishes: &[Dish]) -> NutritionalValues {
    dishes.iter().map(|dish| &dish.nutritional_values).sum()
}

pub fn meal_nutrition(meal: &Meal) -> NutritionalValues {
    sum_dishes(&meal.dishes)
}

/// Totals for one day, counting only the given (active) meal slots. Dishes in
/// inactive slots stay stored but are skipped here.
pub fn day_nutrition(day: &DayPlan, active_types: &[MealType]) -> NutritionalValues {
    day.meals
        .iter()
        .filter(|(meal_type, _)| active_types.contains(meal_type))
        .map(|(_, meal)| meal_nutrition(meal))
        .sum()
}

fn has_active_dishes(day: &DayPlan, active_types: &[MealType]) -> bool {
    active_types
        .iter()
        .any(|meal_type| !day.dishes(*meal_type).is_empty())
}

/// Share of total calories (in percent) coming from `macro_kcal`.
/// Defined as 0 when there are no calories at all.
pub fn calculate_macro_percentage(macro_kcal: f64, total_kcal: f64) -> f64 {
    if total_kcal > 0.0 {
        macro_kcal / total_kcal * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

impl MacroBreakdown {
    pub fn from_values(values: &NutritionalValues) -> Self {
        Self {
            protein_pct: calculate_macro_percentage(values.protein_g * KCAL_PER_G_PROTEIN, values.kcal),
            carbs_pct: calculate_macro_percentage(values.carbs_g * KCAL_PER_G_CARBS, values.kcal),
            fat_pct: calculate_macro_percentage(values.fat_g * KCAL_PER_G_FAT, values.kcal),
        }
    }
}

/// Fraction of the daily target already eaten, clamped to [0, 1] for
/// progress bars.
pub fn calorie_progress(consumed_kcal: f64, target_kcal: u32) -> f64 {
    if target_kcal == 0 {
        return 0.0;
    }
    (consumed_kcal / f64::from(target_kcal)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthStatistics {
    pub days_with_meals: usize,
    pub total: NutritionalValues,
    /// Average over `days_with_meals` only; empty days do not drag it down.
    pub average: NutritionalValues,
}

pub fn month_statistics(
    plans: &BTreeMap<NaiveDate, DayPlan>,
    month: YearMonth,
    active_types: &[MealType],
) -> MonthStatistics {
    let mut stats = MonthStatistics::default();

    for day in month.days().filter_map(|date| plans.get(&date)) {
        if !has_active_dishes(day, active_types) {
            continue;
        }
        stats.days_with_meals += 1;
        stats.total += day_nutrition(day, active_types);
    }

    if stats.days_with_meals > 0 {
        stats.average = stats.total.scaled(1.0 / stats.days_with_meals as f64);
    }
    stats
}
