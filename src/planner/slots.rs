use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::{DayPlan, MealType};
use crate::validation::ValidationError;

/// How many meal slots a day uses. The slot subsets are fixed, not user labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum MealCount {
    Three,
    Four,
    #[default]
    Five,
}

const FIVE_MEALS: [MealType; 5] = MealType::ALL;
const FOUR_MEALS: [MealType; 4] = [
    MealType::Breakfast,
    MealType::Lunch,
    MealType::AfternoonSnack,
    MealType::Dinner,
];
const THREE_MEALS: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

impl MealCount {
    pub fn get(&self) -> u8 {
        match self {
            MealCount::Three => 3,
            MealCount::Four => 4,
            MealCount::Five => 5,
        }
    }

    pub fn active_meal_types(&self) -> &'static [MealType] {
        match self {
            MealCount::Three => &THREE_MEALS,
            MealCount::Four => &FOUR_MEALS,
            MealCount::Five => &FIVE_MEALS,
        }
    }

    pub fn is_active(&self, meal_type: MealType) -> bool {
        self.active_meal_types().contains(&meal_type)
    }
}

impl TryFrom<i64> for MealCount {
    type Error = ValidationError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        match count {
            3 => Ok(MealCount::Three),
            4 => Ok(MealCount::Four),
            5 => Ok(MealCount::Five),
            other => Err(ValidationError::UnsupportedMealCount(other)),
        }
    }
}

impl From<MealCount> for u8 {
    fn from(count: MealCount) -> u8 {
        count.get()
    }
}

impl fmt::Display for MealCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Appends every dish of `from` to the end of `into` and empties `from`.
/// The slot key itself stays. Returns the number of dishes moved.
fn move_slot(day: &mut DayPlan, from: MealType, into: MealType) -> usize {
    let moved = std::mem::take(&mut day.meal_mut(from).dishes);
    let count = moved.len();
    if count > 0 {
        day.meal_mut(into).dishes.extend(moved);
    }
    count
}

/// Folds dishes out of slots that a smaller meal count gives up, so nothing
/// is silently dropped. Rules run in order, the second one on the output of
/// the first:
/// - 5 -> 4 or 3: afternoon snack goes into dinner
/// - 5 or 4 -> 3: morning snack goes into lunch
///
/// Increases (and equal counts) leave the day untouched.
pub fn reassign_for_reduction(day: &mut DayPlan, from: MealCount, to: MealCount) -> usize {
    if to >= from {
        return 0;
    }

    let mut moved = 0;
    if from == MealCount::Five && to <= MealCount::Four {
        moved += move_slot(day, MealType::AfternoonSnack, MealType::Dinner);
    }
    if matches!(from, MealCount::Five | MealCount::Four) && to == MealCount::Three {
        moved += move_slot(day, MealType::MorningSnack, MealType::Lunch);
    }

    if moved > 0 {
        debug!(date = %day.date, from = %from, to = %to, moved, "dishes reassigned after meal count reduction");
    }
    moved
}
