//! Input boundary for user-typed numbers. Text that does not parse is
//! rejected; numbers that parse are clamped into their valid range, so the
//! planner core never sees out-of-range values.

use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::planner::MealCount;
use crate::portion::{MAX_PORTIONS, MIN_PORTIONS};

pub const CALORIES_RANGE: RangeInclusive<u32> = 1000..=6500;
pub const WEIGHT_KG_RANGE: RangeInclusive<f64> = 30.0..=300.0;
pub const HEIGHT_CM_RANGE: RangeInclusive<u32> = 120..=250;
pub const AGE_RANGE: RangeInclusive<u32> = 16..=100;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NotANumber { field: &'static str, input: String },
    UnsupportedMealCount(i64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotANumber { field, input } => {
                write!(f, "{} must be a number, got '{}'", field, input)
            }
            ValidationError::UnsupportedMealCount(count) => {
                write!(f, "number of meals must be 3, 4 or 5, got {}", count)
            }
        }
    }
}

impl Error for ValidationError {}

fn parse_number<T: FromStr>(field: &'static str, input: &str) -> Result<T, ValidationError> {
    input.trim().parse::<T>().map_err(|_| ValidationError::NotANumber {
        field,
        input: input.to_string(),
    })
}

fn parse_finite(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let value: f64 = parse_number(field, input)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotANumber { field, input: input.to_string() })
    }
}

fn clamp_to<T: PartialOrd + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        value
    }
}

pub fn clamp_target_calories(kcal: u32) -> u32 {
    clamp_to(kcal, &CALORIES_RANGE)
}

pub fn clamp_weight_kg(weight: f64) -> f64 {
    clamp_to(weight, &WEIGHT_KG_RANGE)
}

pub fn clamp_height_cm(height: u32) -> u32 {
    clamp_to(height, &HEIGHT_CM_RANGE)
}

pub fn clamp_age(age: u32) -> u32 {
    clamp_to(age, &AGE_RANGE)
}

pub fn parse_target_calories(input: &str) -> Result<u32, ValidationError> {
    parse_number::<u32>("target calories", input).map(clamp_target_calories)
}

pub fn parse_portions(input: &str) -> Result<f64, ValidationError> {
    parse_finite("portions", input).map(|p| clamp_to(p, &(MIN_PORTIONS..=MAX_PORTIONS)))
}

pub fn parse_weight_kg(input: &str) -> Result<f64, ValidationError> {
    parse_finite("weight", input).map(clamp_weight_kg)
}

pub fn parse_height_cm(input: &str) -> Result<u32, ValidationError> {
    parse_number::<u32>("height", input).map(clamp_height_cm)
}

pub fn parse_age(input: &str) -> Result<u32, ValidationError> {
    parse_number::<u32>("age", input).map(clamp_age)
}

pub fn parse_meal_count(input: &str) -> Result<MealCount, ValidationError> {
    let count = parse_number::<i64>("number of meals", input)?;
    MealCount::try_from(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_numeric_input_is_rejected() {
        assert_eq!(
            parse_target_calories("lots"),
            Err(ValidationError::NotANumber { field: "target calories", input: "lots".to_string() })
        );
        assert!(parse_portions("").is_err());
        assert!(parse_portions("NaN").is_err());
        assert!(parse_weight_kg("inf").is_err());
        assert!(parse_age("-3").is_err());
    }

    #[test]
    fn test_values_are_clamped() {
        assert_eq!(parse_target_calories("500").unwrap(), 1000);
        assert_eq!(parse_target_calories(" 2400 ").unwrap(), 2400);
        assert_eq!(parse_target_calories("9000").unwrap(), 6500);
        assert_eq!(parse_portions("0.1").unwrap(), 0.5);
        assert_eq!(parse_portions("12").unwrap(), 10.0);
        assert_eq!(parse_portions("2.5").unwrap(), 2.5);
        assert_eq!(parse_weight_kg("12.5").unwrap(), 30.0);
        assert_eq!(parse_height_cm("300").unwrap(), 250);
        assert_eq!(parse_age("12").unwrap(), 16);
    }

    #[test]
    fn test_meal_count() {
        assert_eq!(parse_meal_count("4").unwrap(), MealCount::Four);
        assert_eq!(parse_meal_count("6"), Err(ValidationError::UnsupportedMealCount(6)));
        assert!(parse_meal_count("three").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::UnsupportedMealCount(2);
        assert_eq!(err.to_string(), "number of meals must be 3, 4 or 5, got 2");
        let err = ValidationError::NotANumber { field: "age", input: "x".to_string() };
        assert_eq!(err.to_string(), "age must be a number, got 'x'");
    }
}
