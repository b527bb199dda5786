use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

// The backend still serves the Polish column names, so every wire field is
// renamed and the English name is accepted as an alias for local JSON files.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(pub i64);

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kcal and macronutrients in grams. Used both for absolute totals and for
/// per-100g rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalValues {
    #[serde(default)]
    pub kcal: f64,
    #[serde(rename = "bialko", alias = "protein_g", default)]
    pub protein_g: f64,
    #[serde(rename = "weglowodany", alias = "carbs_g", default)]
    pub carbs_g: f64,
    #[serde(rename = "tluszcze", alias = "fat_g", default)]
    pub fat_g: f64,
}

impl NutritionalValues {
    pub const ZERO: NutritionalValues = NutritionalValues {
        kcal: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    };

    pub fn new(kcal: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self { kcal, protein_g, carbs_g, fat_g }
    }

    /// Field-wise multiplication, e.g. by a portion multiplier.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            kcal: self.kcal * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    /// Contribution of `amount` grams of an ingredient whose rates are per 100g.
    pub fn for_amount(per_100g: &NutritionalValues, amount: f64) -> Self {
        per_100g.scaled(amount / 100.0)
    }
}

impl Add for NutritionalValues {
    type Output = NutritionalValues;

    fn add(mut self, rhs: NutritionalValues) -> NutritionalValues {
        self += rhs;
        self
    }
}

impl AddAssign for NutritionalValues {
    fn add_assign(&mut self, rhs: NutritionalValues) {
        macro_rules! add_field {
            ($($field:ident),*) => {
                $( self.$field += rhs.$field; )*
            };
        }
        add_field!(kcal, protein_g, carbs_g, fat_g);
    }
}

impl Sum for NutritionalValues {
    fn sum<I: Iterator<Item = NutritionalValues>>(iter: I) -> Self {
        iter.fold(NutritionalValues::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a NutritionalValues> for NutritionalValues {
    fn sum<I: Iterator<Item = &'a NutritionalValues>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "nazwa", alias = "name")]
    pub name: String,
    #[serde(rename = "ilosc", alias = "amount", default)]
    pub amount: f64,
    /// Free text, never normalised ("g", "ml", "szt", ...).
    #[serde(rename = "jednostka", alias = "unit", default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(rename = "wartosci_na_100g", alias = "per_100g", default)]
    pub per_100g: NutritionalValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    #[serde(rename = "nazwa", alias = "name")]
    pub name: String,
    #[serde(rename = "opis", alias = "description", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        rename = "sposob_przygotowania",
        alias = "preparation_steps",
        default,
        deserialize_with = "null_as_default"
    )]
    pub preparation_steps: String,
    #[serde(rename = "ma_zdjecie", alias = "has_photo", default, deserialize_with = "null_as_default")]
    pub has_photo: bool,
    #[serde(rename = "skladniki", alias = "ingredients", default)]
    pub ingredients: Vec<Ingredient>,
    /// Totals for the ingredient amounts above, computed by the server.
    #[serde(rename = "wartosci_odzywcze", alias = "nutritional_values", default)]
    pub nutritional_values: NutritionalValues,
}

/// The five fixed meal slots of a day, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::MorningSnack,
        MealType::Lunch,
        MealType::AfternoonSnack,
        MealType::Dinner,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::MorningSnack => "Morning snack",
            MealType::Lunch => "Lunch",
            MealType::AfternoonSnack => "Afternoon snack",
            MealType::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "morning_snack" => Ok(MealType::MorningSnack),
            "lunch" => Ok(MealType::Lunch),
            "afternoon_snack" => Ok(MealType::AfternoonSnack),
            "dinner" => Ok(MealType::Dinner),
            other => Err(format!("unknown meal type: {}", other)),
        }
    }
}

/// A meal slot with its dishes in insertion order. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: MealType,
    pub dishes: Vec<Dish>,
}

impl Meal {
    pub fn empty(meal_type: MealType) -> Self {
        Self { meal_type, dishes: Vec::new() }
    }
}

/// One calendar day. All five slots are always present, active or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub meals: BTreeMap<MealType, Meal>,
}

impl DayPlan {
    pub fn new(date: NaiveDate) -> Self {
        let meals = MealType::ALL
            .iter()
            .map(|meal_type| (*meal_type, Meal::empty(*meal_type)))
            .collect();
        Self { date, meals }
    }

    pub fn dishes(&self, meal_type: MealType) -> &[Dish] {
        self.meals
            .get(&meal_type)
            .map(|meal| meal.dishes.as_slice())
            .unwrap_or(&[])
    }

    pub fn meal_mut(&mut self, meal_type: MealType) -> &mut Meal {
        self.meals
            .entry(meal_type)
            .or_insert_with(|| Meal::empty(meal_type))
    }

    pub fn dish_count(&self) -> usize {
        self.meals.values().map(|meal| meal.dishes.len()).sum()
    }

    pub fn contains_dish(&self, dish_id: DishId) -> bool {
        self.meals
            .values()
            .any(|meal| meal.dishes.iter().any(|dish| dish.id == dish_id))
    }
}

/// A calendar month, stored as its first day so it is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so with_day(1) cannot fail here.
        Self { first: date.with_day(1).unwrap_or(date) }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.first.month();
        self.first.iter_days().take_while(move |day| day.month() == month)
    }

    pub fn length(&self) -> usize {
        self.days().count()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year = year.parse::<i32>().map_err(|e| format!("bad year in '{}': {}", s, e))?;
        let month = month.parse::<u32>().map_err(|e| format!("bad month in '{}': {}", s, e))?;
        YearMonth::new(year, month).ok_or_else(|| format!("no such month: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_deserializes_backend_payload() {
        let payload = r#"{
            "id": 7,
            "nazwa": "Owsianka",
            "opis": null,
            "sposob_przygotowania": "Ugotuj.",
            "ma_zdjecie": true,
            "skladniki": [
                {"nazwa": "Płatki owsiane", "ilosc": 60, "jednostka": "g",
                 "wartosci_na_100g": {"kcal": 370, "bialko": 13.0, "weglowodany": 60.0, "tluszcze": 7.0}}
            ],
            "wartosci_odzywcze": {"kcal": 222, "bialko": 7.8, "weglowodany": 36.0, "tluszcze": 4.2}
        }"#;
        let dish: Dish = serde_json::from_str(payload).unwrap();
        assert_eq!(dish.id, DishId(7));
        assert_eq!(dish.name, "Owsianka");
        assert_eq!(dish.description, "");
        assert!(dish.has_photo);
        assert_eq!(dish.ingredients[0].amount, 60.0);
        assert_eq!(dish.ingredients[0].per_100g.kcal, 370.0);
        assert_eq!(dish.nutritional_values.carbs_g, 36.0);
    }

    #[test]
    fn test_dish_accepts_english_field_names() {
        let payload = r#"{"id": 1, "name": "Rice bowl",
            "ingredients": [{"name": "Rice", "amount": 200, "unit": "g",
                             "per_100g": {"kcal": 130, "protein_g": 2.7, "carbs_g": 28, "fat_g": 0.3}}],
            "nutritional_values": {"kcal": 260}}"#;
        let dish: Dish = serde_json::from_str(payload).unwrap();
        assert_eq!(dish.ingredients[0].unit, "g");
        assert_eq!(dish.nutritional_values.kcal, 260.0);
        assert_eq!(dish.nutritional_values.fat_g, 0.0);
    }

    #[test]
    fn test_nutritional_values_arithmetic() {
        let a = NutritionalValues::new(100.0, 10.0, 5.0, 2.0);
        let b = NutritionalValues::new(50.0, 1.0, 1.0, 1.0);
        assert_eq!(a + b, NutritionalValues::new(150.0, 11.0, 6.0, 3.0));
        assert_eq!(a.scaled(2.0), NutritionalValues::new(200.0, 20.0, 10.0, 4.0));
        let total: NutritionalValues = vec![a, b, b].into_iter().sum();
        assert_eq!(total.kcal, 200.0);
        let per_100g = NutritionalValues::new(130.0, 2.7, 28.0, 0.3);
        assert!((NutritionalValues::for_amount(&per_100g, 200.0).kcal - 260.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_plan_has_all_slots() {
        let day = DayPlan::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(day.meals.len(), 5);
        assert!(MealType::ALL.iter().all(|t| day.dishes(*t).is_empty()));
        let keys: Vec<MealType> = day.meals.keys().copied().collect();
        assert_eq!(keys, MealType::ALL.to_vec());
    }

    #[test]
    fn test_year_month_days() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.length(), 29);
        assert_eq!(YearMonth::new(2023, 2).unwrap().length(), 28);
        assert_eq!(YearMonth::new(2024, 6).unwrap().length(), 30);
        assert!(YearMonth::new(2024, 13).is_none());
        let june = YearMonth::from_date(NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
        assert_eq!(june.to_string(), "2024-06");
        assert!(june.contains(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!june.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert_eq!("2024-06".parse::<YearMonth>().unwrap(), june);
    }

    #[test]
    fn test_meal_type_parsing() {
        assert_eq!("afternoon-snack".parse::<MealType>().unwrap(), MealType::AfternoonSnack);
        assert_eq!("Dinner".parse::<MealType>().unwrap(), MealType::Dinner);
        assert!("brunch".parse::<MealType>().is_err());
    }
}
