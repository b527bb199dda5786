//! Batch input for the `plan` command: a JSON list of dishes to put on
//! given days, resolved against the dish catalog.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::catalog::DishCatalog;
use crate::models::{DishId, MealType, YearMonth};
use crate::planner::PlannerSession;
use crate::portion::PortionableDish;

fn one_portion() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanEntry {
    pub date: NaiveDate,
    pub meal: MealType,
    pub dish_id: DishId,
    #[serde(default = "one_portion")]
    pub portions: f64,
    /// Also put the dish's ingredients on the shopping list.
    #[serde(default = "yes")]
    pub shopping_list: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanFile {
    pub entries: Vec<PlanEntry>,
}

impl PlanFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plan file '{}'", path.display()))
    }

    pub fn months(&self) -> BTreeSet<YearMonth> {
        self.entries.iter().map(|entry| YearMonth::from_date(entry.date)).collect()
    }

    /// Applies every entry whose dish exists in the catalog and returns the
    /// ids that could not be found.
    pub fn apply(&self, session: &mut PlannerSession, catalog: &DishCatalog) -> Vec<DishId> {
        for month in self.months() {
            session.initialize_month(month);
        }

        let mut missing = Vec::new();
        for entry in &self.entries {
            let Some(dish) = catalog.find(entry.dish_id) else {
                warn!(dish_id = %entry.dish_id, date = %entry.date, "dish not in catalog, entry skipped");
                missing.push(entry.dish_id);
                continue;
            };

            if entry.shopping_list {
                session.add_dish_to_meal_and_shopping_list(entry.date, entry.meal, dish.clone(), entry.portions);
            } else {
                let scaled = PortionableDish::new(dish.clone(), entry.portions).scaled_dish();
                session.assign_dish_to_meal(entry.date, entry.meal, scaled);
            }
        }
        missing
    }
}
