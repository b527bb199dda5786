use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{DayPlan, Dish, DishId, MealType, NutritionalValues, YearMonth};
use crate::nutrition::{self, MacroBreakdown, MonthStatistics};
use crate::planner::slots::{reassign_for_reduction, MealCount};

pub type MonthPlans = BTreeMap<NaiveDate, DayPlan>;

/// Date-keyed day plans plus the selected date and its cached totals.
///
/// The map sits behind an `Arc` and is changed through `Arc::make_mut`, so a
/// snapshot taken before a mutation keeps seeing the old plans.
#[derive(Debug, Clone)]
pub struct MealPlanStore {
    plans: Arc<MonthPlans>,
    selected_date: NaiveDate,
    meal_count: MealCount,
    current_date_nutrition: NutritionalValues,
}

impl MealPlanStore {
    pub fn new(selected_date: NaiveDate, meal_count: MealCount) -> Self {
        let mut store = Self {
            plans: Arc::new(BTreeMap::new()),
            selected_date,
            meal_count,
            current_date_nutrition: NutritionalValues::ZERO,
        };
        store.initialize_month(YearMonth::from_date(selected_date));
        store
    }

    /// Adds an empty plan for every day of `month` that has none yet.
    /// Days already present keep their dishes.
    pub fn initialize_month(&mut self, month: YearMonth) {
        let missing: Vec<NaiveDate> = month.days().filter(|date| !self.plans.contains_key(date)).collect();
        if missing.is_empty() {
            return;
        }

        let plans = Arc::make_mut(&mut self.plans);
        for date in &missing {
            plans.insert(*date, DayPlan::new(*date));
        }
        debug!(month = %month, added = missing.len(), "month initialized");
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
        self.recompute_current();
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn meal_count(&self) -> MealCount {
        self.meal_count
    }

    pub fn active_meal_types(&self) -> &'static [MealType] {
        self.meal_count.active_meal_types()
    }

    pub fn assign_dish_to_meal(&mut self, date: NaiveDate, meal_type: MealType, dish: Dish) {
        let plans = Arc::make_mut(&mut self.plans);
        plans
            .entry(date)
            .or_insert_with(|| DayPlan::new(date))
            .meal_mut(meal_type)
            .dishes
            .push(dish);

        if date == self.selected_date {
            self.recompute_current();
        }
    }

    /// Removes the dish at `index` in the slot. Unknown dates and bad indices
    /// leave the store untouched and return `None`.
    pub fn remove_dish_from_meal(&mut self, date: NaiveDate, meal_type: MealType, index: usize) -> Option<Dish> {
        let in_bounds = self
            .plans
            .get(&date)
            .is_some_and(|day| index < day.dishes(meal_type).len());
        if !in_bounds {
            return None;
        }

        let plans = Arc::make_mut(&mut self.plans);
        let removed = plans
            .get_mut(&date)
            .map(|day| day.meal_mut(meal_type).dishes.remove(index));

        if date == self.selected_date {
            self.recompute_current();
        }
        removed
    }

    /// Switches the meal count. On a reduction every stored day is folded
    /// into the remaining slots. Returns whether a reduction happened.
    pub fn apply_meal_count(&mut self, new_count: MealCount) -> bool {
        let old_count = self.meal_count;
        if new_count == old_count {
            return false;
        }
        self.meal_count = new_count;

        if new_count > old_count {
            // The current-date totals gain the reopened slots, which start empty
            // unless something was assigned to them while inactive.
            self.recompute_current();
            return false;
        }

        let plans = Arc::make_mut(&mut self.plans);
        let moved: usize = plans
            .values_mut()
            .map(|day| reassign_for_reduction(day, old_count, new_count))
            .sum();
        info!(from = %old_count, to = %new_count, moved, "meal count reduced");

        self.recompute_current();
        true
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.plans.get(&date)
    }

    pub fn snapshot(&self) -> Arc<MonthPlans> {
        Arc::clone(&self.plans)
    }

    pub fn daily_nutrition(&self, date: NaiveDate) -> NutritionalValues {
        self.plans
            .get(&date)
            .map(|day| nutrition::day_nutrition(day, self.active_meal_types()))
            .unwrap_or(NutritionalValues::ZERO)
    }

    pub fn current_date_nutrition(&self) -> NutritionalValues {
        self.current_date_nutrition
    }

    pub fn current_date_macros(&self) -> MacroBreakdown {
        MacroBreakdown::from_values(&self.current_date_nutrition)
    }

    pub fn month_statistics(&self, month: YearMonth) -> MonthStatistics {
        nutrition::month_statistics(&self.plans, month, self.active_meal_types())
    }

    /// Looks in every slot, active or not, of every day in `month`.
    pub fn is_dish_used_in_month(&self, dish_id: DishId, month: YearMonth) -> bool {
        self.plans
            .range(month.first_day()..)
            .take_while(|(date, _)| month.contains(**date))
            .any(|(_, day)| day.contains_dish(dish_id))
    }

    fn recompute_current(&mut self) {
        self.current_date_nutrition = self.daily_nutrition(self.selected_date);
    }
}
