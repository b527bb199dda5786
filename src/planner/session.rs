use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::{Dish, DishId, MealType, YearMonth};
use crate::planner::month::MealPlanStore;
use crate::portion::PortionableDish;
use crate::settings::{SettingsError, SettingsRepository, UserSettings};
use crate::shopping_list::ShoppingList;

/// Single owner of one user's plan and shopping list.
///
/// Settings saved through the shared repository reach the session over a
/// watch channel. Every entry point drains that channel first, so a read
/// that follows a save already sees the reassigned plan.
pub struct PlannerSession {
    store: MealPlanStore,
    shopping_list: ShoppingList,
    settings: Arc<SettingsRepository>,
    settings_rx: watch::Receiver<UserSettings>,
    target_calories: u32,
}

impl PlannerSession {
    pub fn new(settings: Arc<SettingsRepository>, selected_date: NaiveDate) -> Self {
        let settings_rx = settings.subscribe();
        let current = settings_rx.borrow().clone();
        Self {
            store: MealPlanStore::new(selected_date, current.number_of_meals),
            shopping_list: ShoppingList::new(),
            settings,
            settings_rx,
            target_calories: current.effective_target_calories(),
        }
    }

    fn sync_settings(&mut self) {
        match self.settings_rx.has_changed() {
            Ok(true) => {}
            Ok(false) => return,
            Err(_) => {
                warn!("settings repository closed, keeping last known settings");
                return;
            }
        }

        let settings = self.settings_rx.borrow_and_update().clone();
        self.target_calories = settings.effective_target_calories();
        let reduced = self.store.apply_meal_count(settings.number_of_meals);
        debug!(
            meals = %settings.number_of_meals,
            target_calories = self.target_calories,
            reduced,
            "settings change applied to session"
        );
    }

    pub fn plan(&mut self) -> &MealPlanStore {
        self.sync_settings();
        &self.store
    }

    pub fn shopping_list(&mut self) -> &ShoppingList {
        self.sync_settings();
        &self.shopping_list
    }

    pub fn target_calories(&mut self) -> u32 {
        self.sync_settings();
        self.target_calories
    }

    pub fn settings(&self) -> UserSettings {
        self.settings.get_settings()
    }

    /// Persists through the shared repository; the change is applied here on
    /// the next call like any other subscriber would see it.
    pub fn update_settings(&mut self, settings: &UserSettings) -> Result<(), SettingsError> {
        self.settings.save_settings(settings)?;
        self.sync_settings();
        Ok(())
    }

    pub fn initialize_month(&mut self, month: YearMonth) {
        self.sync_settings();
        self.store.initialize_month(month);
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.sync_settings();
        self.store.select_date(date);
    }

    pub fn assign_dish_to_meal(&mut self, date: NaiveDate, meal_type: MealType, dish: Dish) {
        self.sync_settings();
        self.store.assign_dish_to_meal(date, meal_type, dish);
    }

    /// Plans the dish at the given portions and puts its scaled ingredients
    /// on the shopping list.
    pub fn add_dish_to_meal_and_shopping_list(
        &mut self,
        date: NaiveDate,
        meal_type: MealType,
        dish: Dish,
        portions: f64,
    ) {
        self.sync_settings();
        let portionable = PortionableDish::new(dish, portions);
        self.store.assign_dish_to_meal(date, meal_type, portionable.scaled_dish());
        self.shopping_list.add_dish(&portionable);
    }

    /// Removes the dish at `index` from the slot. With `also_shopping_list`,
    /// its ingredients leave the shopping list too, unless another slot in
    /// the same calendar month still uses the dish.
    pub fn remove_dish_from_meal_and_shopping_list(
        &mut self,
        date: NaiveDate,
        meal_type: MealType,
        index: usize,
        also_shopping_list: bool,
    ) -> Option<Dish> {
        self.sync_settings();
        let removed = self.store.remove_dish_from_meal(date, meal_type, index)?;

        if also_shopping_list {
            let month = YearMonth::from_date(date);
            if self.store.is_dish_used_in_month(removed.id, month) {
                debug!(dish_id = %removed.id, month = %month, "dish still planned elsewhere, shopping list kept");
            } else {
                self.shopping_list.remove_dish(removed.id);
            }
        }
        Some(removed)
    }

    pub fn add_to_shopping_list(&mut self, portionable: &PortionableDish) {
        self.sync_settings();
        self.shopping_list.add_dish(portionable);
    }

    pub fn remove_from_shopping_list(&mut self, dish_id: DishId) {
        self.sync_settings();
        self.shopping_list.remove_dish(dish_id);
    }

    pub fn shopping_list_mut(&mut self) -> &mut ShoppingList {
        self.sync_settings();
        &mut self.shopping_list
    }
}
