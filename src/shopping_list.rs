use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::debug;

use crate::models::DishId;
use crate::portion::PortionableDish;

/// Items are merged only when both strings match exactly; "g" and "G" stay
/// separate lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub name: String,
    pub unit: String,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { name: name.into(), unit: unit.into() }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.unit)
    }
}

/// How much of one item a single dish asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishSource {
    pub dish_id: DishId,
    pub dish_name: String,
    pub amount: f64,
    pub portions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub unit: String,
    /// Always the sum of `sources[..].amount`.
    pub total_amount: f64,
    pub checked: bool,
    pub sources: Vec<DishSource>,
}

impl ShoppingListItem {
    fn new(key: &ItemKey, source: DishSource) -> Self {
        Self {
            name: key.name.clone(),
            unit: key.unit.clone(),
            total_amount: source.amount,
            checked: false,
            sources: vec![source],
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.name.clone(), self.unit.clone())
    }

    fn recompute_total(&mut self) {
        self.total_amount = self.sources.iter().map(|source| source.amount).sum();
    }

    fn upsert_source(&mut self, source: DishSource) {
        match self.sources.iter_mut().find(|existing| existing.dish_id == source.dish_id) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
        self.recompute_total();
    }

    /// Returns true when the dish had a source here.
    fn drop_source(&mut self, dish_id: DishId) -> bool {
        let before = self.sources.len();
        self.sources.retain(|source| source.dish_id != dish_id);
        if self.sources.len() == before {
            return false;
        }
        self.recompute_total();
        true
    }
}

/// Items and the denormalised dish membership set. They are replaced as one
/// value so the two can never be observed out of sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingListState {
    items: BTreeMap<ItemKey, ShoppingListItem>,
    dishes: HashSet<DishId>,
}

impl ShoppingListState {
    pub fn items(&self) -> impl Iterator<Item = &ShoppingListItem> {
        self.items.values()
    }

    pub fn get(&self, key: &ItemKey) -> Option<&ShoppingListItem> {
        self.items.get(key)
    }

    pub fn contains_dish(&self, dish_id: DishId) -> bool {
        self.dishes.contains(&dish_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn rebuild_membership(&mut self) {
        self.dishes = self
            .items
            .values()
            .flat_map(|item| item.sources.iter().map(|source| source.dish_id))
            .collect();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    state: Arc<ShoppingListState>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap handle to the current state; later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<ShoppingListState> {
        Arc::clone(&self.state)
    }

    /// Items sorted by ingredient name, then unit.
    pub fn items(&self) -> Vec<&ShoppingListItem> {
        self.state.items().collect()
    }

    pub fn get(&self, key: &ItemKey) -> Option<&ShoppingListItem> {
        self.state.get(key)
    }

    pub fn is_in_list(&self, dish_id: DishId) -> bool {
        self.state.contains_dish(dish_id)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Adds (or re-adds with new portions) every scaled ingredient of a dish.
    /// Re-adding replaces the dish's previous contribution instead of
    /// stacking on top of it.
    pub fn add_dish(&mut self, portionable: &PortionableDish) {
        let dish_id = portionable.dish.id;

        // Same ingredient listed twice in one dish becomes one contribution.
        let mut contributions: Vec<(ItemKey, f64)> = Vec::new();
        for ingredient in portionable.adjusted_ingredients() {
            let key = ItemKey::new(ingredient.name, ingredient.unit);
            match contributions.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, amount)) => *amount += ingredient.adjusted_amount,
                None => contributions.push((key, ingredient.adjusted_amount)),
            }
        }

        if contributions.is_empty() && !self.state.contains_dish(dish_id) {
            return;
        }

        let state = Arc::make_mut(&mut self.state);

        // Ingredients the dish no longer lists (e.g. a customised variant)
        // must not keep stale sources around.
        let keep: HashSet<&ItemKey> = contributions.iter().map(|(key, _)| key).collect();
        state.items.retain(|key, item| {
            if keep.contains(key) {
                return true;
            }
            item.drop_source(dish_id);
            !item.sources.is_empty()
        });

        for (key, amount) in &contributions {
            let source = DishSource {
                dish_id,
                dish_name: portionable.dish.name.clone(),
                amount: *amount,
                portions: portionable.portions(),
            };
            match state.items.get_mut(key) {
                Some(item) => item.upsert_source(source),
                None => {
                    state.items.insert(key.clone(), ShoppingListItem::new(key, source));
                }
            }
        }

        if contributions.is_empty() {
            state.dishes.remove(&dish_id);
        } else {
            state.dishes.insert(dish_id);
        }
        debug!(dish_id = %dish_id, items = contributions.len(), portions = portionable.portions(), "dish added to shopping list");
    }

    /// Removes exactly this dish's contributions. Unknown ids are a no-op
    /// and leave the state untouched.
    pub fn remove_dish(&mut self, dish_id: DishId) {
        if !self.state.contains_dish(dish_id) {
            return;
        }

        let state = Arc::make_mut(&mut self.state);
        state.items.retain(|_, item| {
            item.drop_source(dish_id);
            !item.sources.is_empty()
        });
        state.dishes.remove(&dish_id);
        debug!(dish_id = %dish_id, "dish removed from shopping list");
    }

    /// Returns false if there is no such item.
    pub fn toggle_checked(&mut self, key: &ItemKey) -> bool {
        if !self.state.items.contains_key(key) {
            return false;
        }
        let state = Arc::make_mut(&mut self.state);
        if let Some(item) = state.items.get_mut(key) {
            item.checked = !item.checked;
        }
        true
    }

    /// Drops every checked item. Dishes whose last item goes with them stop
    /// being members of the list.
    pub fn clear_checked(&mut self) {
        if !self.state.items().any(|item| item.checked) {
            return;
        }
        let state = Arc::make_mut(&mut self.state);
        state.items.retain(|_, item| !item.checked);
        state.rebuild_membership();
    }

    pub fn clear(&mut self) {
        self.state = Arc::new(ShoppingListState::default());
    }

    /// Columns: ingredient, amount, unit, checked, dishes.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["ingredient", "amount", "unit", "checked", "dishes"])?;
        for item in self.state.items() {
            let dishes = item
                .sources
                .iter()
                .map(|source| source.dish_name.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let amount = format!("{:.1}", item.total_amount);
            csv_writer.write_record([
                item.name.as_str(),
                amount.as_str(),
                item.unit.as_str(),
                if item.checked { "yes" } else { "no" },
                dishes.as_str(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dish, Ingredient, NutritionalValues};

    fn ingredient(name: &str, amount: f64, unit: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            amount,
            unit: unit.to_string(),
            per_100g: NutritionalValues::new(100.0, 1.0, 1.0, 1.0),
        }
    }

    fn dish(id: i64, name: &str, ingredients: Vec<Ingredient>) -> Dish {
        Dish {
            id: DishId(id),
            name: name.to_string(),
            description: String::new(),
            preparation_steps: String::new(),
            has_photo: false,
            ingredients,
            nutritional_values: NutritionalValues::default(),
        }
    }

    fn assert_totals_consistent(list: &ShoppingList) {
        for item in list.items() {
            let sum: f64 = item.sources.iter().map(|s| s.amount).sum();
            assert!((item.total_amount - sum).abs() < 1e-9, "total mismatch for {}", item.name);
        }
        let from_items: HashSet<DishId> = list
            .items()
            .iter()
            .flat_map(|item| item.sources.iter().map(|s| s.dish_id))
            .collect();
        assert_eq!(from_items, list.snapshot().dishes);
    }

    #[test]
    fn test_merge_and_remove_rice() {
        let mut list = ShoppingList::new();
        let a = dish(1, "Dish A", vec![ingredient("Rice", 200.0, "g")]);
        let b = dish(2, "Dish B", vec![ingredient("Rice", 100.0, "g")]);

        list.add_dish(&PortionableDish::new(a, 1.0));
        assert_totals_consistent(&list);
        list.add_dish(&PortionableDish::new(b, 2.0));
        assert_totals_consistent(&list);

        let key = ItemKey::new("Rice", "g");
        let rice = list.get(&key).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(rice.total_amount, 400.0);
        assert_eq!(rice.sources.len(), 2);
        assert_eq!(rice.sources[1].portions, 2.0);

        list.remove_dish(DishId(1));
        assert_totals_consistent(&list);
        let rice = list.get(&key).unwrap();
        assert_eq!(rice.total_amount, 200.0);
        assert_eq!(rice.sources.len(), 1);
        assert!(!list.is_in_list(DishId(1)));
        assert!(list.is_in_list(DishId(2)));
    }

    #[test]
    fn test_re_add_replaces_source() {
        let mut list = ShoppingList::new();
        let a = dish(1, "Dish A", vec![ingredient("Rice", 200.0, "g"), ingredient("Milk", 250.0, "ml")]);
        list.add_dish(&PortionableDish::new(a.clone(), 1.0));
        list.add_dish(&PortionableDish::new(a, 3.0));
        assert_totals_consistent(&list);

        let rice = list.get(&ItemKey::new("Rice", "g")).unwrap();
        assert_eq!(rice.sources.len(), 1);
        assert_eq!(rice.total_amount, 600.0);
        assert_eq!(list.get(&ItemKey::new("Milk", "ml")).unwrap().total_amount, 750.0);
    }

    #[test]
    fn test_re_add_drops_ingredients_no_longer_listed() {
        let mut list = ShoppingList::new();
        let full = dish(1, "Dish A", vec![ingredient("Rice", 200.0, "g"), ingredient("Salt", 5.0, "g")]);
        let trimmed = dish(1, "Dish A", vec![ingredient("Rice", 200.0, "g")]);
        list.add_dish(&PortionableDish::single(full));
        list.add_dish(&PortionableDish::single(trimmed));
        assert!(list.get(&ItemKey::new("Salt", "g")).is_none());
        assert_totals_consistent(&list);
    }

    #[test]
    fn test_key_is_exact_and_case_sensitive() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "A", vec![ingredient("Rice", 100.0, "g")])));
        list.add_dish(&PortionableDish::single(dish(2, "B", vec![ingredient("rice", 100.0, "g")])));
        list.add_dish(&PortionableDish::single(dish(3, "C", vec![ingredient("Rice", 1.0, "cup")])));
        assert_eq!(list.len(), 3);
        let names: Vec<(&str, &str)> = list.items().iter().map(|i| (i.name.as_str(), i.unit.as_str())).collect();
        assert_eq!(names, vec![("Rice", "cup"), ("Rice", "g"), ("rice", "g")]);
    }

    #[test]
    fn test_duplicate_ingredient_within_dish_is_merged() {
        let mut list = ShoppingList::new();
        let a = dish(1, "A", vec![ingredient("Salt", 2.0, "g"), ingredient("Salt", 3.0, "g")]);
        list.add_dish(&PortionableDish::single(a));
        let salt = list.get(&ItemKey::new("Salt", "g")).unwrap();
        assert_eq!(salt.sources.len(), 1);
        assert_eq!(salt.total_amount, 5.0);
    }

    #[test]
    fn test_remove_unknown_dish_is_noop() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "A", vec![ingredient("Rice", 100.0, "g")])));
        list.toggle_checked(&ItemKey::new("Rice", "g"));
        let before = list.snapshot();

        list.remove_dish(DishId(42));
        let after = list.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_removing_last_source_deletes_item() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "A", vec![ingredient("Egg", 2.0, "szt")])));
        list.remove_dish(DishId(1));
        assert!(list.is_empty());
        assert!(!list.is_in_list(DishId(1)));
        list.remove_dish(DishId(1));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle_and_clear_checked() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "A", vec![ingredient("Egg", 2.0, "szt")])));
        list.add_dish(&PortionableDish::single(dish(2, "B", vec![ingredient("Rice", 100.0, "g"), ingredient("Egg", 1.0, "szt")])));

        let egg = ItemKey::new("Egg", "szt");
        assert!(list.toggle_checked(&egg));
        assert!(list.get(&egg).unwrap().checked);
        assert!(!list.toggle_checked(&ItemKey::new("Flour", "g")));

        list.clear_checked();
        assert!(list.get(&egg).is_none());
        assert_eq!(list.len(), 1);
        // Dish 1 only contributed eggs, so it is gone from the list entirely.
        assert!(!list.is_in_list(DishId(1)));
        assert!(list.is_in_list(DishId(2)));
        assert_totals_consistent(&list);

        assert!(list.toggle_checked(&ItemKey::new("Rice", "g")));
        assert!(list.toggle_checked(&ItemKey::new("Rice", "g")));
        assert!(!list.get(&ItemKey::new("Rice", "g")).unwrap().checked);
    }

    #[test]
    fn test_snapshot_is_copy_on_write() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "A", vec![ingredient("Rice", 100.0, "g")])));
        let snapshot = list.snapshot();
        list.remove_dish(DishId(1));
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_dish(DishId(1)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_write_csv() {
        let mut list = ShoppingList::new();
        list.add_dish(&PortionableDish::single(dish(1, "Dish A", vec![ingredient("Rice", 200.0, "g")])));
        list.add_dish(&PortionableDish::new(dish(2, "Dish B", vec![ingredient("Rice", 100.0, "g")]), 2.0));

        let mut out = Vec::new();
        list.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ingredient,amount,unit,checked,dishes");
        assert_eq!(lines[1], "Rice,400.0,g,no,Dish A; Dish B");
    }
}
