use serde::{Deserialize, Serialize};

use crate::models::{Dish, Ingredient, NutritionalValues};

pub const MIN_PORTIONS: f64 = 0.5;
pub const MAX_PORTIONS: f64 = 10.0;

pub fn clamp_portions(portions: f64) -> f64 {
    if portions.is_nan() {
        return 1.0;
    }
    portions.clamp(MIN_PORTIONS, MAX_PORTIONS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedIngredient {
    pub name: String,
    pub original_amount: f64,
    pub adjusted_amount: f64,
    pub unit: String,
    pub per_100g: NutritionalValues,
}

/// A dish eaten `portions` times. Every ingredient keeps its ratio, so the
/// server-computed totals scale linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct PortionableDish {
    pub dish: Dish,
    portions: f64,
}

impl PortionableDish {
    pub fn new(dish: Dish, portions: f64) -> Self {
        Self { dish, portions: clamp_portions(portions) }
    }

    pub fn single(dish: Dish) -> Self {
        Self::new(dish, 1.0)
    }

    pub fn portions(&self) -> f64 {
        self.portions
    }

    pub fn with_portions(&self, portions: f64) -> Self {
        Self::new(self.dish.clone(), portions)
    }

    pub fn adjusted_ingredients(&self) -> Vec<AdjustedIngredient> {
        self.dish
            .ingredients
            .iter()
            .map(|ingredient| AdjustedIngredient {
                name: ingredient.name.clone(),
                original_amount: ingredient.amount,
                adjusted_amount: ingredient.amount * self.portions,
                unit: ingredient.unit.clone(),
                per_100g: ingredient.per_100g,
            })
            .collect()
    }

    pub fn adjusted_nutritional_values(&self) -> NutritionalValues {
        self.dish.nutritional_values.scaled(self.portions)
    }

    /// The dish with amounts and totals already multiplied out, as it is
    /// stored in a day plan.
    pub fn scaled_dish(&self) -> Dish {
        let ingredients = self
            .dish
            .ingredients
            .iter()
            .map(|ingredient| Ingredient { amount: ingredient.amount * self.portions, ..ingredient.clone() })
            .collect();
        Dish {
            ingredients,
            nutritional_values: self.adjusted_nutritional_values(),
            ..self.dish.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomIngredient {
    pub ingredient: Ingredient,
    pub custom_amount: f64,
    pub is_customized: bool,
}

impl CustomIngredient {
    pub fn new(ingredient: Ingredient) -> Self {
        let custom_amount = ingredient.amount;
        Self { ingredient, custom_amount, is_customized: false }
    }

    fn set_amount(&mut self, amount: f64) {
        self.custom_amount = amount;
        self.is_customized = amount != self.ingredient.amount;
    }

    fn reset(&mut self) {
        self.custom_amount = self.ingredient.amount;
        self.is_customized = false;
    }

    pub fn adjusted_nutritional_values(&self) -> NutritionalValues {
        NutritionalValues::for_amount(&self.ingredient.per_100g, self.custom_amount)
    }
}

/// A dish whose ingredient amounts can be overridden one by one, on top of a
/// portion multiplier. Totals are rebuilt from per-100g rates, not from the
/// server totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomizableDish {
    pub dish: Dish,
    ingredients: Vec<CustomIngredient>,
    portions: f64,
}

impl CustomizableDish {
    pub fn new(dish: Dish) -> Self {
        let ingredients = dish.ingredients.iter().cloned().map(CustomIngredient::new).collect();
        Self { dish, ingredients, portions: 1.0 }
    }

    pub fn ingredients(&self) -> &[CustomIngredient] {
        &self.ingredients
    }

    pub fn portions(&self) -> f64 {
        self.portions
    }

    /// Out-of-range indices are ignored.
    pub fn set_ingredient_amount(&mut self, index: usize, amount: f64) {
        if let Some(ingredient) = self.ingredients.get_mut(index) {
            ingredient.set_amount(amount);
        }
    }

    pub fn set_portions(&mut self, portions: f64) {
        self.portions = clamp_portions(portions);
    }

    pub fn reset_ingredient(&mut self, index: usize) {
        if let Some(ingredient) = self.ingredients.get_mut(index) {
            ingredient.reset();
        }
    }

    pub fn reset_all(&mut self) {
        self.ingredients.iter_mut().for_each(CustomIngredient::reset);
        self.portions = 1.0;
    }

    pub fn total_nutritional_values(&self) -> NutritionalValues {
        self.ingredients
            .iter()
            .map(CustomIngredient::adjusted_nutritional_values)
            .sum::<NutritionalValues>()
            .scaled(self.portions)
    }

    pub fn has_customizations(&self) -> bool {
        self.ingredients.iter().any(|ingredient| ingredient.is_customized) || self.portions != 1.0
    }

    /// Bakes amounts and portions into a plain dish at a single portion, the
    /// shape the shopping list and plan store consume.
    pub fn to_portionable(&self) -> PortionableDish {
        let ingredients = self
            .ingredients
            .iter()
            .map(|custom| Ingredient {
                amount: custom.custom_amount * self.portions,
                ..custom.ingredient.clone()
            })
            .collect();

        let dish = Dish {
            ingredients,
            nutritional_values: self.total_nutritional_values(),
            ..self.dish.clone()
        };
        PortionableDish::single(dish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DishId;

    fn rice_bowl() -> Dish {
        let rice = Ingredient {
            name: "Rice".to_string(),
            amount: 200.0,
            unit: "g".to_string(),
            per_100g: NutritionalValues::new(130.0, 2.7, 28.0, 0.3),
        };
        let chicken = Ingredient {
            name: "Chicken breast".to_string(),
            amount: 150.0,
            unit: "g".to_string(),
            per_100g: NutritionalValues::new(165.0, 31.0, 0.0, 3.6),
        };
        let totals = NutritionalValues::for_amount(&rice.per_100g, rice.amount)
            + NutritionalValues::for_amount(&chicken.per_100g, chicken.amount);
        Dish {
            id: DishId(1),
            name: "Rice bowl".to_string(),
            description: String::new(),
            preparation_steps: String::new(),
            has_photo: false,
            ingredients: vec![rice, chicken],
            nutritional_values: totals,
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_portion_scaling_is_linear() {
        let base = rice_bowl().nutritional_values;
        for p in [0.5, 1.0, 2.0, 3.5] {
            let portioned = PortionableDish::new(rice_bowl(), p);
            let values = portioned.adjusted_nutritional_values();
            assert_close(values.kcal, base.kcal * p);
            assert_close(values.protein_g, base.protein_g * p);
            assert_close(values.carbs_g, base.carbs_g * p);
            assert_close(values.fat_g, base.fat_g * p);

            let mut custom = CustomizableDish::new(rice_bowl());
            custom.set_portions(p);
            assert_close(custom.total_nutritional_values().kcal, base.kcal * p);
        }
    }

    #[test]
    fn test_portions_are_clamped() {
        assert_eq!(PortionableDish::new(rice_bowl(), 0.1).portions(), MIN_PORTIONS);
        assert_eq!(PortionableDish::new(rice_bowl(), 25.0).portions(), MAX_PORTIONS);
        assert_eq!(PortionableDish::new(rice_bowl(), f64::NAN).portions(), 1.0);
    }

    #[test]
    fn test_adjusted_ingredients() {
        let portioned = PortionableDish::new(rice_bowl(), 1.5);
        let adjusted = portioned.adjusted_ingredients();
        assert_eq!(adjusted.len(), 2);
        assert_eq!(adjusted[0].original_amount, 200.0);
        assert_eq!(adjusted[0].adjusted_amount, 300.0);
        assert_eq!(adjusted[1].adjusted_amount, 225.0);
        assert_eq!(adjusted[1].unit, "g");
    }

    #[test]
    fn test_scaled_dish() {
        let scaled = PortionableDish::new(rice_bowl(), 2.0).scaled_dish();
        assert_eq!(scaled.ingredients[0].amount, 400.0);
        assert_close(scaled.nutritional_values.kcal, rice_bowl().nutritional_values.kcal * 2.0);
        assert_eq!(scaled.id, DishId(1));
    }

    #[test]
    fn test_ingredient_customization_and_reset() {
        let mut custom = CustomizableDish::new(rice_bowl());
        assert!(!custom.has_customizations());

        custom.set_ingredient_amount(0, 100.0);
        assert!(custom.ingredients()[0].is_customized);
        assert!(custom.has_customizations());
        // 100g rice (130) + 150g chicken (247.5)
        assert_close(custom.total_nutritional_values().kcal, 377.5);

        custom.set_portions(2.0);
        assert_close(custom.total_nutritional_values().kcal, 755.0);

        custom.reset_ingredient(0);
        assert!(!custom.ingredients()[0].is_customized);
        assert_eq!(custom.ingredients()[0].custom_amount, 200.0);
        // Portion multiplier still set.
        assert!(custom.has_customizations());

        custom.set_ingredient_amount(1, 300.0);
        custom.reset_all();
        assert!(!custom.has_customizations());
        assert_eq!(custom.portions(), 1.0);
        assert_close(custom.total_nutritional_values().kcal, rice_bowl().nutritional_values.kcal);
    }

    #[test]
    fn test_setting_original_amount_is_not_a_customization() {
        let mut custom = CustomizableDish::new(rice_bowl());
        custom.set_ingredient_amount(0, 200.0);
        assert!(!custom.has_customizations());
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut custom = CustomizableDish::new(rice_bowl());
        custom.set_ingredient_amount(9, 1.0);
        custom.reset_ingredient(9);
        assert_eq!(custom, CustomizableDish::new(rice_bowl()));
    }

    #[test]
    fn test_to_portionable_bakes_customizations() {
        let mut custom = CustomizableDish::new(rice_bowl());
        custom.set_ingredient_amount(0, 100.0);
        custom.set_portions(2.0);

        let baked = custom.to_portionable();
        assert_eq!(baked.portions(), 1.0);
        assert_eq!(baked.dish.ingredients[0].amount, 200.0);
        assert_eq!(baked.dish.ingredients[1].amount, 300.0);
        assert_close(baked.adjusted_nutritional_values().kcal, 755.0);
    }
}
