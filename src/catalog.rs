use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::api_connection::{CatalogClient, CatalogError};
use crate::models::{Dish, DishId};

/// In-memory list of every dish the user can plan with.
#[derive(Debug, Clone, Default)]
pub struct DishCatalog {
    dishes: Vec<Dish>,
}

impl DishCatalog {
    pub fn from_dishes(dishes: Vec<Dish>) -> Self {
        Self { dishes }
    }

    /// Reads a JSON array of dishes in the backend's wire format.
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dish catalog file '{}'", path.display()))?;
        let dishes: Vec<Dish> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dish catalog file '{}'", path.display()))?;
        info!(count = dishes.len(), path = %path.display(), "dish catalog loaded from file");
        Ok(Self { dishes })
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn find(&self, id: DishId) -> Option<&Dish> {
        self.dishes.iter().find(|dish| dish.id == id)
    }

    /// Case-insensitive substring match on the dish name. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&Dish> {
        let needle = query.trim().to_lowercase();
        self.dishes
            .iter()
            .filter(|dish| dish.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Replaces the dishes with a fresh fetch. On failure the current dishes
    /// stay as they are and the error goes back to the caller.
    pub async fn refresh(&mut self, client: &CatalogClient) -> Result<usize, CatalogError> {
        match client.fetch_all_dishes().await {
            Ok(dishes) => {
                self.dishes = dishes;
                Ok(self.dishes.len())
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), kept = self.dishes.len(), "catalog refresh failed, keeping current dishes");
                Err(err)
            }
        }
    }
}
