use reqwest::{Client, StatusCode};
use std::error::Error;
use std::fmt;
use tracing::{debug, info};

use super::endpoints::{join_url, ALL_DISHES_PATH};
use crate::models::Dish;

#[derive(Debug)]
pub enum CatalogError {
    InvalidBaseUrl(String),
    NetworkError(reqwest::Error),
    SerializationError(serde_json::Error),
    ApiError {
        status: StatusCode,
        error_body: String,
    },
}

impl CatalogError {
    /// Worth retrying later: the backend was unreachable or failed on its side.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::NetworkError(_) => true,
            CatalogError::ApiError { status, .. } => status.is_server_error(),
            CatalogError::InvalidBaseUrl(_) | CatalogError::SerializationError(_) => false,
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::InvalidBaseUrl(url) => write!(f, "Invalid API base URL: {}", url),
            CatalogError::NetworkError(err) => write!(f, "Network error: {}", err),
            CatalogError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            CatalogError::ApiError { status, error_body } => {
                write!(f, "API error {}: {}", status, error_body)
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::NetworkError(err) => Some(err),
            CatalogError::SerializationError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::NetworkError(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::SerializationError(err)
    }
}

/// Read-only client for the dish backend.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    client: Client,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CatalogError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { base_url: trimmed.to_string(), client: Client::new() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/getalldishes`. Nutrition arrives already totalled per dish.
    pub async fn fetch_all_dishes(&self) -> Result<Vec<Dish>, CatalogError> {
        let url = join_url(&self.base_url, ALL_DISHES_PATH);
        debug!(url = %url, "fetching dish catalog");

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            // Decode separately so a bad payload is a serialization error, not a network one.
            let body = response.text().await?;
            let dishes: Vec<Dish> = serde_json::from_str(&body)?;
            info!(count = dishes.len(), "dish catalog fetched");
            Ok(dishes)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(CatalogError::ApiError { status, error_body })
        }
    }
}
