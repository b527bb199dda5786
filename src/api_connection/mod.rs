pub mod connection;
pub mod endpoints;

pub use connection::{CatalogClient, CatalogError};
pub use endpoints::photo_url;
