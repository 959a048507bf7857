//! Static product catalog and the search/filter engine.
//!
//! The catalog is loaded once at startup from an external dataset and is
//! immutable for the lifetime of the session. Filtering is a pure function
//! over the product list and is cheap enough to run on every keystroke.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use botilleria_core::{Price, ProductId};

/// Category sentinel that disables category filtering.
pub const ALL_CATEGORIES: &str = "todos";

const DEFAULT_RATING: f32 = 4.5;

/// A purchasable product. Read-only; the session core never mutates the
/// catalog, only filters and reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Url,
    pub description: String,
    #[serde(default = "default_rating")]
    pub rating: f32,
    pub category: String,
}

const fn default_rating() -> f32 {
    DEFAULT_RATING
}

/// Errors loading the catalog dataset.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
}

/// The immutable, insertion-ordered product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from an ordered product list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two products share an id.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(product.id.clone()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// Parse a catalog from its JSON representation (an array of products).
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Filter the catalog by category and free-text query.
    ///
    /// Returns the matching subsequence in catalog order. `category` is
    /// either the [`ALL_CATEGORIES`] sentinel (pass-through) or an exact,
    /// case-sensitive match on `Product::category`. A non-empty `query`
    /// matches case-insensitively as a substring of name, description, or
    /// category; both predicates must hold. An empty query applies the
    /// category filter alone.
    #[must_use]
    pub fn filter(&self, category: &str, query: &str) -> Vec<&Product> {
        let needle = query.to_lowercase();

        self.products
            .iter()
            .filter(|product| {
                let matches_category =
                    category == ALL_CATEGORIES || product.category == category;

                if needle.is_empty() {
                    return matches_category;
                }

                let matches_query = product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
                    || product.category.to_lowercase().contains(&needle);

                matches_category && matches_query
            })
            .collect()
    }
}
