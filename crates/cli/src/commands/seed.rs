//! Seed reference data.
//!
//! Products are read from YAML:
//!
//! ```yaml
//! products:
//!   - name: Kettle
//!   - name: Discontinued lamp
//!     available: false
//! ```
//!
//! Seeding is idempotent: products are matched by name, and only their
//! availability is updated.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use supportdesk_web::db::{PgTicketStore, create_pool};

use super::database_url;

/// Top-level YAML document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeedFile {
    pub products: Vec<ProductSeed>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

/// Problems that make a seed file unusable. Empty means valid.
fn validate(file: &ProductSeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if file.products.is_empty() {
        errors.push("no products listed".to_owned());
    }

    for (index, product) in file.products.iter().enumerate() {
        let name = product.name.trim();
        if name.is_empty() {
            errors.push(format!("product #{} has an empty name", index + 1));
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("duplicate product name: {name:?}"));
        }
    }

    errors
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, the database URL is
/// unset, or a database operation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let file: ProductSeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Product file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let database_url = database_url()?;
    let pool = create_pool(&database_url).await?;
    info!("Connected to database");

    let store = PgTicketStore::new(pool);
    for seed in &file.products {
        let product = store
            .upsert_product(seed.name.trim(), seed.available)
            .await?;
        info!(id = %product.id, name = %product.name, available = product.available, "Seeded product");
    }

    info!(count = file.products.len(), "Product seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_available() {
        let file: ProductSeedFile = serde_yaml::from_str(
            "products:\n  - name: Kettle\n  - name: Lamp\n    available: false\n",
        )
        .unwrap();

        assert_eq!(file.products.len(), 2);
        assert!(file.products[0].available);
        assert!(!file.products[1].available);
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<ProductSeedFile, _> =
            serde_yaml::from_str("products:\n  - name: Kettle\n    price: 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_blank_and_duplicate_names() {
        let file: ProductSeedFile = serde_yaml::from_str(
            "products:\n  - name: Kettle\n  - name: '  '\n  - name: kettle\n",
        )
        .unwrap();

        let errors = validate(&file);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("#2"));
        assert!(errors[1].contains("duplicate"));
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        let file: ProductSeedFile = serde_yaml::from_str("products: []\n").unwrap();
        assert_eq!(validate(&file), vec!["no products listed".to_owned()]);
    }
}
