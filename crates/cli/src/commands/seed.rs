//! Seed a workspace catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - description: Solar panel 550W
//!     sell_price: "1200.00"
//!     cost_price: "800.00"
//! services:
//!   - label: Installation
//!     price: "500.00"
//! ```
//!
//! ```bash
//! tidi-cli seed catalog --workspace acme --file catalog.yaml
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use tidi_core::{Money, WorkspaceRef};
use tidi_web::db::{CatalogRepository, WorkspaceRepository};

use super::connect;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<ProductEntry>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProductEntry {
    pub description: String,
    pub sell_price: Money,
    pub cost_price: Money,
}

#[derive(Debug, Deserialize)]
pub struct ServiceEntry {
    pub label: String,
    pub price: Money,
}

/// Problems found in a catalog file, one message per entry.
#[must_use]
pub fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, product) in catalog.products.iter().enumerate() {
        if product.description.trim().is_empty() {
            errors.push(format!("products[{i}]: description is empty"));
        }
        if product.sell_price < Money::ZERO || product.cost_price < Money::ZERO {
            errors.push(format!("products[{i}]: prices cannot be negative"));
        }
    }

    for (i, service) in catalog.services.iter().enumerate() {
        if service.label.trim().is_empty() {
            errors.push(format!("services[{i}]: label is empty"));
        }
        if service.price < Money::ZERO {
            errors.push(format!("services[{i}]: price cannot be negative"));
        }
    }

    errors
}

/// Insert every entry of `file_path` into the workspace's catalog.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, the workspace does
/// not exist, or database operations fail.
pub async fn catalog(workspace: &str, file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;

    let workspace = WorkspaceRepository::new(&pool)
        .find(&WorkspaceRef::parse(workspace))
        .await?
        .ok_or_else(|| format!("Workspace not found: {workspace}"))?;

    let repo = CatalogRepository::new(&pool);
    for product in &catalog.products {
        repo.create_product(
            workspace.id,
            product.description.trim(),
            product.sell_price,
            product.cost_price,
        )
        .await?;
    }
    for service in &catalog.services {
        repo.create_service(workspace.id, service.label.trim(), service.price)
            .await?;
    }

    info!("Seeding complete!");
    info!("  Workspace: {} ({})", workspace.name, workspace.id);
    info!("  Products inserted: {}", catalog.products.len());
    info!("  Services inserted: {}", catalog.services.len());

    Ok(())
}
