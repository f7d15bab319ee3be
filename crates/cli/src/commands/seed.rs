//! Seed the catalog from a YAML file.
//!
//! The file lists categories and products; categories are upserted by name so
//! re-running the seed is safe. See `catalog.example.yaml` for the format
//! (prices are quoted strings to keep decimal parsing exact).

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use pitchside_core::{Money, ProductStatus};

use pitchside_api::db::{CategoryRepository, ProductRepository};
use pitchside_api::models::NewProduct;

/// Top-level seed file structure.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<SeedCategory>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    name: String,
    #[serde(default)]
    image: String,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    price: Decimal,
    #[serde(default)]
    original_price: Option<Decimal>,
    stock: i32,
    #[serde(default)]
    status: Option<ProductStatus>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    images: Vec<String>,
    category: String,
}

/// Seed categories and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let pool = super::connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    for category in &catalog.categories {
        categories.upsert(&category.name, &category.image).await?;
    }

    for product in catalog.products {
        let created = products
            .create(&NewProduct {
                name: product.name,
                price: Money::new(product.price),
                original_price: product.original_price.map(Money::new),
                stock: product.stock,
                status: product.status.unwrap_or_default(),
                image: product.image,
                images: product.images,
                category: product.category,
            })
            .await?;
        info!(id = %created.id, name = %created.name, stock = created.stock, "Seeded product");
    }

    info!("Catalog seed complete!");
    Ok(())
}
