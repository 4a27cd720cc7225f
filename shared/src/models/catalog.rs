//! Product and certification catalog
//!
//! The catalog drives which products appear in the monthly balance and how
//! each one is aggregated. Deployments can override the default catalog
//! through configuration; the defaults below match the standard sawmill
//! setup (one raw material, one finished good, two by-products).

use serde::{Deserialize, Serialize};

/// How a product participates in the material balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Enters via receptions, leaves via consumption, carries stock
    RawMaterial,
    /// Enters via production, leaves via sales, carries stock
    FinishedGood,
    /// Sales-driven: production mirrors sales, no stock is carried
    ByProduct,
}

/// A product tracked by the balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Stable product code, e.g. "W1.1"
    pub code: String,
    /// Human-readable name used in reports
    pub display_name: String,
    pub category: ProductCategory,
}

/// The set of products and certification labels a deployment tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: Vec<Product>,
    pub certifications: Vec<String>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self {
            products: vec![
                Product {
                    code: "W1.1".to_string(),
                    display_name: "Sawlogs".to_string(),
                    category: ProductCategory::RawMaterial,
                },
                Product {
                    code: "W5.2".to_string(),
                    display_name: "Dimensioned lumber".to_string(),
                    category: ProductCategory::FinishedGood,
                },
                Product {
                    code: "W3.1".to_string(),
                    display_name: "Wood chips".to_string(),
                    category: ProductCategory::ByProduct,
                },
                Product {
                    code: "W3.2".to_string(),
                    display_name: "Sawdust".to_string(),
                    category: ProductCategory::ByProduct,
                },
            ],
            certifications: vec![
                "FSC 100%".to_string(),
                "FSC Mixto".to_string(),
                "FSC Controlled Wood".to_string(),
                "Material Controlado".to_string(),
            ],
        }
    }
}

impl ProductCatalog {
    /// Look up a product by its code
    pub fn product(&self, code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.code == code)
    }

    /// Category of a product code, if the code is known
    pub fn category_of(&self, code: &str) -> Option<ProductCategory> {
        self.product(code).map(|p| p.category)
    }

    /// All products in a given category, in catalog order
    pub fn products_in(&self, category: ProductCategory) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Whether a certification label is part of this catalog
    pub fn is_known_certification(&self, label: &str) -> bool {
        self.certifications.iter().any(|c| c == label)
    }
}
