//! # Product Types
//!
//! Product records as stored in the `products` table.
//! Prices are integers; stock never drops below zero.

use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Database identifier
    pub id: i64,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Price in whole currency units (multiplied by 100 for the gateway)
    pub price: i64,

    /// Units available
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Amount charged through the gateway, in minor units.
    pub fn amount_in_cents(&self) -> PaymentResult<i64> {
        self.price
            .checked_mul(100)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| PaymentError::InvalidPrice {
                message: format!("price {} of product {} is not chargeable", self.price, self.id),
            })
    }

    /// Check if at least `quantity` units are in stock
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// A product to insert (seeding / admin)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub stock: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: i64, stock: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn validate(&self) -> PaymentResult<()> {
        ProductUpdate {
            name: Some(self.name.clone()),
            description: None,
            price: Some(self.price),
            stock: Some(self.stock),
        }
        .validate()
    }
}

/// Partial product update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductUpdate {
    /// Validate only the fields that are present
    pub fn validate(&self) -> PaymentResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(PaymentError::InvalidRequest(
                    "name must not be empty".to_string(),
                ));
            }
        }
        if let Some(price) = self.price {
            if price <= 0 {
                return Err(PaymentError::InvalidPrice {
                    message: format!("price must be positive, got {}", price),
                });
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(PaymentError::InvalidRequest(format!(
                    "stock must not be negative, got {}",
                    stock
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }

    /// Merge this update over an existing product
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Seed data for an empty store (loaded from `config/products.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSeed {
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

impl ProductSeed {
    /// Load seed data from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn validate(&self) -> PaymentResult<()> {
        self.products.iter().try_for_each(NewProduct::validate)
    }
}
