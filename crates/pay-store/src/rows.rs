//! Row types as read from SQLite, converted into `pay-core` records.

use chrono::{DateTime, Utc};
use pay_core::{Customer, Delivery, Product, Transaction};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    id: i64,
    product_id: i64,
    transaction_id: Option<String>,
    reference: Option<String>,
    status: String,
    amount: i64,
    customer_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            transaction_id: row.transaction_id,
            reference: row.reference,
            status: row.status,
            amount: row.amount,
            customer_id: row.customer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CustomerRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct DeliveryRow {
    id: i64,
    transaction_id: i64,
    address: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeliveryRow> for Delivery {
    fn from(row: DeliveryRow) -> Self {
        Self {
            id: row.id,
            transaction_id: row.transaction_id,
            address: row.address,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
