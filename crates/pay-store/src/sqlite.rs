//! SQLite implementation of the `pay-core` storage ports.

use crate::rows::{CustomerRow, DeliveryRow, ProductRow, TransactionRow};
use async_trait::async_trait;
use chrono::Utc;
use pay_core::{
    Customer, CustomerStore, Delivery, DeliveryStore, NewCustomer, NewDelivery, NewProduct,
    NewTransaction, PaymentError, PaymentResult, Product, ProductStore, ProductUpdate,
    Transaction, TransactionFilter, TransactionStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, product_id, transaction_id, reference, status, amount, customer_id, created_at, updated_at";
const CUSTOMER_COLUMNS: &str = "id, name, email, phone, created_at, updated_at";
const DELIVERY_COLUMNS: &str = "id, transaction_id, address, status, created_at, updated_at";

/// Map sqlx errors onto the storefront taxonomy
pub(crate) fn storage_error(err: sqlx::Error) -> PaymentError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return PaymentError::Conflict(format!("duplicate value: {}", db.message()));
        }
        if db.is_foreign_key_violation() {
            return PaymentError::Conflict(format!("referenced row constraint: {}", db.message()));
        }
        if db.is_check_violation() {
            return PaymentError::InvalidRequest(format!("constraint failed: {}", db.message()));
        }
    }
    PaymentError::Storage(err.to_string())
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url`
    pub async fn connect(database_url: &str) -> PaymentResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(storage_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(storage_error)?;

        info!("Connected to {}", database_url);
        Ok(Self { pool })
    }

    /// A private in-memory database with migrations applied
    pub async fn in_memory() -> PaymentResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(storage_error)?
            .foreign_keys(true);

        // One connection that never expires, otherwise the database is lost
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(storage_error)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> PaymentResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentError::Storage(format!("migration failed: {}", e)))?;
        debug!("Migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn product_exists(&self, id: i64) -> PaymentResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl ProductStore for SqliteStore {
    async fn list_products(&self) -> PaymentResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: i64) -> PaymentResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Product::from))
    }

    async fn insert_product(&self, product: &NewProduct) -> PaymentResult<Product> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, description, price, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn update_product(&self, id: i64, update: &ProductUpdate) -> PaymentResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                price = COALESCE(?, price),
                stock = COALESCE(?, stock),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(update.stock)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn reduce_stock(&self, id: i64, quantity: i64) -> PaymentResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.product_exists(id).await? {
            Err(PaymentError::InsufficientStock {
                product_id: id,
                requested: quantity,
            })
        } else {
            Ok(false)
        }
    }

    async fn delete_product(&self, id: i64) -> PaymentResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn insert_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> PaymentResult<Transaction> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (
                product_id, transaction_id, reference, status, amount, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.product_id)
        .bind(&transaction.transaction_id)
        .bind(&transaction.reference)
        .bind(&transaction.status)
        .bind(transaction.amount)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn find_transaction(&self, transaction_id: &str) -> PaymentResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE transaction_id = ? ORDER BY id LIMIT 1",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Transaction::from))
    }

    async fn update_transaction_status(
        &self,
        transaction_id: &str,
        status: &str,
    ) -> PaymentResult<u64> {
        let result = sqlx::query(
            "UPDATE transactions SET status = ?, updated_at = ? WHERE transaction_id = ?",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> PaymentResult<Vec<Transaction>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE 1 = 1",
            TRANSACTION_COLUMNS
        ));

        if let Some(status) = &filter.status {
            query.push(" AND status = ").push_bind(status.clone());
        }
        if let Some((start, end)) = filter.created_between {
            query
                .push(" AND julianday(created_at) BETWEEN julianday(")
                .push_bind(start)
                .push(") AND julianday(")
                .push_bind(end)
                .push(")");
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}

#[async_trait]
impl CustomerStore for SqliteStore {
    async fn insert_customer(&self, customer: &NewCustomer) -> PaymentResult<Customer> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (name, email, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn get_customer(&self, id: i64) -> PaymentResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = ?",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Customer::from))
    }
}

#[async_trait]
impl DeliveryStore for SqliteStore {
    async fn insert_delivery(&self, delivery: &NewDelivery) -> PaymentResult<Delivery> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            r#"
            INSERT INTO deliveries (transaction_id, address, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            DELIVERY_COLUMNS
        ))
        .bind(delivery.transaction_id)
        .bind(&delivery.address)
        .bind(&delivery.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn find_delivery_by_transaction(
        &self,
        transaction_id: i64,
    ) -> PaymentResult<Option<Delivery>> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {} FROM deliveries WHERE transaction_id = ? ORDER BY id LIMIT 1",
            DELIVERY_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Delivery::from))
    }
}
