use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku, Version};
use domain::{Batch, OrderLine, Product};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{ProductStorage, Result, StorageSession, StoreError};

/// PostgreSQL-backed product storage.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new PostgreSQL product storage.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStorage for PostgresStorage {
    type Session = PostgresSession;

    async fn open(&self) -> Result<PostgresSession> {
        Ok(PostgresSession {
            tx: self.pool.begin().await?,
            loaded: HashMap::new(),
        })
    }
}

/// Session over [`PostgresStorage`], backed by one database transaction.
///
/// Loading a product locks its row until the transaction ends, so two
/// sessions working on the same sku are serialized by the database.
pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
    loaded: HashMap<Sku, Version>,
}

fn decode_quantity(value: i64) -> std::result::Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl PostgresSession {
    async fn fetch(&mut self, sku: &Sku, for_update: bool) -> Result<Option<Product>> {
        let query = if for_update {
            "SELECT sku, version_number FROM products WHERE sku = $1 FOR UPDATE"
        } else {
            "SELECT sku, version_number FROM products WHERE sku = $1"
        };

        let Some(row) = sqlx::query(query)
            .bind(sku.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
        else {
            return Ok(None);
        };
        let version = Version::new(row.try_get("version_number")?);

        let batch_rows = sqlx::query(
            r#"
            SELECT id, reference, sku, purchased_quantity, eta
            FROM batches
            WHERE sku = $1
            ORDER BY id ASC
            "#,
        )
        .bind(sku.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        let allocation_rows = sqlx::query(
            r#"
            SELECT a.batch_id, a.orderid, a.sku, a.qty
            FROM allocations a
            JOIN batches b ON b.id = a.batch_id
            WHERE b.sku = $1
            "#,
        )
        .bind(sku.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        let mut lines: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in allocation_rows {
            let (batch_id, line) = Self::row_to_line(row)?;
            lines.entry(batch_id).or_default().push(line);
        }

        let batches = batch_rows
            .into_iter()
            .map(|row| -> std::result::Result<Batch, sqlx::Error> {
                let id: i64 = row.try_get("id")?;
                let eta: Option<NaiveDate> = row.try_get("eta")?;
                Ok(Batch::from_parts(
                    BatchRef::new(row.try_get::<String, _>("reference")?),
                    Sku::new(row.try_get::<String, _>("sku")?),
                    decode_quantity(row.try_get("purchased_quantity")?)?,
                    eta,
                    lines.remove(&id).unwrap_or_default(),
                ))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.loaded.insert(sku.clone(), version);
        Ok(Some(Product::from_parts(sku.clone(), batches, version)))
    }

    fn row_to_line(row: PgRow) -> std::result::Result<(i64, OrderLine), sqlx::Error> {
        let batch_id: i64 = row.try_get("batch_id")?;
        let qty = decode_quantity(row.try_get("qty")?)?;
        let line = OrderLine::new(
            OrderId::new(row.try_get::<String, _>("orderid")?),
            Sku::new(row.try_get::<String, _>("sku")?),
            qty,
        )
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok((batch_id, line))
    }

    async fn save_batches(&mut self, product: &Product) -> Result<()> {
        for batch in product.batches() {
            let batch_id: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO batches (reference, sku, purchased_quantity, eta)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (reference) DO UPDATE
                    SET purchased_quantity = EXCLUDED.purchased_quantity,
                        eta = EXCLUDED.eta
                    WHERE batches.sku = EXCLUDED.sku
                RETURNING id
                "#,
            )
            .bind(batch.reference().as_str())
            .bind(product.sku().as_str())
            .bind(i64::from(batch.purchased_quantity()))
            .bind(batch.eta())
            .fetch_optional(&mut *self.tx)
            .await?;

            let batch_id =
                batch_id.ok_or_else(|| StoreError::DuplicateBatch(batch.reference().clone()))?;

            sqlx::query("DELETE FROM allocations WHERE batch_id = $1")
                .bind(batch_id)
                .execute(&mut *self.tx)
                .await?;

            for line in batch.allocations() {
                sqlx::query(
                    r#"
                    INSERT INTO allocations (batch_id, orderid, sku, qty)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(batch_id)
                .bind(line.orderid().as_str())
                .bind(line.sku().as_str())
                .bind(i64::from(line.qty()))
                .execute(&mut *self.tx)
                .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StorageSession for PostgresSession {
    async fn load(&mut self, sku: &Sku) -> Result<Option<Product>> {
        self.fetch(sku, true).await
    }

    async fn sku_for_batch(&mut self, batchref: &BatchRef) -> Result<Option<Sku>> {
        let sku: Option<String> =
            sqlx::query_scalar("SELECT sku FROM batches WHERE reference = $1")
                .bind(batchref.as_str())
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(sku.map(Sku::new))
    }

    async fn load_all(&mut self) -> Result<Vec<Product>> {
        let skus: Vec<String> = sqlx::query_scalar("SELECT sku FROM products ORDER BY sku ASC")
            .fetch_all(&mut *self.tx)
            .await?;

        let mut products = Vec::with_capacity(skus.len());
        for sku in skus {
            if let Some(product) = self.fetch(&Sku::new(sku), false).await? {
                products.push(product);
            }
        }
        Ok(products)
    }

    #[tracing::instrument(skip(self, product), fields(sku = %product.sku()))]
    async fn save(&mut self, product: &Product) -> Result<()> {
        let sku = product.sku();
        let version = product.version_number();

        match self.loaded.get(sku).copied() {
            Some(expected) => {
                let result = sqlx::query(
                    "UPDATE products SET version_number = $1 WHERE sku = $2 AND version_number = $3",
                )
                .bind(version.as_i64())
                .bind(sku.as_str())
                .bind(expected.as_i64())
                .execute(&mut *self.tx)
                .await?;

                if result.rows_affected() == 0 {
                    let actual: Option<i64> = sqlx::query_scalar(
                        "SELECT version_number FROM products WHERE sku = $1",
                    )
                    .bind(sku.as_str())
                    .fetch_optional(&mut *self.tx)
                    .await?;

                    return Err(StoreError::ConcurrencyConflict {
                        sku: sku.clone(),
                        expected,
                        actual: Version::new(actual.unwrap_or_default()),
                    });
                }
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO products (sku, version_number)
                    VALUES ($1, $2)
                    ON CONFLICT (sku) DO NOTHING
                    "#,
                )
                .bind(sku.as_str())
                .bind(version.as_i64())
                .execute(&mut *self.tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::DuplicateProduct(sku.clone()));
                }
            }
        }

        self.save_batches(product).await?;
        self.loaded.insert(sku.clone(), version);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
