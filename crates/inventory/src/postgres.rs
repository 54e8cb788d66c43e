//! PostgreSQL-backed inventory store.
//!
//! Both mutating operations run inside a single transaction with the product
//! rows locked (`FOR UPDATE`), so the check-then-decrement of `reserve` and
//! the reversal of `release` are atomic under concurrent consumers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    InventoryError, Product, Reservation, ReservationLine,
    store::{InventoryStore, ReserveOutcome},
};

#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_product(row: PgRow) -> Result<Product, InventoryError> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            available_quantity: row.try_get::<i32, _>("available_quantity")? as u32,
            reserved_quantity: row.try_get::<i32, _>("reserved_quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn upsert_product(&self, product: Product) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, available_quantity, reserved_quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                sku = EXCLUDED.sku,
                available_quantity = EXCLUDED.available_quantity,
                reserved_quantity = EXCLUDED.reserved_quantity,
                updated_at = now()
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.available_quantity as i32)
        .bind(product.reserved_quantity as i32)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<Product>, InventoryError> {
        let row = sqlx::query(
            "SELECT id, name, sku, available_quantity, reserved_quantity, created_at, updated_at
             FROM products WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn reserve(
        &self,
        order_id: OrderId,
        lines: &[ReservationLine],
    ) -> Result<ReserveOutcome, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM reservations WHERE order_id = $1 AND is_active",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(id) = existing {
            warn!(%order_id, reservation_id = %id, "order already has an active reservation");
            return Ok(ReserveOutcome::Reserved {
                reservation_id: ReservationId::from_uuid(id),
            });
        }

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT id, available_quantity FROM products WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let available: std::collections::HashMap<Uuid, i64> = rows
            .iter()
            .map(|row| {
                Ok((
                    row.try_get::<Uuid, _>("id")?,
                    i64::from(row.try_get::<i32, _>("available_quantity")?),
                ))
            })
            .collect::<Result<_, sqlx::Error>>()?;

        let unavailable: Vec<ProductId> = lines
            .iter()
            .filter(|line| {
                available
                    .get(&line.product_id.as_uuid())
                    .is_none_or(|&a| a < i64::from(line.quantity))
            })
            .map(|line| line.product_id)
            .collect();

        if !unavailable.is_empty() {
            tx.rollback().await?;
            metrics::counter!("inventory_reservation_failures_total").increment(1);
            warn!(%order_id, ?unavailable, "reservation rejected");
            return Ok(ReserveOutcome::Rejected { unavailable });
        }

        let reservation_id = ReservationId::new();
        sqlx::query(
            "INSERT INTO reservations (id, order_id, is_active, reserved_at) VALUES ($1, $2, TRUE, $3)",
        )
        .bind(reservation_id.as_uuid())
        .bind(order_id.as_uuid())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO reservation_items (id, reservation_id, product_id, quantity)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(reservation_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products
                 SET available_quantity = available_quantity - $2,
                     reserved_quantity = reserved_quantity + $2,
                     updated_at = now()
                 WHERE id = $1",
            )
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        metrics::counter!("inventory_reservations_total").increment(1);
        info!(%order_id, %reservation_id, "inventory reserved");
        Ok(ReserveOutcome::Reserved { reservation_id })
    }

    async fn release(&self, order_id: OrderId) -> Result<Option<ReservationId>, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let reservation: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM reservations WHERE order_id = $1 AND is_active FOR UPDATE",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reservation_id) = reservation else {
            warn!(%order_id, "no active reservation to release");
            return Ok(None);
        };

        let items = sqlx::query(
            "SELECT product_id, quantity FROM reservation_items WHERE reservation_id = $1",
        )
        .bind(reservation_id)
        .fetch_all(&mut *tx)
        .await?;

        for item in items {
            let product_id: Uuid = item.try_get("product_id")?;
            let quantity: i32 = item.try_get("quantity")?;
            sqlx::query(
                "UPDATE products
                 SET available_quantity = available_quantity + $2,
                     reserved_quantity = reserved_quantity - $2,
                     updated_at = now()
                 WHERE id = $1",
            )
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE reservations SET is_active = FALSE, released_at = $2 WHERE id = $1",
        )
        .bind(reservation_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let reservation_id = ReservationId::from_uuid(reservation_id);
        metrics::counter!("inventory_releases_total").increment(1);
        info!(%order_id, %reservation_id, "inventory released");
        Ok(Some(reservation_id))
    }

    async fn active_reservation(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Reservation>, InventoryError> {
        let row = sqlx::query(
            "SELECT id, order_id, is_active, reserved_at, released_at
             FROM reservations WHERE order_id = $1 AND is_active",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id")?;
        let items = sqlx::query(
            "SELECT product_id, quantity FROM reservation_items WHERE reservation_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|item| {
            Ok(ReservationLine {
                product_id: ProductId::from_uuid(item.try_get::<Uuid, _>("product_id")?),
                quantity: item.try_get::<i32, _>("quantity")? as u32,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(Reservation {
            id: ReservationId::from_uuid(id),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            items,
            is_active: row.try_get("is_active")?,
            reserved_at: row.try_get::<DateTime<Utc>, _>("reserved_at")?,
            released_at: row.try_get("released_at")?,
        }))
    }
}
