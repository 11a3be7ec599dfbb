use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{Span, instrument};
use uuid::Uuid;

use carkeeper_core::{ConfigurationId, Money, OrderId, UserId};
use carkeeper_orders::{Order, OrderDetails, OrderStatus};

use super::{PostgresStore, corrupt, map_sqlx_error};
use crate::StoreResult;
use crate::store::OrderStore;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: Uuid,
    user_id: Uuid,
    configuration_id: Uuid,
    manager_id: Option<Uuid>,
    status: String,
    final_price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    manager_name: Option<String>,
}

const ORDER_SELECT: &str = r#"
    SELECT
        o.order_id, o.user_id, o.configuration_id, o.manager_id, o.status, o.final_price,
        o.created_at, o.updated_at,
        m.first_name || ' ' || m.last_name AS manager_name
    FROM orders o
    LEFT JOIN users m ON o.manager_id = m.user_id
"#;

impl PostgresStore {
    /// Join order rows with their configuration details. Orders whose
    /// configuration cannot be loaded are skipped, matching an inner join.
    async fn order_details(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<OrderDetails>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.configuration_id).collect();
        let configurations: HashMap<Uuid, _> = self
            .configuration_details(&ids)
            .await?
            .into_iter()
            .map(|c| (*c.configuration.configuration_id.as_uuid(), c))
            .collect();

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(configuration) = configurations.get(&row.configuration_id).cloned() else {
                continue;
            };
            let status = row
                .status
                .parse::<OrderStatus>()
                .map_err(|e| corrupt("orders.status", e))?;
            details.push(OrderDetails {
                order: Order {
                    order_id: OrderId::from_uuid(row.order_id),
                    user_id: UserId::from_uuid(row.user_id),
                    configuration_id: ConfigurationId::from_uuid(row.configuration_id),
                    manager_id: row.manager_id.map(UserId::from_uuid),
                    status,
                    final_price: Money::new(row.final_price),
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                configuration,
                manager_name: row.manager_name,
            });
        }
        Ok(details)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(
        skip(self, order),
        fields(order_id = %order.order_id, configuration_id = %order.configuration_id),
        err
    )]
    async fn place_order(&self, order: &Order) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let moved = sqlx::query(
            r#"
            UPDATE configurations
            SET status = 'ordered', updated_at = $2
            WHERE configuration_id = $1
              AND status IN ('draft', 'confirmed')
              AND total_price = $3
            "#,
        )
        .bind(order.configuration_id.as_uuid())
        .bind(order.created_at)
        .bind(order.final_price.minor_units())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("mark_configuration_ordered", e))?
        .rows_affected();

        if moved == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO orders
                (order_id, user_id, configuration_id, manager_id, status, final_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.configuration_id.as_uuid())
        .bind(order.manager_id.map(Uuid::from))
        .bind(order.status.as_str())
        .bind(order.final_price.minor_units())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetails>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{ORDER_SELECT} WHERE o.order_id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order", e))?;

        match row {
            Some(row) => Ok(self.order_details(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id, order_count), err)]
    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetails>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.order_id DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_user", e))?;

        Span::current().record("order_count", rows.len());
        self.order_details(rows).await
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status), err)]
    async fn set_order_status(&self, id: OrderId, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE order_id = $3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_order_status", e))?;
        Ok(result.rows_affected() > 0)
    }
}
