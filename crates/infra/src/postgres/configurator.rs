use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{Span, instrument};
use uuid::Uuid;

use carkeeper_configurator::{Color, Configuration, ConfigurationDetails, ConfigurationStatus, EquipmentOption};
use carkeeper_core::{ColorId, ConfigurationId, Money, OptionId, TrimId, UserId};

use super::{PostgresStore, corrupt, map_sqlx_error, uuids};
use crate::store::ConfiguratorStore;
use crate::StoreResult;

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    color_id: Uuid,
    name: String,
    hex_code: Option<String>,
    price_delta: i64,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<ColorRow> for Color {
    fn from(row: ColorRow) -> Self {
        Color {
            color_id: ColorId::from_uuid(row.color_id),
            name: row.name,
            hex_code: row.hex_code,
            price_delta: Money::new(row.price_delta),
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OptionRow {
    option_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<OptionRow> for EquipmentOption {
    fn from(row: OptionRow) -> Self {
        EquipmentOption {
            option_id: OptionId::from_uuid(row.option_id),
            name: row.name,
            description: row.description,
            price: Money::new(row.price),
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConfigurationOptionRow {
    configuration_id: Uuid,
    #[sqlx(flatten)]
    option: OptionRow,
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ConfigurationDetailsRow {
    configuration_id: Uuid,
    user_id: Uuid,
    trim_id: Uuid,
    color_id: Uuid,
    status: String,
    total_price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    trim_name: String,
    color_name: String,
    color_hex: Option<String>,
}

impl ConfigurationDetailsRow {
    fn into_details(self, options: Vec<EquipmentOption>) -> StoreResult<ConfigurationDetails> {
        let status = self
            .status
            .parse::<ConfigurationStatus>()
            .map_err(|e| corrupt("configurations.status", e))?;
        Ok(ConfigurationDetails {
            configuration: Configuration {
                configuration_id: ConfigurationId::from_uuid(self.configuration_id),
                user_id: UserId::from_uuid(self.user_id),
                trim_id: TrimId::from_uuid(self.trim_id),
                color_id: ColorId::from_uuid(self.color_id),
                status,
                total_price: Money::new(self.total_price),
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            trim_name: self.trim_name,
            color_name: self.color_name,
            color_hex: self.color_hex,
            options,
        })
    }
}

const CONFIGURATION_DETAILS_SELECT: &str = r#"
    SELECT
        c.configuration_id, c.user_id, c.trim_id, c.color_id, c.status, c.total_price,
        c.created_at, c.updated_at,
        t.name AS trim_name, col.name AS color_name, col.hex_code AS color_hex
    FROM configurations c
    JOIN trims t ON c.trim_id = t.trim_id
    JOIN colors col ON c.color_id = col.color_id
"#;

impl PostgresStore {
    /// Attach option rows to configuration rows with a single query.
    async fn with_options(&self, rows: Vec<ConfigurationDetailsRow>) -> StoreResult<Vec<ConfigurationDetails>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.configuration_id).collect();

        let option_rows: Vec<ConfigurationOptionRow> = sqlx::query_as(
            r#"
            SELECT co.configuration_id, o.option_id, o.name, o.description, o.price,
                   o.is_available, o.created_at
            FROM configuration_options co
            JOIN options o ON o.option_id = co.option_id
            WHERE co.configuration_id = ANY($1)
            ORDER BY o.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("configuration_options", e))?;

        let mut by_configuration: HashMap<Uuid, Vec<EquipmentOption>> = HashMap::new();
        for row in option_rows {
            by_configuration
                .entry(row.configuration_id)
                .or_default()
                .push(row.option.into());
        }

        rows.into_iter()
            .map(|row| {
                let options = by_configuration.remove(&row.configuration_id).unwrap_or_default();
                row.into_details(options)
            })
            .collect()
    }

    pub(super) async fn configuration_details(&self, ids: &[Uuid]) -> StoreResult<Vec<ConfigurationDetails>> {
        let rows: Vec<ConfigurationDetailsRow> = sqlx::query_as(&format!(
            "{CONFIGURATION_DETAILS_SELECT} WHERE c.configuration_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("configuration_details", e))?;
        self.with_options(rows).await
    }
}

#[async_trait]
impl ConfiguratorStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn colors(&self, is_available: Option<bool>) -> StoreResult<Vec<Color>> {
        let rows: Vec<ColorRow> = sqlx::query_as(
            r#"
            SELECT color_id, name, hex_code, price_delta, is_available, created_at
            FROM colors
            WHERE ($1::boolean IS NULL OR is_available = $1)
            ORDER BY name
            "#,
        )
        .bind(is_available)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("colors", e))?;
        Ok(rows.into_iter().map(Color::from).collect())
    }

    #[instrument(skip(self), fields(color_id = %id), err)]
    async fn color(&self, id: ColorId) -> StoreResult<Option<Color>> {
        let row: Option<ColorRow> = sqlx::query_as(
            "SELECT color_id, name, hex_code, price_delta, is_available, created_at FROM colors WHERE color_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("color", e))?;
        Ok(row.map(Color::from))
    }

    #[instrument(skip(self), fields(trim_id = %trim_id), err)]
    async fn options_for_trim(&self, trim_id: TrimId) -> StoreResult<Vec<EquipmentOption>> {
        let rows: Vec<OptionRow> = sqlx::query_as(
            r#"
            SELECT o.option_id, o.name, o.description, o.price, o.is_available, o.created_at
            FROM options o
            JOIN trim_options tro ON o.option_id = tro.option_id
            WHERE tro.trim_id = $1 AND o.is_available = TRUE
            ORDER BY o.name
            "#,
        )
        .bind(trim_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("options_for_trim", e))?;
        Ok(rows.into_iter().map(EquipmentOption::from).collect())
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<EquipmentOption>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<OptionRow> = sqlx::query_as(
            r#"
            SELECT option_id, name, description, price, is_available, created_at
            FROM options
            WHERE option_id = ANY($1)
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("options_by_ids", e))?;
        Ok(rows.into_iter().map(EquipmentOption::from).collect())
    }

    #[instrument(
        skip(self, configuration, option_ids),
        fields(configuration_id = %configuration.configuration_id, option_count = option_ids.len()),
        err
    )]
    async fn insert_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO configurations
                (configuration_id, user_id, trim_id, color_id, status, total_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(configuration.configuration_id.as_uuid())
        .bind(configuration.user_id.as_uuid())
        .bind(configuration.trim_id.as_uuid())
        .bind(configuration.color_id.as_uuid())
        .bind(configuration.status.as_str())
        .bind(configuration.total_price.minor_units())
        .bind(configuration.created_at)
        .bind(configuration.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_configuration", e))?;

        if !option_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO configuration_options (configuration_id, option_id)
                SELECT $1, unnest($2::uuid[])
                "#,
            )
            .bind(configuration.configuration_id.as_uuid())
            .bind(uuids(option_ids))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_configuration_options", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(configuration_id = %id), err)]
    async fn configuration(&self, id: ConfigurationId) -> StoreResult<Option<ConfigurationDetails>> {
        Ok(self.configuration_details(&[*id.as_uuid()]).await?.into_iter().next())
    }

    #[instrument(skip(self), fields(user_id = %user_id, configuration_count), err)]
    async fn configurations_for_user(&self, user_id: UserId) -> StoreResult<Vec<ConfigurationDetails>> {
        let rows: Vec<ConfigurationDetailsRow> = sqlx::query_as(&format!(
            "{CONFIGURATION_DETAILS_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at DESC, c.configuration_id DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("configurations_for_user", e))?;

        Span::current().record("configuration_count", rows.len());
        self.with_options(rows).await
    }

    #[instrument(
        skip(self, configuration, option_ids),
        fields(configuration_id = %configuration.configuration_id),
        err
    )]
    async fn revise_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // The row lock taken here serializes with concurrent status updates.
        let updated = sqlx::query(
            r#"
            UPDATE configurations
            SET trim_id = $1, color_id = $2, total_price = $3, updated_at = $4
            WHERE configuration_id = $5 AND status = 'draft'
            "#,
        )
        .bind(configuration.trim_id.as_uuid())
        .bind(configuration.color_id.as_uuid())
        .bind(configuration.total_price.minor_units())
        .bind(configuration.updated_at)
        .bind(configuration.configuration_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("revise_configuration", e))?
        .rows_affected();

        if updated == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM configuration_options WHERE configuration_id = $1")
            .bind(configuration.configuration_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_configuration_options", e))?;

        if !option_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO configuration_options (configuration_id, option_id)
                SELECT $1, unnest($2::uuid[])
                "#,
            )
            .bind(configuration.configuration_id.as_uuid())
            .bind(uuids(option_ids))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_configuration_options", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }

    #[instrument(skip(self), fields(configuration_id = %id, status = %status), err)]
    async fn set_configuration_status(
        &self,
        id: ConfigurationId,
        status: ConfigurationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE configurations SET status = $1, updated_at = $2 WHERE configuration_id = $3",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_configuration_status", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(configuration_id = %id), err)]
    async fn delete_draft_configuration(&self, id: ConfigurationId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM configurations WHERE configuration_id = $1 AND status = 'draft'")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_draft_configuration", e))?;
        Ok(result.rows_affected() > 0)
    }
}
