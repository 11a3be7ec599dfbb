use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{Span, instrument};
use uuid::Uuid;

use carkeeper_catalog::{Brand, CarModel, DriveType, EngineType, Generation, Transmission, Trim, TrimDetails, TrimFilter};
use carkeeper_core::{BrandId, DriveTypeId, EngineTypeId, GenerationId, ModelId, Money, TransmissionId, TrimId};

use super::{PostgresStore, map_sqlx_error, uuids};
use crate::StoreResult;
use crate::store::CatalogStore;

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    brand_id: Uuid,
    name: String,
    country: String,
    created_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Brand {
            brand_id: BrandId::from_uuid(row.brand_id),
            name: row.name,
            country: row.country,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ModelRow {
    model_id: Uuid,
    brand_id: Uuid,
    name: String,
    segment: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ModelRow> for CarModel {
    fn from(row: ModelRow) -> Self {
        CarModel {
            model_id: ModelId::from_uuid(row.model_id),
            brand_id: BrandId::from_uuid(row.brand_id),
            name: row.name,
            segment: row.segment,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GenerationRow {
    generation_id: Uuid,
    model_id: Uuid,
    name: String,
    year_from: i32,
    year_to: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<GenerationRow> for Generation {
    fn from(row: GenerationRow) -> Self {
        Generation {
            generation_id: GenerationId::from_uuid(row.generation_id),
            model_id: ModelId::from_uuid(row.model_id),
            name: row.name,
            year_from: row.year_from,
            year_to: row.year_to,
            created_at: row.created_at,
        }
    }
}

/// `id` / `name` / `created_at` dictionary row.
#[derive(Debug, sqlx::FromRow)]
struct DictionaryRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct TrimDetailsRow {
    trim_id: Uuid,
    generation_id: Uuid,
    name: String,
    base_price: i64,
    engine_type_id: Uuid,
    transmission_id: Uuid,
    drive_type_id: Uuid,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    brand_id: Uuid,
    brand_name: String,
    model_id: Uuid,
    model_name: String,
    generation_name: String,
    engine_type: String,
    transmission: String,
    drive_type: String,
}

impl From<TrimDetailsRow> for TrimDetails {
    fn from(row: TrimDetailsRow) -> Self {
        TrimDetails {
            trim: Trim {
                trim_id: TrimId::from_uuid(row.trim_id),
                generation_id: GenerationId::from_uuid(row.generation_id),
                name: row.name,
                base_price: Money::new(row.base_price),
                engine_type_id: EngineTypeId::from_uuid(row.engine_type_id),
                transmission_id: TransmissionId::from_uuid(row.transmission_id),
                drive_type_id: DriveTypeId::from_uuid(row.drive_type_id),
                is_available: row.is_available,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            brand_id: BrandId::from_uuid(row.brand_id),
            brand_name: row.brand_name,
            model_id: ModelId::from_uuid(row.model_id),
            model_name: row.model_name,
            generation_name: row.generation_name,
            engine_type: row.engine_type,
            transmission: row.transmission,
            drive_type: row.drive_type,
        }
    }
}

const TRIM_DETAILS_SELECT: &str = r#"
    SELECT
        t.trim_id, t.generation_id, t.name, t.base_price,
        t.engine_type_id, t.transmission_id, t.drive_type_id,
        t.is_available, t.created_at, t.updated_at,
        b.brand_id, b.name AS brand_name,
        m.model_id, m.name AS model_name,
        g.name AS generation_name,
        et.name AS engine_type,
        tr.name AS transmission,
        dt.name AS drive_type
    FROM trims t
    JOIN generations g ON t.generation_id = g.generation_id
    JOIN models m ON g.model_id = m.model_id
    JOIN brands b ON m.brand_id = b.brand_id
    JOIN engine_types et ON t.engine_type_id = et.engine_type_id
    JOIN transmissions tr ON t.transmission_id = tr.transmission_id
    JOIN drive_types dt ON t.drive_type_id = dt.drive_type_id
"#;

impl PostgresStore {
    async fn dictionary(&self, table: &'static str, id_column: &'static str) -> StoreResult<Vec<DictionaryRow>> {
        sqlx::query_as(&format!(
            "SELECT {id_column} AS id, name, created_at FROM {table} ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(table, e))
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        let rows: Vec<BrandRow> =
            sqlx::query_as("SELECT brand_id, name, country, created_at FROM brands ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("brands", e))?;
        Ok(rows.into_iter().map(Brand::from).collect())
    }

    #[instrument(skip(self), fields(brand_id = %brand_id), err)]
    async fn models(&self, brand_id: BrandId) -> StoreResult<Vec<CarModel>> {
        let rows: Vec<ModelRow> = sqlx::query_as(
            r#"
            SELECT model_id, brand_id, name, segment, description, created_at
            FROM models
            WHERE brand_id = $1
            ORDER BY name
            "#,
        )
        .bind(brand_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("models", e))?;
        Ok(rows.into_iter().map(CarModel::from).collect())
    }

    #[instrument(skip(self), fields(model_id = %model_id), err)]
    async fn generations(&self, model_id: ModelId) -> StoreResult<Vec<Generation>> {
        let rows: Vec<GenerationRow> = sqlx::query_as(
            r#"
            SELECT generation_id, model_id, name, year_from, year_to, created_at
            FROM generations
            WHERE model_id = $1
            ORDER BY year_from DESC
            "#,
        )
        .bind(model_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("generations", e))?;
        Ok(rows.into_iter().map(Generation::from).collect())
    }

    #[instrument(skip(self, filter), fields(trim_count), err)]
    async fn trims(&self, filter: &TrimFilter) -> StoreResult<Vec<TrimDetails>> {
        // Empty id arrays disable the corresponding predicate.
        let rows: Vec<TrimDetailsRow> = sqlx::query_as(&format!(
            r#"
            {TRIM_DETAILS_SELECT}
            WHERE (cardinality($1::uuid[]) = 0 OR b.brand_id = ANY($1))
              AND (cardinality($2::uuid[]) = 0 OR t.engine_type_id = ANY($2))
              AND (cardinality($3::uuid[]) = 0 OR t.transmission_id = ANY($3))
              AND (cardinality($4::uuid[]) = 0 OR t.drive_type_id = ANY($4))
              AND ($5::bigint IS NULL OR t.base_price >= $5)
              AND ($6::bigint IS NULL OR t.base_price <= $6)
              AND ($7::boolean IS NULL OR t.is_available = $7)
            ORDER BY t.created_at DESC, t.trim_id DESC
            "#
        ))
        .bind(uuids(&filter.brand_ids))
        .bind(uuids(&filter.engine_type_ids))
        .bind(uuids(&filter.transmission_ids))
        .bind(uuids(&filter.drive_type_ids))
        .bind(filter.min_price.map(Money::minor_units))
        .bind(filter.max_price.map(Money::minor_units))
        .bind(filter.is_available)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("trims", e))?;

        Span::current().record("trim_count", rows.len());
        Ok(rows.into_iter().map(TrimDetails::from).collect())
    }

    #[instrument(skip(self), fields(trim_id = %id), err)]
    async fn trim(&self, id: TrimId) -> StoreResult<Option<TrimDetails>> {
        let row: Option<TrimDetailsRow> =
            sqlx::query_as(&format!("{TRIM_DETAILS_SELECT} WHERE t.trim_id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("trim", e))?;
        Ok(row.map(TrimDetails::from))
    }

    #[instrument(skip(self), err)]
    async fn engine_types(&self) -> StoreResult<Vec<EngineType>> {
        let rows = self.dictionary("engine_types", "engine_type_id").await?;
        Ok(rows
            .into_iter()
            .map(|r| EngineType {
                engine_type_id: EngineTypeId::from_uuid(r.id),
                name: r.name,
                created_at: r.created_at,
            })
            .collect())
    }

    #[instrument(skip(self), err)]
    async fn transmissions(&self) -> StoreResult<Vec<Transmission>> {
        let rows = self.dictionary("transmissions", "transmission_id").await?;
        Ok(rows
            .into_iter()
            .map(|r| Transmission {
                transmission_id: TransmissionId::from_uuid(r.id),
                name: r.name,
                created_at: r.created_at,
            })
            .collect())
    }

    #[instrument(skip(self), err)]
    async fn drive_types(&self) -> StoreResult<Vec<DriveType>> {
        let rows = self.dictionary("drive_types", "drive_type_id").await?;
        Ok(rows
            .into_iter()
            .map(|r| DriveType {
                drive_type_id: DriveTypeId::from_uuid(r.id),
                name: r.name,
                created_at: r.created_at,
            })
            .collect())
    }
}
