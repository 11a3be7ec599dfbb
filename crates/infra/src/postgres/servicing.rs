use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{Span, instrument};
use uuid::Uuid;

use carkeeper_core::{AppointmentId, BranchId, ColorId, Money, ServiceTypeId, TrimId, UserCarId, UserId};
use carkeeper_servicing::{
    AppointmentDetails, AppointmentStatus, Branch, ServiceAppointment, ServiceType, UserCar, UserCarDetails,
};

use super::{PostgresStore, corrupt, map_sqlx_error, uuids};
use crate::StoreResult;
use crate::store::ServicingStore;

#[derive(Debug, sqlx::FromRow)]
struct ServiceTypeRow {
    service_type_id: Uuid,
    name: String,
    category: String,
    description: Option<String>,
    price: i64,
    duration_minutes: Option<i32>,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<ServiceTypeRow> for ServiceType {
    fn from(row: ServiceTypeRow) -> Self {
        ServiceType {
            service_type_id: ServiceTypeId::from_uuid(row.service_type_id),
            name: row.name,
            category: row.category,
            description: row.description,
            price: Money::new(row.price),
            duration_minutes: row.duration_minutes,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentTypeRow {
    service_appointment_id: Uuid,
    #[sqlx(flatten)]
    service_type: ServiceTypeRow,
}

#[derive(Debug, sqlx::FromRow)]
struct BranchRow {
    branch_id: Uuid,
    name: String,
    address: String,
    phone: Option<String>,
    email: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            branch_id: BranchId::from_uuid(row.branch_id),
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserCarDetailsRow {
    user_car_id: Uuid,
    user_id: Uuid,
    trim_id: Uuid,
    color_id: Uuid,
    vin: String,
    year: i32,
    current_mileage: i32,
    purchase_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    trim_name: String,
    brand_name: String,
    model_name: String,
    color_name: String,
    color_hex: Option<String>,
}

impl From<UserCarDetailsRow> for UserCarDetails {
    fn from(row: UserCarDetailsRow) -> Self {
        UserCarDetails {
            car: UserCar {
                user_car_id: UserCarId::from_uuid(row.user_car_id),
                user_id: UserId::from_uuid(row.user_id),
                trim_id: TrimId::from_uuid(row.trim_id),
                color_id: ColorId::from_uuid(row.color_id),
                vin: row.vin.trim_end().to_string(),
                year: row.year,
                current_mileage: row.current_mileage,
                purchase_date: row.purchase_date,
                created_at: row.created_at,
            },
            trim_name: row.trim_name,
            brand_name: row.brand_name,
            model_name: row.model_name,
            color_name: row.color_name,
            color_hex: row.color_hex,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    service_appointment_id: Uuid,
    user_car_id: Uuid,
    branch_id: Uuid,
    manager_id: Option<Uuid>,
    appointment_date: DateTime<Utc>,
    status: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Uuid,
    user_car_vin: String,
    branch_name: String,
    branch_address: String,
    manager_name: Option<String>,
}

const SERVICE_TYPE_COLUMNS: &str =
    "service_type_id, name, category, description, price, duration_minutes, is_available, created_at";

const USER_CAR_SELECT: &str = r#"
    SELECT
        uc.user_car_id, uc.user_id, uc.trim_id, uc.color_id, uc.vin, uc.year,
        uc.current_mileage, uc.purchase_date, uc.created_at,
        t.name AS trim_name, b.name AS brand_name, m.name AS model_name,
        col.name AS color_name, col.hex_code AS color_hex
    FROM user_cars uc
    JOIN trims t ON uc.trim_id = t.trim_id
    JOIN generations g ON t.generation_id = g.generation_id
    JOIN models m ON g.model_id = m.model_id
    JOIN brands b ON m.brand_id = b.brand_id
    JOIN colors col ON uc.color_id = col.color_id
"#;

const APPOINTMENT_SELECT: &str = r#"
    SELECT
        sa.service_appointment_id, sa.user_car_id, sa.branch_id, sa.manager_id,
        sa.appointment_date, sa.status, sa.description, sa.created_at, sa.updated_at,
        uc.user_id AS owner_id, uc.vin AS user_car_vin,
        br.name AS branch_name, br.address AS branch_address,
        m.first_name || ' ' || m.last_name AS manager_name
    FROM service_appointments sa
    JOIN user_cars uc ON sa.user_car_id = uc.user_car_id
    JOIN branches br ON sa.branch_id = br.branch_id
    LEFT JOIN users m ON sa.manager_id = m.user_id
"#;

impl PostgresStore {
    async fn appointment_details(&self, rows: Vec<AppointmentRow>) -> StoreResult<Vec<AppointmentDetails>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.service_appointment_id).collect();

        let type_rows: Vec<AppointmentTypeRow> = sqlx::query_as(
            r#"
            SELECT sat.service_appointment_id, st.service_type_id, st.name, st.category,
                   st.description, st.price, st.duration_minutes, st.is_available, st.created_at
            FROM service_appointment_types sat
            JOIN service_types st ON st.service_type_id = sat.service_type_id
            WHERE sat.service_appointment_id = ANY($1)
            ORDER BY st.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("appointment_service_types", e))?;

        let mut by_appointment: HashMap<Uuid, Vec<ServiceType>> = HashMap::new();
        for row in type_rows {
            by_appointment
                .entry(row.service_appointment_id)
                .or_default()
                .push(row.service_type.into());
        }

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse::<AppointmentStatus>()
                    .map_err(|e| corrupt("service_appointments.status", e))?;
                Ok(AppointmentDetails {
                    service_types: by_appointment
                        .remove(&row.service_appointment_id)
                        .unwrap_or_default(),
                    appointment: ServiceAppointment {
                        service_appointment_id: AppointmentId::from_uuid(row.service_appointment_id),
                        user_car_id: UserCarId::from_uuid(row.user_car_id),
                        branch_id: BranchId::from_uuid(row.branch_id),
                        manager_id: row.manager_id.map(UserId::from_uuid),
                        appointment_date: row.appointment_date,
                        status,
                        description: row.description,
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                    },
                    owner_id: UserId::from_uuid(row.owner_id),
                    user_car_vin: row.user_car_vin.trim_end().to_string(),
                    branch_name: row.branch_name,
                    branch_address: row.branch_address,
                    manager_name: row.manager_name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ServicingStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn service_types(&self, category: Option<&str>, is_available: Option<bool>) -> StoreResult<Vec<ServiceType>> {
        let rows: Vec<ServiceTypeRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SERVICE_TYPE_COLUMNS}
            FROM service_types
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::boolean IS NULL OR is_available = $2)
            ORDER BY category, name
            "#
        ))
        .bind(category)
        .bind(is_available)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("service_types", e))?;
        Ok(rows.into_iter().map(ServiceType::from).collect())
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn service_types_by_ids(&self, ids: &[ServiceTypeId]) -> StoreResult<Vec<ServiceType>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<ServiceTypeRow> = sqlx::query_as(&format!(
            "SELECT {SERVICE_TYPE_COLUMNS} FROM service_types WHERE service_type_id = ANY($1)"
        ))
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("service_types_by_ids", e))?;
        Ok(rows.into_iter().map(ServiceType::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn branches(&self, is_active: Option<bool>) -> StoreResult<Vec<Branch>> {
        let rows: Vec<BranchRow> = sqlx::query_as(
            r#"
            SELECT branch_id, name, address, phone, email, is_active, created_at, updated_at
            FROM branches
            WHERE ($1::boolean IS NULL OR is_active = $1)
            ORDER BY name
            "#,
        )
        .bind(is_active)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("branches", e))?;
        Ok(rows.into_iter().map(Branch::from).collect())
    }

    #[instrument(skip(self), fields(branch_id = %id), err)]
    async fn branch(&self, id: BranchId) -> StoreResult<Option<Branch>> {
        let row: Option<BranchRow> = sqlx::query_as(
            r#"
            SELECT branch_id, name, address, phone, email, is_active, created_at, updated_at
            FROM branches
            WHERE branch_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("branch", e))?;
        Ok(row.map(Branch::from))
    }

    #[instrument(skip(self, car), fields(user_car_id = %car.user_car_id, user_id = %car.user_id), err)]
    async fn insert_user_car(&self, car: &UserCar) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_cars
                (user_car_id, user_id, trim_id, color_id, vin, year, current_mileage, purchase_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(car.user_car_id.as_uuid())
        .bind(car.user_id.as_uuid())
        .bind(car.trim_id.as_uuid())
        .bind(car.color_id.as_uuid())
        .bind(&car.vin)
        .bind(car.year)
        .bind(car.current_mileage)
        .bind(car.purchase_date)
        .bind(car.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user_car", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_car_id = %id), err)]
    async fn user_car(&self, id: UserCarId) -> StoreResult<Option<UserCarDetails>> {
        let row: Option<UserCarDetailsRow> =
            sqlx::query_as(&format!("{USER_CAR_SELECT} WHERE uc.user_car_id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("user_car", e))?;
        Ok(row.map(UserCarDetails::from))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn user_cars(&self, user_id: UserId) -> StoreResult<Vec<UserCarDetails>> {
        let rows: Vec<UserCarDetailsRow> = sqlx::query_as(&format!(
            "{USER_CAR_SELECT} WHERE uc.user_id = $1 ORDER BY uc.created_at DESC, uc.user_car_id DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_cars", e))?;
        Ok(rows.into_iter().map(UserCarDetails::from).collect())
    }

    #[instrument(
        skip(self, appointment, service_type_ids),
        fields(appointment_id = %appointment.service_appointment_id, type_count = service_type_ids.len()),
        err
    )]
    async fn insert_appointment(
        &self,
        appointment: &ServiceAppointment,
        service_type_ids: &[ServiceTypeId],
    ) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO service_appointments
                (service_appointment_id, user_car_id, branch_id, manager_id, appointment_date,
                 status, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(appointment.service_appointment_id.as_uuid())
        .bind(appointment.user_car_id.as_uuid())
        .bind(appointment.branch_id.as_uuid())
        .bind(appointment.manager_id.map(Uuid::from))
        .bind(appointment.appointment_date)
        .bind(appointment.status.as_str())
        .bind(&appointment.description)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_appointment", e))?;

        sqlx::query(
            r#"
            INSERT INTO service_appointment_types (service_appointment_id, service_type_id)
            SELECT $1, unnest($2::uuid[])
            "#,
        )
        .bind(appointment.service_appointment_id.as_uuid())
        .bind(uuids(service_type_ids))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_appointment_types", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(appointment_id = %id), err)]
    async fn appointment(&self, id: AppointmentId) -> StoreResult<Option<AppointmentDetails>> {
        let rows: Vec<AppointmentRow> =
            sqlx::query_as(&format!("{APPOINTMENT_SELECT} WHERE sa.service_appointment_id = $1"))
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("appointment", e))?;
        Ok(self.appointment_details(rows).await?.into_iter().next())
    }

    #[instrument(skip(self), fields(user_id = %user_id, appointment_count), err)]
    async fn appointments_for_user(&self, user_id: UserId) -> StoreResult<Vec<AppointmentDetails>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            {APPOINTMENT_SELECT}
            WHERE uc.user_id = $1
            ORDER BY sa.appointment_date DESC, sa.service_appointment_id DESC
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("appointments_for_user", e))?;

        Span::current().record("appointment_count", rows.len());
        self.appointment_details(rows).await
    }

    #[instrument(skip(self), fields(appointment_id = %id, status = %status), err)]
    async fn set_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE service_appointments SET status = $1, updated_at = $2 WHERE service_appointment_id = $3",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_appointment_status", e))?;
        Ok(result.rows_affected() > 0)
    }
}
