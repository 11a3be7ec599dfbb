//! Storage traits, one per area.
//!
//! Lookups return `Ok(None)` for a missing row. Guarded writes return
//! `Ok(false)` when the row is missing or not in a state that allows the
//! write, and leave it unchanged in that case.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use carkeeper_auth::{NewUser, User};
use carkeeper_catalog::{Brand, CarModel, DriveType, EngineType, Generation, Transmission, TrimDetails, TrimFilter};
use carkeeper_configurator::{Color, Configuration, ConfigurationDetails, ConfigurationStatus, EquipmentOption};
use carkeeper_core::{
    AppointmentId, BranchId, BrandId, ColorId, ConfigurationId, ModelId, NewsId, OptionId, OrderId,
    ServiceTypeId, TrimId, UserCarId, UserId,
};
use carkeeper_news::{NewsArticle, NewsWithAuthor};
use carkeeper_orders::{Order, OrderDetails, OrderStatus};
use carkeeper_servicing::{
    AppointmentDetails, AppointmentStatus, Branch, ServiceAppointment, ServiceType, UserCar, UserCarDetails,
};

use crate::StoreResult;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn brands(&self) -> StoreResult<Vec<Brand>>;
    async fn models(&self, brand_id: BrandId) -> StoreResult<Vec<CarModel>>;
    async fn generations(&self, model_id: ModelId) -> StoreResult<Vec<Generation>>;
    /// Newest first.
    async fn trims(&self, filter: &TrimFilter) -> StoreResult<Vec<TrimDetails>>;
    async fn trim(&self, id: TrimId) -> StoreResult<Option<TrimDetails>>;
    async fn engine_types(&self) -> StoreResult<Vec<EngineType>>;
    async fn transmissions(&self) -> StoreResult<Vec<Transmission>>;
    async fn drive_types(&self) -> StoreResult<Vec<DriveType>>;
}

#[async_trait]
pub trait ConfiguratorStore: Send + Sync {
    async fn colors(&self, is_available: Option<bool>) -> StoreResult<Vec<Color>>;
    async fn color(&self, id: ColorId) -> StoreResult<Option<Color>>;
    /// Available options offered for a trim.
    async fn options_for_trim(&self, trim_id: TrimId) -> StoreResult<Vec<EquipmentOption>>;
    async fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<EquipmentOption>>;

    /// Insert the configuration and its option rows atomically.
    async fn insert_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<()>;
    async fn configuration(&self, id: ConfigurationId) -> StoreResult<Option<ConfigurationDetails>>;
    /// Newest first.
    async fn configurations_for_user(&self, user_id: UserId) -> StoreResult<Vec<ConfigurationDetails>>;

    /// Replace trim, color, price and option rows atomically, only while the
    /// stored row is still `draft`.
    async fn revise_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<bool>;
    async fn set_configuration_status(
        &self,
        id: ConfigurationId,
        status: ConfigurationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;
    /// Delete only while the stored row is still `draft`.
    async fn delete_draft_configuration(&self, id: ConfigurationId) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and move its configuration to `ordered` in one unit
    /// of work. Returns `false` and writes nothing when the configuration is
    /// no longer `draft` or `confirmed`, or its `total_price` no longer
    /// matches the order's `final_price`.
    async fn place_order(&self, order: &Order) -> StoreResult<bool>;
    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetails>>;
    /// Newest first.
    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetails>>;
    async fn set_order_status(&self, id: OrderId, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<bool>;
}

#[async_trait]
pub trait ServicingStore: Send + Sync {
    async fn service_types(&self, category: Option<&str>, is_available: Option<bool>) -> StoreResult<Vec<ServiceType>>;
    async fn service_types_by_ids(&self, ids: &[ServiceTypeId]) -> StoreResult<Vec<ServiceType>>;
    async fn branches(&self, is_active: Option<bool>) -> StoreResult<Vec<Branch>>;
    async fn branch(&self, id: BranchId) -> StoreResult<Option<Branch>>;

    /// Fails with `Conflict` when the VIN is taken.
    async fn insert_user_car(&self, car: &UserCar) -> StoreResult<()>;
    async fn user_car(&self, id: UserCarId) -> StoreResult<Option<UserCarDetails>>;
    async fn user_cars(&self, user_id: UserId) -> StoreResult<Vec<UserCarDetails>>;

    /// Insert the appointment and its service type rows atomically.
    async fn insert_appointment(
        &self,
        appointment: &ServiceAppointment,
        service_type_ids: &[ServiceTypeId],
    ) -> StoreResult<()>;
    async fn appointment(&self, id: AppointmentId) -> StoreResult<Option<AppointmentDetails>>;
    /// Latest appointment date first.
    async fn appointments_for_user(&self, user_id: UserId) -> StoreResult<Vec<AppointmentDetails>>;
    async fn set_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Published first by `published_at` desc, then by `created_at` desc.
    async fn news(&self, is_published: Option<bool>) -> StoreResult<Vec<NewsWithAuthor>>;
    async fn news_item(&self, id: NewsId) -> StoreResult<Option<NewsWithAuthor>>;
    async fn insert_news(&self, article: &NewsArticle) -> StoreResult<()>;
    /// Persist title, content and publishing state.
    async fn update_news(&self, article: &NewsArticle) -> StoreResult<bool>;
    async fn delete_news(&self, id: NewsId) -> StoreResult<bool>;
}

/// Everything the API needs from storage.
pub trait Store: UserStore + CatalogStore + ConfiguratorStore + OrderStore + ServicingStore + NewsStore {}

impl<T> Store for T where T: UserStore + CatalogStore + ConfiguratorStore + OrderStore + ServicingStore + NewsStore {}
