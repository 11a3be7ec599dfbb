//! In-memory store for development without a database and for tests.
//!
//! Mirrors the Postgres behavior: the same orderings, inner-join semantics
//! for detail views, unique email and VIN, and all-or-nothing guarded writes
//! (each write takes the table lock once).

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use carkeeper_auth::{NewUser, User};
use carkeeper_catalog::{Brand, CarModel, DriveType, EngineType, Generation, Transmission, Trim, TrimDetails, TrimFilter};
use carkeeper_configurator::{Color, Configuration, ConfigurationDetails, ConfigurationStatus, EquipmentOption};
use carkeeper_core::{
    AppointmentId, BranchId, BrandId, ColorId, ConfigurationId, DriveTypeId, EngineTypeId, GenerationId, ModelId,
    NewsId, OptionId, OrderId, ServiceTypeId, TransmissionId, TrimId, UserCarId, UserId,
};
use carkeeper_news::{NewsArticle, NewsWithAuthor, newest_published_first};
use carkeeper_orders::{Order, OrderDetails, OrderStatus};
use carkeeper_servicing::{
    AppointmentDetails, AppointmentStatus, Branch, ServiceAppointment, ServiceType, UserCar, UserCarDetails,
};

use crate::store::{CatalogStore, ConfiguratorStore, NewsStore, OrderStore, ServicingStore, UserStore};
use crate::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,

    brands: HashMap<BrandId, Brand>,
    models: HashMap<ModelId, CarModel>,
    generations: HashMap<GenerationId, Generation>,
    trims: HashMap<TrimId, Trim>,
    engine_types: HashMap<EngineTypeId, EngineType>,
    transmissions: HashMap<TransmissionId, Transmission>,
    drive_types: HashMap<DriveTypeId, DriveType>,

    colors: HashMap<ColorId, Color>,
    options: HashMap<OptionId, EquipmentOption>,
    trim_options: HashSet<(TrimId, OptionId)>,
    configurations: HashMap<ConfigurationId, Configuration>,
    configuration_options: HashMap<ConfigurationId, Vec<OptionId>>,

    orders: HashMap<OrderId, Order>,

    branches: HashMap<BranchId, Branch>,
    service_types: HashMap<ServiceTypeId, ServiceType>,
    user_cars: HashMap<UserCarId, UserCar>,
    appointments: HashMap<AppointmentId, ServiceAppointment>,
    appointment_types: HashMap<AppointmentId, Vec<ServiceTypeId>>,

    news: HashMap<NewsId, NewsArticle>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn seed(&self, f: impl FnOnce(&mut Tables)) {
        if let Ok(mut tables) = self.tables.write() {
            f(&mut tables);
        }
    }

    // Reference data has no write API over HTTP; these load it directly.

    pub fn add_brand(&self, brand: Brand) {
        self.seed(|t| {
            t.brands.insert(brand.brand_id, brand);
        });
    }

    pub fn add_model(&self, model: CarModel) {
        self.seed(|t| {
            t.models.insert(model.model_id, model);
        });
    }

    pub fn add_generation(&self, generation: Generation) {
        self.seed(|t| {
            t.generations.insert(generation.generation_id, generation);
        });
    }

    pub fn add_engine_type(&self, engine_type: EngineType) {
        self.seed(|t| {
            t.engine_types.insert(engine_type.engine_type_id, engine_type);
        });
    }

    pub fn add_transmission(&self, transmission: Transmission) {
        self.seed(|t| {
            t.transmissions.insert(transmission.transmission_id, transmission);
        });
    }

    pub fn add_drive_type(&self, drive_type: DriveType) {
        self.seed(|t| {
            t.drive_types.insert(drive_type.drive_type_id, drive_type);
        });
    }

    pub fn add_trim(&self, trim: Trim) {
        self.seed(|t| {
            t.trims.insert(trim.trim_id, trim);
        });
    }

    pub fn add_color(&self, color: Color) {
        self.seed(|t| {
            t.colors.insert(color.color_id, color);
        });
    }

    /// Add an option and offer it on the given trims.
    pub fn add_option(&self, option: EquipmentOption, trims: &[TrimId]) {
        self.seed(|t| {
            for trim_id in trims {
                t.trim_options.insert((*trim_id, option.option_id));
            }
            t.options.insert(option.option_id, option);
        });
    }

    pub fn add_branch(&self, branch: Branch) {
        self.seed(|t| {
            t.branches.insert(branch.branch_id, branch);
        });
    }

    pub fn add_service_type(&self, service_type: ServiceType) {
        self.seed(|t| {
            t.service_types.insert(service_type.service_type_id, service_type);
        });
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, uuid::Uuid)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl Tables {
    fn trim_details(&self, trim: &Trim) -> Option<TrimDetails> {
        let generation = self.generations.get(&trim.generation_id)?;
        let model = self.models.get(&generation.model_id)?;
        let brand = self.brands.get(&model.brand_id)?;
        Some(TrimDetails {
            trim: trim.clone(),
            brand_id: brand.brand_id,
            brand_name: brand.name.clone(),
            model_id: model.model_id,
            model_name: model.name.clone(),
            generation_name: generation.name.clone(),
            engine_type: self.engine_types.get(&trim.engine_type_id)?.name.clone(),
            transmission: self.transmissions.get(&trim.transmission_id)?.name.clone(),
            drive_type: self.drive_types.get(&trim.drive_type_id)?.name.clone(),
        })
    }

    fn configuration_details(&self, configuration: &Configuration) -> Option<ConfigurationDetails> {
        let trim = self.trims.get(&configuration.trim_id)?;
        let color = self.colors.get(&configuration.color_id)?;
        let mut options: Vec<EquipmentOption> = self
            .configuration_options
            .get(&configuration.configuration_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.options.get(id).cloned())
            .collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));

        Some(ConfigurationDetails {
            configuration: configuration.clone(),
            trim_name: trim.name.clone(),
            color_name: color.name.clone(),
            color_hex: color.hex_code.clone(),
            options,
        })
    }

    fn order_details(&self, order: &Order) -> Option<OrderDetails> {
        let configuration = self.configurations.get(&order.configuration_id)?;
        Some(OrderDetails {
            order: order.clone(),
            configuration: self.configuration_details(configuration)?,
            manager_name: order
                .manager_id
                .and_then(|id| self.users.get(&id))
                .map(User::full_name),
        })
    }

    fn user_car_details(&self, car: &UserCar) -> Option<UserCarDetails> {
        let trim = self.trims.get(&car.trim_id)?;
        let details = self.trim_details(trim)?;
        let color = self.colors.get(&car.color_id)?;
        Some(UserCarDetails {
            car: car.clone(),
            trim_name: trim.name.clone(),
            brand_name: details.brand_name,
            model_name: details.model_name,
            color_name: color.name.clone(),
            color_hex: color.hex_code.clone(),
        })
    }

    fn appointment_details(&self, appointment: &ServiceAppointment) -> Option<AppointmentDetails> {
        let car = self.user_cars.get(&appointment.user_car_id)?;
        let branch = self.branches.get(&appointment.branch_id)?;
        let mut service_types: Vec<ServiceType> = self
            .appointment_types
            .get(&appointment.service_appointment_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.service_types.get(id).cloned())
            .collect();
        service_types.sort_by(|a, b| a.name.cmp(&b.name));

        Some(AppointmentDetails {
            appointment: appointment.clone(),
            owner_id: car.user_id,
            user_car_vin: car.vin.clone(),
            branch_name: branch.name.clone(),
            branch_address: branch.address.clone(),
            manager_name: appointment
                .manager_id
                .and_then(|id| self.users.get(&id))
                .map(User::full_name),
            service_types,
        })
    }

    fn news_with_author(&self, article: &NewsArticle) -> NewsWithAuthor {
        NewsWithAuthor {
            article: article.clone(),
            author_name: article
                .author_id
                .and_then(|id| self.users.get(&id))
                .map(User::full_name),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("user with this email already exists".into()));
        }
        let now = Utc::now();
        let user = User {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        let mut rows: Vec<Brand> = self.read()?.brands.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn models(&self, brand_id: BrandId) -> StoreResult<Vec<CarModel>> {
        let mut rows: Vec<CarModel> = self
            .read()?
            .models
            .values()
            .filter(|m| m.brand_id == brand_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn generations(&self, model_id: ModelId) -> StoreResult<Vec<Generation>> {
        let mut rows: Vec<Generation> = self
            .read()?
            .generations
            .values()
            .filter(|g| g.model_id == model_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.year_from.cmp(&a.year_from));
        Ok(rows)
    }

    async fn trims(&self, filter: &TrimFilter) -> StoreResult<Vec<TrimDetails>> {
        let t = self.read()?;
        let mut rows: Vec<TrimDetails> = t
            .trims
            .values()
            .filter_map(|trim| t.trim_details(trim))
            .filter(|d| filter.matches(d))
            .collect();
        newest_first(&mut rows, |d| (d.trim.created_at, *d.trim.trim_id.as_uuid()));
        Ok(rows)
    }

    async fn trim(&self, id: TrimId) -> StoreResult<Option<TrimDetails>> {
        let t = self.read()?;
        Ok(t.trims.get(&id).and_then(|trim| t.trim_details(trim)))
    }

    async fn engine_types(&self) -> StoreResult<Vec<EngineType>> {
        let mut rows: Vec<EngineType> = self.read()?.engine_types.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn transmissions(&self) -> StoreResult<Vec<Transmission>> {
        let mut rows: Vec<Transmission> = self.read()?.transmissions.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn drive_types(&self) -> StoreResult<Vec<DriveType>> {
        let mut rows: Vec<DriveType> = self.read()?.drive_types.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl ConfiguratorStore for InMemoryStore {
    async fn colors(&self, is_available: Option<bool>) -> StoreResult<Vec<Color>> {
        let mut rows: Vec<Color> = self
            .read()?
            .colors
            .values()
            .filter(|c| is_available.is_none_or(|a| c.is_available == a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn color(&self, id: ColorId) -> StoreResult<Option<Color>> {
        Ok(self.read()?.colors.get(&id).cloned())
    }

    async fn options_for_trim(&self, trim_id: TrimId) -> StoreResult<Vec<EquipmentOption>> {
        let t = self.read()?;
        let mut rows: Vec<EquipmentOption> = t
            .options
            .values()
            .filter(|o| o.is_available && t.trim_options.contains(&(trim_id, o.option_id)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<EquipmentOption>> {
        let t = self.read()?;
        Ok(ids.iter().filter_map(|id| t.options.get(id).cloned()).collect())
    }

    async fn insert_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.trims.contains_key(&configuration.trim_id) || !t.colors.contains_key(&configuration.color_id) {
            return Err(StoreError::Reference("configuration references a missing trim or color".into()));
        }
        if let Some(missing) = option_ids.iter().find(|o| !t.options.contains_key(*o)) {
            return Err(StoreError::Reference(format!("option {missing} does not exist")));
        }
        t.configurations
            .insert(configuration.configuration_id, configuration.clone());
        t.configuration_options
            .insert(configuration.configuration_id, option_ids.to_vec());
        Ok(())
    }

    async fn configuration(&self, id: ConfigurationId) -> StoreResult<Option<ConfigurationDetails>> {
        let t = self.read()?;
        Ok(t.configurations.get(&id).and_then(|c| t.configuration_details(c)))
    }

    async fn configurations_for_user(&self, user_id: UserId) -> StoreResult<Vec<ConfigurationDetails>> {
        let t = self.read()?;
        let mut rows: Vec<ConfigurationDetails> = t
            .configurations
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| t.configuration_details(c))
            .collect();
        newest_first(&mut rows, |d| {
            (d.configuration.created_at, *d.configuration.configuration_id.as_uuid())
        });
        Ok(rows)
    }

    async fn revise_configuration(&self, configuration: &Configuration, option_ids: &[OptionId]) -> StoreResult<bool> {
        let mut t = self.write()?;
        let id = configuration.configuration_id;
        match t.configurations.get(&id) {
            Some(stored) if stored.status == ConfigurationStatus::Draft => {}
            _ => return Ok(false),
        }
        if !t.trims.contains_key(&configuration.trim_id) || !t.colors.contains_key(&configuration.color_id) {
            return Err(StoreError::Reference("configuration references a missing trim or color".into()));
        }
        if let Some(missing) = option_ids.iter().find(|o| !t.options.contains_key(*o)) {
            return Err(StoreError::Reference(format!("option {missing} does not exist")));
        }
        if let Some(stored) = t.configurations.get_mut(&id) {
            stored.trim_id = configuration.trim_id;
            stored.color_id = configuration.color_id;
            stored.total_price = configuration.total_price;
            stored.updated_at = configuration.updated_at;
        }
        t.configuration_options.insert(id, option_ids.to_vec());
        Ok(true)
    }

    async fn set_configuration_status(
        &self,
        id: ConfigurationId,
        status: ConfigurationStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(match t.configurations.get_mut(&id) {
            Some(c) => {
                c.set_status(status, now);
                true
            }
            None => false,
        })
    }

    async fn delete_draft_configuration(&self, id: ConfigurationId) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.configurations.get(&id) {
            Some(c) if c.status == ConfigurationStatus::Draft => {}
            _ => return Ok(false),
        }
        if t.orders.values().any(|o| o.configuration_id == id) {
            return Err(StoreError::Reference("configuration is referenced by an order".into()));
        }
        t.configurations.remove(&id);
        t.configuration_options.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, order: &Order) -> StoreResult<bool> {
        let mut t = self.write()?;
        let Some(configuration) = t.configurations.get_mut(&order.configuration_id) else {
            return Ok(false);
        };
        if !matches!(
            configuration.status,
            ConfigurationStatus::Draft | ConfigurationStatus::Confirmed
        ) || configuration.total_price != order.final_price
        {
            return Ok(false);
        }
        configuration.set_status(ConfigurationStatus::Ordered, order.created_at);
        t.orders.insert(order.order_id, order.clone());
        Ok(true)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<OrderDetails>> {
        let t = self.read()?;
        Ok(t.orders.get(&id).and_then(|o| t.order_details(o)))
    }

    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetails>> {
        let t = self.read()?;
        let mut rows: Vec<OrderDetails> = t
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .filter_map(|o| t.order_details(o))
            .collect();
        newest_first(&mut rows, |d| (d.order.created_at, *d.order.order_id.as_uuid()));
        Ok(rows)
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(match t.orders.get_mut(&id) {
            Some(o) => {
                o.status = status;
                o.updated_at = now;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl ServicingStore for InMemoryStore {
    async fn service_types(&self, category: Option<&str>, is_available: Option<bool>) -> StoreResult<Vec<ServiceType>> {
        let mut rows: Vec<ServiceType> = self
            .read()?
            .service_types
            .values()
            .filter(|st| category.is_none_or(|c| st.category == c))
            .filter(|st| is_available.is_none_or(|a| st.is_available == a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn service_types_by_ids(&self, ids: &[ServiceTypeId]) -> StoreResult<Vec<ServiceType>> {
        let t = self.read()?;
        Ok(ids.iter().filter_map(|id| t.service_types.get(id).cloned()).collect())
    }

    async fn branches(&self, is_active: Option<bool>) -> StoreResult<Vec<Branch>> {
        let mut rows: Vec<Branch> = self
            .read()?
            .branches
            .values()
            .filter(|b| is_active.is_none_or(|a| b.is_active == a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn branch(&self, id: BranchId) -> StoreResult<Option<Branch>> {
        Ok(self.read()?.branches.get(&id).cloned())
    }

    async fn insert_user_car(&self, car: &UserCar) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.user_cars.values().any(|c| c.vin == car.vin) {
            return Err(StoreError::Conflict("a car with this VIN already exists".into()));
        }
        if !t.trims.contains_key(&car.trim_id) || !t.colors.contains_key(&car.color_id) {
            return Err(StoreError::Reference("car references a missing trim or color".into()));
        }
        t.user_cars.insert(car.user_car_id, car.clone());
        Ok(())
    }

    async fn user_car(&self, id: UserCarId) -> StoreResult<Option<UserCarDetails>> {
        let t = self.read()?;
        Ok(t.user_cars.get(&id).and_then(|c| t.user_car_details(c)))
    }

    async fn user_cars(&self, user_id: UserId) -> StoreResult<Vec<UserCarDetails>> {
        let t = self.read()?;
        let mut rows: Vec<UserCarDetails> = t
            .user_cars
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| t.user_car_details(c))
            .collect();
        newest_first(&mut rows, |d| (d.car.created_at, *d.car.user_car_id.as_uuid()));
        Ok(rows)
    }

    async fn insert_appointment(
        &self,
        appointment: &ServiceAppointment,
        service_type_ids: &[ServiceTypeId],
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.user_cars.contains_key(&appointment.user_car_id) || !t.branches.contains_key(&appointment.branch_id) {
            return Err(StoreError::Reference("appointment references a missing car or branch".into()));
        }
        if let Some(missing) = service_type_ids.iter().find(|s| !t.service_types.contains_key(*s)) {
            return Err(StoreError::Reference(format!("service type {missing} does not exist")));
        }
        t.appointments
            .insert(appointment.service_appointment_id, appointment.clone());
        t.appointment_types
            .insert(appointment.service_appointment_id, service_type_ids.to_vec());
        Ok(())
    }

    async fn appointment(&self, id: AppointmentId) -> StoreResult<Option<AppointmentDetails>> {
        let t = self.read()?;
        Ok(t.appointments.get(&id).and_then(|a| t.appointment_details(a)))
    }

    async fn appointments_for_user(&self, user_id: UserId) -> StoreResult<Vec<AppointmentDetails>> {
        let t = self.read()?;
        let mut rows: Vec<AppointmentDetails> = t
            .appointments
            .values()
            .filter_map(|a| t.appointment_details(a))
            .filter(|d| d.owner_id == user_id)
            .collect();
        newest_first(&mut rows, |d| {
            (
                d.appointment.appointment_date,
                *d.appointment.service_appointment_id.as_uuid(),
            )
        });
        Ok(rows)
    }

    async fn set_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(match t.appointments.get_mut(&id) {
            Some(a) => {
                a.status = status;
                a.updated_at = now;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl NewsStore for InMemoryStore {
    async fn news(&self, is_published: Option<bool>) -> StoreResult<Vec<NewsWithAuthor>> {
        let t = self.read()?;
        let mut articles: Vec<&NewsArticle> = t
            .news
            .values()
            .filter(|n| is_published.is_none_or(|p| n.is_published == p))
            .collect();
        articles.sort_by(|a, b| newest_published_first(a, b));
        Ok(articles.into_iter().map(|a| t.news_with_author(a)).collect())
    }

    async fn news_item(&self, id: NewsId) -> StoreResult<Option<NewsWithAuthor>> {
        let t = self.read()?;
        Ok(t.news.get(&id).map(|a| t.news_with_author(a)))
    }

    async fn insert_news(&self, article: &NewsArticle) -> StoreResult<()> {
        self.write()?.news.insert(article.news_id, article.clone());
        Ok(())
    }

    async fn update_news(&self, article: &NewsArticle) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(match t.news.get_mut(&article.news_id) {
            Some(stored) => {
                stored.title = article.title.clone();
                stored.content = article.content.clone();
                stored.is_published = article.is_published;
                stored.published_at = article.published_at;
                stored.updated_at = article.updated_at;
                true
            }
            None => false,
        })
    }

    async fn delete_news(&self, id: NewsId) -> StoreResult<bool> {
        Ok(self.write()?.news.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use carkeeper_auth::Role;
    use carkeeper_configurator::ConfigurationDraft;
    use carkeeper_core::Money;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: UserId::new(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: None,
            password_hash: "hash".into(),
            role: Role::Customer,
        }
    }

    fn draft_for(catalog: &demo::DemoCatalog, user: UserId) -> (Configuration, Vec<OptionId>) {
        let draft = ConfigurationDraft::new(catalog.trim_id, catalog.color_id, catalog.option_ids.clone());
        let c = Configuration::new_draft(user, &draft, Money::new(31_700), Utc::now());
        (c, draft.option_ids)
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("a@x.io")).await.unwrap();
        let err = store.insert_user(new_user("a@x.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.user_by_email("a@x.io").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn configuration_round_trip_with_options() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let user = UserId::new();
        let (c, options) = draft_for(&catalog, user);

        store.insert_configuration(&c, &options).await.unwrap();
        let details = store.configuration(c.configuration_id).await.unwrap().unwrap();
        assert_eq!(details.options.len(), options.len());
        assert_eq!(details.trim_name, "Comfort");
        assert_eq!(store.configurations_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_with_unknown_option_writes_nothing() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let user = UserId::new();
        let (c, _) = draft_for(&catalog, user);

        let err = store
            .insert_configuration(&c, &[OptionId::new()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Reference(_)));
        assert!(store.configuration(c.configuration_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guarded_writes_require_draft() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let (c, options) = draft_for(&catalog, UserId::new());
        store.insert_configuration(&c, &options).await.unwrap();

        store
            .set_configuration_status(c.configuration_id, ConfigurationStatus::Confirmed, Utc::now())
            .await
            .unwrap();
        assert!(!store.revise_configuration(&c, &[]).await.unwrap());
        assert!(!store.delete_draft_configuration(c.configuration_id).await.unwrap());

        let stored = store.configuration(c.configuration_id).await.unwrap().unwrap();
        assert_eq!(stored.options.len(), options.len());
        assert_eq!(stored.configuration.status, ConfigurationStatus::Confirmed);
    }

    #[tokio::test]
    async fn placing_an_order_marks_configuration_ordered_once() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let user = UserId::new();
        let (c, options) = draft_for(&catalog, user);
        store.insert_configuration(&c, &options).await.unwrap();

        let order = Order::place(user, &c, Utc::now()).unwrap();
        assert!(store.place_order(&order).await.unwrap());

        let stored = store.configuration(c.configuration_id).await.unwrap().unwrap();
        assert_eq!(stored.configuration.status, ConfigurationStatus::Ordered);

        let again = Order::place(user, &c, Utc::now()).unwrap();
        assert!(!store.place_order(&again).await.unwrap());
        assert_eq!(store.orders_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn order_priced_before_a_revision_is_refused() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let user = UserId::new();
        let (c, options) = draft_for(&catalog, user);
        store.insert_configuration(&c, &options).await.unwrap();

        let stale = Order::place(user, &c, Utc::now()).unwrap();

        let mut revised = c.clone();
        let draft = ConfigurationDraft::new(catalog.trim_id, catalog.color_id, vec![]);
        revised.revise(&draft, Money::new(30_500), Utc::now()).unwrap();
        assert!(store.revise_configuration(&revised, &[]).await.unwrap());

        assert!(!store.place_order(&stale).await.unwrap());
        let stored = store.configuration(c.configuration_id).await.unwrap().unwrap();
        assert_eq!(stored.configuration.status, ConfigurationStatus::Draft);
        assert!(store.orders_for_user(user).await.unwrap().is_empty());

        let fresh = Order::place(user, &stored.configuration, Utc::now()).unwrap();
        assert!(store.place_order(&fresh).await.unwrap());
        let placed = store.order(fresh.order_id).await.unwrap().unwrap();
        assert_eq!(placed.order.final_price, Money::new(30_500));
        assert_eq!(placed.configuration.configuration.total_price, Money::new(30_500));
    }

    #[tokio::test]
    async fn vin_is_unique() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);
        let car = |owner| UserCar {
            user_car_id: UserCarId::new(),
            user_id: owner,
            trim_id: catalog.trim_id,
            color_id: catalog.color_id,
            vin: "1HGCM82633A004352".into(),
            year: 2020,
            current_mileage: 0,
            purchase_date: None,
            created_at: Utc::now(),
        };
        store.insert_user_car(&car(UserId::new())).await.unwrap();
        let err = store.insert_user_car(&car(UserId::new())).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn trims_are_filtered_and_joined() {
        let store = InMemoryStore::new();
        let catalog = demo::seed(&store);

        let all = store.trims(&TrimFilter::default()).await.unwrap();
        assert!(all.iter().any(|d| d.trim.trim_id == catalog.trim_id));

        let filter = TrimFilter {
            brand_ids: vec![BrandId::new()],
            ..Default::default()
        };
        assert!(store.trims(&filter).await.unwrap().is_empty());

        let options = store.options_for_trim(catalog.trim_id).await.unwrap();
        assert_eq!(options.len(), catalog.option_ids.len());
    }
}
