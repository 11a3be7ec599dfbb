//! Application services: one method per API operation.
//!
//! Handlers stay thin; everything that touches the store or enforces a rule
//! happens here. Domain rules are checked first for a precise error, then the
//! store's guarded writes catch anything that changed in between.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use carkeeper_auth::{
    DEFAULT_PASSWORD_COST, NewUser, RegisterUser, TokenIssuer, UserResponse, hash_password_with_cost,
    verify_password,
};
use carkeeper_catalog::{Brand, CarModel, DriveType, EngineType, Generation, Transmission, TrimDetails, TrimFilter};
use carkeeper_configurator::{
    Color, Configuration, ConfigurationDetails, ConfigurationDraft, ConfigurationStatus, ConfiguratorError, EquipmentOption,
    PriceCalculator,
};
use carkeeper_core::{
    AppointmentId, BrandId, ConfigurationId, ModelId, Money, NewsId, OrderId, TrimId, UserCarId,
};
use carkeeper_infra::{Store, StoreError};
use carkeeper_news::{NewsArticle, NewsContent, NewsWithAuthor};
use carkeeper_orders::{Order, OrderDetails, OrderError, OrderStatus};
use carkeeper_servicing::{
    AppointmentDetails, AppointmentStatus, BookAppointment, Branch, RegisterCar, ServiceType, UserCarDetails,
    check_booking,
};

use crate::app::dto::{ConfigurationUpdate, LoginResponse};
use crate::app::errors::{ServiceError, ServiceResult};
use crate::authz;
use crate::context::PrincipalContext;

pub struct AppServices {
    store: Arc<dyn Store>,
    tokens: Arc<dyn TokenIssuer>,
    password_cost: u32,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            store,
            tokens,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }

    /// bcrypt cost for new password hashes.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    // -------------------------
    // Auth
    // -------------------------

    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterUser) -> ServiceResult<UserResponse> {
        let input = input.validate()?;

        if self.store.user_by_email(&input.email).await?.is_some() {
            return Err(email_taken());
        }

        let password = input.password.clone();
        let cost = self.password_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
            .await
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))??;

        let user = self
            .store
            .insert_user(NewUser::customer(input, hash))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => email_taken(),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.user_by_email(&email).await? else {
            return Err(invalid_credentials());
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?;
        if !verified {
            return Err(invalid_credentials());
        }

        let token = self.tokens.issue(user.id, user.role, Utc::now())?;
        Ok(LoginResponse {
            token,
            user: UserResponse::from(&user),
        })
    }

    pub async fn me(&self, principal: &PrincipalContext) -> ServiceResult<UserResponse> {
        let user = self
            .store
            .user_by_id(principal.user_id())
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        Ok(UserResponse::from(&user))
    }

    // -------------------------
    // Catalog
    // -------------------------

    pub async fn brands(&self) -> ServiceResult<Vec<Brand>> {
        Ok(self.store.brands().await?)
    }

    pub async fn models(&self, brand_id: BrandId) -> ServiceResult<Vec<CarModel>> {
        Ok(self.store.models(brand_id).await?)
    }

    pub async fn generations(&self, model_id: ModelId) -> ServiceResult<Vec<Generation>> {
        Ok(self.store.generations(model_id).await?)
    }

    pub async fn trims(&self, filter: &TrimFilter) -> ServiceResult<Vec<TrimDetails>> {
        Ok(self.store.trims(filter).await?)
    }

    pub async fn trim(&self, id: TrimId) -> ServiceResult<TrimDetails> {
        self.store
            .trim(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("trim"))
    }

    pub async fn engine_types(&self) -> ServiceResult<Vec<EngineType>> {
        Ok(self.store.engine_types().await?)
    }

    pub async fn transmissions(&self) -> ServiceResult<Vec<Transmission>> {
        Ok(self.store.transmissions().await?)
    }

    pub async fn drive_types(&self) -> ServiceResult<Vec<DriveType>> {
        Ok(self.store.drive_types().await?)
    }

    // -------------------------
    // Configurator
    // -------------------------

    pub async fn colors(&self, is_available: Option<bool>) -> ServiceResult<Vec<Color>> {
        Ok(self.store.colors(is_available).await?)
    }

    pub async fn options_for_trim(&self, trim_id: TrimId) -> ServiceResult<Vec<EquipmentOption>> {
        Ok(self.store.options_for_trim(trim_id).await?)
    }

    #[instrument(skip(self, principal, draft), fields(user_id = %principal.user_id()))]
    pub async fn create_configuration(
        &self,
        principal: &PrincipalContext,
        draft: ConfigurationDraft,
    ) -> ServiceResult<ConfigurationDetails> {
        let draft = draft.dedup_options();
        let total = self.price(&draft).await?;

        let configuration =
            Configuration::new_draft(principal.user_id(), &draft, total, Utc::now());
        self.store
            .insert_configuration(&configuration, &draft.option_ids)
            .await?;

        tracing::info!(
            configuration_id = %configuration.configuration_id,
            total_price = total.minor_units(),
            "configuration created"
        );
        self.load_configuration(configuration.configuration_id).await
    }

    pub async fn configuration(
        &self,
        principal: &PrincipalContext,
        id: ConfigurationId,
    ) -> ServiceResult<ConfigurationDetails> {
        let details = self.load_configuration(id).await?;
        authz::require_owner_or_staff(principal, details.configuration.user_id, "configuration")?;
        Ok(details)
    }

    pub async fn configurations_for_user(&self, principal: &PrincipalContext) -> ServiceResult<Vec<ConfigurationDetails>> {
        Ok(self.store.configurations_for_user(principal.user_id()).await?)
    }

    #[instrument(skip(self, principal, update), fields(user_id = %principal.user_id()))]
    pub async fn update_configuration(
        &self,
        principal: &PrincipalContext,
        id: ConfigurationId,
        update: ConfigurationUpdate,
    ) -> ServiceResult<ConfigurationDetails> {
        let details = self.load_configuration(id).await?;
        authz::require_owner(principal, details.configuration.user_id, "configuration")?;

        match update {
            ConfigurationUpdate::Status(raw) => {
                let status: ConfigurationStatus = raw.parse()?;
                if !self
                    .store
                    .set_configuration_status(id, status, Utc::now())
                    .await?
                {
                    return Err(ServiceError::not_found("configuration"));
                }
                tracing::info!(%status, "configuration status updated");
            }
            ConfigurationUpdate::Full(draft) => {
                let mut configuration = details.configuration;
                configuration.ensure_revisable()?;

                let draft = draft.dedup_options();
                let total = self.price(&draft).await?;
                configuration.revise(&draft, total, Utc::now())?;

                if !self
                    .store
                    .revise_configuration(&configuration, &draft.option_ids)
                    .await?
                {
                    return Err(self.configuration_state_error(id, "update").await);
                }
                tracing::info!(total_price = total.minor_units(), "configuration revised");
            }
        }

        self.load_configuration(id).await
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub async fn delete_configuration(&self, principal: &PrincipalContext, id: ConfigurationId) -> ServiceResult<()> {
        let details = self.load_configuration(id).await?;
        authz::require_owner(principal, details.configuration.user_id, "configuration")?;
        details.configuration.ensure_deletable()?;

        let deleted = self.store.delete_draft_configuration(id).await.map_err(|e| match e {
            StoreError::Reference(_) => ServiceError::Conflict("configuration is referenced by an order".into()),
            other => other.into(),
        })?;
        if !deleted {
            return Err(self.configuration_state_error(id, "delete").await);
        }
        tracing::info!("configuration deleted");
        Ok(())
    }

    /// `base_price + color delta + option prices`. Every referenced row must exist.
    async fn price(&self, draft: &ConfigurationDraft) -> ServiceResult<Money> {
        let trim = self
            .store
            .trim(draft.trim_id)
            .await?
            .ok_or_else(|| ServiceError::validation("trim not found"))?;
        let color = self
            .store
            .color(draft.color_id)
            .await?
            .ok_or_else(|| ServiceError::validation("color not found"))?;

        let options = self.store.options_by_ids(&draft.option_ids).await?;
        if let Some(missing) = draft
            .option_ids
            .iter()
            .find(|id| !options.iter().any(|o| o.option_id == **id))
        {
            return Err(ServiceError::validation(format!("option {missing} not found")));
        }

        let option_prices: Vec<Money> = options.iter().map(|o| o.price).collect();
        Ok(PriceCalculator::compute(
            trim.trim.base_price,
            color.price_delta,
            &option_prices,
        ))
    }

    async fn load_configuration(&self, id: ConfigurationId) -> ServiceResult<ConfigurationDetails> {
        self.store
            .configuration(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("configuration"))
    }

    /// The error for a guarded write that found the row in another state.
    async fn configuration_state_error(&self, id: ConfigurationId, action: &'static str) -> ServiceError {
        match self.load_configuration(id).await {
            Ok(current) => ConfiguratorError::InvalidState {
                action,
                status: current.configuration.status,
            }
            .into(),
            Err(e) => e,
        }
    }

    // -------------------------
    // Orders
    // -------------------------

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub async fn place_order(
        &self,
        principal: &PrincipalContext,
        configuration_id: ConfigurationId,
    ) -> ServiceResult<OrderDetails> {
        let details = self.load_configuration(configuration_id).await?;
        authz::require_owner(principal, details.configuration.user_id, "configuration")?;

        let order = Order::place(principal.user_id(), &details.configuration, Utc::now())?;
        if !self.store.place_order(&order).await? {
            let current = self.load_configuration(configuration_id).await?.configuration;
            return Err(match current.status {
                ConfigurationStatus::Draft | ConfigurationStatus::Confirmed => {
                    ServiceError::Conflict("configuration was changed while the order was being placed".into())
                }
                other => OrderError::NotOrderable(other).into(),
            });
        }

        tracing::info!(
            order_id = %order.order_id,
            final_price = order.final_price.minor_units(),
            "order placed"
        );
        self.load_order(order.order_id).await
    }

    pub async fn orders_for_user(&self, principal: &PrincipalContext) -> ServiceResult<Vec<OrderDetails>> {
        Ok(self.store.orders_for_user(principal.user_id()).await?)
    }

    pub async fn order(&self, principal: &PrincipalContext, id: OrderId) -> ServiceResult<OrderDetails> {
        let details = self.load_order(id).await?;
        authz::require_owner_or_staff(principal, details.order.user_id, "order")?;
        Ok(details)
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub async fn set_order_status(
        &self,
        principal: &PrincipalContext,
        id: OrderId,
        raw_status: &str,
    ) -> ServiceResult<OrderDetails> {
        authz::require_staff(principal)?;
        let status: OrderStatus = raw_status.trim().parse()?;

        if !self.store.set_order_status(id, status, Utc::now()).await? {
            return Err(ServiceError::not_found("order"));
        }
        tracing::info!(%status, "order status updated");
        self.load_order(id).await
    }

    async fn load_order(&self, id: OrderId) -> ServiceResult<OrderDetails> {
        self.store
            .order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order"))
    }

    // -------------------------
    // Servicing
    // -------------------------

    pub async fn service_types(
        &self,
        category: Option<&str>,
        is_available: Option<bool>,
    ) -> ServiceResult<Vec<ServiceType>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(self.store.service_types(category, is_available).await?)
    }

    pub async fn branches(&self, is_active: Option<bool>) -> ServiceResult<Vec<Branch>> {
        Ok(self.store.branches(is_active).await?)
    }

    #[instrument(skip(self, principal, request), fields(user_id = %principal.user_id()))]
    pub async fn book_appointment(
        &self,
        principal: &PrincipalContext,
        request: BookAppointment,
    ) -> ServiceResult<AppointmentDetails> {
        let car = self
            .store
            .user_car(request.user_car_id)
            .await?
            .ok_or_else(|| ServiceError::validation("user car not found"))?;
        let branch = self
            .store
            .branch(request.branch_id)
            .await?
            .ok_or_else(|| ServiceError::validation("branch not found"))?;

        let requested = request.distinct_service_types();
        let found = self.store.service_types_by_ids(&requested).await?;
        check_booking(principal.user_id(), &car.car, &branch, &requested, &found)?;

        let appointment = request.into_appointment(Utc::now());
        self.store
            .insert_appointment(&appointment, &requested)
            .await?;

        tracing::info!(
            appointment_id = %appointment.service_appointment_id,
            branch_id = %appointment.branch_id,
            "appointment booked"
        );
        self.load_appointment(appointment.service_appointment_id).await
    }

    pub async fn appointments_for_user(&self, principal: &PrincipalContext) -> ServiceResult<Vec<AppointmentDetails>> {
        Ok(self.store.appointments_for_user(principal.user_id()).await?)
    }

    pub async fn appointment(&self, principal: &PrincipalContext, id: AppointmentId) -> ServiceResult<AppointmentDetails> {
        let details = self.load_appointment(id).await?;
        authz::require_owner_or_staff(principal, details.owner_id, "appointment")?;
        Ok(details)
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub async fn cancel_appointment(
        &self,
        principal: &PrincipalContext,
        id: AppointmentId,
    ) -> ServiceResult<AppointmentDetails> {
        let details = self.load_appointment(id).await?;
        authz::require_owner_or_staff(principal, details.owner_id, "appointment")?;

        if !self
            .store
            .set_appointment_status(id, AppointmentStatus::Cancelled, Utc::now())
            .await?
        {
            return Err(ServiceError::not_found("appointment"));
        }
        tracing::info!("appointment cancelled");
        self.load_appointment(id).await
    }

    async fn load_appointment(&self, id: AppointmentId) -> ServiceResult<AppointmentDetails> {
        self.store
            .appointment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("appointment"))
    }

    // -------------------------
    // Profile
    // -------------------------

    pub async fn user_cars(&self, principal: &PrincipalContext) -> ServiceResult<Vec<UserCarDetails>> {
        Ok(self.store.user_cars(principal.user_id()).await?)
    }

    #[instrument(skip(self, principal, request), fields(user_id = %principal.user_id()))]
    pub async fn register_car(&self, principal: &PrincipalContext, request: RegisterCar) -> ServiceResult<UserCarDetails> {
        let car = request.into_car(principal.user_id(), Utc::now())?;

        if self.store.trim(car.trim_id).await?.is_none() {
            return Err(ServiceError::validation("trim not found"));
        }
        if self.store.color(car.color_id).await?.is_none() {
            return Err(ServiceError::validation("color not found"));
        }

        self.store.insert_user_car(&car).await.map_err(|e| match e {
            StoreError::Conflict(_) => ServiceError::Conflict("a car with this VIN already exists".into()),
            other => other.into(),
        })?;

        tracing::info!(user_car_id = %car.user_car_id, "car registered");
        self.load_user_car(car.user_car_id).await
    }

    pub async fn user_car(&self, principal: &PrincipalContext, id: UserCarId) -> ServiceResult<UserCarDetails> {
        let details = self.load_user_car(id).await?;
        authz::require_owner_or_staff(principal, details.car.user_id, "car")?;
        Ok(details)
    }

    async fn load_user_car(&self, id: UserCarId) -> ServiceResult<UserCarDetails> {
        self.store
            .user_car(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("car"))
    }

    // -------------------------
    // News
    // -------------------------

    pub async fn news(&self, is_published: Option<bool>) -> ServiceResult<Vec<NewsWithAuthor>> {
        Ok(self.store.news(is_published).await?)
    }

    pub async fn news_item(&self, id: NewsId) -> ServiceResult<NewsWithAuthor> {
        self.store
            .news_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("news"))
    }

    #[instrument(skip(self, principal, content), fields(user_id = %principal.user_id()))]
    pub async fn create_news(&self, principal: &PrincipalContext, content: NewsContent) -> ServiceResult<NewsWithAuthor> {
        authz::require_staff(principal)?;
        let content = content.validate()?;

        let article = NewsArticle::draft(content, principal.user_id(), Utc::now());
        self.store.insert_news(&article).await?;

        tracing::info!(news_id = %article.news_id, "news created");
        self.news_item(article.news_id).await
    }

    pub async fn update_news(
        &self,
        principal: &PrincipalContext,
        id: NewsId,
        content: NewsContent,
    ) -> ServiceResult<NewsWithAuthor> {
        authz::require_staff(principal)?;
        let content = content.validate()?;
        self.modify_news(id, |article, now| article.edit(content, now)).await
    }

    pub async fn publish_news(&self, principal: &PrincipalContext, id: NewsId) -> ServiceResult<NewsWithAuthor> {
        authz::require_staff(principal)?;
        self.modify_news(id, |article, now| article.publish(now)).await
    }

    pub async fn unpublish_news(&self, principal: &PrincipalContext, id: NewsId) -> ServiceResult<NewsWithAuthor> {
        authz::require_staff(principal)?;
        self.modify_news(id, |article, now| article.unpublish(now)).await
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub async fn delete_news(&self, principal: &PrincipalContext, id: NewsId) -> ServiceResult<()> {
        authz::require_staff(principal)?;
        if !self.store.delete_news(id).await? {
            return Err(ServiceError::not_found("news"));
        }
        tracing::info!("news deleted");
        Ok(())
    }

    async fn modify_news(
        &self,
        id: NewsId,
        change: impl FnOnce(&mut NewsArticle, DateTime<Utc>),
    ) -> ServiceResult<NewsWithAuthor> {
        let mut article = self.news_item(id).await?.article;
        change(&mut article, Utc::now());
        if !self.store.update_news(&article).await? {
            return Err(ServiceError::not_found("news"));
        }
        self.news_item(id).await
    }
}

fn email_taken() -> ServiceError {
    ServiceError::Conflict("user with this email already exists".into())
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthenticated("invalid credentials".into())
}
