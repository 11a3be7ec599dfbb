use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use carkeeper_configurator::{Configuration, ConfigurationDetails, ConfigurationStatus};
use carkeeper_core::{ConfigurationId, Money, OrderId, UserId};

/// Order status lifecycle. Independent of the configuration status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("configuration must be in 'draft' or 'confirmed' status to be ordered (current: '{0}')")]
    NotOrderable(ConfigurationStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub configuration_id: ConfigurationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<UserId>,
    pub status: OrderStatus,
    pub final_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Place a `pending` order for a configuration at its current price.
    ///
    /// Only `draft` and `confirmed` configurations can be ordered. The caller
    /// is responsible for moving the configuration to `ordered` in the same
    /// unit of work.
    pub fn place(
        user_id: UserId,
        configuration: &Configuration,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        match configuration.status {
            ConfigurationStatus::Draft | ConfigurationStatus::Confirmed => {}
            other => return Err(OrderError::NotOrderable(other)),
        }

        Ok(Self {
            order_id: OrderId::new(),
            user_id,
            configuration_id: configuration.configuration_id,
            manager_id: None,
            status: OrderStatus::Pending,
            final_price: configuration.total_price,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// An order with its configuration and the assigned manager's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub configuration: ConfigurationDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use carkeeper_configurator::ConfigurationDraft;
    use carkeeper_core::{ColorId, TrimId};

    fn configuration(status: ConfigurationStatus) -> Configuration {
        let draft = ConfigurationDraft::new(TrimId::new(), ColorId::new(), vec![]);
        let mut c = Configuration::new_draft(UserId::new(), &draft, Money::new(31_700), Utc::now());
        c.set_status(status, Utc::now());
        c
    }

    #[test]
    fn placed_order_is_pending_at_configuration_price() {
        let c = configuration(ConfigurationStatus::Confirmed);
        let order = Order::place(c.user_id, &c, Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.final_price, Money::new(31_700));
        assert_eq!(order.configuration_id, c.configuration_id);
        assert!(order.is_owned_by(c.user_id));
    }

    #[test]
    fn only_draft_or_confirmed_configurations_are_orderable() {
        for status in ConfigurationStatus::ALL {
            let c = configuration(status);
            let placed = Order::place(c.user_id, &c, Utc::now());
            match status {
                ConfigurationStatus::Draft | ConfigurationStatus::Confirmed => assert!(placed.is_ok()),
                other => assert_eq!(placed, Err(OrderError::NotOrderable(other))),
            }
        }
    }

    #[test]
    fn order_serializes_flat_without_unassigned_manager() {
        let c = configuration(ConfigurationStatus::Draft);
        let order = Order::place(c.user_id, &c, Utc::now()).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["final_price"], 31_700);
        assert_eq!(json["configuration_id"], c.configuration_id.to_string());
        assert!(json.get("manager_id").is_none());
    }

    #[test]
    fn parse_rejects_configuration_literals() {
        assert_eq!("paid".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
        assert_eq!(
            "ordered".parse::<OrderStatus>(),
            Err(OrderError::InvalidStatus("ordered".into()))
        );
    }
}
