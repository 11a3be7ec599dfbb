//! Saved configurations and their lifecycle.
//!
//! States: `draft`, `confirmed`, `ordered`, `cancelled`, `purchased`.
//!
//! - created in `draft`
//! - a status-only update may move between any two states
//! - trim/color/options may only be revised while `draft`
//! - only a `draft` may be deleted
//! - placing an order moves the configuration to `ordered`

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{ColorId, ConfigurationId, Money, OptionId, TrimId, UserId};

use crate::{ConfiguratorError, EquipmentOption};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationStatus {
    #[default]
    Draft,
    Confirmed,
    Ordered,
    Cancelled,
    Purchased,
}

impl ConfigurationStatus {
    pub const ALL: [ConfigurationStatus; 5] = [
        ConfigurationStatus::Draft,
        ConfigurationStatus::Confirmed,
        ConfigurationStatus::Ordered,
        ConfigurationStatus::Cancelled,
        ConfigurationStatus::Purchased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationStatus::Draft => "draft",
            ConfigurationStatus::Confirmed => "confirmed",
            ConfigurationStatus::Ordered => "ordered",
            ConfigurationStatus::Cancelled => "cancelled",
            ConfigurationStatus::Purchased => "purchased",
        }
    }

    /// Trim, color and options are only editable in draft.
    pub fn is_modifiable(&self) -> bool {
        matches!(self, ConfigurationStatus::Draft)
    }
}

impl core::fmt::Display for ConfigurationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationStatus {
    type Err = ConfiguratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConfiguratorError::InvalidStatus(s.to_string()))
    }
}

/// Requested trim, color and options for a create or full update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigurationDraft {
    pub trim_id: TrimId,
    pub color_id: ColorId,
    #[serde(default)]
    pub option_ids: Vec<OptionId>,
}

impl ConfigurationDraft {
    pub fn new(trim_id: TrimId, color_id: ColorId, option_ids: Vec<OptionId>) -> Self {
        Self {
            trim_id,
            color_id,
            option_ids,
        }
        .dedup_options()
    }

    /// Collapse repeated option ids, keeping first occurrence order.
    pub fn dedup_options(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.option_ids.len());
        self.option_ids.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        self
    }
}

/// A user's saved configuration with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub configuration_id: ConfigurationId,
    pub user_id: UserId,
    pub trim_id: TrimId,
    pub color_id: ColorId,
    pub status: ConfigurationStatus,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Configuration {
    /// A fresh draft owned by `user_id`.
    pub fn new_draft(
        user_id: UserId,
        draft: &ConfigurationDraft,
        total_price: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            configuration_id: ConfigurationId::new(),
            user_id,
            trim_id: draft.trim_id,
            color_id: draft.color_id,
            status: ConfigurationStatus::Draft,
            total_price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn ensure_revisable(&self) -> Result<(), ConfiguratorError> {
        if self.status.is_modifiable() {
            Ok(())
        } else {
            Err(ConfiguratorError::InvalidState {
                action: "update",
                status: self.status,
            })
        }
    }

    pub fn ensure_deletable(&self) -> Result<(), ConfiguratorError> {
        if self.status.is_modifiable() {
            Ok(())
        } else {
            Err(ConfiguratorError::InvalidState {
                action: "delete",
                status: self.status,
            })
        }
    }

    /// Replace trim, color and price. Leaves `self` untouched on error.
    pub fn revise(
        &mut self,
        draft: &ConfigurationDraft,
        total_price: Money,
        now: DateTime<Utc>,
    ) -> Result<(), ConfiguratorError> {
        self.ensure_revisable()?;
        self.trim_id = draft.trim_id;
        self.color_id = draft.color_id;
        self.total_price = total_price;
        self.updated_at = now;
        Ok(())
    }

    /// Status-only update. Never touches the price.
    pub fn set_status(&mut self, status: ConfigurationStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// A configuration joined with trim and color names and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationDetails {
    #[serde(flatten)]
    pub configuration: Configuration,
    pub trim_name: String,
    pub color_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    pub options: Vec<EquipmentOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriceCalculator;

    fn draft() -> ConfigurationDraft {
        ConfigurationDraft::new(TrimId::new(), ColorId::new(), vec![])
    }

    fn configuration() -> Configuration {
        let total = PriceCalculator::compute(
            Money::new(30_000),
            Money::new(500),
            &[Money::new(1_000), Money::new(200)],
        );
        Configuration::new_draft(UserId::new(), &draft(), total, Utc::now())
    }

    #[test]
    fn new_configuration_is_draft() {
        let c = configuration();
        assert_eq!(c.status, ConfigurationStatus::Draft);
        assert_eq!(c.total_price, Money::new(31_700));
    }

    #[test]
    fn parse_accepts_exactly_the_five_literals() {
        for status in ConfigurationStatus::ALL {
            assert_eq!(status.as_str().parse::<ConfigurationStatus>(), Ok(status));
        }
        assert_eq!(
            "unknown".parse::<ConfigurationStatus>(),
            Err(ConfiguratorError::InvalidStatus("unknown".into()))
        );
        assert!("Draft".parse::<ConfigurationStatus>().is_err());
        assert!("".parse::<ConfigurationStatus>().is_err());
    }

    #[test]
    fn draft_can_be_revised_until_confirmed() {
        let mut c = configuration();
        let next = draft();
        c.revise(&next, Money::new(40_000), Utc::now()).unwrap();
        assert_eq!(c.trim_id, next.trim_id);
        assert_eq!(c.total_price, Money::new(40_000));

        c.set_status(ConfigurationStatus::Confirmed, Utc::now());
        let before = c.clone();
        let err = c.revise(&draft(), Money::new(1), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            ConfiguratorError::InvalidState { status: ConfigurationStatus::Confirmed, .. }
        ));
        assert_eq!(c, before);
    }

    #[test]
    fn only_drafts_are_deletable() {
        let mut c = configuration();
        assert!(c.ensure_deletable().is_ok());
        c.set_status(ConfigurationStatus::Confirmed, Utc::now());
        assert!(matches!(
            c.ensure_deletable(),
            Err(ConfiguratorError::InvalidState { action: "delete", .. })
        ));
    }

    #[test]
    fn status_change_keeps_price() {
        let mut c = configuration();
        c.set_status(ConfigurationStatus::Purchased, Utc::now());
        assert_eq!(c.total_price, Money::new(31_700));
        // Any state may move to any other through a status-only update.
        c.set_status(ConfigurationStatus::Draft, Utc::now());
        assert!(c.ensure_revisable().is_ok());
    }

    #[test]
    fn duplicate_options_collapse_in_order() {
        let a = OptionId::new();
        let b = OptionId::new();
        let d = ConfigurationDraft::new(TrimId::new(), ColorId::new(), vec![a, b, a, b, a]);
        assert_eq!(d.option_ids, vec![a, b]);
    }

    #[test]
    fn details_serialize_flat_with_lowercase_status() {
        let details = ConfigurationDetails {
            configuration: configuration(),
            trim_name: "Comfort".into(),
            color_name: "Red".into(),
            color_hex: None,
            options: vec![],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "draft");
        assert_eq!(json["total_price"], 31_700);
        assert!(json.get("color_hex").is_none());
    }
}
