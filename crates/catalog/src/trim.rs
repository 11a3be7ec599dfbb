use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{
    BrandId, DriveTypeId, EngineTypeId, GenerationId, ModelId, Money, TransmissionId, TrimId,
};

/// A purchasable equipment level of a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trim {
    pub trim_id: TrimId,
    pub generation_id: GenerationId,
    pub name: String,
    pub base_price: Money,
    pub engine_type_id: EngineTypeId,
    pub transmission_id: TransmissionId,
    pub drive_type_id: DriveTypeId,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A trim joined with the names of everything it hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimDetails {
    #[serde(flatten)]
    pub trim: Trim,
    pub brand_id: BrandId,
    pub brand_name: String,
    pub model_id: ModelId,
    pub model_name: String,
    pub generation_name: String,
    pub engine_type: String,
    pub transmission: String,
    pub drive_type: String,
}

/// Trim search criteria. Empty id lists mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimFilter {
    pub brand_ids: Vec<BrandId>,
    pub engine_type_ids: Vec<EngineTypeId>,
    pub transmission_ids: Vec<TransmissionId>,
    pub drive_type_ids: Vec<DriveTypeId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub is_available: Option<bool>,
}

impl TrimFilter {
    pub fn matches(&self, details: &TrimDetails) -> bool {
        let trim = &details.trim;
        any_or_contains(&self.brand_ids, &details.brand_id)
            && any_or_contains(&self.engine_type_ids, &trim.engine_type_id)
            && any_or_contains(&self.transmission_ids, &trim.transmission_id)
            && any_or_contains(&self.drive_type_ids, &trim.drive_type_id)
            && self.min_price.is_none_or(|min| trim.base_price >= min)
            && self.max_price.is_none_or(|max| trim.base_price <= max)
            && self.is_available.is_none_or(|a| trim.is_available == a)
    }
}

fn any_or_contains<T: PartialEq>(allowed: &[T], value: &T) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

/// Parse a comma separated id list, skipping blank and unparsable entries.
pub fn parse_id_list<T: FromStr>(raw: &str) -> Vec<T> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(price: i64, available: bool) -> TrimDetails {
        let now = Utc::now();
        TrimDetails {
            trim: Trim {
                trim_id: TrimId::new(),
                generation_id: GenerationId::new(),
                name: "Comfort".into(),
                base_price: Money::new(price),
                engine_type_id: EngineTypeId::new(),
                transmission_id: TransmissionId::new(),
                drive_type_id: DriveTypeId::new(),
                is_available: available,
                created_at: now,
                updated_at: now,
            },
            brand_id: BrandId::new(),
            brand_name: "Toyota".into(),
            model_id: ModelId::new(),
            model_name: "Camry".into(),
            generation_name: "XV70".into(),
            engine_type: "Petrol".into(),
            transmission: "Automatic".into(),
            drive_type: "FWD".into(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(TrimFilter::default().matches(&details(1, false)));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let d = details(30_000, true);
        let filter = TrimFilter {
            min_price: Some(Money::new(30_000)),
            max_price: Some(Money::new(30_000)),
            ..Default::default()
        };
        assert!(filter.matches(&d));

        let filter = TrimFilter {
            max_price: Some(Money::new(29_999)),
            ..Default::default()
        };
        assert!(!filter.matches(&d));
    }

    #[test]
    fn id_lists_restrict_results() {
        let d = details(100, true);
        let filter = TrimFilter {
            brand_ids: vec![BrandId::new()],
            ..Default::default()
        };
        assert!(!filter.matches(&d));

        let filter = TrimFilter {
            brand_ids: vec![BrandId::new(), d.brand_id],
            is_available: Some(true),
            ..Default::default()
        };
        assert!(filter.matches(&d));
    }

    #[test]
    fn parse_id_list_skips_garbage() {
        let a = BrandId::new();
        let b = BrandId::new();
        let raw = format!("{a}, nope ,,{b}");
        assert_eq!(parse_id_list::<BrandId>(&raw), vec![a, b]);
        assert!(parse_id_list::<BrandId>("").is_empty());
    }

    #[test]
    fn details_serialize_flat() {
        let json = serde_json::to_value(details(500, true)).unwrap();
        assert_eq!(json["base_price"], 500);
        assert_eq!(json["brand_name"], "Toyota");
        assert!(json.get("trim").is_none());
    }
}
