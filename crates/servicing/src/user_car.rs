use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{ColorId, DomainError, DomainResult, TrimId, UserCarId, UserId};

pub const VIN_LEN: usize = 17;
pub const MIN_YEAR: i32 = 1900;

/// A car owned by a customer, registered for servicing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCar {
    pub user_car_id: UserCarId,
    pub user_id: UserId,
    pub trim_id: TrimId,
    pub color_id: ColorId,
    pub vin: String,
    pub year: i32,
    pub current_mileage: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl UserCar {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Car registration request. `purchase_date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCar {
    pub trim_id: TrimId,
    pub color_id: ColorId,
    pub vin: String,
    pub year: i32,
    #[serde(default)]
    pub current_mileage: i32,
    #[serde(default)]
    pub purchase_date: Option<String>,
}

impl RegisterCar {
    /// Validate the request into a car owned by `user_id`.
    pub fn into_car(self, user_id: UserId, now: DateTime<Utc>) -> DomainResult<UserCar> {
        let vin = self.vin.trim().to_uppercase();
        if vin.chars().count() != VIN_LEN {
            return Err(DomainError::validation(format!(
                "vin must be exactly {VIN_LEN} characters"
            )));
        }
        if self.year < MIN_YEAR {
            return Err(DomainError::validation(format!("year must be at least {MIN_YEAR}")));
        }
        if self.current_mileage < 0 {
            return Err(DomainError::validation("current_mileage must not be negative"));
        }

        let purchase_date = match self.purchase_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                DomainError::validation("purchase_date must be formatted as YYYY-MM-DD")
            })?),
        };

        Ok(UserCar {
            user_car_id: UserCarId::new(),
            user_id,
            trim_id: self.trim_id,
            color_id: self.color_id,
            vin,
            year: self.year,
            current_mileage: self.current_mileage,
            purchase_date,
            created_at: now,
        })
    }
}

/// A user car with trim, brand, model and color names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCarDetails {
    #[serde(flatten)]
    pub car: UserCar,
    pub trim_name: String,
    pub brand_name: String,
    pub model_name: String,
    pub color_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterCar {
        RegisterCar {
            trim_id: TrimId::new(),
            color_id: ColorId::new(),
            vin: "1hgcm82633a004352".into(),
            year: 2019,
            current_mileage: 42_000,
            purchase_date: Some("2019-05-14".into()),
        }
    }

    #[test]
    fn valid_request_becomes_car() {
        let owner = UserId::new();
        let car = request().into_car(owner, Utc::now()).unwrap();
        assert_eq!(car.vin, "1HGCM82633A004352");
        assert_eq!(car.purchase_date, NaiveDate::from_ymd_opt(2019, 5, 14));
        assert!(car.is_owned_by(owner));
    }

    #[test]
    fn vin_must_be_seventeen_characters() {
        let mut r = request();
        r.vin = "SHORT".into();
        assert!(matches!(r.into_car(UserId::new(), Utc::now()), Err(DomainError::Validation(m)) if m.contains("vin")));
    }

    #[test]
    fn year_and_mileage_bounds() {
        let mut r = request();
        r.year = 1899;
        assert!(r.into_car(UserId::new(), Utc::now()).is_err());

        let mut r = request();
        r.current_mileage = -1;
        assert!(r.into_car(UserId::new(), Utc::now()).is_err());

        let mut r = request();
        r.year = 1900;
        r.current_mileage = 0;
        assert!(r.into_car(UserId::new(), Utc::now()).is_ok());
    }

    #[test]
    fn purchase_date_format_is_checked() {
        let mut r = request();
        r.purchase_date = Some("14.05.2019".into());
        assert!(matches!(r.into_car(UserId::new(), Utc::now()), Err(DomainError::Validation(m)) if m.contains("purchase_date")));

        let mut r = request();
        r.purchase_date = Some(String::new());
        assert_eq!(r.into_car(UserId::new(), Utc::now()).unwrap().purchase_date, None);
    }
}
