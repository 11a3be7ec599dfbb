//! Service appointment booking.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use carkeeper_core::{AppointmentId, BranchId, DomainError, ServiceTypeId, UserCarId, UserId};

use crate::{Branch, ServiceType, UserCar};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown appointment status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAppointment {
    pub service_appointment_id: AppointmentId,
    pub user_car_id: UserCarId,
    pub branch_id: BranchId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<UserId>,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointment {
    pub user_car_id: UserCarId,
    pub branch_id: BranchId,
    #[serde(default)]
    pub service_type_ids: Vec<ServiceTypeId>,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BookAppointment {
    /// Build the `scheduled` appointment. Call after [`check_booking`].
    pub fn into_appointment(self, now: DateTime<Utc>) -> ServiceAppointment {
        ServiceAppointment {
            service_appointment_id: AppointmentId::new(),
            user_car_id: self.user_car_id,
            branch_id: self.branch_id,
            manager_id: None,
            appointment_date: self.appointment_date,
            status: AppointmentStatus::Scheduled,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Requested service types with duplicates collapsed.
    pub fn distinct_service_types(&self) -> Vec<ServiceTypeId> {
        let mut ids = Vec::with_capacity(self.service_type_ids.len());
        for id in &self.service_type_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("user car does not belong to user")]
    NotCarOwner,

    #[error("branch is not active")]
    BranchInactive,

    #[error("at least one service type is required")]
    NoServiceTypes,

    #[error("service type {0} not found or not available")]
    ServiceTypeUnavailable(ServiceTypeId),
}

/// Check a booking against the car, the branch and the service types found
/// for the requested ids.
pub fn check_booking(
    user_id: UserId,
    car: &UserCar,
    branch: &Branch,
    requested: &[ServiceTypeId],
    found: &[ServiceType],
) -> Result<(), BookingError> {
    if !car.is_owned_by(user_id) {
        return Err(BookingError::NotCarOwner);
    }
    if !branch.is_active {
        return Err(BookingError::BranchInactive);
    }
    if requested.is_empty() {
        return Err(BookingError::NoServiceTypes);
    }
    for id in requested {
        let available = found
            .iter()
            .any(|st| st.service_type_id == *id && st.is_available);
        if !available {
            return Err(BookingError::ServiceTypeUnavailable(*id));
        }
    }
    Ok(())
}

/// An appointment joined with car, branch, manager and service types.
///
/// `owner_id` is the owner of the car and drives access checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: ServiceAppointment,
    pub owner_id: UserId,
    pub user_car_vin: String,
    pub branch_name: String,
    pub branch_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    pub service_types: Vec<ServiceType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use carkeeper_core::{ColorId, Money, TrimId};

    fn car(owner: UserId) -> UserCar {
        UserCar {
            user_car_id: UserCarId::new(),
            user_id: owner,
            trim_id: TrimId::new(),
            color_id: ColorId::new(),
            vin: "1HGCM82633A004352".into(),
            year: 2020,
            current_mileage: 10,
            purchase_date: None,
            created_at: Utc::now(),
        }
    }

    fn branch(active: bool) -> Branch {
        Branch {
            branch_id: BranchId::new(),
            name: "North".into(),
            address: "1 Main St".into(),
            phone: None,
            email: None,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service_type(available: bool) -> ServiceType {
        ServiceType {
            service_type_id: ServiceTypeId::new(),
            name: "Oil change".into(),
            category: "maintenance".into(),
            description: None,
            price: Money::new(4_500),
            duration_minutes: Some(30),
            is_available: available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_valid_booking() {
        let owner = UserId::new();
        let st = service_type(true);
        assert_eq!(
            check_booking(owner, &car(owner), &branch(true), &[st.service_type_id], &[st]),
            Ok(())
        );
    }

    #[test]
    fn rejects_foreign_car_and_inactive_branch() {
        let owner = UserId::new();
        let st = service_type(true);
        let ids = [st.service_type_id];
        assert_eq!(
            check_booking(UserId::new(), &car(owner), &branch(true), &ids, &[st.clone()]),
            Err(BookingError::NotCarOwner)
        );
        assert_eq!(
            check_booking(owner, &car(owner), &branch(false), &ids, &[st]),
            Err(BookingError::BranchInactive)
        );
    }

    #[test]
    fn rejects_missing_or_unavailable_service_types() {
        let owner = UserId::new();
        assert_eq!(
            check_booking(owner, &car(owner), &branch(true), &[], &[]),
            Err(BookingError::NoServiceTypes)
        );

        let off = service_type(false);
        assert_eq!(
            check_booking(owner, &car(owner), &branch(true), &[off.service_type_id], &[off.clone()]),
            Err(BookingError::ServiceTypeUnavailable(off.service_type_id))
        );

        let unknown = ServiceTypeId::new();
        assert_eq!(
            check_booking(owner, &car(owner), &branch(true), &[unknown], &[]),
            Err(BookingError::ServiceTypeUnavailable(unknown))
        );
    }

    #[test]
    fn new_appointment_is_scheduled_and_status_uses_snake_case() {
        let a = BookAppointment {
            user_car_id: UserCarId::new(),
            branch_id: BranchId::new(),
            service_type_ids: vec![],
            appointment_date: Utc::now(),
            description: Some("  ".into()),
        }
        .into_appointment(Utc::now());
        assert_eq!(a.status, AppointmentStatus::Scheduled);
        assert_eq!(a.description, None);
        assert_eq!(
            serde_json::to_value(AppointmentStatus::InProgress).unwrap(),
            "in_progress"
        );
        assert_eq!("in_progress".parse::<AppointmentStatus>(), Ok(AppointmentStatus::InProgress));
    }

    #[test]
    fn duplicate_service_types_collapse() {
        let id = ServiceTypeId::new();
        let req = BookAppointment {
            user_car_id: UserCarId::new(),
            branch_id: BranchId::new(),
            service_type_ids: vec![id, id],
            appointment_date: Utc::now(),
            description: None,
        };
        assert_eq!(req.distinct_service_types(), vec![id]);
    }
}
