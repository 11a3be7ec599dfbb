//! API-side authorization guards.
//!
//! Customers act on their own records; staff (manager, admin) may read
//! anyone's and perform the back-office operations.

use carkeeper_core::UserId;

use crate::app::errors::ServiceError;
use crate::context::PrincipalContext;

/// Staff-only operations (order status, news publishing).
pub fn require_staff(principal: &PrincipalContext) -> Result<(), ServiceError> {
    if principal.is_staff() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("staff role required"))
    }
}

/// Mutations: only the owner.
pub fn require_owner(principal: &PrincipalContext, owner: UserId, what: &str) -> Result<(), ServiceError> {
    if principal.user_id() == owner {
        Ok(())
    } else {
        Err(ServiceError::forbidden(format!("{what} belongs to another user")))
    }
}

/// Reads: the owner or staff.
pub fn require_owner_or_staff(
    principal: &PrincipalContext,
    owner: UserId,
    what: &str,
) -> Result<(), ServiceError> {
    if principal.is_staff() {
        return Ok(());
    }
    require_owner(principal, owner, what)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carkeeper_auth::Role;

    #[test]
    fn staff_reads_anything_customers_only_their_own() {
        let owner = UserId::new();
        let customer = PrincipalContext::new(UserId::new(), Role::Customer);
        let manager = PrincipalContext::new(UserId::new(), Role::Manager);

        assert!(require_owner_or_staff(&manager, owner, "order").is_ok());
        assert!(matches!(
            require_owner_or_staff(&customer, owner, "order"),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(require_owner_or_staff(&PrincipalContext::new(owner, Role::Customer), owner, "order").is_ok());
    }

    #[test]
    fn staff_cannot_mutate_someone_elses_record() {
        let admin = PrincipalContext::new(UserId::new(), Role::Admin);
        assert!(require_owner(&admin, UserId::new(), "configuration").is_err());
        assert!(require_staff(&admin).is_ok());
        assert!(require_staff(&PrincipalContext::new(UserId::new(), Role::Customer)).is_err());
    }
}
