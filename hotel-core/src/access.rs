//! Role-based access gate.
//!
//! Roles are a closed set and are *not* ordered: every operation declares the
//! exact set of roles it admits through a [`Policy`], and [`authorize`] is the
//! single place that evaluates it.

use std::fmt;

use uuid::Uuid;

use crate::error::ServiceError;

crate::sql_enum! {
    pub enum Role => crate::schema::sql_types::UserRole {
        Guest = "guest",
        Waiter = "waiter",
        Staff = "staff",
        Admin = "admin",
    }
}

impl Role {
    const fn bit(self) -> u8 {
        match self {
            Role::Guest => 0b0001,
            Role::Waiter => 0b0010,
            Role::Staff => 0b0100,
            Role::Admin => 0b1000,
        }
    }
}

/// Explicit set of roles admitted by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EVERYONE: RoleSet = RoleSet::of(&[Role::Guest, Role::Waiter, Role::Staff, Role::Admin]);
    pub const WAITER_OR_ABOVE: RoleSet = RoleSet::of(&[Role::Waiter, Role::Staff, Role::Admin]);
    pub const NOT_GUEST: RoleSet = RoleSet::of(&[Role::Waiter, Role::Staff, Role::Admin]);
    pub const STAFF_OR_ADMIN: RoleSet = RoleSet::of(&[Role::Staff, Role::Admin]);
    pub const ADMIN_ONLY: RoleSet = RoleSet::of(&[Role::Admin]);
    pub const NOT_WAITER: RoleSet = RoleSet::of(&[Role::Guest, Role::Staff, Role::Admin]);

    pub const fn of(roles: &[Role]) -> RoleSet {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.iter().copied().filter(|r| self.contains(*r))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().map(|r| r.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Whoever is invoking an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Unauthenticated caller; acts with the guest role.
    Anonymous,
    User { id: Uuid, role: Role },
}

impl Actor {
    pub fn user(id: Uuid, role: Role) -> Self {
        Actor::User { id, role }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Anonymous => Role::Guest,
            Actor::User { role, .. } => *role,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::User { id, .. } => Some(*id),
        }
    }

    /// Identity of an authenticated actor; anonymous callers get `Unauthenticated`.
    pub fn require_user_id(&self) -> Result<Uuid, ServiceError> {
        self.user_id().ok_or(ServiceError::Unauthenticated)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub operation: &'static str,
    pub allowed: RoleSet,
    pub allow_anonymous: bool,
}

impl Policy {
    pub const fn authenticated(operation: &'static str, allowed: RoleSet) -> Self {
        Policy {
            operation,
            allowed,
            allow_anonymous: false,
        }
    }

    pub const fn public(operation: &'static str) -> Self {
        Policy {
            operation,
            allowed: RoleSet::EVERYONE,
            allow_anonymous: true,
        }
    }
}

pub fn authorize(actor: &Actor, policy: &Policy) -> Result<(), ServiceError> {
    if matches!(actor, Actor::Anonymous) && !policy.allow_anonymous {
        return Err(ServiceError::Unauthenticated);
    }
    let role = actor.role();
    if !policy.allowed.contains(role) {
        tracing::debug!(
            operation = policy.operation,
            role = %role,
            required = %policy.allowed,
            "access denied"
        );
        return Err(ServiceError::Forbidden {
            required: policy.allowed,
            actual: role,
        });
    }
    Ok(())
}

/// Declared access rules for every core operation.
pub mod policies {
    use super::{Policy, RoleSet};

    // Menu catalog
    pub const VIEW_MENU: Policy = Policy::public("view_menu");
    pub const MANAGE_MENU: Policy = Policy::authenticated("manage_menu", RoleSet::ADMIN_ONLY);

    // Table registry
    pub const VIEW_TABLES: Policy = Policy::public("view_tables");
    pub const MANAGE_TABLES: Policy = Policy::authenticated("manage_tables", RoleSet::ADMIN_ONLY);
    pub const CHANGE_TABLE_STATUS: Policy =
        Policy::authenticated("change_table_status", RoleSet::WAITER_OR_ABOVE);
    pub const VIEW_TABLE_REPORTS: Policy =
        Policy::authenticated("view_table_reports", RoleSet::ADMIN_ONLY);

    // Orders
    pub const PLACE_ORDER: Policy = Policy::public("place_order");
    pub const TRACK_ORDER: Policy = Policy::public("track_order");
    pub const VIEW_ORDER: Policy = Policy::authenticated("view_order", RoleSet::EVERYONE);
    pub const VIEW_OWN_ORDERS: Policy = Policy::authenticated("view_own_orders", RoleSet::EVERYONE);
    pub const VIEW_ALL_ORDERS: Policy =
        Policy::authenticated("view_all_orders", RoleSet::WAITER_OR_ABOVE);
    pub const UPDATE_ORDER_STATUS: Policy =
        Policy::authenticated("update_order_status", RoleSet::WAITER_OR_ABOVE);
    pub const UPDATE_ORDER_PAYMENT: Policy =
        Policy::authenticated("update_order_payment", RoleSet::WAITER_OR_ABOVE);
    pub const SELF_ASSIGN_ORDER: Policy =
        Policy::authenticated("self_assign_order", RoleSet::WAITER_OR_ABOVE);
    pub const ASSIGN_ORDER: Policy = Policy::authenticated("assign_order", RoleSet::ADMIN_ONLY);
    pub const RATE_ORDER: Policy = Policy::authenticated("rate_order", RoleSet::EVERYONE);
    pub const VIEW_ORDER_REPORTS: Policy =
        Policy::authenticated("view_order_reports", RoleSet::ADMIN_ONLY);

    // Room bookings
    pub const CREATE_ROOM_BOOKING: Policy =
        Policy::authenticated("create_room_booking", RoleSet::NOT_WAITER);
    pub const MANAGE_ROOM_BOOKINGS: Policy =
        Policy::authenticated("manage_room_bookings", RoleSet::STAFF_OR_ADMIN);

    // Event bookings
    pub const CREATE_EVENT_BOOKING: Policy =
        Policy::authenticated("create_event_booking", RoleSet::NOT_GUEST);
    pub const MANAGE_EVENT_BOOKINGS: Policy =
        Policy::authenticated("manage_event_bookings", RoleSet::STAFF_OR_ADMIN);

    pub const VIEW_OWN_BOOKINGS: Policy =
        Policy::authenticated("view_own_bookings", RoleSet::EVERYONE);
    pub const CHECK_AVAILABILITY: Policy = Policy::public("check_availability");
    pub const VIEW_VENUES: Policy = Policy::public("view_venues");
    pub const MANAGE_VENUES: Policy = Policy::authenticated("manage_venues", RoleSet::STAFF_OR_ADMIN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn user(role: Role) -> Actor {
        Actor::user(Uuid::new_v4(), role)
    }

    #[test]
    fn test_role_sets_are_explicit() {
        assert!(!RoleSet::WAITER_OR_ABOVE.contains(Role::Guest));
        assert!(RoleSet::WAITER_OR_ABOVE.contains(Role::Waiter));
        assert!(RoleSet::STAFF_OR_ADMIN.contains(Role::Admin));
        assert!(!RoleSet::STAFF_OR_ADMIN.contains(Role::Waiter));
        assert!(!RoleSet::NOT_WAITER.contains(Role::Waiter));
        assert!(RoleSet::NOT_WAITER.contains(Role::Guest));
    }

    #[test]
    fn test_waiter_cannot_manage_room_bookings() {
        let err = authorize(&user(Role::Waiter), &policies::MANAGE_ROOM_BOOKINGS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        match err {
            ServiceError::Forbidden { required, actual } => {
                assert_eq!(required, RoleSet::STAFF_OR_ADMIN);
                assert_eq!(actual, Role::Waiter);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_waiter_cannot_create_room_booking() {
        assert!(authorize(&user(Role::Waiter), &policies::CREATE_ROOM_BOOKING).is_err());
        assert!(authorize(&user(Role::Guest), &policies::CREATE_ROOM_BOOKING).is_ok());
    }

    #[test]
    fn test_anonymous_actor() {
        assert!(authorize(&Actor::Anonymous, &policies::PLACE_ORDER).is_ok());
        let err = authorize(&Actor::Anonymous, &policies::RATE_ORDER).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_admin_only() {
        assert!(authorize(&user(Role::Admin), &policies::ASSIGN_ORDER).is_ok());
        assert!(authorize(&user(Role::Staff), &policies::ASSIGN_ORDER).is_err());
    }

    #[test]
    fn test_role_set_display() {
        assert_eq!(RoleSet::WAITER_OR_ABOVE.to_string(), "waiter, staff, admin");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert!("manager".parse::<Role>().is_err());
    }
}
