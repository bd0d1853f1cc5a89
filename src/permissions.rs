//! RBAC permission bitmasks.
//!
//! A user's effective permissions are the bitwise OR of the masks carried by
//! their roles. The sentinel value -1 (ADMIN) satisfies every check.

/// Permission bitmask. Stored in the database as a signed 64-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission(pub i64);

// --- User management ---
pub const USER_READ: Permission = Permission(1 << 0);
pub const USER_CREATE: Permission = Permission(1 << 1);
pub const USER_UPDATE: Permission = Permission(1 << 2);
pub const USER_DELETE: Permission = Permission(1 << 3);
pub const USER_DISABLE: Permission = Permission(1 << 4);

// --- Application (OAuth client) management ---
pub const APP_READ: Permission = Permission(1 << 8);
pub const APP_UPDATE: Permission = Permission(1 << 10);
pub const APP_DELETE: Permission = Permission(1 << 11);
pub const APP_SECRET_ROTATE: Permission = Permission(1 << 12);

// --- System / config ---
pub const TOKEN_REVOKE: Permission = Permission(1 << 16);
pub const AUDIT_READ: Permission = Permission(1 << 18);
pub const CONFIG_UPDATE: Permission = Permission(1 << 19);
pub const KEY_MANAGE: Permission = Permission(1 << 20);

// --- RBAC / security ---
pub const ROLE_MANAGE: Permission = Permission(1 << 24);
pub const PERMISSION_MANAGE: Permission = Permission(1 << 25);
pub const SESSION_MANAGE: Permission = Permission(1 << 26);
pub const MFA_MANAGE: Permission = Permission(1 << 27);

// --- Announcements ---
pub const ANNOUNCEMENT_CREATE: Permission = Permission(1 << 32);
pub const ANNOUNCEMENT_UPDATE: Permission = Permission(1 << 33);
pub const ANNOUNCEMENT_DELETE: Permission = Permission(1 << 34);
pub const ANNOUNCEMENT_PIN: Permission = Permission(1 << 35);

/// System administrator: every bit set.
pub const ADMIN: Permission = Permission(-1);

pub const NONE: Permission = Permission(0);

impl Permission {
    pub fn has(self, required: Permission) -> bool {
        if self == ADMIN {
            return true;
        }
        (self.0 & required.0) == required.0
    }

    pub fn union(self, other: Permission) -> Permission {
        Permission(self.0 | other.0)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Permission required to grant a single scope. Scopes that need no
/// permission map to the empty mask. The table is fixed at compile time.
pub fn scope_permission(scope: &str) -> Permission {
    match scope {
        "openid" | "profile" | "email" => NONE,
        "announcements.write" => ANNOUNCEMENT_CREATE.union(ANNOUNCEMENT_UPDATE),
        "announcements.delete" => ANNOUNCEMENT_DELETE,
        _ => NONE,
    }
}

/// Union of the permissions required by every scope in a space-separated
/// scope string.
pub fn required_for_scopes(scope: &str) -> Permission {
    crate::utils::scope::split_scopes(scope)
        .into_iter()
        .fold(NONE, |acc, s| acc.union(scope_permission(s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_satisfies_everything() {
        assert!(ADMIN.has(USER_READ));
        assert!(ADMIN.has(ANNOUNCEMENT_DELETE));
        assert!(ADMIN.has(Permission(i64::MAX)));
    }

    #[test]
    fn test_has_requires_all_bits() {
        let mask = USER_READ.union(USER_CREATE);
        assert!(mask.has(USER_READ));
        assert!(mask.has(mask));
        assert!(!mask.has(USER_DELETE));
        assert!(!USER_READ.has(mask));
    }

    #[test]
    fn test_basic_scopes_need_no_permission() {
        assert!(required_for_scopes("openid profile email").is_none());
    }

    #[test]
    fn test_announcement_scopes_require_bits() {
        let required = required_for_scopes("openid announcements.write");
        assert_eq!(required, ANNOUNCEMENT_CREATE.union(ANNOUNCEMENT_UPDATE));

        let required = required_for_scopes("announcements.write announcements.delete");
        assert!(required.has(ANNOUNCEMENT_CREATE));
        assert!(required.has(ANNOUNCEMENT_UPDATE));
        assert!(required.has(ANNOUNCEMENT_DELETE));
    }

    #[test]
    fn test_unknown_scope_maps_to_none() {
        assert!(required_for_scopes("unknown.scope").is_none());
    }
}
