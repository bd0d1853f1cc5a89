use std::fmt;

/// Closed set of audit actions matching the database enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    Login,
    Logout,
    Authorization,
}

impl AuditAction {
    /// Map an arbitrary action string onto the closed set; anything
    /// unrecognized becomes AUTHORIZATION.
    pub fn normalize(action: &str) -> Self {
        match action.to_ascii_uppercase().as_str() {
            "CREATE" => Self::Create,
            "READ" => Self::Read,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "LOGIN" => Self::Login,
            "LOGOUT" => Self::Logout,
            "AUTHORIZATION" => Self::Authorization,
            _ => Self::Authorization,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::Authorization => "AUTHORIZATION",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry. `details` is a JSON document serialized by the sink.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<String>,
    pub application_id: Option<String>,
    pub session_id: Option<String>,
    pub action: AuditAction,
    pub target_resource: String,
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_actions() {
        assert_eq!(AuditAction::normalize("create"), AuditAction::Create);
        assert_eq!(AuditAction::normalize("LOGIN"), AuditAction::Login);
        assert_eq!(AuditAction::normalize("Delete"), AuditAction::Delete);
    }

    #[test]
    fn test_normalize_unknown_falls_back_to_authorization() {
        assert_eq!(AuditAction::normalize("CONSENT"), AuditAction::Authorization);
        assert_eq!(AuditAction::normalize(""), AuditAction::Authorization);
    }
}
