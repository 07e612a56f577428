pub mod diff;
pub mod middleware;
pub mod snapshot;

pub use middleware::audit_capture;

use axum::body::Bytes;
use http::Method;
use std::collections::HashMap;
use std::fmt;

/// What a request did to the resource, derived from its HTTP method.
///
/// The derivation is total over the persisted enum: methods outside the
/// mapping (HEAD, OPTIONS, ...) yield `None` and the capture middleware
/// degrades to a pass-through, so nothing outside these four variants can
/// ever reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
}

impl AuditAction {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::POST => Some(AuditAction::Create),
            Method::PUT | Method::PATCH => Some(AuditAction::Update),
            Method::DELETE => Some(AuditAction::Delete),
            Method::GET => Some(AuditAction::View),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::View => "view",
        }
    }

    /// Updates and deletes have a pre-mutation state worth snapshotting.
    pub fn captures_before_state(&self) -> bool {
        matches!(self, AuditAction::Update | AuditAction::Delete)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry-phase capture, stored in request extensions before the handler
/// runs. These are owned copies; whatever the handler later does to the
/// live request cannot change them. They are taken once, at entry, and
/// never re-captured.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub resource_type: &'static str,
    pub action: AuditAction,
    pub path_params: HashMap<String, String>,
    pub query: Option<String>,
    pub request_body: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_mapping_matches_action_table() {
        assert_eq!(
            AuditAction::from_method(&Method::POST),
            Some(AuditAction::Create)
        );
        assert_eq!(
            AuditAction::from_method(&Method::PUT),
            Some(AuditAction::Update)
        );
        assert_eq!(
            AuditAction::from_method(&Method::PATCH),
            Some(AuditAction::Update)
        );
        assert_eq!(
            AuditAction::from_method(&Method::DELETE),
            Some(AuditAction::Delete)
        );
        assert_eq!(
            AuditAction::from_method(&Method::GET),
            Some(AuditAction::View)
        );
    }

    #[test]
    fn unmapped_methods_produce_no_action() {
        assert_eq!(AuditAction::from_method(&Method::HEAD), None);
        assert_eq!(AuditAction::from_method(&Method::OPTIONS), None);
        assert_eq!(AuditAction::from_method(&Method::TRACE), None);
    }

    #[test]
    fn only_mutations_capture_before_state() {
        assert!(AuditAction::Update.captures_before_state());
        assert!(AuditAction::Delete.captures_before_state());
        assert!(!AuditAction::Create.captures_before_state());
        assert!(!AuditAction::View.captures_before_state());
    }
}
