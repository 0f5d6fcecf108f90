//! Static route authorization table.

use axum::http::Method;

pub const VIEW_ROLES: &[&str] = &["ADMIN", "MANAGER", "ACCOUNTANT", "FINANCIAL_VIEWER", "SALES"];
pub const EDIT_ROLES: &[&str] = &["ADMIN", "ACCOUNTANT", "SALES"];
pub const STATUS_ROLES: &[&str] = &["ADMIN", "ACCOUNTANT", "SALES", "MANAGER"];
pub const DELETE_ROLES: &[&str] = &["ADMIN"];

/// Paths served without any identity (probes only).
pub fn is_public(path: &str) -> bool {
    matches!(path, "/health" | "/ready")
}

/// Role sets required for a route, most specific pattern first. `None`
/// means any authenticated identity is enough.
pub fn required_roles(method: &Method, path: &str) -> Option<&'static [&'static str]> {
    let receivables = path == "/receivables" || path.starts_with("/receivables/");
    if !receivables {
        return None;
    }

    match *method {
        // Creation is matched on the exact collection path; POSTs to
        // sub-resources fall through to the authenticated-only default.
        Method::POST if path == "/receivables" => Some(EDIT_ROLES),
        Method::GET => Some(VIEW_ROLES),
        Method::PUT => Some(EDIT_ROLES),
        Method::PATCH => Some(STATUS_ROLES),
        Method::DELETE => Some(DELETE_ROLES),
        _ => None,
    }
}

/// Allow/deny for an already-authenticated caller. Callers without a
/// validated identity must be rejected before this point.
pub fn is_allowed(method: &Method, path: &str, roles: &[String]) -> bool {
    match required_roles(method, path) {
        Some(required) => roles.iter().any(|role| required.contains(&role.as_str())),
        None => true,
    }
}
