/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules so
/// access control is applied explicitly at the module level (via Axum
/// layers) rather than per route, keeping protected endpoints from being
/// exposed by accident.
///
/// The three modules map directly to the access roles.

/// Routes accessible to all clients (anonymous, mostly read-only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session.
pub mod authenticated;

/// Routes restricted to accounts with the 'admin' role.
/// Every handler performs the role check itself.
pub mod admin;
