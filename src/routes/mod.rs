/// Router Module Index
///
/// Routes are grouped by who may call them. Authentication and page policies are
/// enforced by extractors (`Principal`, `Guarded<P>`), so each group only has to
/// pick the right handlers.

/// Anonymous access: health, the auth flows and the SPA guard endpoint.
pub mod public;

/// Any authenticated principal, resolved or not.
pub mod authenticated;

/// Per-role dashboard data, each handler bound to the policy of its SPA page.
pub mod dashboards;

/// Admin-only, read-only oversight.
pub mod admin;
