/// Request boundary: validation, status mapping, and the HTTP routes.
///
/// `handlers` is transport-neutral and returns an [`handlers::ApiResponse`];
/// `server` binds those handlers to axum.

pub mod handlers;
pub mod server;
