// Users module - identity read endpoints guarded by role/ownership rules

pub mod handlers;
pub mod routes;

pub use routes::users_routes;
