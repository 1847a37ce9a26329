pub mod auth;

pub use auth::require_operator_token;
