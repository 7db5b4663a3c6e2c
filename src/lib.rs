//! Request-authentication gate for axum.
//!
//! A JWT is looked up in a header, then the JSON body, then a cookie (all under the same
//! configured field name), verified, and its claims attached to the request as
//! [`services::auth::JwtContext`]. Anything else gets a generic 401.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
