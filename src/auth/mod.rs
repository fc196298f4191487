//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Credential hashing and verification
//! - JWT signing and validation
//! - Access/refresh token pair issuance
//! - Role and ownership access decisions
//! - The authentication gate and `AuthContext` extractor for protected routes

pub mod access;
pub mod codec;
pub mod context;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
pub mod tokens;
pub mod validators;


pub use context::AuthContext;
pub use routes::auth_routes;
