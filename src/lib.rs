//! Authentication and session lifecycle for the chirpy service: argon2
//! password credentials, HS256 access tokens, persisted refresh tokens and
//! the ownership check that guards mutations.

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
