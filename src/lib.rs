//! Maptunnel - signed-URL gateway
//!
//! Lets a public map frontend reach internal services (geocoder, trip
//! planner) through short-lived HMAC-signed URLs or edge bearer tokens.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
