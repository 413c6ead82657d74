//! # Data Transfer Objects
//!
//! Request and response types exchanged with API clients.

pub mod auth;
pub mod users;
