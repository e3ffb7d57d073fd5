//! LuxeMarket storefront backend library.
//!
//! This crate provides the backend functionality as a library,
//! allowing it to be tested and reused (the operational CLI links
//! against it for password hashing and migrations).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod services;
pub mod state;
