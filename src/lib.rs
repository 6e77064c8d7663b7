//! Customer feedback service: public submission, filtered admin listing and
//! dashboard analytics over a pluggable record store.

pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
