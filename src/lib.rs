//! # Recipe Costing Server
//!
//! Inventory and recipe cost-of-goods-sold (COGS) backend with passwordless
//! magic-link sign-in, built on Axum, Tokio and PostgreSQL.
//!
//! ## Architecture
//! - `auth`: magic-link and session tokens, the auth middleware
//! - `costing`: unit normalisation, COGS calculation, SKU generation
//! - `database`: the `Store` trait with PostgreSQL and in-memory implementations
//! - `mail`: outbound email (SMTP via lettre)
//! - `routes`: HTTP handlers, one module per API area
//! - `response` / `error`: the JSON envelope and the error type behind it
//! - `server`: state, router and listener
//! - `config`: environment-driven settings

pub mod auth;
pub mod config;
pub mod costing;
pub mod database;
pub mod error;
pub mod mail;
pub mod response;
pub mod routes;
pub mod server;
