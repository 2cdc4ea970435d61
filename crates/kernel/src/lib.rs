//! Navkit kernel library.
//!
//! Menu item administration with dependent dropdown lookups. The main entry
//! point for running the server is the `navkit` binary; the library exposes
//! the same pieces for integration testing.

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod menu;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
