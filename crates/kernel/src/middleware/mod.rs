//! HTTP middleware components.

pub mod principal;

pub use principal::resolve_principal;
