//! Cross-tenant account migration: export an account to a portable archive and
//! rebuild it inside another tenant with every identifier remapped.

pub mod archive;
pub mod collaborators;
pub mod config;
pub mod database;
pub mod errors;
pub mod services;
pub mod transfer;

pub mod app_context;
pub use app_context::{AppContext, Collaborators};
pub use config::TransferConfig;
