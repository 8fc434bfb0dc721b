//! Shared helpers for tenantport integration tests.

pub mod archive;
pub mod db;
pub mod fixtures;
pub mod temp;

pub use archive::ArchiveBuilder;
pub use db::TestDb;
pub use fixtures::{seed_workspace, Harness, Tenant, Workspace};
pub use temp::TempDir;
