//! Database integration for Roomlink
//!
//! This crate provides a database client built on the SQLx `Any` driver, the
//! registry schema, and the named store queries the registry engine runs.
//! The schema is written for SQLite.
//!
//! # Example
//!
//! ```rust,no_run
//! use roomlink_db::{DbClient, RegistryRepository, RegistryRepositoryFactory, RepositoryFactory};
//!
//! async fn setup() -> Result<(), roomlink_db::error::DbError> {
//!     let client = DbClient::from_url("sqlite:data/roomlink.db").await?;
//!     let repo = RegistryRepositoryFactory::new().create_repository(client);
//!     repo.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod repository;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use repository::{Repository, RepositoryFactory};

pub use repositories::{
    AssignmentListRow, AssignmentRecord, DeviceRecord, DisplayAssignmentRow, LegacyDevice,
    LegacyDeviceRepository, LegacyDeviceRepositoryFactory, NewAssignment, NewRegistrationRequest,
    PendingRequestRow, RegistrationRequestRecord, RegistryRepository, RegistryRepositoryFactory,
    ReplaceRequestOutcome, RoomRecord, SqlLegacyDeviceRepository, SqlRegistryRepository,
};
