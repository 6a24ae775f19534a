//! Repository modules for database access
//!
//! Each entity family has a trait with its named queries and a SQL
//! implementation over [`crate::DbClient`].

pub mod factories;
pub mod legacy_device;
pub mod legacy_device_sql;
pub mod registry;
pub mod registry_sql;

pub use factories::{LegacyDeviceRepositoryFactory, RegistryRepositoryFactory};
pub use legacy_device::{LegacyDevice, LegacyDeviceRepository};
pub use legacy_device_sql::SqlLegacyDeviceRepository;
pub use registry::{
    AssignmentListRow, AssignmentRecord, DeviceRecord, DisplayAssignmentRow, NewAssignment,
    NewRegistrationRequest, PendingRequestRow, RegistrationRequestRecord, RegistryRepository,
    ReplaceRequestOutcome, RoomRecord,
};
pub use registry_sql::SqlRegistryRepository;
