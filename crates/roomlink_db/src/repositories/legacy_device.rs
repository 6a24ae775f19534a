//! Repository for the legacy device list
//!
//! The flat `device_list` table predates pairing. Each row binds a display
//! name and classroom to a pre-shared URL token.

use crate::error::DbError;
use crate::repository::Repository;
use std::future::Future;

/// A row of the legacy device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDevice {
    /// Row id, `0` for a row that has not been stored yet
    pub id: i64,
    pub device_name: String,
    pub device_classroom: String,
    pub device_url: String,
}

/// Store operations over the legacy device list.
pub trait LegacyDeviceRepository: Repository<LegacyDevice, DbError, Id = i64> + Send + Sync {
    /// Create the `device_list` table if it doesn't exist
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// The row whose classroom and URL both match exactly
    fn find_by_classroom_and_url(
        &self,
        classroom: &str,
        device_url: &str,
    ) -> impl Future<Output = Result<Option<LegacyDevice>, DbError>> + Send;
}
