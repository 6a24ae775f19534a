//! Factories for creating repositories over a shared database client

use crate::repositories::legacy_device_sql::SqlLegacyDeviceRepository;
use crate::repositories::registry_sql::SqlRegistryRepository;
use crate::{DbClient, RepositoryFactory};

/// Factory for creating registry repositories
#[derive(Debug, Clone, Default)]
pub struct RegistryRepositoryFactory;

impl RegistryRepositoryFactory {
    /// Create a new registry repository factory
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlRegistryRepository, DbClient> for RegistryRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlRegistryRepository {
        SqlRegistryRepository::new(db_client)
    }
}

/// Factory for creating legacy device list repositories
#[derive(Debug, Clone, Default)]
pub struct LegacyDeviceRepositoryFactory;

impl LegacyDeviceRepositoryFactory {
    /// Create a new legacy device repository factory
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlLegacyDeviceRepository, DbClient> for LegacyDeviceRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlLegacyDeviceRepository {
        SqlLegacyDeviceRepository::new(db_client)
    }
}
