//! Service for the legacy device list
//!
//! Rows of the flat list carry a pre-shared URL token derived from the device
//! name and classroom at creation time.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use roomlink_db::{LegacyDevice, LegacyDeviceRepository};
use tracing::info;

use crate::engine::bounded;
use crate::error::RegistryError;
use crate::models::{CreateLegacyDeviceRequest, LegacyDeviceView};

/// Derive the URL token of a legacy device: `base64("<name>_<CLASSROOM>")`.
pub fn legacy_device_url(device_name: &str, classroom: &str) -> String {
    general_purpose::STANDARD.encode(format!("{}_{}", device_name, classroom.to_uppercase()))
}

/// CRUD over the legacy device list.
pub struct LegacyDeviceService<L> {
    repo: L,
    store_timeout: Duration,
}

impl<L: LegacyDeviceRepository> LegacyDeviceService<L> {
    pub fn new(repo: L, store_timeout: Duration) -> Self {
        Self {
            repo,
            store_timeout,
        }
    }

    pub async fn list(&self) -> Result<Vec<LegacyDeviceView>, RegistryError> {
        let devices = bounded(self.store_timeout, "list_legacy_devices", self.repo.list()).await?;
        Ok(devices.into_iter().map(LegacyDeviceView::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<LegacyDeviceView, RegistryError> {
        bounded(self.store_timeout, "read_legacy_device", self.repo.read(id))
            .await?
            .map(LegacyDeviceView::from)
            .ok_or_else(|| RegistryError::NotFound(format!("Legacy device {} not found", id)))
    }

    /// Store a new row; the classroom is upper-cased and the URL token derived.
    pub async fn create(
        &self,
        request: CreateLegacyDeviceRequest,
    ) -> Result<LegacyDeviceView, RegistryError> {
        if request.device_name.trim().is_empty() || request.device_classroom.trim().is_empty() {
            return Err(RegistryError::Validation(
                "deviceName and deviceClassroom are required".to_string(),
            ));
        }

        let device = LegacyDevice {
            id: 0,
            device_url: legacy_device_url(&request.device_name, &request.device_classroom),
            device_classroom: request.device_classroom.to_uppercase(),
            device_name: request.device_name,
        };

        let created = bounded(self.store_timeout, "create_legacy_device", self.repo.create(device)).await?;
        info!(
            "Created legacy device {} in classroom {}",
            created.id, created.device_classroom
        );
        Ok(created.into())
    }

    /// Replace a row with `device` as given. The path id must match the body id.
    pub async fn update(
        &self,
        id: i64,
        device: LegacyDeviceView,
    ) -> Result<LegacyDeviceView, RegistryError> {
        if id != device.id {
            return Err(RegistryError::Validation(format!(
                "Path id {} does not match body id {}",
                id, device.id
            )));
        }

        bounded(
            self.store_timeout,
            "update_legacy_device",
            self.repo.update(device.into()),
        )
        .await?
        .map(LegacyDeviceView::from)
        .ok_or_else(|| RegistryError::NotFound(format!("Legacy device {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> Result<(), RegistryError> {
        if bounded(self.store_timeout, "delete_legacy_device", self.repo.delete(id)).await? {
            info!("Deleted legacy device {}", id);
            Ok(())
        } else {
            Err(RegistryError::NotFound(format!("Legacy device {} not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_device_url_upper_cases_classroom() {
        // base64("Tab_WI-1")
        assert_eq!(legacy_device_url("Tab", "wi-1"), "VGFiX1dJLTE=");
    }
}
