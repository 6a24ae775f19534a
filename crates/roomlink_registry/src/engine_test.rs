use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use roomlink_config::{DatabaseConfig, RegistryConfig};
use roomlink_db::{
    DbClient, DbError, LegacyDevice, Repository, SqlLegacyDeviceRepository, SqlRegistryRepository,
};

use crate::clock::{Clock, ManualClock};
use crate::engine::{RegistryEngine, MAX_DEVICE_ID_LEN};
use crate::error::RegistryError;
use crate::handlers::SqlRegistryEngine;
use crate::models::DeviceStatus;
use crate::random::testing::ScriptedRandom;
use crate::random::{is_pairing_code, RandomSource, SystemRandomSource};

struct Harness {
    engine: Arc<SqlRegistryEngine>,
    clock: Arc<ManualClock>,
    legacy: SqlLegacyDeviceRepository,
}

async fn harness_with(rng: Arc<dyn RandomSource>, config: RegistryConfig) -> Harness {
    let mut db_config = DatabaseConfig::from_url("sqlite::memory:");
    db_config.max_connections = 1;
    harness_on(&db_config, rng, config).await
}

async fn harness_on(
    db_config: &DatabaseConfig,
    rng: Arc<dyn RandomSource>,
    config: RegistryConfig,
) -> Harness {
    let client = DbClient::from_config(db_config).await.expect("client");

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
    ));
    let legacy = SqlLegacyDeviceRepository::new(client.clone());
    let engine = RegistryEngine::with_sources(
        SqlRegistryRepository::new(client),
        legacy.clone(),
        &config,
        clock.clone(),
        rng,
    );
    engine.init_schema().await.expect("schema");

    Harness {
        engine: Arc::new(engine),
        clock,
        legacy,
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(SystemRandomSource::new()), RegistryConfig::default()).await
}

/// A harness over a SQLite file with a multi-connection pool, so concurrent
/// callers really run in separate transactions.
async fn file_harness() -> (Harness, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("roomlink-engine-{}.db", uuid::Uuid::new_v4()));
    let mut db_config = DatabaseConfig::from_url(format!("sqlite:{}", path.display()));
    db_config.max_connections = 5;
    let h = harness_on(
        &db_config,
        Arc::new(SystemRandomSource::new()),
        RegistryConfig::default(),
    )
    .await;
    (h, path)
}

async fn scripted(codes: &[u32]) -> Harness {
    harness_with(Arc::new(ScriptedRandom::codes(codes)), RegistryConfig::default()).await
}

fn labels() -> (Option<String>, Option<String>) {
    (Some("Lenovo".to_string()), Some("Tab M10".to_string()))
}

#[tokio::test]
async fn test_full_pairing_lifecycle() {
    let h = harness().await;
    let engine = &h.engine;
    let (manufacturer, model) = labels();

    assert_eq!(engine.get_status("d1").await.unwrap(), DeviceStatus::Unregistered);

    let issued = engine.register("d1", manufacturer, model).await.unwrap();
    assert!(is_pairing_code(&issued.code));
    assert_eq!(issued.expires_at, h.clock.now() + Duration::minutes(15));
    assert_eq!(
        engine.get_status("d1").await.unwrap(),
        DeviceStatus::Pending {
            code: issued.code.clone(),
            expires_at: issued.expires_at,
        }
    );

    let assigned = engine.assign(&issued.code, "WI WI1-308").await.unwrap();
    assert_eq!(assigned.device_id, "d1");

    let DeviceStatus::Assigned {
        room_id,
        room_name,
        secret_key,
    } = engine.get_status("d1").await.unwrap()
    else {
        panic!("device should be assigned");
    };
    assert_eq!(room_id, assigned.room_id);
    assert_eq!(room_name, "WI WI1-308");
    assert_eq!(secret_key.len(), 64);
    assert!(engine.list_pending_requests().await.unwrap().is_empty());

    let moved = engine.update_assignment("d1", "WI WI1-309").await.unwrap();
    assert_eq!(moved.room_name, "WI WI1-309");
    assert_ne!(moved.room_id, assigned.room_id);
    match engine.get_status("d1").await.unwrap() {
        DeviceStatus::Assigned {
            room_name,
            secret_key: kept,
            ..
        } => {
            assert_eq!(room_name, "WI WI1-309");
            assert_eq!(kept, secret_key);
        }
        other => panic!("unexpected status {:?}", other),
    }

    engine.unpair("d1").await.unwrap();
    assert_eq!(engine.get_status("d1").await.unwrap(), DeviceStatus::Unregistered);
}

#[tokio::test]
async fn test_second_register_supersedes_first_code() {
    let h = scripted(&[111_111, 222_222]).await;
    let engine = &h.engine;

    let first = engine.register("d1", None, None).await.unwrap();
    let second = engine.register("d1", None, None).await.unwrap();
    assert_eq!(first.code, "111111");
    assert_eq!(second.code, "222222");

    let pending = engine.list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].code, "222222");

    assert!(matches!(
        engine.assign(&first.code, "Room A").await,
        Err(RegistryError::InvalidCode)
    ));
    assert!(engine.assign(&second.code, "Room A").await.is_ok());
}

#[tokio::test]
async fn test_expired_code_is_invalid() {
    let h = harness().await;
    let engine = &h.engine;

    let issued = engine.register("d1", None, None).await.unwrap();
    h.clock.advance(Duration::minutes(15));

    assert_eq!(engine.get_status("d1").await.unwrap(), DeviceStatus::Unregistered);
    assert!(engine.list_pending_requests().await.unwrap().is_empty());
    assert!(matches!(
        engine.assign(&issued.code, "Room A").await,
        Err(RegistryError::InvalidCode)
    ));
    assert!(engine.list_rooms().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_used_code_cannot_be_assigned_twice() {
    let h = harness().await;
    let engine = &h.engine;

    let issued = engine.register("d1", None, None).await.unwrap();
    engine.assign(&issued.code, "Room A").await.unwrap();
    assert!(matches!(
        engine.assign(&issued.code, "Room B").await,
        Err(RegistryError::InvalidCode)
    ));
}

#[tokio::test]
async fn test_malformed_code_is_invalid() {
    let h = harness().await;
    for code in ["", "12345", "abcdef", "1234567", "012345"] {
        assert!(matches!(
            h.engine.assign(code, "Room A").await,
            Err(RegistryError::InvalidCode)
        ));
    }
}

#[tokio::test]
async fn test_code_collision_is_retried() {
    let h = scripted(&[123_456, 123_456, 654_321]).await;
    let engine = &h.engine;

    assert_eq!(engine.register("d1", None, None).await.unwrap().code, "123456");
    assert_eq!(engine.register("d2", None, None).await.unwrap().code, "654321");
    assert_eq!(engine.list_pending_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_code_generation_gives_up_after_configured_attempts() {
    let config = RegistryConfig {
        max_code_attempts: 3,
        ..RegistryConfig::default()
    };
    let rng = Arc::new(ScriptedRandom::codes(&[123_456; 4]));
    let h = harness_with(rng, config).await;

    h.engine.register("d1", None, None).await.unwrap();
    let err = h.engine.register("d2", None, None).await.unwrap_err();
    assert!(matches!(err, RegistryError::CodeGenerationExhausted { attempts: 3 }));
    assert!(err.is_retryable());
    assert_eq!(h.engine.get_status("d2").await.unwrap(), DeviceStatus::Unregistered);
}

#[tokio::test]
async fn test_expired_code_is_reused() {
    let h = scripted(&[123_456, 123_456]).await;

    h.engine.register("d1", None, None).await.unwrap();
    h.clock.advance(Duration::minutes(16));

    let reused = h.engine.register("d2", None, None).await.unwrap();
    assert_eq!(reused.code, "123456");
}

#[tokio::test]
async fn test_device_labels_keep_first_registration() {
    let h = harness().await;
    let (manufacturer, model) = labels();

    h.engine.register("d1", manufacturer, model).await.unwrap();
    h.engine
        .register("d1", Some("Samsung".to_string()), Some("Galaxy Tab".to_string()))
        .await
        .unwrap();

    let pending = h.engine.list_pending_requests().await.unwrap();
    assert_eq!(pending[0].device.manufacturer.as_deref(), Some("Lenovo"));
    assert_eq!(pending[0].device.model.as_deref(), Some("Tab M10"));
}

#[tokio::test]
async fn test_reassignment_replaces_assignment_and_secret() {
    let h = harness().await;
    let engine = &h.engine;

    let first = engine.register("d1", None, None).await.unwrap();
    engine.assign(&first.code, "Room A").await.unwrap();
    let DeviceStatus::Assigned { secret_key: old_secret, .. } = engine.get_status("d1").await.unwrap() else {
        panic!("device should be assigned");
    };

    let second = engine.register("d1", None, None).await.unwrap();
    engine.assign(&second.code, "Room B").await.unwrap();

    let assignments = engine.list_assignments().await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].room_name, "Room B");
    let DeviceStatus::Assigned { secret_key: new_secret, .. } = engine.get_status("d1").await.unwrap() else {
        panic!("device should be assigned");
    };
    assert_ne!(old_secret, new_secret);
}

#[tokio::test]
async fn test_update_assignment_requires_assignment() {
    let h = harness().await;
    assert!(matches!(
        h.engine.update_assignment("d1", "Room A").await,
        Err(RegistryError::NotAssigned(id)) if id == "d1"
    ));
    assert!(h.engine.list_rooms().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unpair_is_idempotent() {
    let h = harness().await;
    h.engine.unpair("ghost").await.unwrap();
    h.engine.unpair("ghost").await.unwrap();

    let issued = h.engine.register("d1", None, None).await.unwrap();
    h.engine.unpair("d1").await.unwrap();
    // Unpair leaves an open request alone and creates none.
    assert!(matches!(
        h.engine.get_status("d1").await.unwrap(),
        DeviceStatus::Pending { code, .. } if code == issued.code
    ));
}

#[tokio::test]
async fn test_concurrent_room_creation_yields_one_room() {
    let h = harness().await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.create_room("Lab 1").await })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(h.engine.list_rooms().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_leaves_one_active_request() {
    let (h, path) = file_harness().await;

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.register("d1", None, None).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let pending = h.engine.list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(matches!(
        h.engine.get_status("d1").await.unwrap(),
        DeviceStatus::Pending { code, .. } if code == pending[0].code
    ));

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_assign_to_new_room_creates_it_once() {
    let (h, path) = file_harness().await;

    let mut codes = Vec::new();
    for n in 0..20 {
        let issued = h.engine.register(&format!("d{}", n), None, None).await.unwrap();
        codes.push(issued.code);
    }

    let tasks: Vec<_> = codes
        .into_iter()
        .map(|code| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.assign(&code, "Room X").await })
        })
        .collect();
    let mut room_ids = Vec::new();
    for task in tasks {
        room_ids.push(task.await.unwrap().unwrap().room_id);
    }
    room_ids.dedup();

    assert_eq!(room_ids.len(), 1);
    assert_eq!(h.engine.list_rooms().await.unwrap().len(), 1);
    assert_eq!(h.engine.list_assignments().await.unwrap().len(), 20);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_unlabelled_device_is_listed_and_validated() {
    let h = harness().await;

    let issued = h.engine.register("d1", None, None).await.unwrap();
    let pending = h.engine.list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].device.manufacturer, None);
    assert_eq!(pending[0].device.model, None);

    h.engine.assign(&issued.code, "Room A").await.unwrap();
    let assignments = h.engine.list_assignments().await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].device.manufacturer, None);

    let DeviceStatus::Assigned { secret_key, .. } = h.engine.get_status("d1").await.unwrap()
    else {
        panic!("device should be assigned");
    };
    let found = h.engine.validate("Room A", &secret_key).await.unwrap();
    assert_eq!(found.device.device_name, "");
    assert_eq!(found.device.device_classroom, "Room A");
}

#[tokio::test]
async fn test_input_validation() {
    let h = harness().await;

    assert!(matches!(
        h.engine.register("", None, None).await,
        Err(RegistryError::Validation(_))
    ));
    let long_id = "x".repeat(MAX_DEVICE_ID_LEN + 1);
    assert!(matches!(
        h.engine.get_status(&long_id).await,
        Err(RegistryError::Validation(_))
    ));
    assert!(matches!(
        h.engine.create_room("  ").await,
        Err(RegistryError::Validation(_))
    ));
}

#[tokio::test]
async fn test_validate_prefers_legacy_rows() {
    let h = harness().await;

    let issued = h.engine.register("d1", labels().0, labels().1).await.unwrap();
    h.engine.assign(&issued.code, "WI WI1-308").await.unwrap();
    let DeviceStatus::Assigned { secret_key, .. } = h.engine.get_status("d1").await.unwrap() else {
        panic!("device should be assigned");
    };

    let structured = h.engine.validate("WI WI1-308", &secret_key).await.unwrap();
    assert_eq!(structured.device.device_name, "Lenovo Tab M10");
    assert_eq!(structured.device.device_classroom, "WI WI1-308");
    assert_eq!(structured.device.device_url, secret_key);
    assert!(structured.device.id.is_none());

    let legacy = h
        .legacy
        .create(LegacyDevice {
            id: 0,
            device_name: "Old Tab".to_string(),
            device_classroom: "WI WI1-308".to_string(),
            device_url: secret_key.clone(),
        })
        .await
        .unwrap();
    let found = h.engine.validate("WI WI1-308", &secret_key).await.unwrap();
    assert_eq!(found.device.id, Some(legacy.id));
    assert_eq!(found.device.device_name, "Old Tab");

    assert!(matches!(
        h.engine.validate("WI WI1-309", &secret_key).await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_purge_expired_requests() {
    let h = harness().await;
    h.engine.register("d1", None, None).await.unwrap();
    h.engine.register("d2", None, None).await.unwrap();

    assert_eq!(h.engine.purge_expired().await.unwrap(), 0);
    h.clock.advance(Duration::minutes(15));
    assert_eq!(h.engine.purge_expired().await.unwrap(), 2);
}

#[tokio::test]
async fn test_slow_store_call_times_out() {
    let config = RegistryConfig {
        store_timeout_ms: 20,
        ..RegistryConfig::default()
    };
    let h = harness_with(Arc::new(SystemRandomSource::new()), config).await;

    let result = h
        .engine
        .store("stalled", std::future::pending::<Result<(), DbError>>())
        .await;
    assert!(matches!(result, Err(RegistryError::Timeout("stalled"))));
}
