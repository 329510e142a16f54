use kvstash::{AppConfig, Backend, DiskBackend, Envelope, Stash, StashConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Adds automatic logging to test
#[test_log::test]
fn test_full_flow_over_disk_backend() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(DiskBackend::open(dir.path()).expect("Failed to open backend"));
    let stash = Stash::new(backend.clone(), StashConfig::with_namespace("app"));

    assert!(stash.set("x", &json!({"a": 1}), None));
    assert!(stash.set("y", &5, Some(Duration::from_millis(20))));

    assert_eq!(stash.get::<Value>("x"), Some(json!({"a": 1})));
    assert_eq!(stash.get::<i32>("y"), Some(5));
    info!("both entries readable before expiry");

    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(stash.get::<i32>("y"), None);
    assert_eq!(stash.keys(), vec!["x".to_string()]);

    // The expired read deleted the raw entry from the partition
    assert!(backend.get("app:y").unwrap().is_none());
    assert!(backend.get("app:x").unwrap().is_some());
}

#[test_log::test]
fn test_namespaces_share_one_disk_backend() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(DiskBackend::open(dir.path()).expect("Failed to open backend"));
    let a = Stash::new(backend.clone(), StashConfig::with_namespace("a"));
    let b = Stash::new(backend.clone(), StashConfig::with_namespace("b"));

    a.set("k", &"from-a", None);
    b.set("k", &"from-b", None);

    assert_eq!(a.get::<String>("k"), Some("from-a".to_string()));
    assert_eq!(b.get::<String>("k"), Some("from-b".to_string()));

    assert!(a.clear());
    assert_eq!(a.get::<String>("k"), None);
    assert_eq!(b.get::<String>("k"), Some("from-b".to_string()));
}

#[test_log::test]
fn test_cleanup_sweeps_disk_entries() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(DiskBackend::open(dir.path()).expect("Failed to open backend"));
    let stash = Stash::new(backend.clone(), StashConfig::with_namespace("app"));

    stash.set("alive", &1, None);

    // Seed already-expired and corrupt entries straight into the partition
    let created_at = chrono::Utc::now().timestamp_millis() - 10_000;
    let expired = Envelope::new(json!("stale"), created_at, Some(1_000));
    backend
        .set("app:stale", &expired.encode().unwrap())
        .unwrap();
    backend.set("app:junk", "not an envelope").unwrap();

    assert_eq!(stash.cleanup(), 1);
    assert!(backend.get("app:stale").unwrap().is_none());
    // Corrupt entries survive cleanup; only an access through `get` drops them
    assert!(backend.get("app:junk").unwrap().is_some());
    assert_eq!(stash.get::<Value>("junk"), None);
    assert!(backend.get("app:junk").unwrap().is_none());

    assert_eq!(stash.get::<i32>("alive"), Some(1));
}

#[test_log::test]
fn test_config_file_drives_store_construction() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        "namespace: \"app\"\ndefault_ttl_ms: 25\ndata_path: \"{}\"\n",
        dir.path().display()
    );
    std::fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let config = AppConfig::load_from_path(config_file.path()).expect("Failed to load config");
    let backend = Arc::new(DiskBackend::open(config.data_path().unwrap()).unwrap());
    let stash = Stash::new(backend, config.stash_config(None));

    // The configured default ttl applies to writes without a per-call ttl
    assert!(stash.set("ephemeral", &1, None));
    assert_eq!(stash.get::<i32>("ephemeral"), Some(1));

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(stash.get::<i32>("ephemeral"), None);
}
