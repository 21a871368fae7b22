use std::{env, fs, time::Duration};

use workstatus_agent::config::loader::{load_config, load_config_with_default_path};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("workstatus.toml");

    let toml_content = r#"
[sync]
interval_secs = 30
call_timeout_ms = 2500
concurrency = 8
edge_triggered = false

[logging]
level = "debug"

[fixtures]
path = "demos/local.json"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.sync.interval(), Duration::from_secs(30));
    assert_eq!(cfg.sync.call_timeout(), Duration::from_millis(2500));
    assert_eq!(cfg.sync.concurrency, 8);
    assert!(!cfg.sync.edge_triggered);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.fixtures.path.as_deref(), Some("demos/local.json"));

    // 2) Env override should win over file
    unsafe {
        env::set_var("WORKSTATUS__SYNC__INTERVAL_SECS", "5");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.sync.interval_secs, 5);
    unsafe {
        env::remove_var("WORKSTATUS__SYNC__INTERVAL_SECS");
    }

    // 3) Interval below one second is rejected
    let invalid_path = dir.path().join("invalid.toml");
    fs::write(&invalid_path, "[sync]\ninterval_secs = 0\n").expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("sync.interval_secs must be >= 1"));

    // 4) A missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let cfg = load_config_with_default_path(Some(&missing)).expect("defaults");
    assert_eq!(cfg.sync.interval_secs, 60);
    assert!(cfg.fixtures.path.is_none());
}
