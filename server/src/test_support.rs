#![allow(dead_code)]

use rosterd_core::AppConfig;
use tempfile::TempDir;

use crate::state::{AppState, build_state};

pub(crate) fn setup_state() -> (TempDir, AppState) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = AppConfig {
        bind_address: "127.0.0.1:0".parse().expect("bind address"),
        data_dir: temp_dir.path().join("data"),
        backup_dir: temp_dir.path().join("data/backups"),
        static_dir: temp_dir.path().join("static"),
        ..AppConfig::default()
    };

    let state = build_state(config).expect("build state");
    (temp_dir, state)
}

pub(crate) async fn seed_backup_file(state: &AppState, file_name: &str, content: &str) {
    let path = state.backup_store.backup_dir().join(file_name);
    tokio::fs::write(path, content)
        .await
        .expect("seed backup file");
}
