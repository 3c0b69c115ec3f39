use std::{
    cmp::Ordering,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tokio::fs;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const BACKUP_SUFFIX: &str = ".json";

/// Formats the canonical backup filename for `base_name` taken at the
/// given instant: `<base>.<YYYYMMDD-HHMMSS>.json`.
pub fn backup_file_name(base_name: &str, taken_at: DateTime<Utc>) -> String {
    format!(
        "{base_name}.{}{BACKUP_SUFFIX}",
        taken_at.format(TIMESTAMP_FORMAT)
    )
}

/// Splits a backup filename back into its base name and embedded
/// timestamp. Returns `None` when the name does not follow the canonical
/// encoding.
pub fn parse_backup_file_name(name: &str) -> Option<(&str, NaiveDateTime)> {
    let stem = name.strip_suffix(BACKUP_SUFFIX)?;
    let (base_name, token) = stem.rsplit_once('.')?;
    if base_name.is_empty() {
        return None;
    }

    let timestamp = NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).ok()?;
    Some((base_name, timestamp))
}

/// Newest-first ordering over backup filenames. Entries with a parseable
/// embedded timestamp sort before malformed ones; malformed entries fall
/// back to descending whole-filename comparison.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse_backup_file_name(a), parse_backup_file_name(b)) {
        (Some((_, ts_a)), Some((_, ts_b))) => ts_b.cmp(&ts_a).then_with(|| b.cmp(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

/// Filesystem-backed store of point-in-time document copies.
///
/// A backup is immutable once written: it is created by a document update
/// and removed only by retention pruning or an explicit delete. All
/// metadata (owning document, creation time) lives in the filename, owned
/// by the [`backup_file_name`]/[`parse_backup_file_name`] pair.
#[derive(Clone)]
pub struct BackupStore {
    backup_dir: PathBuf,
}

impl BackupStore {
    /// Opens the store, creating the backup directory if it is missing.
    pub fn open(backup_dir: impl AsRef<Path>) -> Result<Self> {
        let backup_dir = backup_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&backup_dir).with_context(|| {
            format!(
                "failed to create backup directory {}",
                backup_dir.display()
            )
        })?;

        Ok(Self { backup_dir })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Writes a copy of `content` as a new backup for `base_name`, stamped
    /// with the current time. The source document is left untouched.
    ///
    /// Timestamps have second resolution, so updates landing within the
    /// same second would collide on the same name; the stamp is advanced
    /// until the name is free so an earlier backup is never overwritten.
    pub async fn create(&self, base_name: &str, content: &[u8]) -> Result<String> {
        let mut taken_at = Utc::now();
        let mut file_name = backup_file_name(base_name, taken_at);
        while fs::try_exists(self.backup_dir.join(&file_name))
            .await
            .with_context(|| format!("failed to probe backup {file_name}"))?
        {
            taken_at += Duration::seconds(1);
            file_name = backup_file_name(base_name, taken_at);
        }

        let path = self.backup_dir.join(&file_name);
        fs::write(&path, content)
            .await
            .with_context(|| format!("failed to write backup {}", path.display()))?;
        info!(backup = %file_name, "created backup");

        Ok(file_name)
    }

    /// Lists backup filenames starting with `prefix`, in no particular
    /// order. Matching is a plain prefix test over the filename, so a
    /// prefix shared between document names matches every family it
    /// starts.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.backup_dir).await.with_context(|| {
            format!(
                "failed to read backup directory {}",
                self.backup_dir.display()
            )
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.with_context(|| {
            format!(
                "failed to read backup directory {}",
                self.backup_dir.display()
            )
        })? {
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("failed to stat {}", entry.path().display()))?;
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if name.starts_with(prefix) {
                names.push(name.to_owned());
            }
        }

        Ok(names)
    }

    /// Deletes backups of `base_name` beyond `max_backups`, keeping the
    /// newest ones, and returns the filenames it removed. The first
    /// deletion failure aborts the pass; files already removed stay
    /// removed.
    pub async fn prune(&self, base_name: &str, max_backups: usize) -> Result<Vec<String>> {
        let mut backups = self.list(base_name).await?;
        if backups.len() <= max_backups {
            return Ok(Vec::new());
        }

        backups.sort_by(|a, b| newest_first(a, b));

        let mut deleted = Vec::new();
        for file_name in backups.drain(max_backups..) {
            let path = self.backup_dir.join(&file_name);
            info!(backup = %file_name, "deleting old backup");
            fs::remove_file(&path)
                .await
                .with_context(|| format!("failed to delete backup {}", path.display()))?;
            deleted.push(file_name);
        }

        Ok(deleted)
    }

    /// Removes exactly one backup by filename. The name is untrusted
    /// input and is reduced to its final path component before touching
    /// the filesystem, so it cannot escape the backup directory.
    pub async fn delete(&self, file_name: &str) -> Result<()> {
        let reduced = final_path_component(file_name);
        if reduced.is_empty() {
            let missing = io::Error::new(io::ErrorKind::NotFound, "empty backup filename");
            return Err(missing).with_context(|| format!("failed to delete backup {file_name}"));
        }

        let path = self.backup_dir.join(reduced);
        fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to delete backup {}", path.display()))
    }
}

fn final_path_component(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|component| component.to_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::is_not_found;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store() -> (TempDir, BackupStore) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = BackupStore::open(dir.path().join("backups")).expect("open backup store");
        (dir, store)
    }

    async fn seed(store: &BackupStore, file_name: &str, content: &str) {
        fs::write(store.backup_dir().join(file_name), content)
            .await
            .expect("seed backup file");
    }

    #[test]
    fn file_name_round_trips_through_parse() {
        let taken_at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 5, 42).unwrap();
        let name = backup_file_name("holidays", taken_at);
        assert_eq!(name, "holidays.20240309-180542.json");

        let (base_name, timestamp) = parse_backup_file_name(&name).expect("parse canonical name");
        assert_eq!(base_name, "holidays");
        assert_eq!(timestamp, taken_at.naive_utc());
    }

    #[test]
    fn parse_rejects_malformed_names() {
        assert!(parse_backup_file_name("holidays.json").is_none());
        assert!(parse_backup_file_name("holidays.yesterday.json").is_none());
        assert!(parse_backup_file_name("holidays.20240309-180542.txt").is_none());
        assert!(parse_backup_file_name(".20240309-180542.json").is_none());
    }

    #[test]
    fn newest_first_orders_parsed_before_malformed() {
        let mut names = vec![
            "holidays.garbage.json".to_owned(),
            "holidays.20240301-120000.json".to_owned(),
            "holidays.20240302-120000.json".to_owned(),
        ];
        names.sort_by(|a, b| newest_first(a, b));

        assert_eq!(
            names,
            vec![
                "holidays.20240302-120000.json",
                "holidays.20240301-120000.json",
                "holidays.garbage.json",
            ]
        );
    }

    #[tokio::test]
    async fn list_matches_plain_filename_prefix() {
        let (_dir, store) = store();
        seed(&store, "daysOff.20240301-120000.json", "{}").await;
        seed(&store, "daysOff.20240302-120000.json", "{}").await;
        seed(&store, "days.20240301-120000.json", "{}").await;
        seed(&store, "holidays.20240301-120000.json", "{}").await;

        let mut matches = store.list("daysOff").await.expect("list daysOff");
        matches.sort();
        assert_eq!(
            matches,
            vec![
                "daysOff.20240301-120000.json",
                "daysOff.20240302-120000.json",
            ]
        );

        // A prefix shared between base names over-matches by design.
        let broad = store.list("day").await.expect("list day");
        assert_eq!(broad.len(), 3);
    }

    #[tokio::test]
    async fn create_never_overwrites_an_earlier_backup() {
        let (_dir, store) = store();
        let first = store.create("holidays", b"{\"rev\": 1}").await.expect("first backup");
        let second = store.create("holidays", b"{\"rev\": 2}").await.expect("second backup");

        assert_ne!(first, second);
        let listed = store.list("holidays").await.expect("list backups");
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn prune_keeps_the_newest_backups() {
        let (_dir, store) = store();
        seed(&store, "holidays.20240301-120000.json", "{\"rev\": 1}").await;
        seed(&store, "holidays.20240302-120000.json", "{\"rev\": 2}").await;
        seed(&store, "holidays.20240303-120000.json", "{\"rev\": 3}").await;
        seed(&store, "daysOff.20240101-000000.json", "{}").await;

        let deleted = store.prune("holidays", 2).await.expect("prune holidays");
        assert_eq!(deleted, vec!["holidays.20240301-120000.json"]);

        let mut kept = store.list("holidays").await.expect("list holidays");
        kept.sort();
        assert_eq!(
            kept,
            vec![
                "holidays.20240302-120000.json",
                "holidays.20240303-120000.json",
            ]
        );

        // Other documents' backups are untouched.
        assert_eq!(store.list("daysOff").await.expect("list daysOff").len(), 1);
    }

    #[tokio::test]
    async fn prune_is_a_no_op_under_the_limit() {
        let (_dir, store) = store();
        seed(&store, "holidays.20240301-120000.json", "{}").await;
        seed(&store, "holidays.20240302-120000.json", "{}").await;

        let deleted = store.prune("holidays", 5).await.expect("prune holidays");
        assert!(deleted.is_empty());
        assert_eq!(store.list("holidays").await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn prune_treats_malformed_names_as_oldest() {
        let (_dir, store) = store();
        seed(&store, "holidays.not-a-timestamp.json", "{}").await;
        seed(&store, "holidays.20240301-120000.json", "{}").await;
        seed(&store, "holidays.20240302-120000.json", "{}").await;

        let deleted = store.prune("holidays", 2).await.expect("prune holidays");
        assert_eq!(deleted, vec!["holidays.not-a-timestamp.json"]);
    }

    #[tokio::test]
    async fn delete_reduces_untrusted_names_to_their_final_component() {
        let (_dir, store) = store();
        seed(&store, "holidays.20240301-120000.json", "{}").await;

        store
            .delete("../../holidays.20240301-120000.json")
            .await
            .expect("delete sanitized name");

        assert!(store.list("holidays").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn delete_missing_backup_reports_not_found() {
        let (_dir, store) = store();
        seed(&store, "holidays.20240301-120000.json", "{}").await;

        let err = store
            .delete("holidays.20990101-000000.json")
            .await
            .expect_err("delete of missing backup fails");
        assert!(is_not_found(&err));

        // The directory is unchanged.
        assert_eq!(store.list("holidays").await.expect("list").len(), 1);
    }
}
