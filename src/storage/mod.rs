use std::{
    collections::{HashSet, VecDeque},
    ffi::OsString,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{migrate_legacy_id, NotifierError};

/// Identifiers of already notified articles, oldest first. Lookups go
/// through the set, eviction through the queue.
#[derive(Clone, Debug, Default)]
pub struct SeenSet {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl SeenSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Add an id as the newest entry. Returns false if it was already known;
    /// a known id keeps its original position.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        self.members.insert(id.to_string());
        self.order.push_back(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate from the oldest to the newest id
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Drop the oldest ids until at most `max` remain; returns how many went.
    pub fn retain_newest(&mut self, max: usize) -> usize {
        let mut evicted = 0;
        while self.order.len() > max {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                evicted += 1;
            }
        }
        evicted
    }
}

impl<S: AsRef<str>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = SeenSet::new();
        for id in iter {
            seen.insert(id.as_ref());
        }
        seen
    }
}

pub trait SeenStore {
    /// Read the persisted ids. Never fails: a missing or broken state
    /// yields an empty set.
    fn load(&self) -> SeenSet;
    /// Persist the ids, keeping only the newest ones up to the cap.
    fn save(&self, seen: &SeenSet) -> Result<(), NotifierError>;
}

#[derive(Serialize)]
struct StateRecord<'a> {
    ids: Vec<&'a str>,
    updated_at: String,
}

/// JSON state file: `{"ids": [...], "updated_at": "..."}`. A bare list of ids
/// is accepted on load too.
#[derive(Clone, Debug)]
pub struct StateFile {
    path: PathBuf,
    max_ids: usize,
}

impl StateFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_ids: usize) -> Self {
        Self {
            path: path.into(),
            max_ids,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

/// Pull the id list out of a parsed state document. Accepts the current
/// object form and the legacy bare list.
fn ids_from_value(value: Value) -> Option<Vec<String>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("ids") {
            Some(Value::Array(entries)) => entries,
            _ => return None,
        },
        _ => return None,
    };

    Some(
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    )
}

impl SeenStore for StateFile {
    fn load(&self) -> SeenSet {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file yet");
            return SeenSet::new();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read state file");
                return SeenSet::new();
            }
        };

        let value: Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not parse state file");
                return SeenSet::new();
            }
        };

        match ids_from_value(value) {
            Some(ids) => ids.into_iter().map(migrate_legacy_id).collect(),
            None => {
                warn!(path = %self.path.display(), "state file has no id list");
                SeenSet::new()
            }
        }
    }

    fn save(&self, seen: &SeenSet) -> Result<(), NotifierError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut bounded = seen.clone();
        let evicted = bounded.retain_newest(self.max_ids);
        if evicted > 0 {
            debug!(evicted, "dropping oldest ids over the cap");
        }
        let record = StateRecord {
            ids: bounded.iter().map(String::as_str).collect(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let bytes = serde_json::to_vec_pretty(&record)?;

        // write aside, then swap in, so a crash leaves the previous state intact
        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), ids = record.ids.len(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state_in(dir: &tempfile::TempDir, max_ids: usize) -> StateFile {
        StateFile::new(dir.path().join("state").join("seen_ids.json"), max_ids)
    }

    #[test]
    fn test_seen_set() {
        let mut seen = SeenSet::new();
        assert!(seen.is_empty());
        assert!(seen.insert("te:1"));
        assert!(seen.insert("te:2"));
        assert!(!seen.insert("te:1"));
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("te:2"));
        assert!(!seen.contains("te:3"));
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec!["te:1", "te:2"]);
    }

    #[test]
    fn test_retain_newest_evicts_oldest_first() {
        let mut seen: SeenSet = ["a", "b", "c", "d"].into_iter().collect();
        assert_eq!(seen.retain_newest(2), 2);
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec!["c", "d"]);
        assert!(!seen.contains("a"));
        assert!(!seen.contains("b"));
        assert_eq!(seen.retain_newest(5), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = state_in(&dir, 10);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(StateFile::new(&path, 10).load().is_empty());

        fs::write(&path, r#"{"ids": "te:1"}"#).unwrap();
        assert!(StateFile::new(&path, 10).load().is_empty());

        fs::write(&path, "42").unwrap();
        assert!(StateFile::new(&path, 10).load().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = state_in(&dir, 10);
        let seen: SeenSet = ["te:1", "rss:ft-home:abc"].into_iter().collect();
        store.save(&seen).unwrap();

        // the missing state directory was created and the temp file is gone
        assert!(store.path().exists());
        assert!(!store.tmp_path().exists());

        let loaded = store.load();
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            vec!["te:1", "rss:ft-home:abc"]
        );
    }

    #[test]
    fn test_saved_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = state_in(&dir, 10);
        store.save(&["te:7"].into_iter().collect()).unwrap();

        let value: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["ids"], serde_json::json!(["te:7"]));
        assert!(value["updated_at"].is_string());
    }

    #[test]
    fn test_save_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = state_in(&dir, 3);
        let seen: SeenSet = (1..=10).map(|i| format!("te:{i}")).collect();
        store.save(&seen).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 3);
        // the newest ids survive
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            vec!["te:8", "te:9", "te:10"]
        );
    }

    #[test]
    fn test_legacy_numeric_ids_are_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        fs::write(&path, r#"["101", "102", 103]"#).unwrap();

        let loaded = StateFile::new(&path, 10).load();
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            vec!["te:101", "te:102", "te:103"]
        );
        assert!(loaded.iter().all(|id| id.starts_with("te:")));
    }

    #[test]
    fn test_non_numeric_ids_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        fs::write(
            &path,
            r#"{"ids": ["te:1", "rss:wsj-markets:ff00", "legacy-slug", "5", null, true]}"#,
        )
        .unwrap();

        let loaded = StateFile::new(&path, 10).load();
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            vec!["te:1", "rss:wsj-markets:ff00", "legacy-slug", "te:5"]
        );
    }

    #[test]
    fn test_migration_collapses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        fs::write(&path, r#"{"ids": ["te:42", "42"]}"#).unwrap();

        let loaded = StateFile::new(&path, 10).load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("te:42"));
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = state_in(&dir, 10);
        store.save(&["te:1"].into_iter().collect()).unwrap();
        store.save(&["te:1", "te:2"].into_iter().collect()).unwrap();
        assert_eq!(store.load().len(), 2);
    }
}
