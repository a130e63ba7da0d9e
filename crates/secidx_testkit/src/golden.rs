//! Golden snapshots of index contents.
//!
//! Renders the index entries of a store as JSON and compares them with
//! expected files, so that the reserved key layout and membership order
//! are pinned down.

use crate::fixtures::TestStore;
use secidx_core::keys::INDEX_NAMESPACE;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Renders every index entry of `store` as JSON.
///
/// The result maps index name to entry value to the member keys, in
/// stored order: `{"age": {"59": ["2", "4"]}}`. Emptied entries appear
/// with an empty list.
///
/// # Panics
///
/// Panics if the store cannot be read.
pub fn index_snapshot(store: &TestStore) -> Value {
    let keys = store.backend().keys();
    let mut indexes = Map::new();

    for name in store.index_names() {
        let prefix = format!("{INDEX_NAMESPACE}:{name}:");
        let mut entries = Map::new();
        for value in keys.iter().filter_map(|key| key.strip_prefix(&prefix)) {
            let members = store
                .index_members(&name, value)
                .expect("Failed to read index entry")
                .unwrap_or_default();
            entries.insert(value.to_string(), Value::from(members));
        }
        indexes.insert(name, Value::Object(entries));
    }

    Value::Object(indexes)
}

/// A golden test that compares JSON snapshots against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
}

impl GoldenTest {
    /// Creates a new golden test.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the test (used for file naming)
    /// * `golden_dir` - Directory containing golden files
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
        }
    }

    /// Creates a golden test using this crate's `tests/golden` directory.
    pub fn with_default_dir(name: impl Into<String>) -> Self {
        let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("golden");
        Self::new(name, golden_dir)
    }

    /// Asserts that `actual` equals the JSON in the golden file.
    ///
    /// Files are compared as JSON values, so formatting does not matter.
    /// If `UPDATE_GOLDEN` environment variable is set, updates the golden
    /// file instead.
    pub fn assert_json(&self, suffix: &str, actual: &Value) {
        let path = self.file_path(suffix);
        let rendered = serde_json::to_string_pretty(actual).expect("Failed to render JSON");

        if self.update_mode {
            self.update_golden_file(&path, rendered.as_bytes());
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual:\n{}",
                path, rendered
            );
        }

        let text = fs::read_to_string(&path).expect("Failed to read golden file");
        let expected: Value = serde_json::from_str(&text).expect("Golden file is not valid JSON");

        if *actual != expected {
            panic!(
                "Golden test '{}' failed for '{}':\n\
                 --- Expected ---\n{}\n\
                 --- Actual ---\n{}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name, suffix, text, rendered
            );
        }
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let filename = if suffix.is_empty() {
            format!("{}.json", self.name)
        } else {
            format!("{}_{}.json", self.name, suffix)
        };
        self.golden_dir.join(filename)
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
        println!("Updated golden file: {:?}", path);
    }
}
