//! JSON merge - combine every `*.json` file of a directory into one document.
//!
//! Three strategies:
//! - `array`: splice top-level arrays, append anything else
//! - `object`: merge top-level objects key by key (later files win)
//! - `keyed`: store each file's value under its file stem

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WorkbenchError};

/// How the contents of the input files are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    Array,
    Object,
    Keyed,
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeMode::Array => write!(f, "array"),
            MergeMode::Object => write!(f, "object"),
            MergeMode::Keyed => write!(f, "keyed"),
        }
    }
}

/// A file that could not be merged and why
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a merge run
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: Value,
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl MergeOutcome {
    /// Number of top-level entries in the merged document
    pub fn entry_count(&self) -> usize {
        match &self.merged {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 1,
        }
    }
}

/// Find the JSON inputs of `dir`, sorted, excluding `output`.
pub fn discover_inputs(dir: &Path, output: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.json");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| WorkbenchError::Pattern(format!("non UTF-8 path: {}", dir.display())))?;

    let excluded = fs::canonicalize(output).ok();
    let mut files: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| WorkbenchError::Pattern(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter(|path| match (&excluded, fs::canonicalize(path).ok()) {
            (Some(out), Some(candidate)) => *out != candidate,
            _ => true,
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Merge already-parsed documents in order.
pub fn merge_values(mode: MergeMode, docs: &[(String, Value)]) -> Value {
    match mode {
        MergeMode::Array => {
            let mut merged = Vec::new();
            for (_, doc) in docs {
                match doc {
                    Value::Array(items) => merged.extend(items.iter().cloned()),
                    other => merged.push(other.clone()),
                }
            }
            Value::Array(merged)
        }
        MergeMode::Object => {
            let mut merged = Map::new();
            for (stem, doc) in docs {
                match doc {
                    Value::Object(map) => merged.extend(map.clone()),
                    Value::Array(items) => {
                        for item in items {
                            if let Value::Object(map) = item {
                                merged.extend(map.clone());
                            }
                        }
                    }
                    other => {
                        merged.insert(stem.clone(), other.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        MergeMode::Keyed => {
            let mut merged = Map::new();
            for (stem, doc) in docs {
                merged.insert(stem.clone(), doc.clone());
            }
            Value::Object(merged)
        }
    }
}

/// Read `files` and merge them, skipping unreadable or malformed ones.
pub fn merge_files(mode: MergeMode, files: &[PathBuf]) -> Result<MergeOutcome> {
    if files.is_empty() {
        return Err(WorkbenchError::InvalidInput("no JSON files to merge".to_string()));
    }

    let mut docs = Vec::with_capacity(files.len());
    let mut merged_files = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for path in files {
        let parsed = fs::read_to_string(path)
            .map_err(WorkbenchError::from)
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(WorkbenchError::from));
        match parsed {
            Ok(doc) => {
                log::debug!("Read {}", path.display());
                docs.push((file_stem(path), doc));
                merged_files.push(path.clone());
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(MergeOutcome {
        merged: merge_values(mode, &docs),
        files: merged_files,
        skipped,
    })
}

/// Merge the JSON files of `dir` into `output`.
pub fn merge_directory(dir: &Path, output: &Path, mode: MergeMode) -> Result<MergeOutcome> {
    let files = discover_inputs(dir, output)?;
    log::info!("Merging {} files from {} ({} mode)", files.len(), dir.display(), mode);

    let outcome = merge_files(mode, &files)?;
    fs::write(output, serde_json::to_string_pretty(&outcome.merged)?)?;
    log::info!("Wrote {} entries to {}", outcome.entry_count(), output.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn docs(items: &[(&str, Value)]) -> Vec<(String, Value)> {
        items.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_array_mode_splices_arrays() {
        let input = docs(&[
            ("a", json!([{"name": "x"}, {"name": "y"}])),
            ("b", json!({"name": "z"})),
        ]);
        let merged = merge_values(MergeMode::Array, &input);
        assert_eq!(merged, json!([{"name": "x"}, {"name": "y"}, {"name": "z"}]));
    }

    #[test]
    fn test_object_mode_later_files_win() {
        let input = docs(&[
            ("a", json!({"Zhuhai": {"lat": 1.0}, "Aomen": {"lat": 2.0}})),
            ("b", json!({"Zhuhai": {"lat": 3.0}})),
        ]);
        let merged = merge_values(MergeMode::Object, &input);
        assert_eq!(merged["Zhuhai"]["lat"], 3.0);
        assert_eq!(merged["Aomen"]["lat"], 2.0);
    }

    #[test]
    fn test_object_mode_flattens_object_arrays_and_keys_scalars() {
        let input = docs(&[
            ("list", json!([{"A": 1}, 5, {"B": 2}])),
            ("count", json!(42)),
        ]);
        let merged = merge_values(MergeMode::Object, &input);
        assert_eq!(merged, json!({"A": 1, "B": 2, "count": 42}));
    }

    #[test]
    fn test_keyed_mode_uses_file_stems() {
        let input = docs(&[("beijing", json!({"lat": 39.9})), ("tags", json!(["a"]))]);
        let merged = merge_values(MergeMode::Keyed, &input);
        assert_eq!(merged, json!({"beijing": {"lat": 39.9}, "tags": ["a"]}));
    }

    #[test]
    fn test_merge_directory_excludes_output_and_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"name": "Acme"}]"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"[{"name": "Globex"}]"#).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let output = dir.path().join("companies.json");
        fs::write(&output, r#"[{"name": "stale"}]"#).unwrap();

        let outcome = merge_directory(dir.path(), &output, MergeMode::Array).unwrap();
        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].path.ends_with("broken.json"));
        assert_eq!(outcome.entry_count(), 2);

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, json!([{"name": "Acme"}, {"name": "Globex"}]));
    }

    #[test]
    fn test_merge_directory_keeps_non_ascii() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cities.json"), r#"{"珠海": {"lat": 22.27, "lng": 113.57}}"#).unwrap();
        let output = dir.path().join("merged.json");

        merge_directory(dir.path(), &output, MergeMode::Object).unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("珠海"));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("merged.json");
        let err = merge_directory(dir.path(), &output, MergeMode::Object).unwrap_err();
        assert!(matches!(err, WorkbenchError::InvalidInput(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_mode_display_matches_serde_name() {
        for mode in [MergeMode::Array, MergeMode::Object, MergeMode::Keyed] {
            let yaml = serde_yaml::to_string(&mode).unwrap();
            assert_eq!(yaml.trim(), mode.to_string());
        }
    }
}
