use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use drill_core::model::{FactId, ProgressRecord};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::repository::{ProgressEntryRecord, ProgressRepository, StorageError};

/// Schema version written by this build.
pub const TRAINFILE_VERSION: u32 = 1;

/// On-disk document. Plain JSON; nothing in it is executed on load.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrainfileDocument {
    version: u32,
    entries: BTreeMap<FactId, ProgressEntryRecord>,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// Directory the temporary file is staged in before the rename.
///
/// A bare file name stages in the working directory.
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Progress repository backed by a JSON trainfile.
///
/// The file is created on first save and rewritten wholesale afterwards.
#[derive(Debug, Clone)]
pub struct TrainfileRepository {
    path: PathBuf,
}

impl TrainfileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl ToString) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn decode(&self, text: &str) -> Result<ProgressRecord, StorageError> {
        let header: VersionHeader = serde_json::from_str(text).map_err(|e| self.corrupt(e))?;
        if header.version != TRAINFILE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                path: self.path.clone(),
                found: header.version,
            });
        }

        let doc: TrainfileDocument = serde_json::from_str(text).map_err(|e| self.corrupt(e))?;
        let entries = doc
            .entries
            .into_iter()
            .map(|(id, record)| {
                record
                    .into_entry()
                    .map(|entry| (id.clone(), entry))
                    .map_err(|e| self.corrupt(format!("entry {id}: {e}")))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(ProgressRecord::from_entries(entries))
    }

    fn encode(record: &ProgressRecord) -> Result<String, StorageError> {
        let doc = TrainfileDocument {
            version: TRAINFILE_VERSION,
            entries: record
                .entries()
                .map(|(id, entry)| (id.clone(), ProgressEntryRecord::from_entry(entry)))
                .collect(),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn write_error(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressRepository for TrainfileRepository {
    fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no trainfile yet, starting fresh");
                return Ok(ProgressRecord::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let record = self.decode(&text)?;
        debug!(path = %self.path.display(), entries = record.len(), "loaded trainfile");
        Ok(record)
    }

    fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let body = Self::encode(record)?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp =
            NamedTempFile::new_in(staging_dir(&self.path)).map_err(|e| self.write_error(e))?;
        tmp.write_all(body.as_bytes())
            .and_then(|()| tmp.write_all(b"\n"))
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_error(e.error))?;

        debug!(path = %self.path.display(), entries = record.len(), "saved trainfile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::fixed_now;

    fn sample_record() -> ProgressRecord {
        let mut record = ProgressRecord::new();
        let dl = FactId::new("DL").unwrap();
        let f = FactId::new("F").unwrap();
        record.record(&dl, true, fixed_now());
        record.record(&dl, false, fixed_now());
        record.record(&f, true, fixed_now());
        record
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TrainfileRepository::new(dir.path().join("absent.json"));
        assert!(repo.load_progress().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TrainfileRepository::new(dir.path().join("me.train"));
        let record = sample_record();

        repo.save_progress(&record).unwrap();
        assert_eq!(repo.load_progress().unwrap(), record);
    }

    #[test]
    fn file_is_plain_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.train");
        TrainfileRepository::new(&path)
            .save_progress(&sample_record())
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["entries"]["DL"]["times_asked"], 2);
        assert_eq!(value["entries"]["DL"]["times_correct"], 1);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.train");
        fs::write(&path, b"\x80\x04\x95pickled").unwrap();

        let err = TrainfileRepository::new(&path).load_progress().unwrap_err();
        assert!(matches!(err, StorageError::Read { .. } | StorageError::Corrupt { .. }));
    }

    #[test]
    fn inconsistent_counts_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.train");
        fs::write(
            &path,
            r#"{"version":1,"entries":{"DL":{"times_asked":1,"times_correct":4}}}"#,
        )
        .unwrap();

        let err = TrainfileRepository::new(&path).load_progress().unwrap_err();
        match err {
            StorageError::Corrupt { reason, .. } => assert!(reason.contains("DL"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.train");
        fs::write(&path, r#"{"version":7,"entries":{},"extra":true}"#).unwrap();

        let err = TrainfileRepository::new(&path).load_progress().unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 7, .. }));
    }

    #[test]
    fn bare_file_name_stages_in_working_directory() {
        assert_eq!(staging_dir(Path::new("plain.train")), Path::new("."));
        assert_eq!(staging_dir(Path::new("sub/plain.train")), Path::new("sub"));
        assert_eq!(staging_dir(Path::new("/plain.train")), Path::new("/"));
    }

    #[test]
    fn relative_path_saves_and_loads() {
        let dir = tempfile::tempdir_in(".").unwrap();
        let name = dir.path().file_name().unwrap();
        let path = Path::new(name).join("me.train");
        assert!(path.is_relative());

        let repo = TrainfileRepository::new(&path);
        let record = sample_record();
        repo.save_progress(&record).unwrap();

        assert!(path.exists());
        assert_eq!(repo.load_progress().unwrap(), record);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("me.train")]);
    }
}
