use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// Persistence for desktop names, ordered by slot.
pub trait NameStore: Send {
    fn load(&mut self) -> anyhow::Result<Vec<String>>;
    fn save(&mut self, names: &[String]) -> anyhow::Result<()>;
}

/// Names kept as a RON list on disk. A missing file loads as no names.
pub struct RonNameStore {
    path: PathBuf,
}

impl RonNameStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl NameStore for RonNameStore {
    fn load(&mut self) -> anyhow::Result<Vec<String>> {
        let mut buf = String::new();
        match File::open(&self.path) {
            Ok(mut file) => file.read_to_string(&mut buf)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved desktop names");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("opening {}", self.path.display()));
            }
        };
        ron::from_str(&buf).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn save(&mut self, names: &[String]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = ron::ser::to_string(&names)?;
        // Replace the file in one step so an interrupted write never leaves a
        // truncated list behind.
        let tmp = self.tmp_path();
        let mut file =
            File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!(count = names.len(), "saved desktop names");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RonNameStore::new(dir.path().join("names.ron"));
        assert_eq!(Vec::<String>::new(), store.load().unwrap());
    }

    #[test]
    fn saved_names_load_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("names.ron");
        let names = vec!["Mail".to_string(), "Code \"main\"".to_string(), "Desktop 3".to_string()];

        RonNameStore::new(&path).save(&names).unwrap();
        assert_eq!(names, RonNameStore::new(&path).load().unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.ron");
        fs::write(&path, "not ron [").unwrap();
        assert!(RonNameStore::new(path).load().is_err());
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.ron");
        let mut store = RonNameStore::new(&path);
        store.save(&["Mail".to_string(), "Code".to_string(), "Web".to_string()]).unwrap();
        store.save(&["Chat".to_string()]).unwrap();

        assert_eq!(vec!["Chat".to_string()], store.load().unwrap());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(vec!["names.ron".to_string()], entries);
    }

    #[test]
    fn stale_temp_file_does_not_block_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.ron");
        fs::write(&path, r#"["Mail"]"#).unwrap();
        fs::write(dir.path().join("names.ron.tmp"), "[\"Ma").unwrap();

        let mut store = RonNameStore::new(&path);
        assert_eq!(vec!["Mail".to_string()], store.load().unwrap());
        store.save(&["Mail".to_string(), "Code".to_string()]).unwrap();
        assert_eq!(vec!["Mail".to_string(), "Code".to_string()], store.load().unwrap());
        assert!(!dir.path().join("names.ron.tmp").exists());
    }
}
