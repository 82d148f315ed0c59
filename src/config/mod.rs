//! Watch-list persistence.
//!
//! The whole [`Configuration`] is the unit of durable state: it is loaded
//! once, mutated in memory and written back in one piece. Writes go to a
//! sibling temp file which is then renamed over the target, so a crash
//! leaves either the old or the new document on disk. A symlinked config
//! path is resolved first and the link itself is left in place.
//!
//! There is no locking. Two `rssd` processes sharing a config file race
//! and the last writer wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

pub mod path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "commandTemplate", alias = "Exec", default)]
    pub command_template: String,
    #[serde(alias = "Feeds", default, deserialize_with = "null_as_empty")]
    pub feeds: Vec<WatchedFeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedFeed {
    #[serde(alias = "Feed")]
    pub url: String,
    /// Link of the last dispatched entry; empty until the first sync.
    #[serde(rename = "lastSeenID", alias = "Last", default)]
    pub last_seen_id: String,
}

impl WatchedFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), last_seen_id: String::new() }
    }
}

impl Configuration {
    pub fn contains(&self, url: &str) -> bool {
        self.feeds.iter().any(|f| f.url == url)
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<Vec<WatchedFeed>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<WatchedFeed>>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Configuration> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: self.path.clone() });
            }
            Err(e) => return Err(Error::persistence("read", &self.path, e)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|source| Error::ConfigCorrupt { path: self.path.clone(), source })
    }

    pub fn save(&self, cfg: &Configuration) -> Result<()> {
        let target = self.write_target()?;
        let dir = parent_dir(&target);
        let tmp = write_temp(&dir, cfg)?;
        tmp.persist(&target)
            .map_err(|e| Error::persistence("rename into", &target, e.error))?;
        sync_dir(&dir)
    }

    /// Creates an empty configuration at the store path unless something
    /// already exists there. Returns `true` when a file was created.
    pub fn bootstrap(&self) -> Result<bool> {
        if fs::symlink_metadata(&self.path).is_ok() {
            return Ok(false);
        }
        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir).map_err(|e| Error::persistence("create directory", &dir, e))?;

        let tmp = write_temp(&dir, &Configuration::default())?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {}
            // lost a race with another bootstrap; keep theirs
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(Error::persistence("create", &self.path, e.error)),
        }
        sync_dir(&dir)?;
        Ok(true)
    }

    /// The file a save replaces. A symlinked config is followed so the
    /// rename lands on the link target and the link survives.
    fn write_target(&self) -> Result<PathBuf> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(&self.path) {
                Ok(real) => Ok(real),
                // dangling link: create the file it points at
                Err(e) if e.kind() == io::ErrorKind::NotFound => fs::read_link(&self.path)
                    .map(|dest| parent_dir(&self.path).join(dest))
                    .map_err(|e| Error::persistence("resolve symlink", &self.path, e)),
                Err(e) => Err(Error::persistence("resolve symlink", &self.path, e)),
            },
            _ => Ok(self.path.clone()),
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_temp(dir: &Path, cfg: &Configuration) -> Result<NamedTempFile> {
    let bytes = serde_json::to_vec_pretty(cfg)
        .map_err(|e| Error::persistence("encode", dir, io::Error::other(e)))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| Error::persistence("create temp file in", dir, e))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::persistence("write", tmp.path().to_path_buf(), e))?;
    Ok(tmp)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| Error::persistence("sync directory", dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Configuration {
        Configuration {
            command_template: r#"notify-send "&item_title" '$HOME' && echo "\n\t ünï""#.into(),
            feeds: vec![
                WatchedFeed { url: "https://a.example/rss".into(), last_seen_id: "https://a.example/1".into() },
                WatchedFeed::new("https://b.example/atom"),
            ],
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());

        store.save(&Configuration::default()).unwrap();
        assert_eq!(store.load().unwrap(), Configuration::default());
    }

    #[test]
    fn persisted_keys_match_document_format() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        store.save(&sample()).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert!(raw["commandTemplate"].is_string());
        assert_eq!(raw["feeds"][0]["url"], "https://a.example/rss");
        assert_eq!(raw["feeds"][0]["lastSeenID"], "https://a.example/1");
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.json")]);
    }

    #[test]
    fn failed_save_is_persistence_error_and_keeps_old_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"old").unwrap();

        let err = ConfigStore::new(&path).save(&sample()).unwrap_err();
        assert!(matches!(err, Error::Persistence { action: "rename into", .. }), "{err}");
        assert_eq!(err.exit_code(), 6);

        assert_eq!(fs::read(path.join("keep")).unwrap(), b"old");
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn save_through_symlink_updates_target() {
        let dir = tempdir().unwrap();
        let real_dir = dir.path().join("dotfiles");
        fs::create_dir(&real_dir).unwrap();
        let real = real_dir.join("rssd.json");
        let link = dir.path().join("config.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let store = ConfigStore::new(&link);
        store.save(&Configuration::default()).unwrap();
        store.save(&sample()).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(ConfigStore::new(&real).load().unwrap(), sample());
        assert_eq!(store.load().unwrap(), sample());
        assert_eq!(fs::read_dir(&real_dir).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn garbage_is_corrupt_not_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"\x00\x01not json at all").unwrap();
        assert!(matches!(ConfigStore::new(&path).load(), Err(Error::ConfigCorrupt { .. })));

        fs::write(&path, b"{\"commandTemplate\": \"echo\", \"feeds\": [").unwrap();
        assert!(matches!(ConfigStore::new(&path).load(), Err(Error::ConfigCorrupt { .. })));
    }

    #[test]
    fn legacy_keys_and_null_feeds_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::new(&path);

        fs::write(&path, br#"{"Exec":"","Feeds":null}"#).unwrap();
        assert_eq!(store.load().unwrap(), Configuration::default());

        fs::write(&path, br#"{"Exec":"echo &title","Feeds":[{"Feed":"http://x/rss","Last":"http://x/1"}]}"#).unwrap();
        let cfg = store.load().unwrap();
        assert_eq!(cfg.command_template, "echo &title");
        assert_eq!(cfg.feeds, vec![WatchedFeed { url: "http://x/rss".into(), last_seen_id: "http://x/1".into() }]);
    }

    #[test]
    fn bootstrap_creates_parents_once() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested/rssd/config.json"));

        assert!(store.bootstrap().unwrap());
        assert_eq!(store.load().unwrap(), Configuration::default());

        store.save(&sample()).unwrap();
        assert!(!store.bootstrap().unwrap());
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn bootstrap_keeps_corrupt_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"oops").unwrap();

        assert!(!ConfigStore::new(&path).bootstrap().unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"oops");
    }
}
