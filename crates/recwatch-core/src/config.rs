//! Configuration store for the recorder's two config files.
//!
//! The recorder reads `config.ini` (INI sections) and `URL_config.ini`
//! (raw text, one stream URL per line) from its working directory. The
//! store treats both as an opaque bundle: reads return the whole bundle,
//! writes replace it, and a successful write fires a change notification
//! that the supervisor uses to decide whether a restart is due.
//!
//! Files written by Windows tools commonly carry a UTF-8 BOM; reads
//! tolerate it, writes never emit one.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// Main config file name, relative to the config directory.
const MAIN_CONFIG_FILE: &str = "config.ini";

/// URL list file name, relative to the config directory.
const URL_CONFIG_FILE: &str = "URL_config.ini";

/// Errors from reading or writing the configuration bundle.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure while reading or writing a config file.
    #[error("config I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-comment line appeared before any `[section]` header.
    #[error("malformed INI at {path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Raw text content of the URL config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlConfig {
    /// File content, verbatim.
    pub content: String,
}

/// The whole configuration as one replaceable value.
///
/// `main_config` maps section name to key/value pairs; `BTreeMap` keeps
/// rendering deterministic so a round-trip never reorders the file
/// arbitrarily between writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigBundle {
    /// Sections of `config.ini`.
    pub main_config: BTreeMap<String, BTreeMap<String, String>>,
    /// Raw content of `URL_config.ini`.
    pub url_config: UrlConfig,
}

/// On-disk configuration store with change notifications.
///
/// Reads never block on writers beyond filesystem latency; the change
/// channel only ticks after a write has fully succeeded, so a failed
/// write can never trigger a restart.
#[derive(Debug)]
pub struct ConfigStore {
    dir: PathBuf,
    change_tx: watch::Sender<u64>,
}

impl ConfigStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
        let (change_tx, _) = watch::channel(0);
        Ok(Self { dir, change_tx })
    }

    /// Path of the main INI file.
    #[must_use]
    pub fn main_path(&self) -> PathBuf {
        self.dir.join(MAIN_CONFIG_FILE)
    }

    /// Path of the URL list file.
    #[must_use]
    pub fn url_path(&self) -> PathBuf {
        self.dir.join(URL_CONFIG_FILE)
    }

    /// Read the current bundle. Missing files read as empty.
    pub fn read(&self) -> Result<ConfigBundle, ConfigError> {
        let main_path = self.main_path();
        let main_config = match read_text(&main_path)? {
            Some(text) => parse_ini(&text, &main_path)?,
            None => BTreeMap::new(),
        };

        let url_config = UrlConfig {
            content: read_text(&self.url_path())?.unwrap_or_default(),
        };

        Ok(ConfigBundle {
            main_config,
            url_config,
        })
    }

    /// Replace the whole bundle on disk, then fire a change notification.
    pub fn write(&self, bundle: &ConfigBundle) -> Result<(), ConfigError> {
        let main_path = self.main_path();
        write_text(&main_path, &render_ini(&bundle.main_config))?;
        write_text(&self.url_path(), &bundle.url_config.content)?;

        self.change_tx.send_modify(|version| *version += 1);
        debug!(dir = %self.dir.display(), "configuration bundle written");
        Ok(())
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver's value is a monotonically increasing write counter;
    /// subscribers only care that it changed, not what it is.
    #[must_use]
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.change_tx.subscribe()
    }
}

/// Read a file as UTF-8, stripping a leading BOM. `None` if missing.
fn read_text(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(
            text.strip_prefix('\u{feff}').unwrap_or(&text).to_string(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_text(path: &Path, content: &str) -> Result<(), ConfigError> {
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse INI text into section -> key -> value maps.
///
/// Comment lines start with `;` or `#`; keys split at the first `=` or
/// `:` with surrounding whitespace trimmed (values keep inner spacing).
fn parse_ini(
    text: &str,
    path: &Path,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, ConfigError> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(section) = current.as_ref() else {
            return Err(ConfigError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: "entry before any [section] header".into(),
            });
        };

        let Some(split) = line.find(['=', ':']) else {
            return Err(ConfigError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("expected `key = value`, got `{line}`"),
            });
        };

        let key = line[..split].trim().to_string();
        let value = line[split + 1..].trim().to_string();
        if let Some(entries) = sections.get_mut(section) {
            entries.insert(key, value);
        }
    }

    Ok(sections)
}

/// Render section maps back to INI text.
fn render_ini(sections: &BTreeMap<String, BTreeMap<String, String>>) -> String {
    let mut out = String::new();
    for (name, entries) in sections {
        let _ = writeln!(out, "[{name}]");
        for (key, value) in entries {
            let _ = writeln!(out, "{key} = {value}");
        }
        out.push('\n');
    }
    out
}
