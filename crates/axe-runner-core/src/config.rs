use std::{fs, path::PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Well-known configuration file name, resolved against the working directory.
pub const CONFIG_FILENAME: &str = "axe.conf.json";

/// Selector scanned when neither the config file nor the call site names one.
pub const DEFAULT_CONTEXT: &str = "html";

/// Scan timeout applied when no layer overrides it.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Effective configuration for one scan invocation: the DOM subtree to scan
/// plus the options forwarded to the engine and consulted by the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub context: String,
    pub options: ScanOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            options: ScanOptions::default(),
        }
    }
}

/// Options for a scan. The boolean flags each toggle one section of the
/// formatted report; `extra` holds fields this crate does not interpret,
/// passed through to the engine verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanOptions {
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    pub verbose: bool,
    pub selectors: bool,
    pub ancestry: bool,
    pub element_ref: bool,
    pub related_nodes: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verbose: false,
            selectors: false,
            ancestry: false,
            element_ref: false,
            related_nodes: false,
            extra: Map::new(),
        }
    }
}

impl ScanOptions {
    /// Overlay `patch` field by field: every field the patch carries replaces
    /// the current value, every absent field is left untouched.
    pub fn apply(&mut self, patch: &ScanOptionsPatch) {
        if let Some(timeout_ms) = patch.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(verbose) = patch.verbose {
            self.verbose = verbose;
        }
        if let Some(selectors) = patch.selectors {
            self.selectors = selectors;
        }
        if let Some(ancestry) = patch.ancestry {
            self.ancestry = ancestry;
        }
        if let Some(element_ref) = patch.element_ref {
            self.element_ref = element_ref;
        }
        if let Some(related_nodes) = patch.related_nodes {
            self.related_nodes = related_nodes;
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Partial scan options: the overlay unit for file configuration and
/// call-site overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanOptionsPatch {
    #[serde(rename = "timeout")]
    pub timeout_ms: Option<u64>,
    pub verbose: Option<bool>,
    pub selectors: Option<bool>,
    pub ancestry: Option<bool>,
    pub element_ref: Option<bool>,
    pub related_nodes: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shape of the `axe.conf.json` file. Both fields are optional; the file
/// only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    pub context: Option<String>,
    pub options: Option<ScanOptionsPatch>,
}

/// Errors raised while resolving configuration. A missing config file is not
/// an error; a present but broken one always is.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
    #[error("options.timeout must be a positive number of milliseconds (got {timeout_ms})")]
    InvalidTimeout { timeout_ms: u64 },
}

/// Abstraction over where the file-layer configuration comes from, so tests
/// and embedders can supply one without touching the filesystem.
pub trait ConfigSource {
    /// Return the file-layer configuration, or `None` when there is none.
    fn load(&self) -> Result<Option<FileConfig>, ConfigError>;
}

/// Loads `axe.conf.json` (JSON5 syntax, so JS-style comments and trailing
/// commas are accepted) from a fixed path, caching the parse for the life of
/// the loader.
pub struct FileConfigLoader {
    path: PathBuf,
    cache: OnceCell<Option<FileConfig>>,
}

impl FileConfigLoader {
    /// Loader for `axe.conf.json` in the current working directory.
    pub fn new() -> Self {
        Self::with_path(CONFIG_FILENAME)
    }

    /// Loader for a config file at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for FileConfigLoader {
    fn load(&self) -> Result<Option<FileConfig>, ConfigError> {
        let loaded = self.cache.get_or_try_init(|| {
            if !self.path.exists() {
                return Ok(None);
            }
            let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
            let parsed = json5::from_str(&raw).map_err(|source| ConfigError::Malformed {
                path: self.path.clone(),
                source,
            })?;
            Ok(Some(parsed))
        })?;
        Ok(loaded.clone())
    }
}

/// Merge the three configuration layers into one effective config.
///
/// Priority is built-in defaults < file config < call site, applied per
/// field: a layer only changes the fields it actually carries. The context
/// is replaced only by a non-empty selector. A resulting timeout of zero is
/// rejected rather than silently replaced.
pub fn resolve(
    source: &dyn ConfigSource,
    custom_context: Option<&str>,
    custom_options: Option<&ScanOptionsPatch>,
) -> Result<ScanConfig, ConfigError> {
    let mut config = ScanConfig::default();

    if let Some(file) = source.load()? {
        if let Some(context) = file.context.filter(|c| !c.trim().is_empty()) {
            config.context = context;
        }
        if let Some(options) = &file.options {
            config.options.apply(options);
        }
    }

    if let Some(context) = custom_context.filter(|c| !c.trim().is_empty()) {
        config.context = context.to_string();
    }
    if let Some(options) = custom_options {
        config.options.apply(options);
    }

    if config.options.timeout_ms == 0 {
        return Err(ConfigError::InvalidTimeout { timeout_ms: 0 });
    }
    Ok(config)
}
