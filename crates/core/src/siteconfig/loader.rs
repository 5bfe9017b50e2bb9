use crate::error::{Result, UrlTitleError};
use crate::siteconfig::builtin::BUILTIN_OVERRIDES;
use crate::siteconfig::directives::SiteOverride;
use crate::siteconfig::parser::ConfigParser;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable table of site overrides keyed by normalized host
///
/// Lookups for hosts without an entry return a shared empty override.
#[derive(Debug, Clone)]
pub struct OverrideRegistry {
    entries: HashMap<String, Arc<SiteOverride>>,
    empty: Arc<SiteOverride>,
}

impl OverrideRegistry {
    /// Registry holding only the built-in overrides
    pub fn builtin() -> Result<Self> {
        ConfigLoaderBuilder::new().build().load()
    }

    /// Registry with no overrides at all
    pub fn empty() -> Self {
        Self { entries: HashMap::new(), empty: Arc::new(SiteOverride::new()) }
    }

    /// Override for a normalized host
    pub fn lookup(&self, host: &str) -> Arc<SiteOverride> {
        self.entries.get(host).cloned().unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// Whether a host has a non-empty override
    pub fn contains(&self, host: &str) -> bool {
        self.entries.contains_key(host)
    }

    /// Add or merge an entry for a host
    pub fn insert(&mut self, host: &str, entry: SiteOverride) {
        let host = normalize_key(host);
        match self.entries.get_mut(&host) {
            Some(existing) => Arc::make_mut(existing).merge(&entry),
            None => {
                self.entries.insert(host, Arc::new(entry));
            }
        }
    }

    /// Sorted list of hosts with an entry
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

fn normalize_key(host: &str) -> String {
    let host = host.trim().to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Loads the override registry from the built-in table and a custom directory
///
/// Custom files are named `<host>.txt`; their directives merge over the
/// built-in entry for the same host.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Custom override directory path
    custom_dir: Option<PathBuf>,
    /// Whether the built-in table is included
    builtin: bool,
}

impl ConfigLoader {
    /// Create a loader for the built-in table only
    pub fn new() -> Self {
        Self { custom_dir: None, builtin: true }
    }

    /// Create a builder
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::new()
    }

    /// Build the registry
    pub fn load(&self) -> Result<OverrideRegistry> {
        let mut registry = OverrideRegistry::empty();

        if self.builtin {
            for (host, directives) in BUILTIN_OVERRIDES {
                let entry = ConfigParser::parse_string(directives).map_err(|e| {
                    UrlTitleError::SiteConfigError(format!("Built-in override for {}: {}", host, e))
                })?;
                registry.insert(host, entry);
            }
        }

        if let Some(custom_dir) = &self.custom_dir {
            for (host, path) in Self::find_config_files(custom_dir)? {
                let entry = ConfigParser::parse_file(&path)?;
                tracing::debug!("Loaded site override for {} from {}", host, path.display());
                registry.insert(&host, entry);
            }
        }

        registry.entries.retain(|_, entry| !entry.is_empty());
        tracing::debug!("Site override registry has {} hosts", registry.len());
        Ok(registry)
    }

    /// All `*.txt` files of a directory with their host keys, sorted by host
    fn find_config_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let read_dir = fs::read_dir(dir).map_err(|e| {
            UrlTitleError::SiteConfigError(format!("Cannot read directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((normalize_key(stem), path));
            }
        }

        files.sort();
        Ok(files)
    }

    /// Get default custom override directory (~/.config/urltitle/sites)
    pub fn default_custom_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home_dir| home_dir.join(".config").join("urltitle").join("sites"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        let mut builder = ConfigLoaderBuilder::new();

        if let Some(custom_dir) = Self::default_custom_dir() {
            builder = builder.custom_dir(custom_dir);
        }

        builder.build()
    }
}

/// Builder for ConfigLoader
#[derive(Debug)]
pub struct ConfigLoaderBuilder {
    custom_dir: Option<PathBuf>,
    builtin: bool,
}

impl ConfigLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { custom_dir: None, builtin: true }
    }

    /// Set custom override directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip the built-in table
    pub fn builtin(mut self, builtin: bool) -> Self {
        self.builtin = builtin;
        self
    }

    /// Build the ConfigLoader
    pub fn build(self) -> ConfigLoader {
        ConfigLoader { custom_dir: self.custom_dir, builtin: self.builtin }
    }
}

impl Default for ConfigLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
