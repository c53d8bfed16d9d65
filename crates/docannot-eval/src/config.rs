//! Parser configuration loaded from TOML.
//!
//! Hosts that don't want to build a [`ParserContext`] by hand can describe
//! imports and ignore lists in a `.docannot.toml` (or `docannot.toml`) file:
//!
//! ```toml
//! namespace = "App\\Entity"
//! ignored_names = ["api", "internal"]
//! ignored_namespaces = ["Vendor\\Tooling"]
//! target = ["CLASS"]
//!
//! [imports]
//! route = "App\\Annotation\\Route"
//! orm = "Acme\\ORM\\Mapping"
//! ```
//!
//! All keys are optional. `standard_ignores` defaults to `true`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::context::{ImportTable, ParserContext};
use crate::target::Target;

/// File names looked up by [`ParserConfig::discover`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".docannot.toml", "docannot.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("You must either use default namespaces or imports, but not both")]
    MixedResolution,

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid Target \"{0}\". Available targets: [{1}]")]
    UnknownTarget(String, String),
}

/// TOML-friendly intermediate representation (all fields optional).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    imports: Option<BTreeMap<String, String>>,
    /// Fallback namespace for names without an import.
    namespace: Option<String>,
    /// Default namespaces; cannot be combined with `imports`.
    namespaces: Option<Vec<String>>,
    ignored_names: Option<Vec<String>>,
    ignored_namespaces: Option<Vec<String>>,
    ignore_not_imported: Option<bool>,
    standard_ignores: Option<bool>,
    target: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    pub imports: BTreeMap<String, String>,
    pub namespace: Option<String>,
    pub namespaces: Vec<String>,
    pub ignored_names: Vec<String>,
    pub ignored_namespaces: Vec<String>,
    pub ignore_not_imported: bool,
    pub standard_ignores: bool,
    pub target: Target,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            imports: BTreeMap::new(),
            namespace: None,
            namespaces: Vec::new(),
            ignored_names: Vec::new(),
            ignored_namespaces: Vec::new(),
            ignore_not_imported: false,
            standard_ignores: true,
            target: Target::empty(),
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        let defaults = Self::default();

        let mut target = Target::empty();
        for literal in file.target.unwrap_or_default() {
            match Target::from_literal(&literal) {
                Some(bits) => target |= bits,
                None => {
                    return Err(ConfigError::UnknownTarget(
                        literal,
                        Target::available_literals(),
                    ));
                }
            }
        }

        let config = Self {
            imports: file.imports.unwrap_or_default(),
            namespace: file.namespace,
            namespaces: file.namespaces.unwrap_or_default(),
            ignored_names: file.ignored_names.unwrap_or_default(),
            ignored_namespaces: file.ignored_namespaces.unwrap_or_default(),
            ignore_not_imported: file.ignore_not_imported.unwrap_or(defaults.ignore_not_imported),
            standard_ignores: file.standard_ignores.unwrap_or(defaults.standard_ignores),
            target,
        };

        if !config.namespaces.is_empty()
            && (!config.imports.is_empty() || config.namespace.is_some())
        {
            return Err(ConfigError::MixedResolution);
        }
        Ok(config)
    }

    /// Loads configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Walks up from `start_dir` and loads the first config file found.
    /// Returns the defaults when there is none.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::find_config(start_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading parser config");
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn find_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let mut dir = start_dir.as_ref().to_path_buf();
        if let Ok(abs) = dir.canonicalize() {
            dir = abs;
        }

        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Builds a [`ParserContext`] labelled `description`.
    pub fn context(&self, description: impl Into<String>) -> Result<ParserContext, ConfigError> {
        let mut ctx = ParserContext::new(description)
            .with_target(self.target)
            .with_ignored_names(self.ignored_names.iter().cloned())
            .ignore_not_imported(self.ignore_not_imported);

        if self.standard_ignores {
            ctx = ctx.with_standard_ignores();
        }
        for namespace in &self.ignored_namespaces {
            ctx = ctx.with_ignored_namespace(namespace.clone());
        }

        if !self.namespaces.is_empty() {
            for namespace in &self.namespaces {
                ctx = ctx.with_default_namespace(namespace.clone())?;
            }
            return Ok(ctx);
        }

        let mut imports = ImportTable::new();
        for (alias, type_name) in &self.imports {
            imports.insert(alias, type_name.clone());
        }
        let mut ctx = ctx.with_imports(imports)?;
        if let Some(namespace) = &self.namespace {
            ctx = ctx.with_namespace_fallback(namespace.clone())?;
        }
        Ok(ctx)
    }
}
