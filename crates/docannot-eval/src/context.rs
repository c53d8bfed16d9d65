//! Per-call parser state supplied by the host.
//!
//! A [`ParserContext`] says where a docblock came from (its description is
//! quoted in every error), which code element it sits on, how short names
//! resolve, and which names are silently skipped.

use std::collections::{HashMap, HashSet};

use crate::config::ConfigError;
use crate::target::Target;

/// Pseudo-alias that maps to the enclosing namespace of the documented code.
pub const NAMESPACE_ALIAS: &str = "__NAMESPACE__";

/// Tag names that show up in ordinary documentation and are never treated
/// as annotations.
pub const STANDARD_IGNORED_NAMES: &[&str] = &[
    // annotation meta data
    "Annotation",
    "Attribute",
    "Attributes",
    "Required",
    "Target",
    "NamedArgumentConstructor",
    // widely used tags
    "fix",
    "fixme",
    "override",
    // documentation tags
    "abstract",
    "access",
    "code",
    "deprec",
    "endcode",
    "exception",
    "final",
    "ingroup",
    "inheritdoc",
    "inheritDoc",
    "magic",
    "name",
    "toc",
    "tutorial",
    "private",
    "static",
    "staticvar",
    "staticVar",
    "throw",
    "api",
    "author",
    "category",
    "copyright",
    "deprecated",
    "example",
    "filesource",
    "global",
    "ignore",
    "internal",
    "license",
    "link",
    "method",
    "package",
    "param",
    "property",
    "return",
    "see",
    "since",
    "source",
    "subpackage",
    "throws",
    "todo",
    "TODO",
    "usedby",
    "uses",
    "var",
    "version",
    // static analysers
    "codeCoverageIgnore",
    "codeCoverageIgnoreStart",
    "codeCoverageIgnoreEnd",
    "SuppressWarnings",
    "noinspection",
    "package_version",
    "suppress",
    "template",
    "extends",
    "implements",
    // test frameworks
    "after",
    "afterClass",
    "backupGlobals",
    "backupStaticAttributes",
    "before",
    "beforeClass",
    "covers",
    "coversDefaultClass",
    "coversNothing",
    "dataProvider",
    "depends",
    "doesNotPerformAssertions",
    "expectedException",
    "expectedExceptionCode",
    "expectedExceptionMessage",
    "expectedExceptionMessageRegExp",
    "group",
    "large",
    "medium",
    "preserveGlobalState",
    "requires",
    "runTestsInSeparateProcesses",
    "runInSeparateProcess",
    "small",
    "test",
    "testdox",
    "testWith",
    "ticket",
    "uses",
];

/// Alias table of `use` statements, keyed by lowercased alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportTable {
    entries: HashMap<String, String>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: &str, type_name: impl Into<String>) {
        let key = if alias == NAMESPACE_ALIAS {
            alias.to_string()
        } else {
            alias.to_ascii_lowercase()
        };
        self.entries.insert(key, type_name.into());
    }

    pub fn with(mut self, alias: &str, type_name: impl Into<String>) -> Self {
        self.insert(alias, type_name);
        self
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .get(&alias.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Fallback namespace registered under [`NAMESPACE_ALIAS`].
    pub fn namespace(&self) -> Option<&str> {
        self.entries.get(NAMESPACE_ALIAS).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How short annotation names turn into fully-qualified ones.
#[derive(Debug, Clone, PartialEq)]
pub enum NameResolution {
    /// Aliases from `use` statements plus an optional fallback namespace.
    Imports(ImportTable),
    /// Each namespace is tried in order as a prefix.
    Namespaces(Vec<String>),
}

impl Default for NameResolution {
    fn default() -> Self {
        NameResolution::Imports(ImportTable::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserContext {
    description: String,
    target: Target,
    resolution: NameResolution,
    ignored_names: HashSet<String>,
    ignored_namespaces: Vec<String>,
    ignore_not_imported: bool,
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new("")
    }
}

impl ParserContext {
    /// `description` is quoted in error messages, e.g. `class App\Controller`.
    /// The target starts empty, which disables target checks.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            target: Target::empty(),
            resolution: NameResolution::default(),
            ignored_names: HashSet::new(),
            ignored_namespaces: Vec::new(),
            ignore_not_imported: false,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Registers one import. Fails once default namespaces are configured.
    pub fn with_import(
        mut self,
        alias: &str,
        type_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.imports_mut()?.insert(alias, type_name);
        Ok(self)
    }

    /// Replaces the whole import table.
    pub fn with_imports(mut self, imports: ImportTable) -> Result<Self, ConfigError> {
        self.imports_mut()?;
        self.resolution = NameResolution::Imports(imports);
        Ok(self)
    }

    /// Namespace tried after imports for names without a matching alias.
    pub fn with_namespace_fallback(self, namespace: impl Into<String>) -> Result<Self, ConfigError> {
        self.with_import(NAMESPACE_ALIAS, namespace)
    }

    /// Adds a namespace tried as a prefix for every short name. Fails once
    /// imports are configured.
    pub fn with_default_namespace(
        mut self,
        namespace: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let switch = match &self.resolution {
            NameResolution::Imports(table) if !table.is_empty() => {
                return Err(ConfigError::MixedResolution);
            }
            NameResolution::Imports(_) => true,
            NameResolution::Namespaces(_) => false,
        };
        if switch {
            self.resolution = NameResolution::Namespaces(Vec::new());
        }
        if let NameResolution::Namespaces(list) = &mut self.resolution {
            list.push(namespace.into());
        }
        Ok(self)
    }

    pub fn with_ignored_name(mut self, name: impl Into<String>) -> Self {
        self.ignored_names.insert(name.into());
        self
    }

    pub fn with_ignored_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Every name under `namespace` is skipped, matched case-insensitively.
    pub fn with_ignored_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.ignored_namespaces.push(namespace.into());
        self
    }

    pub fn with_standard_ignores(self) -> Self {
        self.with_ignored_names(STANDARD_IGNORED_NAMES.iter().copied())
    }

    /// Skip unresolvable names instead of failing.
    pub fn ignore_not_imported(mut self, ignore: bool) -> Self {
        self.ignore_not_imported = ignore;
        self
    }

    fn imports_mut(&mut self) -> Result<&mut ImportTable, ConfigError> {
        let switch = match &self.resolution {
            NameResolution::Namespaces(list) if !list.is_empty() => {
                return Err(ConfigError::MixedResolution);
            }
            NameResolution::Namespaces(_) => true,
            NameResolution::Imports(_) => false,
        };
        if switch {
            self.resolution = NameResolution::default();
        }
        match &mut self.resolution {
            NameResolution::Imports(table) => Ok(table),
            NameResolution::Namespaces(_) => Err(ConfigError::MixedResolution),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn resolution(&self) -> &NameResolution {
        &self.resolution
    }

    pub fn ignores_not_imported(&self) -> bool {
        self.ignore_not_imported
    }

    /// Exact match against the ignored-name set.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.ignored_names.contains(name)
    }

    /// Whether an unresolved name should be skipped rather than reported.
    pub fn is_ignored(&self, name: &str) -> bool {
        if self.ignore_not_imported || self.is_ignored_name(name) {
            return true;
        }

        let lowered = format!("{}\\", name.trim_end_matches('\\')).to_ascii_lowercase();
        self.ignored_namespaces.iter().any(|namespace| {
            let prefix = format!("{}\\", namespace.trim_end_matches('\\')).to_ascii_lowercase();
            lowered.starts_with(&prefix)
        })
    }
}
