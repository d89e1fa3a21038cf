//! Per-registration configuration.

use std::fmt;
use std::sync::Arc;

use crate::alias::AliasTable;
use crate::resolver::DialectResolver;
use crate::validation::{DialectValidator, FailFastValidator};

/// Dialect used when nothing else resolves one.
pub const DEFAULT_DIALECT_NAME: &str = "postgres";

/// Label used in reports when no source label is configured.
pub const DEFAULT_SOURCE_LABEL: &str = "<embedded fs>";

/// Configuration of one dialect-aware registration.
///
/// Built once with [`DialectOptions::builder`] and immutable afterwards.
#[derive(Clone)]
pub struct DialectOptions {
    explicit_dialect: Option<String>,
    default_dialect: String,
    aliases: AliasTable,
    resolver: Option<Arc<dyn DialectResolver>>,
    validation_targets: Vec<String>,
    validate_default: bool,
    validator: Arc<dyn DialectValidator>,
    source_label: String,
}

impl fmt::Debug for DialectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectOptions")
            .field("explicit_dialect", &self.explicit_dialect)
            .field("default_dialect", &self.default_dialect)
            .field("aliases", &self.aliases)
            .field("resolver", &self.resolver.is_some())
            .field("validation_targets", &self.validation_targets)
            .field("validate_default", &self.validate_default)
            .field("source_label", &self.source_label)
            .finish_non_exhaustive()
    }
}

impl Default for DialectOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DialectOptions {
    /// Starts building options from the defaults.
    #[must_use]
    pub fn builder() -> DialectOptionsBuilder {
        DialectOptionsBuilder::new()
    }

    /// Returns the forced dialect, if any.
    #[must_use]
    pub fn explicit_dialect(&self) -> Option<&str> {
        self.explicit_dialect.as_deref()
    }

    /// Returns the fallback dialect used when detection fails.
    #[must_use]
    pub fn default_dialect(&self) -> &str {
        &self.default_dialect
    }

    /// Returns the alias table.
    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Returns the runtime resolver, if any.
    #[must_use]
    pub fn resolver(&self) -> Option<&dyn DialectResolver> {
        self.resolver.as_deref()
    }

    /// Returns the validator invoked on missing coverage.
    #[must_use]
    pub fn validator(&self) -> &dyn DialectValidator {
        self.validator.as_ref()
    }

    /// Returns whether the resolved dialect is validated too.
    #[must_use]
    pub fn validate_default(&self) -> bool {
        self.validate_default
    }

    /// Returns the label used in validation reports.
    #[must_use]
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Normalizes a dialect name through the alias table.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        self.aliases.normalize(name)
    }

    /// Returns the explicit validation targets, normalized and de-duplicated
    /// in first-seen order. Blank names are dropped.
    #[must_use]
    pub fn validation_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::with_capacity(self.validation_targets.len());
        for raw in &self.validation_targets {
            let normalized = self.normalize(raw);
            if !normalized.is_empty() && !targets.contains(&normalized) {
                targets.push(normalized);
            }
        }
        targets
    }
}

/// Builder for [`DialectOptions`].
#[must_use]
pub struct DialectOptionsBuilder {
    dialect_name: Option<String>,
    default_dialect: Option<String>,
    aliases: AliasTable,
    resolver: Option<Arc<dyn DialectResolver>>,
    validation_targets: Vec<String>,
    validate_default: bool,
    validator: Option<Arc<dyn DialectValidator>>,
    source_label: Option<String>,
}

impl Default for DialectOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectOptionsBuilder {
    /// Creates a builder holding the defaults.
    pub fn new() -> Self {
        Self {
            dialect_name: None,
            default_dialect: None,
            aliases: AliasTable::with_defaults(),
            resolver: None,
            validation_targets: Vec::new(),
            validate_default: false,
            validator: None,
            source_label: None,
        }
    }

    /// Forces a specific dialect for this registration.
    pub fn dialect_name(mut self, name: impl Into<String>) -> Self {
        self.dialect_name = Some(name.into());
        self
    }

    /// Overrides the fallback dialect used when detection fails.
    pub fn default_dialect(mut self, name: impl Into<String>) -> Self {
        self.default_dialect = Some(name.into());
        self
    }

    /// Adds or overrides a single alias.
    pub fn alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases.insert(alias, canonical);
        self
    }

    /// Extends or overrides the built-in alias table.
    pub fn aliases<I, A, C>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        self.aliases.extend(overrides);
        self
    }

    /// Sets a resolver consulted when no dialect is forced.
    pub fn resolver(mut self, resolver: impl DialectResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the dialects to validate.
    ///
    /// An empty list validates the dialect that resolves by default
    /// instead; a non-empty list replaces that behavior.
    pub fn validation_targets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_targets = names.into_iter().map(Into::into).collect();
        self.validate_default = self.validation_targets.is_empty();
        self
    }

    /// Also validates the dialect that resolves by default.
    pub fn validate_default(mut self, enabled: bool) -> Self {
        self.validate_default = enabled;
        self
    }

    /// Overrides the fail-fast validator.
    pub fn validator(mut self, validator: impl DialectValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the label used in validation reports.
    pub fn source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// Freezes the configuration.
    ///
    /// Dialect names are normalized against the final alias table, so the
    /// order in which builder methods were called does not matter.
    #[must_use]
    pub fn build(self) -> DialectOptions {
        let aliases = self.aliases;
        let explicit_dialect = self
            .dialect_name
            .map(|name| aliases.normalize(&name))
            .filter(|name| !name.is_empty());
        let default_dialect = self
            .default_dialect
            .map(|name| aliases.normalize(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DIALECT_NAME.to_string());
        let source_label = self
            .source_label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_LABEL.to_string());

        DialectOptions {
            explicit_dialect,
            default_dialect,
            aliases,
            resolver: self.resolver,
            validation_targets: self.validation_targets,
            validate_default: self.validate_default,
            validator: self
                .validator
                .unwrap_or_else(|| Arc::new(FailFastValidator)),
            source_label,
        }
    }
}
