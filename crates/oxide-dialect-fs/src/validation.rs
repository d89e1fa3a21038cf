//! Dialect coverage validation.
//!
//! Validation builds every requested dialect and reports the ones with no
//! SQL files in any layer. What happens next is up to the configured
//! [`DialectValidator`]: the default [`FailFastValidator`] turns missing
//! coverage into an error, [`WarnOnlyValidator`] only logs it.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::alias::AliasTable;
use crate::error::{MigrateError, Result};
use crate::layer::LayerDiagnostic;
use crate::registration::DialectRegistration;
use crate::resolver::DialectConnection;

/// Reason used when no layer diagnostic explains missing coverage.
pub const NO_SQL_DISCOVERED: &str = "no SQL files discovered across any layer";

/// Coverage outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialectValidationResult {
    /// Label of the validated source.
    pub source_label: String,
    /// Index of the registration among dialect registrations.
    pub registration_index: usize,
    /// Dialects that were built, in order.
    pub checked_dialects: Vec<String>,
    /// Dialects without coverage, with one reason per empty layer.
    pub missing_dialects: IndexMap<String, Vec<String>>,
    /// Snapshot of the alias table used.
    pub dialect_aliases: AliasTable,
    /// Layer diagnostics of every checked dialect.
    pub diagnostics: IndexMap<String, Vec<LayerDiagnostic>>,
    /// Targets that were requested, normalized.
    pub requested_targets: Vec<String>,
}

impl DialectValidationResult {
    /// Returns whether any dialect lacks coverage.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        !self.missing_dialects.is_empty()
    }

    /// Formats the aggregated report of every missing dialect.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "dialect migrations validation failed for {} (registration #{})",
            self.source_label, self.registration_index
        );
        for (dialect, reasons) in &self.missing_dialects {
            let _ = write!(out, "\n  - {dialect}:");
            for reason in reasons {
                let _ = write!(out, " {reason};");
            }
        }
        out
    }
}

/// Turns layer diagnostics into human-readable reasons.
///
/// Only layers with zero matched files are reported.
#[must_use]
pub fn reasons_from_diagnostics(diagnostics: &[LayerDiagnostic]) -> Vec<String> {
    let mut reasons: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.files == 0)
        .filter_map(|d| {
            d.reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(|r| format!("{}: {r}", d.label()))
        })
        .collect();
    if reasons.is_empty() {
        reasons.push(NO_SQL_DISCOVERED.to_string());
    }
    reasons
}

/// Policy applied when validation finds missing coverage.
///
/// Returning `Ok(())` suppresses the failure; returning an error aborts
/// whatever triggered validation.
pub trait DialectValidator: Send + Sync {
    /// Decides what to do with a result that has missing dialects.
    fn check(&self, result: DialectValidationResult) -> Result<()>;
}

impl<F> DialectValidator for F
where
    F: Fn(DialectValidationResult) -> Result<()> + Send + Sync,
{
    fn check(&self, result: DialectValidationResult) -> Result<()> {
        self(result)
    }
}

/// Default validator: missing coverage is a fatal configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFastValidator;

impl DialectValidator for FailFastValidator {
    fn check(&self, result: DialectValidationResult) -> Result<()> {
        Err(MigrateError::MissingCoverage {
            message: result.summary(),
            result: Box::new(result),
        })
    }
}

/// Validator that logs missing coverage and carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarnOnlyValidator;

impl DialectValidator for WarnOnlyValidator {
    fn check(&self, result: DialectValidationResult) -> Result<()> {
        for (dialect, reasons) in &result.missing_dialects {
            warn!(
                source = %result.source_label,
                registration = result.registration_index,
                dialect = %dialect,
                reasons = %reasons.join("; "),
                "Dialect has no migration coverage"
            );
        }
        Ok(())
    }
}

/// Validates dialect coverage for one registration.
///
/// Targets are the explicit validation targets plus, when enabled, the
/// dialect that resolves by default. No targets means nothing to check.
pub async fn validate(
    registration: &DialectRegistration,
    conn: Option<&dyn DialectConnection>,
    index: usize,
) -> Result<()> {
    let options = registration.options();
    let mut targets = options.validation_targets();

    if options.validate_default() {
        let resolved = registration.resolve_dialect(conn).await?;
        if !resolved.is_empty() && !targets.contains(&resolved) {
            targets.push(resolved);
        }
    }

    if targets.is_empty() {
        debug!(source = options.source_label(), "No dialect validation targets");
        return Ok(());
    }

    let mut result = DialectValidationResult {
        source_label: options.source_label().to_string(),
        registration_index: index,
        checked_dialects: Vec::with_capacity(targets.len()),
        missing_dialects: IndexMap::new(),
        dialect_aliases: options.aliases().clone(),
        diagnostics: IndexMap::new(),
        requested_targets: targets.clone(),
    };

    for target in &targets {
        let build = registration.build_for_dialect(target)?;
        result.checked_dialects.push(target.clone());
        if !build.has_sql() {
            result
                .missing_dialects
                .insert(target.clone(), reasons_from_diagnostics(build.diagnostics()));
        }
        result
            .diagnostics
            .insert(target.clone(), build.diagnostics().to_vec());
    }

    if !result.has_missing() {
        debug!(
            source = %result.source_label,
            dialects = ?result.checked_dialects,
            "Dialect coverage complete"
        );
        return Ok(());
    }

    options.validator().check(result)
}
