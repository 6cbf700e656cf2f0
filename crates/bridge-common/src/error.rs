//! Error and warning taxonomy for the bridge backend.
//!
//! Fatal errors abort translation of the current unit (a member or a type)
//! and are returned to the caller. Recoverable problems become warnings that
//! accumulate in [`Diagnostics`] without blocking output. Internal invariant
//! violations are asserted in debug builds and also surface as
//! [`BridgeError`] values so release builds can report them.

use std::fmt;

use serde::Serialize;

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The current unit cannot be translated.
    Fatal,
    /// The backend broke one of its own invariants.
    Internal,
    /// Translation proceeds with reduced fidelity.
    Warning,
}

/// An error that aborts translation of the current unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BridgeError {
    /// A generic method is also abstract. The target model has no
    /// overridable generic members, and the body must come from a subclass,
    /// so there is nothing that can be emitted in its place.
    AbstractGenericMethod {
        type_name: String,
        method_name: String,
    },
    /// A type that should already be resolved has no type info.
    MissingTypeInfo { type_name: String },
    /// A type was marked as cleared while it still had dependencies.
    DependenciesNotEmpty { type_name: String, remaining: usize },
    /// A declaration id does not belong to the source model.
    UnknownDeclaration { index: u32 },
}

impl BridgeError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::AbstractGenericMethod { .. } => "E0100",
            BridgeError::MissingTypeInfo { .. } => "E0110",
            BridgeError::DependenciesNotEmpty { .. } => "E0111",
            BridgeError::UnknownDeclaration { .. } => "E0112",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BridgeError::AbstractGenericMethod { .. } => Severity::Fatal,
            BridgeError::MissingTypeInfo { .. }
            | BridgeError::DependenciesNotEmpty { .. }
            | BridgeError::UnknownDeclaration { .. } => Severity::Internal,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::AbstractGenericMethod {
                type_name,
                method_name,
            } => write!(
                f,
                "`{}.{}` is generic and abstract, which has no target form",
                type_name, method_name
            ),
            BridgeError::MissingTypeInfo { type_name } => {
                write!(f, "type info for `{}` is missing", type_name)
            }
            BridgeError::DependenciesNotEmpty {
                type_name,
                remaining,
            } => write!(
                f,
                "`{}` was cleared with {} dependencies remaining",
                type_name, remaining
            ),
            BridgeError::UnknownDeclaration { index } => {
                write!(f, "declaration #{} is not part of the source model", index)
            }
        }
    }
}

impl std::error::Error for BridgeError {}

/// A recoverable problem. Output is still produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BridgeWarning {
    /// A generic method is virtual. It is emitted non-virtual, so calls
    /// through a base reference will not reach overrides.
    VirtualGenericMethod {
        type_name: String,
        method_name: String,
    },
    /// The remaining types depend on each other by value and cannot be
    /// ordered. They are emitted anyway, in name order.
    DependencyCycle { cycle_path: Vec<String> },
}

impl BridgeWarning {
    pub fn code(&self) -> &'static str {
        match self {
            BridgeWarning::VirtualGenericMethod { .. } => "W0101",
            BridgeWarning::DependencyCycle { .. } => "W0120",
        }
    }
}

impl fmt::Display for BridgeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeWarning::VirtualGenericMethod {
                type_name,
                method_name,
            } => write!(
                f,
                "`{}.{}` is generic and virtual; emitted non-virtual",
                type_name, method_name
            ),
            BridgeWarning::DependencyCycle { cycle_path } => {
                write!(f, "dependency cycle: {}", cycle_path.join(" -> "))
            }
        }
    }
}

/// Problems collected over one compilation run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Diagnostics {
    errors: Vec<BridgeError>,
    warnings: Vec<BridgeWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a unit whose translation was aborted.
    pub fn error(&mut self, error: BridgeError) {
        tracing::error!(code = error.code(), "{}", error);
        self.errors.push(error);
    }

    pub fn warn(&mut self, warning: BridgeWarning) {
        tracing::warn!(code = warning.code(), "{}", warning);
        self.warnings.push(warning);
    }

    pub fn errors(&self) -> &[BridgeError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[BridgeWarning] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// One line per problem, errors first: `error[E0100]: ...`.
    pub fn render(&self) -> Vec<String> {
        let errors = self
            .errors
            .iter()
            .map(|e| format!("error[{}]: {}", e.code(), e));
        let warnings = self
            .warnings
            .iter()
            .map(|w| format!("warning[{}]: {}", w.code(), w));
        errors.chain(warnings).collect()
    }

    /// Machine-readable form for tooling that consumes the run's problems.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
