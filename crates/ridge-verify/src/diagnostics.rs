//! The diagnostic surface of the verifier.
//!
//! Diagnostics carry structured references to the offending type and
//! method(s) rather than pre-baked message strings, so embedders can render
//! them however they like. [`Diagnostic::message`] provides a readable
//! default rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use ridge_types::ClassId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong, independent of message wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    NameClash,
    DuplicateMethodSameErasure,
    MustImplementAbstract,
    IncompatibleReturnType,
    IncompatibleReturnTypesAcrossSupertypes,
    CannotReduceVisibility,
    CannotOverrideFinal,
    StaticInstanceMismatch,
    ExceptionNotCompatible,
    VarargsMismatch,
    RawTypeUsage,
    UncheckedConversion,
    SynchronizedMismatch,
    UnresolvedAncestorType,
}

impl DiagnosticKind {
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::VarargsMismatch
            | DiagnosticKind::RawTypeUsage
            | DiagnosticKind::UncheckedConversion
            | DiagnosticKind::SynchronizedMismatch => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A rendered reference to one method, usable in multi-method messages.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: ClassId,
    pub class_name: String,
    /// Erased rendering, e.g. `void foo(java.lang.Object)`.
    pub erased: String,
    /// Generic rendering, e.g. `<T> void foo(T)`.
    pub generic: String,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.generic, self.class_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// The type being verified when the problem was found.
    pub class: ClassId,
    pub class_name: String,
    /// The offending method, when the problem is about one.
    pub method: Option<MethodRef>,
    /// Other methods referenced by the message (overridden method,
    /// clashing partner, unsatisfied abstract declarations, ...).
    pub related: Vec<MethodRef>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        class: ClassId,
        class_name: impl Into<String>,
        method: Option<MethodRef>,
        related: Vec<MethodRef>,
    ) -> Self {
        Diagnostic {
            severity: kind.default_severity(),
            kind,
            class,
            class_name: class_name.into(),
            method,
            related,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// A readable default rendering.
    pub fn message(&self) -> String {
        let method = self
            .method
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_default();
        let first_related = self.related.first().map(|m| m.to_string());
        match self.kind {
            DiagnosticKind::NameClash => format!(
                "name clash: {} and {} have the same erasure, yet neither overrides the other",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::DuplicateMethodSameErasure => {
                format!("duplicate method: {} has the same erasure as {}", method,
                    first_related.unwrap_or_default())
            }
            DiagnosticKind::MustImplementAbstract => match first_related {
                Some(overriding) => format!(
                    "{} must implement the inherited abstract method {} to override {}",
                    self.class_name, method, overriding
                ),
                None => format!(
                    "{} must implement the inherited abstract method {}",
                    self.class_name, method
                ),
            },
            DiagnosticKind::IncompatibleReturnType => format!(
                "the return type of {} is incompatible with {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::IncompatibleReturnTypesAcrossSupertypes => {
                let all: Vec<String> = self.related.iter().map(|m| m.to_string()).collect();
                format!(
                    "the return types are incompatible for the inherited methods {}",
                    all.join(", ")
                )
            }
            DiagnosticKind::CannotReduceVisibility => format!(
                "cannot reduce the visibility of the inherited method {}",
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::CannotOverrideFinal => format!(
                "{} cannot override the final method {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::StaticInstanceMismatch => format!(
                "static/instance conflict between {} and {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::ExceptionNotCompatible => format!(
                "exception in {} is not compatible with the throws clause of {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::VarargsMismatch => format!(
                "varargs mismatch between {} and {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::RawTypeUsage => match &self.method {
                Some(_) => format!("{} references a raw type", method),
                None => format!("{} extends or implements a raw type", self.class_name),
            },
            DiagnosticKind::UncheckedConversion => format!(
                "unchecked conversion: {} overrides {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::SynchronizedMismatch => format!(
                "{} is not synchronized but overrides the synchronized method {}",
                method,
                first_related.unwrap_or_default()
            ),
            DiagnosticKind::UnresolvedAncestorType => format!(
                "{} references an unresolved ancestor type and was not verified",
                self.class_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_and_errors_default_correctly() {
        assert_eq!(
            DiagnosticKind::VarargsMismatch.default_severity(),
            Severity::Warning
        );
        assert_eq!(
            DiagnosticKind::RawTypeUsage.default_severity(),
            Severity::Warning
        );
        assert_eq!(
            DiagnosticKind::NameClash.default_severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticKind::UnresolvedAncestorType.default_severity(),
            Severity::Error
        );
    }
}
