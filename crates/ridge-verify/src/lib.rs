//! Method override and erasure-clash verification for a resolved Java
//! class/interface hierarchy.
//!
//! Given a frozen [`TypeEnv`] (see `ridge-types`), [`verify`] decides for
//! every requested type which declared or inherited methods override,
//! implement, hide, or erasure-clash with one another, and returns the
//! resulting diagnostics together with the synthetic bridge methods the
//! accepted overrides require. The computation is pure and deterministic:
//! the same hierarchy always yields the same outcome, and one broken type
//! (an unresolved ancestor) degrades to a single diagnostic without
//! stopping the rest of the run.
//!
//! ```
//! use ridge_types::{ClassDef, MethodDef, Type, TypeStore};
//! use ridge_verify::{verify, CompatibilityMode};
//!
//! let mut store = TypeStore::with_minimal_jdk();
//! let base = store.add_class(ClassDef {
//!     methods: vec![MethodDef::new("run", vec![], Type::Void)],
//!     ..ClassDef::class("com.example.Base")
//! });
//! let sub = store.add_class(ClassDef {
//!     methods: vec![MethodDef::new("run", vec![], Type::Void)],
//!     super_class: Some(Type::class(base, vec![])),
//!     ..ClassDef::class("com.example.Sub")
//! });
//!
//! let outcome = verify(&store, &[base, sub], CompatibilityMode::default());
//! assert!(outcome.diagnostics.is_empty());
//! ```

#![forbid(unsafe_code)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ridge_types::{canonicalize_named, ClassId, ClassType, Type, TypeEnv};

mod bridge;
mod diagnostics;
mod matcher;
mod reporter;
mod resolve;

pub use bridge::BridgePlan;
pub use diagnostics::{Diagnostic, DiagnosticKind, MethodRef, Severity};
pub use matcher::{classify, Classification, OverrideRelation, Violation};
pub use resolve::{Ancestor, AncestorTable, ResolveError, ResolvedMethod};

/// Which reference semantics the verifier applies where history diverged.
///
/// [`CompatibilityMode::Jls`] is the documented reference behavior.
/// [`CompatibilityMode::Javac6`] reproduces the javac 6 demotion of an
/// erasure clash to a warning when the clashing return erasures differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompatibilityMode {
    #[default]
    Jls,
    Javac6,
}

/// Everything one verification run produces.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub bridges: Vec<BridgePlan>,
}

impl VerifyOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Verify `roots`, ancestors before subtypes, and collect diagnostics and
/// bridge plans. Types not listed in `roots` contribute methods but are
/// not themselves verified.
pub fn verify(env: &dyn TypeEnv, roots: &[ClassId], mode: CompatibilityMode) -> VerifyOutcome {
    let mut outcome = VerifyOutcome::default();
    for id in topo_order(env, roots) {
        let class_name = env
            .class(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("<class#{}>", id.index()));
        debug!(class = %class_name, "verifying type");
        match AncestorTable::build(env, id) {
            Err(err) => {
                debug!(class = %class_name, %err, "skipping type");
                outcome.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedAncestorType,
                    id,
                    class_name,
                    None,
                    vec![],
                ));
            }
            Ok(table) => {
                let report = reporter::check_type(env, id, &table, mode);
                outcome.diagnostics.extend(report.diagnostics);
                outcome
                    .bridges
                    .extend(bridge::plan(env, id, &table, &report.accepted));
            }
        }
    }
    outcome
}

/// Roots ordered so every listed ancestor precedes its listed subtypes;
/// the relative order of unrelated roots is preserved.
fn topo_order(env: &dyn TypeEnv, roots: &[ClassId]) -> Vec<ClassId> {
    let root_set: HashSet<ClassId> = roots.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(roots.len());
    for &id in roots {
        visit(env, id, &root_set, &mut seen, &mut order);
    }
    order
}

fn visit(
    env: &dyn TypeEnv,
    id: ClassId,
    root_set: &HashSet<ClassId>,
    seen: &mut HashSet<ClassId>,
    order: &mut Vec<ClassId>,
) {
    if !seen.insert(id) {
        return;
    }
    if let Some(def) = env.class(id) {
        let edges = def.super_class.iter().chain(def.interfaces.iter());
        for edge in edges {
            if let Type::Class(ClassType { def: parent, .. }) = canonicalize_named(env, edge) {
                visit(env, parent, root_set, seen, order);
            }
        }
    }
    if root_set.contains(&id) {
        order.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_types::{ClassDef, TypeStore};

    #[test]
    fn topo_order_puts_ancestors_first() {
        let mut store = TypeStore::with_minimal_jdk();
        let base = store.intern_class_id("com.example.Base");
        let sub = store.add_class(ClassDef {
            super_class: Some(Type::class(base, vec![])),
            ..ClassDef::class("com.example.Sub")
        });
        store.define_class(base, ClassDef::class("com.example.Base"));

        assert_eq!(topo_order(&store, &[sub, base]), vec![base, sub]);
    }

    #[test]
    fn undefined_root_reports_unresolved() {
        let mut store = TypeStore::with_minimal_jdk();
        let ghost = store.intern_class_id("com.example.Ghost");

        let outcome = verify(&store, &[ghost], CompatibilityMode::default());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::UnresolvedAncestorType
        );
    }
}
