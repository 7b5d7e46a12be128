//! Per-type aggregation of pairwise classifications into diagnostics.
//!
//! For one verified type this runs the matcher over declared-vs-declared
//! pairs (duplicate detection), declared-vs-inherited pairs, and
//! inherited-vs-inherited pairs from unrelated ancestors (diamond), then
//! settles abstract obligations and raw-type warnings. All checks are
//! independent and non-aborting; everything for the type is collected
//! before the caller moves on.

use std::collections::{BTreeMap, BTreeSet};

use ridge_types::{ClassId, TypeEnv, Visibility};

use crate::diagnostics::{Diagnostic, DiagnosticKind, MethodRef, Severity};
use crate::matcher::{self, classify, Classification, OverrideRelation, Violation};
use crate::resolve::{AncestorTable, ResolvedMethod};
use crate::CompatibilityMode;

/// An error-free Overrides/Implements edge, kept for bridge planning.
pub(crate) struct AcceptedEdge {
    pub delegate: ResolvedMethod,
    pub ancestor: ResolvedMethod,
    pub needs_unchecked: bool,
    pub needs_bridge: bool,
}

pub(crate) struct TypeReport {
    pub diagnostics: Vec<Diagnostic>,
    pub accepted: Vec<AcceptedEdge>,
}

struct Inherited<'a> {
    method: &'a ResolvedMethod,
    is_abstract: bool,
}

pub(crate) fn check_type(
    env: &dyn TypeEnv,
    class: ClassId,
    table: &AncestorTable,
    mode: CompatibilityMode,
) -> TypeReport {
    let mut diagnostics = Vec::new();
    let mut accepted = Vec::new();
    let Some(class_def) = env.class(class) else {
        return TypeReport {
            diagnostics,
            accepted,
        };
    };
    let class_name = class_def.name.clone();
    let concrete = !class_def.is_abstract && !class_def.is_interface();

    let declared: Vec<ResolvedMethod> = class_def
        .methods
        .iter()
        .enumerate()
        .map(|(index, m)| ResolvedMethod::declared(env, class, index, m))
        .collect();

    // Duplicate detection among the type's own declarations.
    for j in 1..declared.len() {
        for i in 0..j {
            let (a, b) = (&declared[i], &declared[j]);
            if a.def.name == b.def.name && a.erased_params == b.erased_params {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateMethodSameErasure,
                    class,
                    &class_name,
                    Some(b.to_ref(env)),
                    vec![a.to_ref(env)],
                ));
            }
        }
    }

    // Everything inherited, grouped by name for pairwise matching.
    let mut by_name: BTreeMap<&str, Vec<Inherited<'_>>> = BTreeMap::new();
    for ancestor in &table.ancestors {
        let from_interface = env
            .class(ancestor.class)
            .map(|d| d.is_interface())
            .unwrap_or(false);
        for method in &ancestor.methods {
            by_name
                .entry(method.def.name.as_str())
                .or_default()
                .push(Inherited {
                    method,
                    is_abstract: method.def.is_abstract || from_interface,
                });
        }
    }

    // Declared against inherited.
    for d in &declared {
        if d.def.visibility == Visibility::Private {
            continue;
        }
        let Some(group) = by_name.get(d.def.name.as_str()) else {
            continue;
        };
        for inh in group {
            let rel = classify(env, d, inh.method, inh.is_abstract);
            match rel.classification {
                Classification::Unrelated => {}
                Classification::NameClash => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::NameClash,
                            class,
                            &class_name,
                            Some(d.to_ref(env)),
                            vec![inh.method.to_ref(env)],
                        )
                        .with_severity(clash_severity(mode, d, inh.method)),
                    );
                }
                _ => {
                    emit_pair_diagnostics(env, class, &class_name, d, inh.method, &rel, &mut diagnostics);
                    if rel.is_accepted()
                        && !d.def.is_abstract
                        && rel.classification != Classification::Hides
                    {
                        accepted.push(AcceptedEdge {
                            delegate: d.clone(),
                            ancestor: inh.method.clone(),
                            needs_unchecked: rel.needs_unchecked_conversion,
                            needs_bridge: rel.needs_bridge,
                        });
                    }
                }
            }
        }
    }

    // Inherited against inherited: the diamond cases. Only pairs whose
    // declaring ancestors are unrelated and that no declared method of the
    // same erasure arbitrates.
    let mut return_conflicts: BTreeMap<String, Vec<MethodRef>> = BTreeMap::new();
    for (name, group) in &by_name {
        for j in 1..group.len() {
            for i in 0..j {
                let (p, q) = (&group[i], &group[j]);
                if p.method.erased_params != q.method.erased_params {
                    continue;
                }
                let arbitrated = declared.iter().any(|d| {
                    d.def.name.as_str() == *name
                        && d.def.visibility != Visibility::Private
                        && d.erased_params == p.method.erased_params
                });
                if arbitrated {
                    continue;
                }
                if AncestorTable::related(env, p.method.class, q.method.class) {
                    continue;
                }
                check_inherited_pair(
                    env,
                    class,
                    &class_name,
                    p,
                    q,
                    mode,
                    &mut diagnostics,
                    &mut return_conflicts,
                    &mut accepted,
                );
            }
        }
    }

    let conflict_keys: BTreeSet<String> = return_conflicts.keys().cloned().collect();
    for (_, refs) in return_conflicts {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::IncompatibleReturnTypesAcrossSupertypes,
            class,
            &class_name,
            None,
            refs,
        ));
    }

    // Abstract obligations: a concrete type must resolve every inherited
    // abstract erased signature, once per signature (not once per
    // declaring ancestor). Signatures already reported as return-type
    // conflicts are not double-reported.
    if concrete {
        let mut by_key: BTreeMap<String, Vec<&ResolvedMethod>> = BTreeMap::new();
        for group in by_name.values() {
            for inh in group {
                if inh.is_abstract {
                    by_key
                        .entry(inh.method.erased_key(env))
                        .or_default()
                        .push(inh.method);
                }
            }
        }
        for (key, obligations) in &by_key {
            if conflict_keys.contains(key) {
                continue;
            }
            let unsatisfied = obligations.iter().find(|n| {
                let group = by_name.get(n.def.name.as_str());
                !obligation_satisfied(env, &declared, group.map(Vec::as_slice).unwrap_or(&[]), n)
            });
            if let Some(n) = unsatisfied {
                let related: Vec<MethodRef> = declared
                    .iter()
                    .filter(|d| d.def.name == n.def.name)
                    .map(|d| d.to_ref(env))
                    .collect();
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MustImplementAbstract,
                    class,
                    &class_name,
                    Some(n.to_ref(env)),
                    related,
                ));
            }
        }
    }

    // Raw-type warnings: once per declared signature mentioning a raw
    // generic type, once per raw supertype edge.
    for d in &declared {
        let raw = d
            .def
            .params
            .iter()
            .chain(std::iter::once(&d.def.return_type))
            .chain(d.def.throws.iter())
            .any(|t| t.mentions_raw(env));
        if raw {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::RawTypeUsage,
                class,
                &class_name,
                Some(d.to_ref(env)),
                vec![],
            ));
        }
    }
    for edge in class_def.super_class.iter().chain(class_def.interfaces.iter()) {
        if edge.mentions_raw(env) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::RawTypeUsage,
                class,
                &class_name,
                None,
                vec![],
            ));
        }
    }

    TypeReport {
        diagnostics,
        accepted,
    }
}

/// One diamond pair with equal erasure from unrelated ancestors.
#[allow(clippy::too_many_arguments)]
fn check_inherited_pair(
    env: &dyn TypeEnv,
    class: ClassId,
    class_name: &str,
    p: &Inherited<'_>,
    q: &Inherited<'_>,
    mode: CompatibilityMode,
    diagnostics: &mut Vec<Diagnostic>,
    return_conflicts: &mut BTreeMap<String, Vec<MethodRef>>,
    accepted: &mut Vec<AcceptedEdge>,
) {
    // A concrete side, if any, is the candidate implementation.
    let (concrete, abstract_side) = match (p.is_abstract, q.is_abstract) {
        (false, true) => (Some(p), q),
        (true, false) => (Some(q), p),
        _ => (None, q),
    };

    if let Some(c) = concrete {
        let rel = classify(env, c.method, abstract_side.method, true);
        match rel.classification {
            Classification::NameClash => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::NameClash,
                    class,
                    class_name,
                    Some(c.method.to_ref(env)),
                    vec![abstract_side.method.to_ref(env)],
                )
                .with_severity(clash_severity(mode, c.method, abstract_side.method)),
            ),
            Classification::Unrelated => {}
            _ => {
                if rel
                    .violations
                    .contains(&Violation::IncompatibleReturn)
                {
                    record_conflict(env, return_conflicts, c.method, abstract_side.method);
                } else {
                    emit_pair_diagnostics(
                        env,
                        class,
                        class_name,
                        c.method,
                        abstract_side.method,
                        &rel,
                        diagnostics,
                    );
                    if rel.is_accepted() && rel.classification != Classification::Hides {
                        accepted.push(AcceptedEdge {
                            delegate: c.method.clone(),
                            ancestor: abstract_side.method.clone(),
                            needs_unchecked: rel.needs_unchecked_conversion,
                            needs_bridge: rel.needs_bridge,
                        });
                    }
                }
            }
        }
        return;
    }

    // Both abstract: a clash in either direction is a name clash; failing
    // that, the returns must be compatible in at least one direction for a
    // single implementation to ever satisfy both.
    let pq = classify(env, p.method, q.method, true);
    let qp = classify(env, q.method, p.method, true);
    if !pq.is_match() && !qp.is_match() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::NameClash,
                class,
                class_name,
                Some(p.method.to_ref(env)),
                vec![q.method.to_ref(env)],
            )
            .with_severity(clash_severity(mode, p.method, q.method)),
        );
        return;
    }
    if !matcher::returns_compatible(env, p.method, q.method)
        && !matcher::returns_compatible(env, q.method, p.method)
    {
        record_conflict(env, return_conflicts, p.method, q.method);
    }
}

fn record_conflict(
    env: &dyn TypeEnv,
    conflicts: &mut BTreeMap<String, Vec<MethodRef>>,
    a: &ResolvedMethod,
    b: &ResolvedMethod,
) {
    let refs = conflicts.entry(a.erased_key(env)).or_default();
    for method in [a, b] {
        let r = method.to_ref(env);
        if !refs.contains(&r) {
            refs.push(r);
        }
    }
}

fn obligation_satisfied(
    env: &dyn TypeEnv,
    declared: &[ResolvedMethod],
    inherited: &[Inherited<'_>],
    n: &ResolvedMethod,
) -> bool {
    let satisfies = |m: &ResolvedMethod| {
        !m.def.is_abstract
            && !m.def.is_static
            && m.def.visibility != Visibility::Private
            && classify(env, m, n, true).is_accepted()
    };
    declared.iter().any(satisfies)
        || inherited
            .iter()
            .any(|c| !c.is_abstract && c.method.class != n.class && satisfies(c.method))
}

fn emit_pair_diagnostics(
    env: &dyn TypeEnv,
    class: ClassId,
    class_name: &str,
    m: &ResolvedMethod,
    n: &ResolvedMethod,
    rel: &OverrideRelation,
    out: &mut Vec<Diagnostic>,
) {
    for violation in &rel.violations {
        let kind = match violation {
            Violation::IncompatibleReturn => DiagnosticKind::IncompatibleReturnType,
            Violation::ExceptionNotCompatible { .. } => DiagnosticKind::ExceptionNotCompatible,
            Violation::ReducedVisibility => DiagnosticKind::CannotReduceVisibility,
            Violation::OverridesFinal => DiagnosticKind::CannotOverrideFinal,
            Violation::InstanceOverStatic | Violation::StaticHidesInstance => {
                DiagnosticKind::StaticInstanceMismatch
            }
        };
        out.push(Diagnostic::new(
            kind,
            class,
            class_name,
            Some(m.to_ref(env)),
            vec![n.to_ref(env)],
        ));
    }
    if rel.varargs_mismatch {
        out.push(Diagnostic::new(
            DiagnosticKind::VarargsMismatch,
            class,
            class_name,
            Some(m.to_ref(env)),
            vec![n.to_ref(env)],
        ));
    }
    if rel.synchronized_mismatch {
        out.push(Diagnostic::new(
            DiagnosticKind::SynchronizedMismatch,
            class,
            class_name,
            Some(m.to_ref(env)),
            vec![n.to_ref(env)],
        ));
    }
    if rel.is_accepted() && rel.needs_unchecked_conversion {
        out.push(Diagnostic::new(
            DiagnosticKind::UncheckedConversion,
            class,
            class_name,
            Some(m.to_ref(env)),
            vec![n.to_ref(env)],
        ));
    }
}

/// Historical javac 6 demotes an erasure clash to a warning when the
/// return erasures already differ; the reference semantics keeps it an
/// error.
fn clash_severity(mode: CompatibilityMode, m: &ResolvedMethod, n: &ResolvedMethod) -> Severity {
    match mode {
        CompatibilityMode::Jls => Severity::Error,
        CompatibilityMode::Javac6 => {
            if m.erased_return != n.erased_return {
                Severity::Warning
            } else {
                Severity::Error
            }
        }
    }
}
