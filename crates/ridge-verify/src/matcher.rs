//! Pairwise override classification.
//!
//! [`classify`] takes one method of the verified type (declared or
//! inherited) and one ancestor method, both already resolved through their
//! substitutions, and decides how they relate: overrides, implements,
//! hides, erasure-clashes, or nothing at all. Modifier and signature
//! violations are attached to the relation instead of being folded into
//! the classification, so the reporting layer can format them without
//! re-deriving anything (JLS 8.4.8).

use std::collections::HashMap;

use ridge_types::{
    canonicalize_named, erasure, is_subtype, substitute, Type, TypeEnv, TypeVarId,
};

use crate::resolve::ResolvedMethod;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Instance method replaces a concrete ancestor method.
    Overrides,
    /// Instance method satisfies an abstract ancestor method.
    Implements,
    /// Static method redeclares a static ancestor method (JLS 8.4.8.2).
    Hides,
    /// Same erasure, no subsignature relation.
    NameClash,
    Unrelated,
}

/// A blocking problem found on an otherwise-matching pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    IncompatibleReturn,
    ExceptionNotCompatible { thrown: Type },
    ReducedVisibility,
    OverridesFinal,
    /// Instance method on top of a static ancestor method.
    InstanceOverStatic,
    /// Static method on top of an instance ancestor method.
    StaticHidesInstance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideRelation {
    pub classification: Classification,
    /// Accepted only by comparing erasures; downgrade to a warning.
    pub needs_unchecked_conversion: bool,
    /// The override is not reachable through the ancestor's erased
    /// signature without a synthetic bridge.
    pub needs_bridge: bool,
    pub varargs_mismatch: bool,
    pub synchronized_mismatch: bool,
    pub violations: Vec<Violation>,
}

impl OverrideRelation {
    fn of(classification: Classification) -> Self {
        OverrideRelation {
            classification,
            needs_unchecked_conversion: false,
            needs_bridge: false,
            varargs_mismatch: false,
            synchronized_mismatch: false,
            violations: Vec::new(),
        }
    }

    /// Overrides/Implements/Hides with no blocking violation.
    pub fn is_accepted(&self) -> bool {
        self.is_match() && self.violations.is_empty()
    }

    /// Any classification that relates the two methods.
    pub fn is_match(&self) -> bool {
        matches!(
            self.classification,
            Classification::Overrides | Classification::Implements | Classification::Hides
        )
    }
}

/// Classify the pair (`m` in the verified type, `n` in an ancestor).
///
/// `n_is_abstract` is precomputed by the caller because interface methods
/// count as abstract regardless of their declared flag.
pub fn classify(
    env: &dyn TypeEnv,
    m: &ResolvedMethod,
    n: &ResolvedMethod,
    n_is_abstract: bool,
) -> OverrideRelation {
    if m.def.name != n.def.name || m.def.params.len() != n.def.params.len() {
        return OverrideRelation::of(Classification::Unrelated);
    }

    if m.erased_params != n.erased_params {
        // Substitution can pull two erasures apart that collide at runtime;
        // the clash is against the declaration as written (JLS 8.4.8.3).
        if m.erased_params == n.original_erased_params {
            return OverrideRelation::of(Classification::NameClash);
        }
        return OverrideRelation::of(Classification::Unrelated);
    }

    let Some(unchecked_params) = subsignature(env, m, n) else {
        return OverrideRelation::of(Classification::NameClash);
    };

    let classification = if m.def.is_static && n.def.is_static {
        Classification::Hides
    } else if n_is_abstract {
        Classification::Implements
    } else {
        Classification::Overrides
    };
    let mut rel = OverrideRelation::of(classification);
    rel.needs_unchecked_conversion = unchecked_params;

    if m.def.is_static != n.def.is_static {
        rel.violations.push(if m.def.is_static {
            Violation::StaticHidesInstance
        } else {
            Violation::InstanceOverStatic
        });
    }

    match check_return(env, m, n) {
        ReturnCheck::Ok => {}
        ReturnCheck::OkUnchecked => rel.needs_unchecked_conversion = true,
        ReturnCheck::Incompatible => rel.violations.push(Violation::IncompatibleReturn),
    }

    check_exceptions(env, m, n, &mut rel.violations);

    if m.def.visibility < n.def.visibility {
        rel.violations.push(Violation::ReducedVisibility);
    }
    if n.def.is_final {
        rel.violations.push(Violation::OverridesFinal);
    }
    rel.varargs_mismatch = m.def.is_varargs != n.def.is_varargs;
    rel.synchronized_mismatch = n.def.is_synchronized && !m.def.is_synchronized;

    // Compare against the runtime form of the ancestor declaration: a
    // covariant return or a generic substitution leaves the override
    // unreachable through the original erasure without a bridge.
    rel.needs_bridge = m.erased_params != n.original_erased_params
        || m.erased_return != n.original_erased_return;

    rel
}

/// JLS 8.4.2 subsignature, with erased (unchecked) acceptance.
///
/// Returns `Some(true)` when the match only holds at the erasure level
/// (a non-generic redeclaration of a substituted or generic signature),
/// `Some(false)` for an exact structural match, `None` for a clash.
fn subsignature(env: &dyn TypeEnv, m: &ResolvedMethod, n: &ResolvedMethod) -> Option<bool> {
    let m_vars = &m.def.type_params;
    let n_vars = &n.def.type_params;

    if n_vars.is_empty() {
        // A generic method never matches a non-generic one of the same
        // erasure; the erasure relation only runs one way.
        if !m_vars.is_empty() {
            return None;
        }
        if m.params == n.params {
            return Some(false);
        }
        // A fully-erased redeclaration of a signature that substitution
        // changed is the raw-override case, legal with a warning. When no
        // substitution was involved the shapes genuinely disagree.
        let n_substituted = n.params != n.def.params;
        if n_substituted && m.params == m.erased_params {
            return Some(true);
        }
        return None;
    }

    if m_vars.is_empty() {
        // Raw override of a generic method: every parameter of `m` must
        // already be the erasure.
        if m.params == m.erased_params && m.params == n.erased_params {
            return Some(true);
        }
        return None;
    }

    if m_vars.len() != n_vars.len() {
        return None;
    }

    // Rename n's method variables to m's, then demand structural equality
    // of parameters and of every bound.
    let mut rename: HashMap<TypeVarId, Type> = HashMap::with_capacity(n_vars.len());
    for (mv, nv) in m_vars.iter().zip(n_vars) {
        rename.insert(*nv, Type::TypeVar(*mv));
    }
    let renamed: Vec<Type> = n.params.iter().map(|p| substitute(p, &rename)).collect();
    if renamed != m.params {
        return None;
    }
    for (mv, nv) in m_vars.iter().zip(n_vars) {
        let (Some(m_def), Some(n_def)) = (env.type_param(*mv), env.type_param(*nv)) else {
            return None;
        };
        if m_def.bounds.len() != n_def.bounds.len() {
            return None;
        }
        for (m_bound, n_bound) in m_def.bounds.iter().zip(&n_def.bounds) {
            let mapped = substitute(&n.subst.apply(n_bound), &rename);
            if &mapped != m_bound {
                return None;
            }
        }
    }
    Some(false)
}

enum ReturnCheck {
    Ok,
    OkUnchecked,
    Incompatible,
}

/// Whether `m`'s return type is acceptable where `n`'s is expected.
/// Diamond analysis uses this to test both directions of an inherited pair.
pub(crate) fn returns_compatible(env: &dyn TypeEnv, m: &ResolvedMethod, n: &ResolvedMethod) -> bool {
    !matches!(check_return(env, m, n), ReturnCheck::Incompatible)
}

/// JLS 8.4.8.3 return-type substitutability: identical, covariant, or
/// compatible at the erasure level (unchecked).
fn check_return(env: &dyn TypeEnv, m: &ResolvedMethod, n: &ResolvedMethod) -> ReturnCheck {
    let mr = canonicalize_named(env, &m.return_type);
    let nr = canonicalize_named(env, &n.return_type);
    if mr == nr {
        return ReturnCheck::Ok;
    }
    if matches!(mr, Type::Void | Type::Primitive(_)) || matches!(nr, Type::Void | Type::Primitive(_))
    {
        return ReturnCheck::Incompatible;
    }
    if is_subtype(env, &mr, &nr) {
        return ReturnCheck::Ok;
    }
    let em = erasure(env, &mr);
    let en = erasure(env, &nr);
    if em == en || is_subtype(env, &em, &en) {
        return ReturnCheck::OkUnchecked;
    }
    ReturnCheck::Incompatible
}

/// JLS 8.4.8.3 throws compatibility: every checked exception of `m` must
/// be assignable to some declared exception of `n`; unchecked exceptions
/// are exempt.
fn check_exceptions(
    env: &dyn TypeEnv,
    m: &ResolvedMethod,
    n: &ResolvedMethod,
    out: &mut Vec<Violation>,
) {
    let wk = env.well_known();
    let runtime = Type::class(wk.runtime_exception, vec![]);
    let error = Type::class(wk.error, vec![]);
    for thrown in &m.throws {
        let thrown = canonicalize_named(env, thrown);
        if thrown.is_errorish() {
            continue;
        }
        if is_subtype(env, &thrown, &runtime) || is_subtype(env, &thrown, &error) {
            continue;
        }
        if !n.throws.iter().any(|u| is_subtype(env, &thrown, u)) {
            out.push(Violation::ExceptionNotCompatible { thrown });
        }
    }
}
