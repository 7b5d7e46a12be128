//! Pure type algebra over a [`TypeEnv`]: substitution, erasure and nominal
//! subtyping. Everything here is side-effect free and never panics on
//! missing metadata; unresolved types degrade to conservative answers.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{ClassDef, ClassId, ClassKind, ClassType, Type, TypeEnv, TypeVarId, WildcardBound};

/// A mapping from type variables to the type arguments supplied at one
/// supertype edge, composable along multi-hop inheritance paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<TypeVarId, Type>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// The substitution for instantiating `class_def` with `args`.
    ///
    /// Missing arguments (raw or malformed instantiations) map to
    /// [`Type::Unknown`] so downstream consumers keep a stable shape.
    pub fn for_class(class_def: &ClassDef, args: &[Type]) -> Self {
        let mut map = HashMap::with_capacity(class_def.type_params.len());
        for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
            map.insert(formal, args.get(idx).cloned().unwrap_or(Type::Unknown));
        }
        Substitution { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn insert(&mut self, var: TypeVarId, ty: Type) {
        self.map.insert(var, ty);
    }

    pub fn get(&self, var: TypeVarId) -> Option<&Type> {
        self.map.get(&var)
    }

    pub fn apply(&self, ty: &Type) -> Type {
        substitute(ty, &self.map)
    }

    /// `self ∘ inner`: first map through `inner`, then through `self`.
    ///
    /// Used when walking a supertype chain S → T → U: the edge substitution
    /// at T→U is composed with the already-accumulated S→T substitution.
    pub fn compose(&self, inner: &Substitution) -> Substitution {
        let mut map = HashMap::with_capacity(self.map.len() + inner.map.len());
        for (var, ty) in &inner.map {
            map.insert(*var, self.apply(ty));
        }
        for (var, ty) in &self.map {
            map.entry(*var).or_insert_with(|| ty.clone());
        }
        Substitution { map }
    }
}

/// Replace type variables according to `subst`, structurally.
pub fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Array(elem) => Type::Array(Box::new(substitute(elem, subst))),
        Type::Class(ClassType { def, args }) => Type::Class(ClassType {
            def: *def,
            args: args.iter().map(|a| substitute(a, subst)).collect(),
        }),
        Type::Wildcard(WildcardBound::Extends(t)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(t, subst))))
        }
        Type::Wildcard(WildcardBound::Super(t)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(t, subst))))
        }
        other => other.clone(),
    }
}

/// Resolve a top-level [`Type::Named`] spelling against the store.
pub fn canonicalize_named(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        other => other.clone(),
    }
}

/// The erasure of `ty` (JLS 4.6): type arguments discarded, array
/// components erased, type variables replaced by the erasure of their
/// leftmost bound, recursively.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
        match ty {
            Type::Class(ClassType { def, .. }) => Type::class(*def, vec![]),
            Type::Array(elem) => Type::Array(Box::new(inner(env, elem, seen))),
            Type::TypeVar(id) => {
                // Bound chains are acyclic in well-formed hierarchies; the
                // seen-set keeps malformed input from looping.
                if !seen.insert(*id) {
                    return Type::class(env.well_known().object, vec![]);
                }
                let erased = match env.type_param(*id).and_then(|tp| tp.bounds.first()) {
                    Some(bound) => {
                        let bound = canonicalize_named(env, bound);
                        inner(env, &bound, seen)
                    }
                    None => Type::class(env.well_known().object, vec![]),
                };
                seen.remove(id);
                erased
            }
            Type::Wildcard(WildcardBound::Extends(t)) => inner(env, t, seen),
            Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
            other => canonicalize_named(env, other),
        }
    }
    let mut seen = HashSet::new();
    inner(env, ty, &mut seen)
}

/// Nominal subtyping with invariant type arguments and wildcard
/// containment (JLS 4.10 / 4.5.1). Raw instantiations are only subtypes of
/// raw (or erased) supertypes; the unchecked acceptance paths live in the
/// verifier, not here.
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    let mut seen_vars = HashSet::new();
    subtype_inner(env, sub, sup, &mut seen_vars)
}

fn subtype_inner(
    env: &dyn TypeEnv,
    sub: &Type,
    sup: &Type,
    seen_vars: &mut HashSet<TypeVarId>,
) -> bool {
    let sub = canonicalize_named(env, sub);
    let sup = canonicalize_named(env, sup);

    if sub == sup {
        return true;
    }
    // One unresolved side never blocks the other checks downstream; a
    // dedicated diagnostic is raised where the unresolved type was found.
    if matches!(sub, Type::Unknown) || matches!(sup, Type::Unknown) {
        return true;
    }

    match (&sub, &sup) {
        (Type::Primitive(_) | Type::Void, _) | (_, Type::Primitive(_) | Type::Void) => false,
        (Type::Named(_), _) | (_, Type::Named(_)) => false,
        (Type::TypeVar(id), _) => {
            if !seen_vars.insert(*id) {
                return false;
            }
            let result = match env.type_param(*id) {
                Some(tp) => {
                    if tp.bounds.is_empty() {
                        subtype_inner(
                            env,
                            &Type::class(env.well_known().object, vec![]),
                            &sup,
                            seen_vars,
                        )
                    } else {
                        tp.bounds
                            .iter()
                            .any(|bound| subtype_inner(env, bound, &sup, seen_vars))
                    }
                }
                None => false,
            };
            seen_vars.remove(id);
            result
        }
        (_, Type::TypeVar(_)) => false,
        (Type::Array(sub_elem), Type::Array(sup_elem)) => {
            match (sub_elem.as_ref(), sup_elem.as_ref()) {
                (Type::Primitive(a), Type::Primitive(b)) => a == b,
                (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
                (a, b) => subtype_inner(env, a, b, seen_vars),
            }
        }
        (Type::Array(_), Type::Class(ClassType { def, .. })) => {
            let wk = env.well_known();
            *def == wk.object || *def == wk.cloneable || *def == wk.serializable
        }
        (Type::Class(_), Type::Class(target)) => {
            class_subtype(env, &sub, target, seen_vars)
        }
        _ => false,
    }
}

fn class_subtype(
    env: &dyn TypeEnv,
    sub: &Type,
    target: &ClassType,
    seen_vars: &mut HashSet<TypeVarId>,
) -> bool {
    // Walk the supertype graph of `sub`, applying type-argument
    // substitution along the way, looking for an instantiation of the
    // target class.
    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(sub.clone());

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current else {
            continue;
        };
        if !seen.insert((def, args.clone())) {
            continue;
        }

        let Some(class_def) = env.class(def) else {
            continue;
        };

        if def == target.def {
            if arguments_contained(env, &args, &target.args, seen_vars) {
                return true;
            }
            // Another path may supply a matching instantiation; keep going.
        }

        let raw = args.is_empty() && !class_def.type_params.is_empty();
        let subst = if raw {
            // Raw instantiations propagate rawness to their supertypes.
            None
        } else {
            Some(Substitution::for_class(class_def, &args))
        };

        let project = |ty: &Type| -> Type {
            let ty = match &subst {
                Some(s) => s.apply(ty),
                None => erasure(env, ty),
            };
            canonicalize_named(env, &ty)
        };

        match (&class_def.super_class, class_def.kind) {
            (Some(sc), ClassKind::Class) => queue.push_back(project(sc)),
            (None, ClassKind::Class) if def != env.well_known().object => {
                queue.push_back(Type::class(env.well_known().object, vec![]));
            }
            _ => {}
        }
        for iface in &class_def.interfaces {
            queue.push_back(project(iface));
        }
        // Every interface implicitly has Object as a supertype (JLS 4.10.2).
        if class_def.kind == ClassKind::Interface {
            queue.push_back(Type::class(env.well_known().object, vec![]));
        }
    }

    false
}

fn arguments_contained(
    env: &dyn TypeEnv,
    found: &[Type],
    wanted: &[Type],
    seen_vars: &mut HashSet<TypeVarId>,
) -> bool {
    // A raw (or non-generic) supertype reference accepts any instantiation.
    if wanted.is_empty() {
        return true;
    }
    if found.is_empty() || found.len() != wanted.len() {
        return false;
    }
    found
        .iter()
        .zip(wanted)
        .all(|(f, w)| argument_contains(env, w, f, seen_vars))
}

/// JLS 4.5.1 containment: does type argument `outer` contain `inner`?
fn argument_contains(
    env: &dyn TypeEnv,
    outer: &Type,
    inner: &Type,
    seen_vars: &mut HashSet<TypeVarId>,
) -> bool {
    if outer == inner {
        return true;
    }
    match outer {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            let inner_upper = match inner {
                Type::Wildcard(WildcardBound::Extends(t)) => (**t).clone(),
                Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
                other => other.clone(),
            };
            subtype_inner(env, &inner_upper, upper, seen_vars)
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            let inner_lower = match inner {
                Type::Wildcard(WildcardBound::Super(t)) => (**t).clone(),
                Type::Wildcard(_) => return false,
                other => other.clone(),
            };
            subtype_inner(env, lower, &inner_lower, seen_vars)
        }
        _ => matches!(inner, Type::Unknown),
    }
}
