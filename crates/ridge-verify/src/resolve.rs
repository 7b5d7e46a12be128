//! Resolution of inherited method signatures.
//!
//! [`AncestorTable::build`] walks the supertype graph of one type and
//! produces, in a deterministic order, every ancestor together with the
//! composed [`Substitution`] that maps the ancestor's type variables into
//! the verified type's view. Each ancestor's methods are resolved once
//! (substituted and erased) so the pairwise matching above never repeats
//! the work.
//!
//! Order is: the superclass chain nearest-first (`Object` last), then all
//! distinct superinterfaces breadth-first in declaration order. Interfaces
//! get an implicit `Object` ancestor appended (JLS 4.10.2).

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use ridge_types::{
    canonicalize_named, display_type, erasure, ClassId, ClassKind, ClassType, MethodDef,
    Substitution, Type, TypeEnv, TypeVarId, Visibility,
};

use crate::diagnostics::MethodRef;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A supertype edge of `class_name` could not be resolved to a defined
    /// class. The whole type is skipped with one diagnostic.
    #[error("unresolved ancestor {reference} of {class_name}")]
    UnresolvedAncestor { class_name: String, reference: String },
}

/// One method as seen from the verified type: substituted along the path
/// that reached its declaring type, with the erasures cached.
#[derive(Clone, Debug)]
pub struct ResolvedMethod {
    /// Declaring class.
    pub class: ClassId,
    /// Index into the declaring class's method list.
    pub index: usize,
    /// The declaration itself, untouched.
    pub def: MethodDef,
    /// The composed substitution that produced `params`/`return_type`.
    pub subst: Substitution,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub erased_params: Vec<Type>,
    pub erased_return: Type,
    /// Erasure of the declaration as written, before substitution. Name
    /// clashes and bridge planning compare against this form.
    pub original_erased_params: Vec<Type>,
    pub original_erased_return: Type,
}

impl ResolvedMethod {
    pub fn new(
        env: &dyn TypeEnv,
        class: ClassId,
        index: usize,
        def: &MethodDef,
        subst: &Substitution,
    ) -> Self {
        let params: Vec<Type> = def.params.iter().map(|p| subst.apply(p)).collect();
        let return_type = subst.apply(&def.return_type);
        let throws: Vec<Type> = def.throws.iter().map(|t| subst.apply(t)).collect();
        let erased_params = params.iter().map(|p| erasure(env, p)).collect();
        let erased_return = erasure(env, &return_type);
        let original_erased_params = def.params.iter().map(|p| erasure(env, p)).collect();
        let original_erased_return = erasure(env, &def.return_type);
        ResolvedMethod {
            class,
            index,
            def: def.clone(),
            subst: subst.clone(),
            params,
            return_type,
            throws,
            erased_params,
            erased_return,
            original_erased_params,
            original_erased_return,
        }
    }

    /// A method declared directly in the verified type (identity view).
    pub fn declared(env: &dyn TypeEnv, class: ClassId, index: usize, def: &MethodDef) -> Self {
        Self::new(env, class, index, def, &Substitution::new())
    }

    /// `name(erased params)`, the key obligations and diamond conflicts
    /// are grouped by.
    pub fn erased_key(&self, env: &dyn TypeEnv) -> String {
        let params: Vec<String> = self
            .erased_params
            .iter()
            .map(|p| display_type(env, p))
            .collect();
        format!("{}({})", self.def.name, params.join(", "))
    }

    /// Whether the erased runtime signature differs from the view this
    /// method presents after substitution. When true, an override with
    /// this exact view still needs a bridge to be reachable through the
    /// original erasure.
    pub fn erasure_changed_by_substitution(&self) -> bool {
        self.erased_params != self.original_erased_params
            || self.erased_return != self.original_erased_return
    }

    pub fn to_ref(&self, env: &dyn TypeEnv) -> MethodRef {
        let class_name = env
            .class(self.class)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("<class#{}>", self.class.index()));
        MethodRef {
            class: self.class,
            class_name,
            erased: render_signature(env, &[], &self.erased_return, &self.def.name, &self.erased_params),
            generic: render_signature(
                env,
                &self.def.type_params,
                &self.return_type,
                &self.def.name,
                &self.params,
            ),
        }
    }
}

fn render_signature(
    env: &dyn TypeEnv,
    type_params: &[TypeVarId],
    return_type: &Type,
    name: &str,
    params: &[Type],
) -> String {
    let mut out = String::new();
    if !type_params.is_empty() {
        let names: Vec<String> = type_params
            .iter()
            .map(|id| {
                env.type_param(*id)
                    .map(|tp| tp.name.clone())
                    .unwrap_or_else(|| format!("{:?}", id))
            })
            .collect();
        out.push('<');
        out.push_str(&names.join(", "));
        out.push_str("> ");
    }
    let rendered: Vec<String> = params.iter().map(|p| display_type(env, p)).collect();
    out.push_str(&format!(
        "{} {}({})",
        display_type(env, return_type),
        name,
        rendered.join(", ")
    ));
    out
}

/// One ancestor of the verified type.
#[derive(Clone, Debug)]
pub struct Ancestor {
    pub class: ClassId,
    /// Maps the ancestor's type variables into the verified type's view.
    pub subst: Substitution,
    /// Reached through at least one raw supertype reference; the
    /// substitution then maps the raw variables to their erasures.
    pub raw_reference: bool,
    /// Inheritable methods of the ancestor, resolved through `subst`.
    pub methods: Vec<ResolvedMethod>,
}

/// All ancestors of one type, in deterministic matching order.
#[derive(Clone, Debug)]
pub struct AncestorTable {
    pub class: ClassId,
    pub ancestors: Vec<Ancestor>,
}

impl AncestorTable {
    pub fn build(env: &dyn TypeEnv, class: ClassId) -> Result<AncestorTable, ResolveError> {
        let class_def = env
            .class(class)
            .ok_or_else(|| ResolveError::UnresolvedAncestor {
                class_name: format!("<class#{}>", class.index()),
                reference: format!("<class#{}>", class.index()),
            })?;
        let wk = *env.well_known();
        let mut ancestors: Vec<Ancestor> = Vec::new();
        let mut seen: HashSet<ClassId> = HashSet::new();
        seen.insert(class);

        // Superclass chain, nearest first, ending at Object.
        if class_def.kind == ClassKind::Class {
            let mut cur_id = class;
            let mut cur_def = class_def;
            let mut cur_subst = Substitution::new();
            let mut raw = false;
            while cur_id != wk.object {
                let edge = match &cur_def.super_class {
                    Some(ty) => cur_subst.apply(ty),
                    None => Type::class(wk.object, vec![]),
                };
                let (next_id, next_subst, edge_raw) = resolve_edge(env, &class_def.name, &edge)?;
                if !seen.insert(next_id) {
                    break;
                }
                raw |= edge_raw;
                let next_def =
                    env.class(next_id)
                        .ok_or_else(|| ResolveError::UnresolvedAncestor {
                            class_name: class_def.name.clone(),
                            reference: display_type(env, &edge),
                        })?;
                ancestors.push(Ancestor {
                    class: next_id,
                    subst: next_subst.clone(),
                    raw_reference: raw,
                    methods: resolve_methods(env, next_id, next_def, &next_subst),
                });
                if next_def.kind == ClassKind::Interface {
                    break;
                }
                cur_id = next_id;
                cur_def = next_def;
                cur_subst = next_subst;
            }
        }

        // Distinct superinterfaces in declaration order: the type's own
        // first, then those contributed by the superclass chain, then
        // breadth-first through extended interfaces.
        let mut queue: VecDeque<(Type, bool)> = VecDeque::new();
        for iface in &class_def.interfaces {
            queue.push_back((iface.clone(), false));
        }
        let chain_len = ancestors.len();
        for ancestor in &ancestors[..chain_len] {
            if let Some(def) = env.class(ancestor.class) {
                for iface in &def.interfaces {
                    queue.push_back((ancestor.subst.apply(iface), ancestor.raw_reference));
                }
            }
        }
        while let Some((edge, raw_in)) = queue.pop_front() {
            let (id, subst, edge_raw) = resolve_edge(env, &class_def.name, &edge)?;
            let raw = raw_in || edge_raw;
            if !seen.insert(id) {
                continue;
            }
            let Some(def) = env.class(id) else {
                continue;
            };
            for iface in &def.interfaces {
                queue.push_back((subst.apply(iface), raw));
            }
            ancestors.push(Ancestor {
                class: id,
                subst: subst.clone(),
                raw_reference: raw,
                methods: resolve_methods(env, id, def, &subst),
            });
        }

        // Interfaces check against Object's methods too.
        if class_def.kind == ClassKind::Interface && seen.insert(wk.object) {
            let subst = Substitution::new();
            let methods = env
                .class(wk.object)
                .map(|def| resolve_methods(env, wk.object, def, &subst))
                .unwrap_or_default();
            ancestors.push(Ancestor {
                class: wk.object,
                subst,
                raw_reference: false,
                methods,
            });
        }

        Ok(AncestorTable { class, ancestors })
    }

    /// Whether one ancestor (or the verified type) reaches another through
    /// the supertype graph; diamond analysis only pairs unrelated sides.
    pub fn related(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> bool {
        let raw_a = Type::class(a, vec![]);
        let raw_b = Type::class(b, vec![]);
        ridge_types::is_subtype(env, &raw_a, &raw_b)
            || ridge_types::is_subtype(env, &raw_b, &raw_a)
    }
}

/// Resolve one supertype edge (already expressed in the verified type's
/// variables) to its target class and the edge substitution. A raw edge to
/// a generic class maps each variable to its erasure.
fn resolve_edge(
    env: &dyn TypeEnv,
    owner: &str,
    edge: &Type,
) -> Result<(ClassId, Substitution, bool), ResolveError> {
    let edge = canonicalize_named(env, edge);
    let Type::Class(ClassType { def, args }) = &edge else {
        return Err(ResolveError::UnresolvedAncestor {
            class_name: owner.to_string(),
            reference: display_type(env, &edge),
        });
    };
    let target = env
        .class(*def)
        .ok_or_else(|| ResolveError::UnresolvedAncestor {
            class_name: owner.to_string(),
            reference: display_type(env, &edge),
        })?;
    if args.is_empty() && !target.type_params.is_empty() {
        let mut subst = Substitution::new();
        for var in &target.type_params {
            subst.insert(*var, erasure(env, &Type::TypeVar(*var)));
        }
        Ok((*def, subst, true))
    } else {
        Ok((*def, Substitution::for_class(target, args), false))
    }
}

fn resolve_methods(
    env: &dyn TypeEnv,
    class: ClassId,
    def: &ridge_types::ClassDef,
    subst: &Substitution,
) -> Vec<ResolvedMethod> {
    def.methods
        .iter()
        .enumerate()
        .filter(|(_, m)| m.visibility != Visibility::Private)
        .map(|(index, m)| ResolvedMethod::new(env, class, index, m, subst))
        .collect()
}
