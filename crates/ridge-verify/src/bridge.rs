//! Planning of synthetic bridge methods for accepted overrides.
//!
//! A bridge carries the ancestor's *erased* signature and delegates to the
//! concrete override, so the override stays reachable through the erasure
//! the rest of the program was compiled against. Covariant returns,
//! generic substitution, unchecked overrides, and public methods inherited
//! from non-public classes all need one (JLS 8.4.8.3, 15.12.4.5).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use ridge_types::{ClassId, ClassKind, Type, TypeEnv, Visibility};

use crate::diagnostics::MethodRef;
use crate::reporter::AcceptedEdge;
use crate::resolve::AncestorTable;

/// One synthetic method to be emitted in `class`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BridgePlan {
    pub class: ClassId,
    pub class_name: String,
    pub name: String,
    /// The ancestor declaration's erased parameter list.
    pub erased_params: Vec<Type>,
    pub erased_return: Type,
    /// Union of the delegate's and the ancestor's declared exceptions.
    pub throws: Vec<Type>,
    /// The ancestor's visibility; the bridge widens nothing.
    pub visibility: Visibility,
    /// The concrete method the bridge forwards to.
    pub delegate: MethodRef,
    /// The ancestor method whose erasure the bridge restores.
    pub overridden: MethodRef,
}

/// Plan the bridges for one concrete class. Duplicate erased signatures
/// collapse to the first plan; order follows the accepted edges.
pub(crate) fn plan(
    env: &dyn TypeEnv,
    class: ClassId,
    table: &AncestorTable,
    accepted: &[AcceptedEdge],
) -> Vec<BridgePlan> {
    let Some(class_def) = env.class(class) else {
        return Vec::new();
    };
    if class_def.is_abstract || class_def.kind != ClassKind::Class {
        return Vec::new();
    }

    let mut plans: Vec<BridgePlan> = Vec::new();
    let mut seen: HashSet<(String, Vec<Type>, Type)> = HashSet::new();

    for edge in accepted {
        if !(edge.needs_bridge || edge.needs_unchecked) {
            continue;
        }
        let ancestor = &edge.ancestor;
        let key = (
            ancestor.def.name.clone(),
            ancestor.original_erased_params.clone(),
            ancestor.original_erased_return.clone(),
        );
        // The delegate already has this exact erasure; nothing to emit.
        if edge.delegate.erased_params == ancestor.original_erased_params
            && edge.delegate.erased_return == ancestor.original_erased_return
        {
            continue;
        }
        if !seen.insert(key) {
            continue;
        }
        let mut throws = edge.delegate.throws.clone();
        for t in &ancestor.throws {
            if !throws.contains(t) {
                throws.push(t.clone());
            }
        }
        plans.push(BridgePlan {
            class,
            class_name: class_def.name.clone(),
            name: ancestor.def.name.clone(),
            erased_params: ancestor.original_erased_params.clone(),
            erased_return: ancestor.original_erased_return.clone(),
            throws,
            visibility: ancestor.def.visibility,
            delegate: edge.delegate.to_ref(env),
            overridden: ancestor.to_ref(env),
        });
    }

    // Visibility bridges: a public class republishing a public method it
    // inherits from a non-public superclass, so reflection and invocation
    // through the public type resolve to an accessible declaration.
    if class_def.is_public {
        for ancestor in &table.ancestors {
            let Some(ancestor_def) = env.class(ancestor.class) else {
                continue;
            };
            if ancestor_def.kind != ClassKind::Class || ancestor_def.is_public {
                continue;
            }
            for method in &ancestor.methods {
                if method.def.is_static
                    || method.def.is_abstract
                    || method.def.visibility != Visibility::Public
                {
                    continue;
                }
                let redeclared = class_def.methods.iter().any(|d| {
                    d.name == method.def.name
                        && d.params
                            .iter()
                            .map(|p| ridge_types::erasure(env, p))
                            .collect::<Vec<_>>()
                            == method.original_erased_params
                });
                if redeclared {
                    continue;
                }
                let key = (
                    method.def.name.clone(),
                    method.original_erased_params.clone(),
                    method.original_erased_return.clone(),
                );
                if !seen.insert(key) {
                    continue;
                }
                plans.push(BridgePlan {
                    class,
                    class_name: class_def.name.clone(),
                    name: method.def.name.clone(),
                    erased_params: method.original_erased_params.clone(),
                    erased_return: method.original_erased_return.clone(),
                    throws: method.throws.clone(),
                    visibility: Visibility::Public,
                    delegate: method.to_ref(env),
                    overridden: method.to_ref(env),
                });
            }
        }
    }

    plans
}
