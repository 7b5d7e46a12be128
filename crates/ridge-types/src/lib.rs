//! Frozen type-hierarchy model shared by the ridge crates.
//!
//! The model is deliberately nominal and small: classes and interfaces with
//! generic type parameters, methods with signatures and modifiers, and the
//! pure type algebra (substitution, erasure, subtyping) the override
//! verifier consumes. Nothing here mutates after the hierarchy is built.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

mod algebra;
mod store;

pub use algebra::{canonicalize_named, erasure, is_subtype, substitute, Substitution};
pub use store::{TypeStore, WellKnownTypes};

/// Identity of a class or interface in a [`TypeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Identity of a class-level or method-level type parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub(crate) u32);

impl fmt::Debug for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeVarId({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Short => "short",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A (possibly parameterized) reference to a class or interface.
///
/// An empty `args` list on a generic class is a *raw* use of that class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    /// Reference to a type the hierarchy builder could not resolve.
    Named(String),
    /// Sentinel for missing or inconsistent metadata. Never produced by a
    /// well-formed hierarchy; treated leniently by the algebra so that one
    /// bad edge does not cascade.
    Unknown,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn boolean() -> Type {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Named(_))
    }

    /// Whether this type mentions an unresolved reference anywhere.
    pub fn mentions_unresolved(&self) -> bool {
        match self {
            Type::Unknown | Type::Named(_) => true,
            Type::Array(elem) => elem.mentions_unresolved(),
            Type::Class(ClassType { args, .. }) => args.iter().any(Type::mentions_unresolved),
            Type::Wildcard(WildcardBound::Extends(t) | WildcardBound::Super(t)) => {
                t.mentions_unresolved()
            }
            _ => false,
        }
    }

    /// Whether this type is a raw use of a generic class, anywhere in its
    /// structure (array components and type arguments included).
    pub fn mentions_raw(&self, env: &dyn TypeEnv) -> bool {
        match self {
            Type::Class(ClassType { def, args }) => {
                if args.is_empty() {
                    if let Some(class) = env.class(*def) {
                        if !class.type_params.is_empty() {
                            return true;
                        }
                    }
                    false
                } else {
                    args.iter().any(|a| a.mentions_raw(env))
                }
            }
            Type::Array(elem) => elem.mentions_raw(env),
            Type::Wildcard(WildcardBound::Extends(t) | WildcardBound::Super(t)) => {
                t.mentions_raw(env)
            }
            _ => false,
        }
    }
}

/// Method and class accessibility, ordered from narrowest to widest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A declared type parameter with its ordered bound list.
///
/// `bounds[0]` is the leftmost bound and determines the erasure of the
/// variable; an empty list means an implicit `java.lang.Object` bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub bounds: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_synchronized: bool,
    pub is_varargs: bool,
}

impl MethodDef {
    /// A public concrete instance method with no generics, throws or flags.
    /// Tests and builders flesh the rest out with struct update syntax.
    pub fn new(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            return_type,
            throws: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            is_synchronized: false,
            is_varargs: false,
        }
    }
}

/// A resolved class or interface declaration.
///
/// `super_class: None` on a class means an implicit `java.lang.Object`
/// superclass; interfaces never have a superclass edge (they check against
/// `Object` implicitly, JLS 4.10.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_public: bool,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            is_abstract: false,
            is_final: false,
            is_public: true,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Interface,
            is_abstract: true,
            ..ClassDef::class(name)
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }
}

/// Read-only view of a resolved hierarchy.
///
/// [`TypeStore`] is the canonical implementation; the verifier only ever
/// sees the trait so embedders can layer their own storage underneath.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// Render a type for diagnostics, without mutating anything.
pub fn display_type(env: &dyn TypeEnv, ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_string(),
        Type::Void => "void".to_string(),
        Type::Class(ClassType { def, args }) => {
            let name = env
                .class(*def)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("<class#{}>", def.index()));
            if args.is_empty() {
                name
            } else {
                let rendered: Vec<String> = args.iter().map(|a| display_type(env, a)).collect();
                format!("{}<{}>", name, rendered.join(", "))
            }
        }
        Type::Array(elem) => format!("{}[]", display_type(env, elem)),
        Type::TypeVar(id) => env
            .type_param(*id)
            .map(|tp| tp.name.clone())
            .unwrap_or_else(|| format!("<var#{}>", id.0)),
        Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
        Type::Wildcard(WildcardBound::Extends(t)) => {
            format!("? extends {}", display_type(env, t))
        }
        Type::Wildcard(WildcardBound::Super(t)) => format!("? super {}", display_type(env, t)),
        Type::Named(name) => name.clone(),
        Type::Unknown => "<unknown>".to_string(),
    }
}
