use std::collections::HashMap;

use crate::{
    ClassDef, ClassId, ClassKind, MethodDef, PrimitiveType, Type, TypeEnv, TypeParamDef,
    TypeVarId, Visibility,
};

/// Ids of the JDK types the algebra and the verifier rely on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub integer: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub error: ClassId,
    pub io_exception: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
}

/// Arena + interner for a resolved hierarchy.
///
/// Classes can be interned before they are defined so that mutually
/// recursive hierarchies (`class Enum<E extends Enum<E>>`) can be built in
/// two passes. Once verification starts the store is only read.
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        TypeStore::with_minimal_jdk()
    }
}

impl TypeStore {
    /// A store seeded with the small slice of `java.lang`/`java.io` the
    /// verifier needs: `Object` and its methods, the boxed numerics used in
    /// covariance tests, and the throwable hierarchy used for checked
    /// exception analysis.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore {
            classes: Vec::new(),
            by_name: HashMap::new(),
            type_params: Vec::new(),
            // Placeholder ids, fixed up below once the classes exist.
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                integer: ClassId(0),
                throwable: ClassId(0),
                exception: ClassId(0),
                runtime_exception: ClassId(0),
                error: ClassId(0),
                io_exception: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
            },
        };

        let object = store.intern_class_id("java.lang.Object");
        let string = store.intern_class_id("java.lang.String");
        let number = store.intern_class_id("java.lang.Number");
        let integer = store.intern_class_id("java.lang.Integer");
        let throwable = store.intern_class_id("java.lang.Throwable");
        let exception = store.intern_class_id("java.lang.Exception");
        let runtime_exception = store.intern_class_id("java.lang.RuntimeException");
        let error = store.intern_class_id("java.lang.Error");
        let io_exception = store.intern_class_id("java.io.IOException");
        let cloneable = store.intern_class_id("java.lang.Cloneable");
        let serializable = store.intern_class_id("java.io.Serializable");

        store.well_known = WellKnownTypes {
            object,
            string,
            number,
            integer,
            throwable,
            exception,
            runtime_exception,
            error,
            io_exception,
            cloneable,
            serializable,
        };

        store.define_class(
            object,
            ClassDef {
                super_class: None,
                methods: object_methods(object, string),
                ..ClassDef::class("java.lang.Object")
            },
        );
        store.define_class(cloneable, ClassDef::interface("java.lang.Cloneable"));
        store.define_class(serializable, ClassDef::interface("java.io.Serializable"));
        store.define_class(
            string,
            ClassDef {
                is_final: true,
                interfaces: vec![Type::class(serializable, vec![])],
                ..ClassDef::class("java.lang.String")
            },
        );
        store.define_class(
            number,
            ClassDef {
                is_abstract: true,
                interfaces: vec![Type::class(serializable, vec![])],
                ..ClassDef::class("java.lang.Number")
            },
        );
        store.define_class(
            integer,
            ClassDef {
                is_final: true,
                super_class: Some(Type::class(number, vec![])),
                ..ClassDef::class("java.lang.Integer")
            },
        );
        store.define_class(throwable, ClassDef::class("java.lang.Throwable"));
        store.define_class(
            exception,
            ClassDef {
                super_class: Some(Type::class(throwable, vec![])),
                ..ClassDef::class("java.lang.Exception")
            },
        );
        store.define_class(
            runtime_exception,
            ClassDef {
                super_class: Some(Type::class(exception, vec![])),
                ..ClassDef::class("java.lang.RuntimeException")
            },
        );
        store.define_class(
            error,
            ClassDef {
                super_class: Some(Type::class(throwable, vec![])),
                ..ClassDef::class("java.lang.Error")
            },
        );
        store.define_class(
            io_exception,
            ClassDef {
                super_class: Some(Type::class(exception, vec![])),
                ..ClassDef::class("java.io.IOException")
            },
        );

        store
    }

    /// Reserve (or fetch) the id for `name` without defining the class.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Define (or redefine) the class behind a previously interned id.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.by_name.insert(def.name.clone(), id);
        self.classes[id.index()] = Some(def);
    }

    /// Intern and define in one step.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Allocate a fresh type parameter.
    pub fn add_type_param(&mut self, name: impl Into<String>, bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            bounds,
        });
        id
    }

    /// Redefine a previously allocated type parameter; needed for
    /// self-referential bounds (`T extends Comparable<T>`).
    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        self.type_params[id.0 as usize] = def;
    }

    /// All defined class ids, in insertion order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter_map(|(i, def)| def.as_ref().map(|_| ClassId(i as u32)))
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index()).and_then(Option::as_ref)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}

fn object_methods(object: ClassId, string: ClassId) -> Vec<MethodDef> {
    vec![
        MethodDef::new(
            "equals",
            vec![Type::class(object, vec![])],
            Type::Primitive(PrimitiveType::Boolean),
        ),
        MethodDef::new("hashCode", vec![], Type::int()),
        MethodDef::new("toString", vec![], Type::class(string, vec![])),
        MethodDef {
            visibility: Visibility::Protected,
            ..MethodDef::new("clone", vec![], Type::class(object, vec![]))
        },
        MethodDef {
            is_final: true,
            ..MethodDef::new("getClass", vec![], Type::class(object, vec![]))
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_class_id_is_idempotent() {
        let mut store = TypeStore::with_minimal_jdk();
        let first = store.intern_class_id("com.example.Foo");
        let second = store.intern_class_id("com.example.Foo");
        assert_eq!(first, second);
    }

    #[test]
    fn define_class_fills_placeholder() {
        let mut store = TypeStore::with_minimal_jdk();
        let id = store.intern_class_id("com.example.Foo");
        assert!(store.class(id).is_none());

        store.define_class(id, ClassDef::class("com.example.Foo"));
        assert_eq!(store.class_id("com.example.Foo"), Some(id));
        assert_eq!(store.class(id).unwrap().kind, ClassKind::Class);
    }

    #[test]
    fn minimal_jdk_throwable_chain() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let rte = store.class(wk.runtime_exception).unwrap();
        assert_eq!(
            rte.super_class,
            Some(Type::class(wk.exception, vec![]))
        );
        let exc = store.class(wk.exception).unwrap();
        assert_eq!(exc.super_class, Some(Type::class(wk.throwable, vec![])));
    }

    #[test]
    fn object_defines_the_usual_suspects() {
        let store = TypeStore::with_minimal_jdk();
        let object = store.class(store.well_known().object).unwrap();
        let names: Vec<&str> = object.methods.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"equals"));
        assert!(names.contains(&"hashCode"));
        assert!(names.contains(&"toString"));
    }
}
