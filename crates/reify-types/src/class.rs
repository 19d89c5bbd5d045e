use std::collections::{HashMap, HashSet, VecDeque};

use crate::Descriptor;

/// Handle to a nominal (erased) class known to a [`ClassEnv`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Array { component: ClassId },
    Primitive,
}

/// Erased class metadata as seen by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.Map$Entry`.
    pub name: String,
    pub kind: ClassKind,
    /// Declared type parameter names. Only the arity matters at runtime.
    pub type_params: Vec<String>,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Generic supertypes written in the class declaration with concrete arguments
    /// (`class Names implements List<String>` declares `List<String>`).
    pub generic_supertypes: Vec<Descriptor>,
    pub is_anonymous: bool,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            generic_supertypes: Vec::new(),
            is_anonymous: false,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ClassKind::Array { .. })
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Classes the reification layer needs to name directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownClasses {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
}

/// Read access to class metadata.
///
/// Descriptors only carry [`ClassId`]s; every operation that needs names or the nominal subtype
/// relation goes through this trait so hosts can plug in their own class table.
pub trait ClassEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownClasses;
}

/// Returns the part of a binary class name after the last `.` or `$`.
pub fn simple_name(name: &str) -> &str {
    match name.rfind(['.', '$']) {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Nominal subtype check on erased classes (`sup.isAssignableFrom(sub)`).
///
/// Reflexive. Interfaces and arrays are subtypes of `Object`; arrays of reference types are
/// covariant in their component class. Missing metadata is treated as "no supertypes".
pub fn is_subclass(env: &dyn ClassEnv, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup {
        return true;
    }
    let object = env.well_known().object;
    if sup == object {
        return env
            .class(sub)
            .is_some_and(|def| def.kind != ClassKind::Primitive);
    }

    if let (Some(sub_def), Some(sup_def)) = (env.class(sub), env.class(sup)) {
        if let (ClassKind::Array { component: a }, ClassKind::Array { component: b }) =
            (sub_def.kind, sup_def.kind)
        {
            let a_primitive = env
                .class(a)
                .is_some_and(|def| def.kind == ClassKind::Primitive);
            return !a_primitive && is_subclass(env, a, b);
        }
    }

    let mut queue = VecDeque::from([sub]);
    let mut seen = HashSet::new();
    while let Some(current) = queue.pop_front() {
        if current == sup {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        queue.extend(def.super_class);
        queue.extend(def.interfaces.iter().copied());
    }
    false
}

/// In-memory [`ClassEnv`].
#[derive(Clone, Debug)]
pub struct ClassRegistry {
    classes: Vec<ClassDef>,
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownClasses,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// A registry that only knows `java.lang.Object` and the two array marker interfaces.
    pub fn new() -> Self {
        let placeholder = ClassId(0);
        let mut registry = Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            well_known: WellKnownClasses {
                object: placeholder,
                cloneable: placeholder,
                serializable: placeholder,
            },
        };
        let object = registry.add_class(ClassDef::new("java.lang.Object", ClassKind::Class));
        let cloneable =
            registry.add_class(ClassDef::new("java.lang.Cloneable", ClassKind::Interface));
        let serializable =
            registry.add_class(ClassDef::new("java.io.Serializable", ClassKind::Interface));
        registry.well_known = WellKnownClasses {
            object,
            cloneable,
            serializable,
        };
        registry
    }

    /// A small slice of the JDK class hierarchy, enough for tests and examples.
    pub fn with_minimal_jdk() -> Self {
        let mut registry = Self::new();
        let object = registry.well_known.object;
        let serializable = registry.well_known.serializable;

        for name in [
            "boolean", "byte", "char", "short", "int", "long", "float", "double",
        ] {
            registry.add_class(ClassDef::new(name, ClassKind::Primitive));
        }

        let comparable = registry.add_class(ClassDef {
            type_params: vec!["T".into()],
            ..ClassDef::new("java.lang.Comparable", ClassKind::Interface)
        });
        let char_sequence =
            registry.add_class(ClassDef::new("java.lang.CharSequence", ClassKind::Interface));
        registry.add_class(ClassDef {
            super_class: Some(object),
            interfaces: vec![serializable, comparable, char_sequence],
            ..ClassDef::new("java.lang.String", ClassKind::Class)
        });
        let number = registry.add_class(ClassDef {
            super_class: Some(object),
            interfaces: vec![serializable],
            ..ClassDef::new("java.lang.Number", ClassKind::Class)
        });
        for name in [
            "java.lang.Integer",
            "java.lang.Long",
            "java.lang.Double",
            "java.lang.Float",
            "java.lang.Short",
            "java.lang.Byte",
        ] {
            registry.add_class(ClassDef {
                super_class: Some(number),
                interfaces: vec![comparable],
                ..ClassDef::new(name, ClassKind::Class)
            });
        }
        registry.add_class(ClassDef {
            super_class: Some(object),
            interfaces: vec![serializable, comparable],
            ..ClassDef::new("java.lang.Boolean", ClassKind::Class)
        });

        let iterable = registry.add_class(ClassDef {
            type_params: vec!["T".into()],
            ..ClassDef::new("java.lang.Iterable", ClassKind::Interface)
        });
        let collection = registry.add_class(ClassDef {
            type_params: vec!["E".into()],
            interfaces: vec![iterable],
            ..ClassDef::new("java.util.Collection", ClassKind::Interface)
        });
        let list = registry.add_class(ClassDef {
            type_params: vec!["E".into()],
            interfaces: vec![collection],
            ..ClassDef::new("java.util.List", ClassKind::Interface)
        });
        let abstract_list = registry.add_class(ClassDef {
            type_params: vec!["E".into()],
            super_class: Some(object),
            interfaces: vec![list],
            ..ClassDef::new("java.util.AbstractList", ClassKind::Class)
        });
        registry.add_class(ClassDef {
            type_params: vec!["E".into()],
            super_class: Some(abstract_list),
            interfaces: vec![list, serializable],
            ..ClassDef::new("java.util.ArrayList", ClassKind::Class)
        });
        let map = registry.add_class(ClassDef {
            type_params: vec!["K".into(), "V".into()],
            ..ClassDef::new("java.util.Map", ClassKind::Interface)
        });
        registry.add_class(ClassDef {
            type_params: vec!["K".into(), "V".into()],
            super_class: Some(object),
            interfaces: vec![map, serializable],
            ..ClassDef::new("java.util.HashMap", ClassKind::Class)
        });

        registry
    }

    /// Register `def`, replacing any class with the same binary name.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        if let Some(&id) = self.by_name.get(&def.name) {
            self.classes[id.0 as usize] = def;
            return id;
        }
        let idx: u32 = self
            .classes
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("class registry exceeded u32::MAX classes"));
        let id = ClassId(idx);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Intern the array class whose component class is `component`.
    pub fn array_of(&mut self, component: ClassId) -> ClassId {
        let component_name = self.classes[component.0 as usize].name.clone();
        let name = format!("{component_name}[]");
        if let Some(id) = self.class_id(&name) {
            return id;
        }
        let WellKnownClasses {
            object,
            cloneable,
            serializable,
        } = self.well_known;
        self.add_class(ClassDef {
            super_class: Some(object),
            interfaces: vec![cloneable, serializable],
            ..ClassDef::new(name, ClassKind::Array { component })
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassEnv for ClassRegistry {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownClasses {
        &self.well_known
    }
}
