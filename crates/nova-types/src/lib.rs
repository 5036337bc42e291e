//! Java type model used by Nova's overload resolution.
//!
//! [`TypeStore`] is an arena of class and type-parameter definitions. Ids are indices into the
//! arena, so a `Type` is a small structural value that can be compared, hashed and substituted
//! without touching the store. All algorithms take a `&dyn TypeEnv` so callers can layer their
//! own declaration providers on top of the store.

use std::collections::HashMap;

pub mod java;

pub use java::format::{format_type, type_sort_key};
pub use java::helpers::{
    contains_type_vars, erasure, glb, instantiate_as_supertype, is_reifiable, lub,
    make_intersection, substitute, Substitution,
};
pub use java::hierarchy::{all_ancestors, check_acyclic, supertypes_of, HierarchyError};
pub use java::subtyping::{
    boxed_class, is_same_type, is_subclass, is_subtype, is_unchecked_convertible,
    unboxed_primitive,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Widening primitive conversion (JLS 5.1.2), reflexive.
    ///
    /// JLS 4.10.1 also defines primitive subtyping in terms of this relation.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub def: ClassId,
    /// Empty for raw or non-generic uses of the class.
    pub args: Vec<Type>,
}

impl ClassType {
    pub fn new(def: ClassId, args: Vec<Type>) -> Self {
        Self { def, args }
    }
}

/// A Java type expression.
///
/// Equality is structural. Intersections are compared order-sensitively by `==`; use
/// [`is_same_type`] when component order must not matter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Intersection(Vec<Type>),
    /// The type of the `null` literal.
    Null,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> Type {
        Type::Primitive(PrimitiveType::Long)
    }

    pub fn double() -> Type {
        Type::Primitive(PrimitiveType::Double)
    }

    pub fn boolean() -> Type {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn char() -> Type {
        Type::Primitive(PrimitiveType::Char)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Whether values of this type are references (including `null`).
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array(_) | Type::TypeVar(_) | Type::Intersection(_) | Type::Null
        )
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(ct) => Some(ct),
            _ => None,
        }
    }

    /// Element type of an array type.
    pub fn array_element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    /// Declared bounds in source order. Empty means `Object`.
    pub upper_bounds: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub is_static: bool,
    pub is_varargs: bool,
    /// Interface methods that are neither abstract nor static are default methods.
    pub is_abstract: bool,
}

impl MethodDef {
    /// A concrete, non-generic instance method.
    pub fn instance(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            type_params: vec![],
            params,
            return_type,
            throws: vec![],
            is_static: false,
            is_varargs: false,
            is_abstract: false,
        }
    }

    pub fn abstract_method(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            is_abstract: true,
            ..Self::instance(name, params, return_type)
        }
    }

    pub fn static_method(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, params, return_type)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorDef {
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub throws: Vec<Type>,
    pub is_varargs: bool,
}

impl ConstructorDef {
    pub fn new(params: Vec<Type>) -> Self {
        Self {
            type_params: vec![],
            params,
            throws: vec![],
            is_varargs: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.List`.
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub constructors: Vec<ConstructorDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn class(name: impl Into<String>, super_class: Option<Type>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class,
            interfaces: vec![],
            constructors: vec![],
            methods: vec![],
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::class(name, None)
        }
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
}

/// Read-only view of declarations.
///
/// Implementations must be shareable across threads: resolution caches are read concurrently.
pub trait TypeEnv: Sync {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl TypeStore {
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())
    }

    /// Reserve an id for `name` without defining the class yet.
    ///
    /// Needed for self-referential declarations such as `class E<T extends E<T>>`.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_id(name) {
            return id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::class(name, None));
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.class_by_name.insert(def.name.clone(), id);
        if let Some(slot) = self.classes.get_mut(id.index()) {
            *slot = def;
        }
    }

    /// Add a class, replacing any existing definition with the same binary name.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
        });
        id
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        if let Some(slot) = self.type_params.get_mut(id.index()) {
            *slot = def;
        }
    }

    pub fn with_minimal_jdk() -> Self {
        let placeholder = ClassId(0);
        let mut store = TypeStore {
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes {
                object: placeholder,
                string: placeholder,
                cloneable: placeholder,
                serializable: placeholder,
                number: placeholder,
                boolean: placeholder,
                byte: placeholder,
                short: placeholder,
                character: placeholder,
                integer: placeholder,
                long: placeholder,
                float: placeholder,
                double: placeholder,
            },
        };
        store.seed_minimal_jdk();
        store
    }

    fn seed_minimal_jdk(&mut self) {
        use PrimitiveType::*;

        let object = self.intern_class_id("java.lang.Object");
        let string = self.intern_class_id("java.lang.String");
        let char_sequence = self.intern_class_id("java.lang.CharSequence");
        let comparable = self.intern_class_id("java.lang.Comparable");
        let cloneable = self.intern_class_id("java.lang.Cloneable");
        let serializable = self.intern_class_id("java.io.Serializable");
        let number = self.intern_class_id("java.lang.Number");
        let runnable = self.intern_class_id("java.lang.Runnable");

        let object_ty = Type::class(object, vec![]);
        let string_ty = Type::class(string, vec![]);
        let serializable_ty = Type::class(serializable, vec![]);

        self.define_class(
            object,
            ClassDef {
                constructors: vec![ConstructorDef::new(vec![])],
                methods: vec![
                    MethodDef::instance("equals", vec![object_ty.clone()], Type::boolean()),
                    MethodDef::instance("hashCode", vec![], Type::int()),
                    MethodDef::instance("toString", vec![], string_ty.clone()),
                ],
                ..ClassDef::class("java.lang.Object", None)
            },
        );
        self.define_class(cloneable, ClassDef::interface("java.lang.Cloneable"));
        self.define_class(serializable, ClassDef::interface("java.io.Serializable"));
        self.define_class(
            runnable,
            ClassDef {
                methods: vec![MethodDef::abstract_method("run", vec![], Type::Void)],
                ..ClassDef::interface("java.lang.Runnable")
            },
        );

        let comparable_t = self.add_type_param("T", vec![object_ty.clone()]);
        self.define_class(
            comparable,
            ClassDef {
                type_params: vec![comparable_t],
                methods: vec![MethodDef::abstract_method(
                    "compareTo",
                    vec![Type::TypeVar(comparable_t)],
                    Type::int(),
                )],
                ..ClassDef::interface("java.lang.Comparable")
            },
        );
        self.define_class(
            char_sequence,
            ClassDef {
                methods: vec![
                    MethodDef::abstract_method("length", vec![], Type::int()),
                    MethodDef::abstract_method("charAt", vec![Type::int()], Type::char()),
                ],
                ..ClassDef::interface("java.lang.CharSequence")
            },
        );

        let char_array = Type::array(Type::char());
        self.define_class(
            string,
            ClassDef {
                interfaces: vec![
                    serializable_ty.clone(),
                    Type::class(comparable, vec![string_ty.clone()]),
                    Type::class(char_sequence, vec![]),
                ],
                constructors: vec![
                    ConstructorDef::new(vec![]),
                    ConstructorDef::new(vec![string_ty.clone()]),
                    ConstructorDef::new(vec![char_array.clone()]),
                ],
                methods: vec![
                    MethodDef::instance("length", vec![], Type::int()),
                    MethodDef::instance("charAt", vec![Type::int()], Type::char()),
                    MethodDef::instance("compareTo", vec![string_ty.clone()], Type::int()),
                    MethodDef::static_method("valueOf", vec![object_ty.clone()], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![char_array], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![Type::boolean()], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![Type::char()], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![Type::int()], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![Type::long()], string_ty.clone()),
                    MethodDef::static_method("valueOf", vec![Type::double()], string_ty.clone()),
                ],
                ..ClassDef::class("java.lang.String", Some(object_ty.clone()))
            },
        );
        self.define_class(
            number,
            ClassDef {
                interfaces: vec![serializable_ty.clone()],
                methods: vec![MethodDef::abstract_method("intValue", vec![], Type::int())],
                ..ClassDef::class("java.lang.Number", Some(object_ty.clone()))
            },
        );

        let boxes = [
            ("java.lang.Boolean", Boolean),
            ("java.lang.Byte", Byte),
            ("java.lang.Short", Short),
            ("java.lang.Character", Char),
            ("java.lang.Integer", Int),
            ("java.lang.Long", Long),
            ("java.lang.Float", Float),
            ("java.lang.Double", Double),
        ];
        let mut box_ids = Vec::with_capacity(boxes.len());
        for (name, prim) in boxes {
            let id = self.intern_class_id(name);
            let self_ty = Type::class(id, vec![]);
            let numeric = !matches!(prim, Boolean | Char);
            let super_class = if numeric {
                Type::class(number, vec![])
            } else {
                object_ty.clone()
            };
            let mut interfaces = vec![Type::class(comparable, vec![self_ty.clone()])];
            if !numeric {
                interfaces.insert(0, serializable_ty.clone());
            }
            let mut methods = vec![
                MethodDef::instance("compareTo", vec![self_ty.clone()], Type::int()),
                MethodDef::static_method("valueOf", vec![Type::Primitive(prim)], self_ty.clone()),
            ];
            if numeric {
                methods.push(MethodDef::instance("intValue", vec![], Type::int()));
            }
            if prim == Int {
                methods.push(MethodDef::static_method(
                    "valueOf",
                    vec![string_ty.clone()],
                    self_ty.clone(),
                ));
                methods.push(MethodDef::static_method(
                    "parseInt",
                    vec![string_ty.clone()],
                    Type::int(),
                ));
            }
            self.define_class(
                id,
                ClassDef {
                    interfaces,
                    constructors: vec![ConstructorDef::new(vec![Type::Primitive(prim)])],
                    methods,
                    ..ClassDef::class(name, Some(super_class))
                },
            );
            box_ids.push(id);
        }

        let math = self.intern_class_id("java.lang.Math");
        self.define_class(
            math,
            ClassDef {
                methods: [Int, Long, Float, Double]
                    .into_iter()
                    .map(|p| {
                        let ty = Type::Primitive(p);
                        MethodDef::static_method("max", vec![ty.clone(), ty.clone()], ty)
                    })
                    .collect(),
                ..ClassDef::class("java.lang.Math", Some(object_ty.clone()))
            },
        );

        // java.util collections.
        let iterable = self.intern_class_id("java.lang.Iterable");
        let collection = self.intern_class_id("java.util.Collection");
        let list = self.intern_class_id("java.util.List");
        let array_list = self.intern_class_id("java.util.ArrayList");
        let arrays = self.intern_class_id("java.util.Arrays");

        let iterable_t = self.add_type_param("T", vec![object_ty.clone()]);
        self.define_class(
            iterable,
            ClassDef {
                type_params: vec![iterable_t],
                ..ClassDef::interface("java.lang.Iterable")
            },
        );

        let collection_e = self.add_type_param("E", vec![object_ty.clone()]);
        let e = Type::TypeVar(collection_e);
        self.define_class(
            collection,
            ClassDef {
                type_params: vec![collection_e],
                interfaces: vec![Type::class(iterable, vec![e.clone()])],
                methods: vec![
                    MethodDef::abstract_method("add", vec![e.clone()], Type::boolean()),
                    MethodDef::abstract_method("size", vec![], Type::int()),
                    MethodDef::abstract_method("contains", vec![object_ty.clone()], Type::boolean()),
                    MethodDef::abstract_method("remove", vec![object_ty.clone()], Type::boolean()),
                ],
                ..ClassDef::interface("java.util.Collection")
            },
        );

        let list_e = self.add_type_param("E", vec![object_ty.clone()]);
        let e = Type::TypeVar(list_e);
        self.define_class(
            list,
            ClassDef {
                type_params: vec![list_e],
                interfaces: vec![Type::class(collection, vec![e.clone()])],
                methods: vec![
                    MethodDef::abstract_method("get", vec![Type::int()], e.clone()),
                    MethodDef::abstract_method("add", vec![e.clone()], Type::boolean()),
                    MethodDef::abstract_method("remove", vec![Type::int()], e.clone()),
                    MethodDef::abstract_method("remove", vec![object_ty.clone()], Type::boolean()),
                ],
                ..ClassDef::interface("java.util.List")
            },
        );

        let array_list_e = self.add_type_param("E", vec![object_ty.clone()]);
        let e = Type::TypeVar(array_list_e);
        self.define_class(
            array_list,
            ClassDef {
                type_params: vec![array_list_e],
                interfaces: vec![Type::class(list, vec![e.clone()])],
                constructors: vec![
                    ConstructorDef::new(vec![]),
                    ConstructorDef::new(vec![Type::int()]),
                    ConstructorDef::new(vec![Type::class(
                        collection,
                        vec![Type::Wildcard(WildcardBound::Extends(Box::new(e.clone())))],
                    )]),
                ],
                methods: vec![
                    MethodDef::instance("get", vec![Type::int()], e.clone()),
                    MethodDef::instance("add", vec![e.clone()], Type::boolean()),
                    MethodDef::instance("size", vec![], Type::int()),
                    MethodDef::instance("contains", vec![object_ty.clone()], Type::boolean()),
                    MethodDef::instance("remove", vec![Type::int()], e.clone()),
                    MethodDef::instance("remove", vec![object_ty.clone()], Type::boolean()),
                ],
                ..ClassDef::class("java.util.ArrayList", Some(object_ty.clone()))
            },
        );

        let as_list_t = self.add_type_param("T", vec![object_ty.clone()]);
        self.define_class(
            arrays,
            ClassDef {
                methods: vec![
                    MethodDef {
                        type_params: vec![as_list_t],
                        is_varargs: true,
                        ..MethodDef::static_method(
                            "asList",
                            vec![Type::array(Type::TypeVar(as_list_t))],
                            Type::class(list, vec![Type::TypeVar(as_list_t)]),
                        )
                    },
                    MethodDef::static_method("sort", vec![Type::array(Type::int())], Type::Void),
                    MethodDef::static_method(
                        "sort",
                        vec![Type::array(object_ty.clone())],
                        Type::Void,
                    ),
                ],
                ..ClassDef::class("java.util.Arrays", Some(object_ty))
            },
        );

        self.well_known = WellKnownTypes {
            object,
            string,
            cloneable,
            serializable,
            number,
            boolean: box_ids[0],
            byte: box_ids[1],
            short: box_ids[2],
            character: box_ids[3],
            integer: box_ids[4],
            long: box_ids[5],
            float: box_ids[6],
            double: box_ids[7],
        };
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_id(name) {
            return Some(id);
        }
        // Implicit `java.lang.*` import.
        if !name.contains('.') {
            return self.class_id(&format!("java.lang.{name}"));
        }
        None
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
