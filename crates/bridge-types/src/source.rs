//! The resolved type graph supplied by the metadata front end.
//!
//! Declarations live in a [`SourceModel`] arena addressed by [`DeclId`].
//! Types that flow through the backend are [`SourceType`] handles. Two
//! handles for the same type can come from different places (the
//! declaration itself, or a use site in a signature) and are distinct
//! values, but they compare equal: the [`Site`] is excluded from equality
//! and hashing.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Index of a declaration in the [`SourceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

/// Where a handle was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Site {
    Declaration,
    Usage,
}

/// A reference to a declared type, possibly instantiated.
///
/// The `site` field is provenance only. It is NOT part of the type's
/// identity and is excluded from `PartialEq` and `Hash`.
#[derive(Debug, Clone, Serialize)]
pub struct TypeRef {
    pub decl: DeclId,
    pub args: Vec<SourceType>,
    pub site: Site,
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.decl == other.decl && self.args == other.args
    }
}

impl Eq for TypeRef {}

impl std::hash::Hash for TypeRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.decl.hash(state);
        self.args.hash(state);
    }
}

/// A type handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SourceType {
    /// A declared type, with generic arguments when instantiated.
    Named(TypeRef),
    /// An open generic parameter, by name.
    Param(String),
    /// Unmanaged pointer to the element type.
    Pointer(Box<SourceType>),
    /// By-reference (`ref`/`out`) view of the element type.
    ByRef(Box<SourceType>),
    /// Single-dimension array of the element type.
    Array(Box<SourceType>),
    /// The type of the `null` literal.
    Null,
}

impl SourceType {
    /// A use-site handle to a non-generic declaration.
    pub fn named(decl: DeclId) -> Self {
        SourceType::Named(TypeRef {
            decl,
            args: Vec::new(),
            site: Site::Usage,
        })
    }

    /// A use-site handle to an instantiation of a generic declaration.
    pub fn generic(decl: DeclId, args: Vec<SourceType>) -> Self {
        SourceType::Named(TypeRef {
            decl,
            args,
            site: Site::Usage,
        })
    }

    pub fn param(name: &str) -> Self {
        SourceType::Param(name.to_string())
    }

    pub fn pointer(self) -> Self {
        SourceType::Pointer(Box::new(self))
    }

    pub fn by_ref(self) -> Self {
        SourceType::ByRef(Box::new(self))
    }

    pub fn array(self) -> Self {
        SourceType::Array(Box::new(self))
    }

    /// The same handle, marked as obtained from a declaration.
    pub fn at_declaration(mut self) -> Self {
        if let SourceType::Named(tref) = &mut self {
            tref.site = Site::Declaration;
        }
        self
    }

    pub fn as_named(&self) -> Option<&TypeRef> {
        match self {
            SourceType::Named(tref) => Some(tref),
            _ => None,
        }
    }

    /// Strip a by-reference wrapper, if any.
    pub fn without_ref(&self) -> &SourceType {
        match self {
            SourceType::ByRef(inner) => inner,
            other => other,
        }
    }

    /// Replace each parameter named in `params` by the argument at the same
    /// position. Parameters not listed are left open.
    pub fn substitute(&self, params: &[String], args: &[SourceType]) -> SourceType {
        match self {
            SourceType::Param(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            SourceType::Named(tref) => SourceType::Named(TypeRef {
                decl: tref.decl,
                args: tref.args.iter().map(|a| a.substitute(params, args)).collect(),
                site: tref.site,
            }),
            SourceType::Pointer(inner) => {
                SourceType::Pointer(Box::new(inner.substitute(params, args)))
            }
            SourceType::ByRef(inner) => SourceType::ByRef(Box::new(inner.substitute(params, args))),
            SourceType::Array(inner) => SourceType::Array(Box::new(inner.substitute(params, args))),
            SourceType::Null => SourceType::Null,
        }
    }
}

/// Declared kind of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Class,
    Interface,
    /// A value type.
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Structs and enums are copied by value.
    pub fn is_value(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }

    pub fn is_reference(self) -> bool {
        !self.is_value()
    }

    /// Suffix of a variable holding an instance: reference kinds are
    /// accessed through a pointer.
    pub fn instance_postfix(self) -> &'static str {
        if self.is_value() {
            ""
        } else {
            " *"
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: SourceType,
    pub is_static: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: SourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionKind {
    Implicit,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MethodKind {
    Normal,
    Constructor,
    /// An overloaded operator such as `op_Addition`.
    Operator(String),
    Conversion(ConversionKind),
}

/// How a method is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dispatch {
    Static,
    NonVirtual,
    Virtual,
    Abstract,
    /// An override that cannot be overridden further.
    Sealed,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    /// `None` for methods returning nothing.
    pub return_type: Option<SourceType>,
    pub params: Vec<ParamDecl>,
    pub generic_arity: usize,
    pub dispatch: Dispatch,
}

impl MethodDecl {
    /// A non-virtual instance method returning nothing.
    pub fn new(name: &str) -> Self {
        MethodDecl {
            name: name.to_string(),
            kind: MethodKind::Normal,
            return_type: None,
            params: Vec::new(),
            generic_arity: 0,
            dispatch: Dispatch::NonVirtual,
        }
    }

    pub fn constructor() -> Self {
        MethodDecl {
            kind: MethodKind::Constructor,
            ..MethodDecl::new(".ctor")
        }
    }

    /// A static operator overload, e.g. `op_Addition`.
    pub fn operator(name: &str) -> Self {
        MethodDecl {
            kind: MethodKind::Operator(name.to_string()),
            dispatch: Dispatch::Static,
            ..MethodDecl::new(name)
        }
    }

    /// A user-defined conversion operator from `from` to `to`.
    pub fn conversion(kind: ConversionKind, from: SourceType, to: SourceType) -> Self {
        let name = match kind {
            ConversionKind::Implicit => "op_Implicit",
            ConversionKind::Explicit => "op_Explicit",
        };
        MethodDecl {
            kind: MethodKind::Conversion(kind),
            dispatch: Dispatch::Static,
            ..MethodDecl::new(name)
        }
        .param("value", from)
        .returns(to)
    }

    pub fn returns(mut self, ty: SourceType) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn param(mut self, name: &str, ty: SourceType) -> Self {
        self.params.push(ParamDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn generic(mut self, arity: usize) -> Self {
        self.generic_arity = arity;
        self
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self.kind, MethodKind::Conversion(_))
    }
}

/// A type declaration as resolved by the front end.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    /// Dotted namespace, e.g. `System.Collections`. Empty for the global
    /// namespace.
    pub namespace: String,
    /// Raw name without arity decoration.
    pub name: String,
    /// Enclosing type for nested declarations.
    pub owner: Option<DeclId>,
    pub generic_params: Vec<String>,
    pub base: Option<SourceType>,
    pub is_interface: bool,
    pub interfaces: Vec<SourceType>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Declared in another unit; already emitted elsewhere.
    pub external: bool,
}

impl TypeDecl {
    pub fn new(namespace: &str, name: &str) -> Self {
        TypeDecl {
            namespace: namespace.to_string(),
            name: name.to_string(),
            owner: None,
            generic_params: Vec::new(),
            base: None,
            is_interface: false,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            external: false,
        }
    }

    pub fn extends(mut self, base: SourceType) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: SourceType) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    pub fn generic(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn nested_in(mut self, owner: DeclId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn field(mut self, name: &str, ty: SourceType) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            is_static: false,
        });
        self
    }

    pub fn static_field(mut self, name: &str, ty: SourceType) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            is_static: true,
        });
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}

pub const SYSTEM_OBJECT: &str = "System.Object";
pub const SYSTEM_VALUE_TYPE: &str = "System.ValueType";
pub const SYSTEM_ENUM: &str = "System.Enum";
pub const SYSTEM_MULTICAST_DELEGATE: &str = "System.MulticastDelegate";

/// Arena of every declaration known to the run.
#[derive(Debug, Default, Clone)]
pub struct SourceModel {
    decls: Vec<TypeDecl>,
    /// Dotted full name (`Ns.Owner.Name`) to id.
    by_name: FxHashMap<String, DeclId>,
}

impl SourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model pre-populated with the external core library types the
    /// backend knows by name.
    pub fn with_system_types() -> Self {
        let mut model = SourceModel::new();
        let object = model.add(TypeDecl::new("System", "Object").external());
        let object_ty = SourceType::named(object);
        let value_type = model.add(
            TypeDecl::new("System", "ValueType")
                .extends(object_ty.clone())
                .external(),
        );
        let value_ty = SourceType::named(value_type);
        model.add(
            TypeDecl::new("System", "Enum")
                .extends(value_ty.clone())
                .external(),
        );
        let delegate = model.add(
            TypeDecl::new("System", "Delegate")
                .extends(object_ty.clone())
                .external(),
        );
        model.add(
            TypeDecl::new("System", "MulticastDelegate")
                .extends(SourceType::named(delegate))
                .external(),
        );
        for name in [
            "Boolean", "Byte", "SByte", "Int16", "UInt16", "Char", "Int32", "UInt32", "Int64",
            "UInt64", "Single", "Double", "Decimal", "Void",
        ] {
            model.add(
                TypeDecl::new("System", name)
                    .extends(value_ty.clone())
                    .external(),
            );
        }
        model.add(
            TypeDecl::new("System", "Nullable")
                .generic(&["T"])
                .extends(value_ty)
                .external(),
        );
        model.add(
            TypeDecl::new("System", "String")
                .extends(object_ty.clone())
                .external(),
        );
        model.add(
            TypeDecl::new("System", "Array")
                .extends(object_ty)
                .external(),
        );
        model.add(TypeDecl::new("System", "IDisposable").interface().external());
        model.add(
            TypeDecl::new("System.Collections", "IEnumerable")
                .interface()
                .external(),
        );
        model.add(
            TypeDecl::new("System.Collections", "IEnumerator")
                .interface()
                .external(),
        );
        model
    }

    /// Add a declaration and return its id. Ids are assigned sequentially.
    pub fn add(&mut self, decl: TypeDecl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        let name = self.dotted_name(id);
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: DeclId) -> &TypeDecl {
        &self.decls[id.0 as usize]
    }

    pub fn try_get(&self, id: DeclId) -> Option<&TypeDecl> {
        self.decls.get(id.0 as usize)
    }

    /// Mutable access, for declarations that reference themselves or each
    /// other and must be completed after their ids are known.
    pub fn get_mut(&mut self, id: DeclId) -> &mut TypeDecl {
        &mut self.decls[id.0 as usize]
    }

    /// Look up a declaration by dotted name, e.g. `System.Int32`.
    pub fn lookup(&self, dotted: &str) -> Option<DeclId> {
        self.by_name.get(dotted).copied()
    }

    /// A use-site handle for the non-generic declaration `dotted`.
    pub fn named(&self, dotted: &str) -> Option<SourceType> {
        self.lookup(dotted).map(SourceType::named)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.decls.len()).map(|i| DeclId(i as u32))
    }

    /// `Ns.Owner.Name`, ignoring generic arity.
    pub fn dotted_name(&self, id: DeclId) -> String {
        let decl = self.get(id);
        let mut segments = vec![decl.name.clone()];
        let mut owner = decl.owner;
        while let Some(o) = owner {
            let owner_decl = self.get(o);
            segments.push(owner_decl.name.clone());
            owner = owner_decl.owner;
        }
        let root = self.get(self.outermost(id));
        if !root.namespace.is_empty() {
            segments.push(root.namespace.clone());
        }
        segments.reverse();
        segments.join(".")
    }

    fn outermost(&self, mut id: DeclId) -> DeclId {
        while let Some(owner) = self.get(id).owner {
            id = owner;
        }
        id
    }

    /// The handle a declaration uses for itself: its own parameters as
    /// arguments.
    pub fn declaration_type(&self, id: DeclId) -> SourceType {
        let decl = self.get(id);
        SourceType::Named(TypeRef {
            decl: id,
            args: decl
                .generic_params
                .iter()
                .map(|p| SourceType::Param(p.clone()))
                .collect(),
            site: Site::Declaration,
        })
    }

    /// Whether `tref` names a declaration with its own parameters, i.e.
    /// the unbound generic definition.
    pub fn is_definition(&self, tref: &TypeRef) -> bool {
        let params = &self.get(tref.decl).generic_params;
        tref.args.len() == params.len()
            && tref
                .args
                .iter()
                .zip(params)
                .all(|(arg, p)| matches!(arg, SourceType::Param(name) if name == p))
    }

    /// Declared kind, derived from the base type alone.
    pub fn kind(&self, id: DeclId) -> TypeKind {
        let decl = self.get(id);
        match decl.base.as_ref().and_then(SourceType::as_named) {
            Some(base) => match self.dotted_name(base.decl).as_str() {
                SYSTEM_MULTICAST_DELEGATE => TypeKind::Delegate,
                SYSTEM_VALUE_TYPE => TypeKind::Struct,
                SYSTEM_ENUM => TypeKind::Enum,
                _ => TypeKind::Class,
            },
            None if decl.is_interface => TypeKind::Interface,
            None => TypeKind::Class,
        }
    }

    /// The base type the target declaration inherits from. Implicit roots
    /// (`System.Object`, `System.ValueType`, `System.Enum`,
    /// `System.MulticastDelegate`) are not recorded.
    pub fn recorded_base(&self, id: DeclId) -> Option<&SourceType> {
        let base = self.get(id).base.as_ref()?;
        let tref = base.as_named()?;
        match self.dotted_name(tref.decl).as_str() {
            SYSTEM_OBJECT | SYSTEM_VALUE_TYPE | SYSTEM_ENUM | SYSTEM_MULTICAST_DELEGATE => None,
            _ => Some(base),
        }
    }
}
