//! Canonical target-side descriptors.
//!
//! A [`LocalType`] exists for every distinct source type that reaches the
//! backend, keyed by structural equality. A [`TypeInfo`] exists for every
//! declared type (or instantiation) that has been resolved. Both live in
//! arenas owned by the [`TypeRegistry`](crate::registry::TypeRegistry)
//! and are addressed by the ids below.

use serde::Serialize;

use crate::builtins::Builtin;
use crate::source::{DeclId, SourceType, TypeKind, TypeRef};
use crate::spelling::NULL_SPELLING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalTypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeInfoId(pub u32);

/// Target-side descriptor of a type as it is used in expressions.
#[derive(Debug, Clone, Serialize)]
pub struct LocalType {
    pub id: LocalTypeId,
    /// Canonical spelling, e.g. `::System::Int32` or `::App::Item *`.
    pub full_name: String,
    /// Compared and converted as a target primitive. Enumerations count.
    pub is_primitive: bool,
    /// Set for entries seeded from the predefined table.
    pub builtin: Option<Builtin>,
    /// The source type this entry stands for. Empty while a predefined
    /// entry is still waiting to be resolved.
    pub source: Option<SourceType>,
    pub type_info: Option<TypeInfoId>,
    /// Declared kind, when the type resolves to a declaration.
    pub kind: Option<TypeKind>,
}

impl LocalType {
    pub fn is_resolved(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_some_and(TypeKind::is_value)
    }

    pub fn is_null(&self) -> bool {
        self.full_name == NULL_SPELLING
    }

    /// An open generic parameter.
    pub fn is_generic_param(&self) -> bool {
        matches!(self.source, Some(SourceType::Param(_)))
    }

    /// An unmanaged pointer type (`T *`).
    pub fn is_pointer(&self) -> bool {
        matches!(self.source, Some(SourceType::Pointer(_)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.source.as_ref().map(SourceType::without_ref), Some(SourceType::Array(_)))
    }

    /// The spelling already carries a trailing pointer qualifier.
    pub fn is_pointer_spelled(&self) -> bool {
        self.full_name.ends_with('*')
    }
}

/// Resolved descriptor of a declared type or instantiation.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    pub id: TypeInfoId,
    pub decl: DeclId,
    /// The reference this record was resolved from.
    pub type_ref: TypeRef,
    /// Short name with owner prefix and arity marker: `Outer__Inner__G1`.
    pub name: String,
    /// Rooted namespace: `::App::Model`.
    pub namespace: String,
    /// Canonical spelling including generic arguments.
    pub full_name: String,
    /// `namespace::name`.
    pub full_name_without_generic: String,
    pub kind: TypeKind,
    /// Recorded base class. Implicit roots are never recorded.
    pub base: Option<TypeInfoId>,
    /// Interfaces named directly in the declaration.
    pub exclusive_interfaces: Vec<TypeInfoId>,
    /// Every interface implemented, through the base chain or through
    /// other interfaces. Deduplicated.
    pub union_of_interfaces: Vec<TypeInfoId>,
    /// The unbound definition of an instantiation.
    pub generic_definition: Option<TypeInfoId>,
    pub generic_args: Vec<SourceType>,
    pub local_type: Option<LocalTypeId>,
    /// Declared in another unit.
    pub external: bool,
}

impl TypeInfo {
    pub fn is_value_type(&self) -> bool {
        self.kind.is_value()
    }

    /// ` *` for reference kinds.
    pub fn instance_postfix(&self) -> &'static str {
        self.kind.instance_postfix()
    }

    /// The identity dependency tracking uses: the generic definition for
    /// instantiations, the record itself otherwise.
    pub fn definition(&self) -> TypeInfoId {
        self.generic_definition.unwrap_or(self.id)
    }
}
