//! Source model, target spellings and the Type Registry.
//!
//! The front end hands over a fully resolved [`SourceModel`]. The
//! [`TypeRegistry`] interns its type handles into canonical descriptors
//! that the cast engine and the dependency graph work on.

pub mod builtins;
pub mod conversions;
pub mod registry;
pub mod source;
pub mod spelling;
pub mod ty;

pub use builtins::Builtin;
pub use conversions::{find_conversion, UserConversion};
pub use registry::TypeRegistry;
pub use source::{
    ConversionKind, DeclId, Dispatch, FieldDecl, MethodDecl, MethodKind, ParamDecl, Site,
    SourceModel, SourceType, TypeDecl, TypeKind, TypeRef,
};
pub use ty::{LocalType, LocalTypeId, TypeInfo, TypeInfoId};
