//! Lookup of user-defined conversion operators.
//!
//! A value may flow from one type to another through an `op_Implicit` or
//! `op_Explicit` declared on either side. For primitive destinations the
//! widening table decides which return types are acceptable, closest first.

use serde::Serialize;

use crate::registry::TypeRegistry;
use crate::source::{MethodDecl, SourceType};
use crate::ty::{LocalTypeId, TypeInfoId};

/// A conversion operator selected for a (source, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserConversion {
    /// Type declaring the operator.
    pub owner: TypeInfoId,
    /// Index of the operator in the owner's method list.
    pub method_index: usize,
    pub owner_full_name: String,
    /// Mangled operator name, unique per return type.
    pub method_name: String,
}

impl UserConversion {
    /// `Owner::op_Implicit__System__Int32`.
    pub fn token(&self) -> String {
        format!("{}::{}", self.owner_full_name, self.method_name)
    }
}

/// Mangled name of a conversion operator returning `return_type`.
///
/// Declared types contribute their full name without generic arguments,
/// anything else its full spelling.
pub fn conversion_method_name(
    registry: &mut TypeRegistry<'_>,
    method_name: &str,
    return_type: &SourceType,
) -> String {
    let mangle_source = match return_type.as_named() {
        Some(tref) => {
            let info = registry.type_info(tref);
            registry.info(info).full_name_without_generic.clone()
        }
        None => {
            let local = registry.local_type(return_type);
            registry.get(local).full_name.clone()
        }
    };
    registry
        .names()
        .conversion_method_name(method_name, &mangle_source)
}

/// Find the operator converting `src` into `dst`, if any.
pub fn find_conversion(
    registry: &mut TypeRegistry<'_>,
    src: LocalTypeId,
    dst: LocalTypeId,
) -> Option<UserConversion> {
    let destination = registry.get(dst);
    if !destination.is_primitive {
        return find_non_standard(registry, src, dst);
    }
    // Enumerations are primitive but have no widening entry of their own.
    let candidates: Vec<LocalTypeId> = match destination.builtin {
        Some(builtin) => builtin
            .widening_sources()
            .iter()
            .map(|b| registry.builtin(*b))
            .collect(),
        None => vec![dst],
    };

    let mut current = registry.get(src).type_info;
    while let Some(info) = current {
        for &candidate in &candidates {
            if let Some(found) = scan_operators(registry, info, candidate) {
                return Some(found);
            }
        }
        current = registry.info(info).base;
    }
    None
}

fn find_non_standard(
    registry: &mut TypeRegistry<'_>,
    src: LocalTypeId,
    dst: LocalTypeId,
) -> Option<UserConversion> {
    let src_info = registry.get(src).type_info;
    let dst_info = registry.get(dst).type_info;

    for owner in [src_info, dst_info].into_iter().flatten() {
        if let Some(found) = scan_operators(registry, owner, dst) {
            return Some(found);
        }
    }

    let base = src_info.and_then(|info| registry.info(info).base)?;
    let base_local = registry.local_type_of_info(base);
    find_conversion(registry, base_local, dst)
}

/// First conversion operator declared on `owner` that returns `target`.
fn scan_operators(
    registry: &mut TypeRegistry<'_>,
    owner: TypeInfoId,
    target: LocalTypeId,
) -> Option<UserConversion> {
    let model = registry.model();
    let record = registry.info(owner);
    let decl = model.get(record.decl);
    let args = record.generic_args.clone();
    let owner_full_name = record.full_name.clone();

    let conversions = decl
        .methods
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_conversion());
    for (method_index, method) in conversions {
        let Some(return_type) = returned(method, &decl.generic_params, &args) else {
            continue;
        };
        if registry.local_type(&return_type) != target {
            continue;
        }
        let method_name = conversion_method_name(registry, &method.name, &return_type);
        tracing::trace!(owner = %owner_full_name, method = %method_name, "found conversion operator");
        return Some(UserConversion {
            owner,
            method_index,
            owner_full_name,
            method_name,
        });
    }
    None
}

fn returned(method: &MethodDecl, params: &[String], args: &[SourceType]) -> Option<SourceType> {
    method
        .return_type
        .as_ref()
        .map(|ty| ty.substitute(params, args))
}
