//! Member shape checks and method naming.
//!
//! The target model has no overridable generic members. A generic method
//! that must be overridden (abstract) cannot be translated at all; a
//! generic method that may be overridden (virtual) is emitted non-virtual
//! and reported.

use bridge_common::{BridgeError, BridgeWarning, Diagnostics};
use bridge_types::conversions::conversion_method_name;
use bridge_types::{DeclId, Dispatch, MethodDecl, MethodKind, TypeKind, TypeRegistry};
use serde::Serialize;

/// Target name of every constructor.
pub const CONSTRUCTOR_NAME: &str = "__ctor__";

/// How a method is declared in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodPlan {
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    /// Virtual dispatch was dropped; calls through a base reference will
    /// not reach overrides.
    pub reduced_fidelity: bool,
}

/// Plan one method of `decl`.
///
/// A generic abstract method is fatal: the error is recorded in
/// `diagnostics` and returned.
pub fn plan_method(
    registry: &mut TypeRegistry<'_>,
    diagnostics: &mut Diagnostics,
    decl: DeclId,
    method: &MethodDecl,
) -> Result<MethodPlan, BridgeError> {
    let model = registry.model();
    if model.try_get(decl).is_none() {
        return Err(BridgeError::UnknownDeclaration { index: decl.0 });
    }
    let kind = model.kind(decl);
    let generic = method.generic_arity > 0;

    let mut plan = MethodPlan {
        name: method_name(registry, method),
        kind: method.kind.clone(),
        is_static: method.dispatch == Dispatch::Static,
        is_virtual: false,
        is_abstract: false,
        reduced_fidelity: false,
    };

    match method.dispatch {
        Dispatch::Abstract if generic => {
            let error = BridgeError::AbstractGenericMethod {
                type_name: model.dotted_name(decl),
                method_name: method.name.clone(),
            };
            diagnostics.error(error.clone());
            return Err(error);
        }
        Dispatch::Virtual if generic => {
            diagnostics.warn(BridgeWarning::VirtualGenericMethod {
                type_name: model.dotted_name(decl),
                method_name: method.name.clone(),
            });
            plan.reduced_fidelity = true;
        }
        // Value types cannot be derived from.
        Dispatch::Virtual if kind == TypeKind::Struct => {}
        Dispatch::Virtual => plan.is_virtual = true,
        Dispatch::Abstract => {
            plan.is_virtual = true;
            plan.is_abstract = true;
        }
        Dispatch::Static | Dispatch::NonVirtual | Dispatch::Sealed => {}
    }
    Ok(plan)
}

/// Plan every method of `decl`, stopping at the first fatal error.
pub fn plan_type(
    registry: &mut TypeRegistry<'_>,
    diagnostics: &mut Diagnostics,
    decl: DeclId,
) -> Result<Vec<MethodPlan>, BridgeError> {
    let model = registry.model();
    let Some(type_decl) = model.try_get(decl) else {
        return Err(BridgeError::UnknownDeclaration { index: decl.0 });
    };
    type_decl
        .methods
        .iter()
        .map(|method| plan_method(registry, diagnostics, decl, method))
        .collect()
}

/// Target identifier of a method.
pub fn method_name(registry: &mut TypeRegistry<'_>, method: &MethodDecl) -> String {
    match &method.kind {
        MethodKind::Conversion(_) => match &method.return_type {
            Some(ret) => conversion_method_name(registry, &method.name, ret),
            None => registry.names().safe_name(&method.name),
        },
        MethodKind::Operator(name) => name.clone(),
        MethodKind::Constructor => CONSTRUCTOR_NAME.to_string(),
        MethodKind::Normal if method.name.starts_with('<') => {
            registry.names().unmangle_method_name(&method.name, false)
        }
        MethodKind::Normal => registry.names().safe_name(&method.name),
    }
}
