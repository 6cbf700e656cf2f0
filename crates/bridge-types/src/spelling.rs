//! Target spellings of source types.
//!
//! Every type has one canonical spelling, rooted at the global scope:
//! `::System::Int32`, `::App::List__G1<::App::Item * >`. The registry
//! matches predefined entries against these spellings, and cast tokens are
//! parameterized by them.

use bridge_common::names::{scoped_namespace, with_generic_arity, NameFixup, SCOPE_SEPARATOR};

use crate::source::{DeclId, SourceModel, SourceType, TypeRef};

/// Spelling of the `null` literal's type. It never names a real type.
pub const NULL_SPELLING: &str = "!null!";

/// Sanitized short name of a declaration: enclosing types first, each with
/// its arity marker, then the declaration's own name and arity.
///
/// `Outer<T>.Inner<U, V>` becomes `Outer__G1__Inner__G2`.
pub fn type_name(model: &SourceModel, names: &NameFixup, id: DeclId) -> String {
    let decl = model.get(id);
    let mut name = names.safe_full_name(&decl.name);
    let mut owner = decl.owner;
    while let Some(o) = owner {
        let owner_decl = model.get(o);
        let owner_name = with_generic_arity(
            &names.safe_name(&owner_decl.name),
            owner_decl.generic_params.len(),
        );
        name = format!("{}__{}", owner_name, name);
        owner = owner_decl.owner;
    }
    let name = names.unmangle_method_name(&name, true);
    with_generic_arity(&name, decl.generic_params.len())
}

/// Rooted namespace of a declaration (`::System::Collections`), taken from
/// its outermost enclosing type.
pub fn namespace(model: &SourceModel, names: &NameFixup, id: DeclId) -> String {
    let mut id = id;
    while let Some(owner) = model.get(id).owner {
        id = owner;
    }
    scoped_namespace(names, &model.get(id).namespace)
}

/// Full name without generic arguments: `::App::List__G1`.
pub fn full_name_without_generic(model: &SourceModel, names: &NameFixup, id: DeclId) -> String {
    format!(
        "{}{}{}",
        namespace(model, names, id),
        SCOPE_SEPARATOR,
        type_name(model, names, id)
    )
}

/// Suffix appended when an instance of `ty` is stored: ` *` for reference
/// kinds and arrays, nothing otherwise.
pub fn instance_postfix(model: &SourceModel, ty: &SourceType) -> &'static str {
    match ty {
        SourceType::Named(tref) => model.kind(tref.decl).instance_postfix(),
        SourceType::Array(_) => " *",
        _ => "",
    }
}

/// Canonical spelling of `ty`.
pub fn spell(model: &SourceModel, names: &NameFixup, ty: &SourceType) -> String {
    match ty {
        SourceType::Named(tref) => spell_named(model, names, tref),
        SourceType::Param(name) => names.safe_name(name),
        SourceType::Pointer(inner) => format!("{} *", spell(model, names, inner)),
        SourceType::ByRef(inner) => format!("{}&", spell(model, names, inner)),
        SourceType::Array(element) => format!(
            "::System::Array__G<{}{} >",
            spell(model, names, element),
            instance_postfix(model, element)
        ),
        SourceType::Null => NULL_SPELLING.to_string(),
    }
}

fn spell_named(model: &SourceModel, names: &NameFixup, tref: &TypeRef) -> String {
    let mut out = full_name_without_generic(model, names, tref.decl);
    if tref.args.is_empty() {
        return out;
    }
    let args: Vec<String> = tref
        .args
        .iter()
        .map(|arg| format!("{}{}", spell(model, names, arg), instance_postfix(model, arg)))
        .collect();
    out.push('<');
    if args.len() > 1 {
        // Commas inside a macro argument need the __W<n>__ wrapper.
        out.push_str(&format!("__W{}__({})", args.len(), args.join(", ")));
    } else {
        out.push_str(&args[0]);
    }
    out.push_str(" >");
    out
}
