//! Cast Resolution Engine.
//!
//! Decides which conversion the target representation needs when a value
//! of one type flows into a slot of another. The decision is an ordered
//! table of rules (see [`rules`]); the first rule whose predicate holds
//! fires and no other rule is consulted.

pub mod rules;

use std::fmt;

use bridge_types::{find_conversion, LocalTypeId, TypeRegistry};
use serde::Serialize;

pub use rules::{CastQuery, CastRule, CAST_RULES, FALLBACK_RULE};

/// A conversion the emitter wraps around a value expression.
///
/// Every variant except [`Conversion::NoOp`] carries the destination
/// spelling it is parameterized by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Conversion {
    /// The value is used as is.
    NoOp,
    /// Explicit primitive narrowing: `(T)`.
    Narrow { target: String },
    /// `null` into a nullable value wrapper: `T::CreateDefault`.
    NullableDefault { target: String },
    /// `null` reinterpreted as a pointer: `static_cast<T * >`. The target
    /// already carries the pointer qualifier.
    NullCast { target: String },
    /// A user-defined conversion operator: `Owner::name`.
    UserDefined { token: String },
    Box { target: String },
    /// Boxing an enumeration, keeping the enum type instead of its
    /// underlying integer.
    BoxEnum { target: String, enum_name: String },
    /// Unboxing. Primitive destinations go through the boxable
    /// representation of the wrapper.
    Unbox { target: String, boxable: bool },
    InterfaceCast { target: String },
    /// Guarded class-to-class cast.
    Downcast { target: String },
    /// Cast into an enumeration, safe for enum arithmetic.
    EnumCast { target: String },
    /// Unchecked reinterpretation.
    Unchecked { target: String },
    /// Low-level pointer reinterpretation.
    Reinterpret { target: String },
}

impl Conversion {
    pub fn is_noop(&self) -> bool {
        matches!(self, Conversion::NoOp)
    }

    /// Render against the runtime namespace, e.g. `::Runtime`.
    pub fn display<'a>(&'a self, runtime: &'a str) -> ConversionDisplay<'a> {
        ConversionDisplay {
            conversion: self,
            runtime,
        }
    }

    /// The conversion token; empty for [`Conversion::NoOp`].
    pub fn token(&self, runtime: &str) -> String {
        self.display(runtime).to_string()
    }

    /// Wrap `value` in the conversion: `token(value)`.
    pub fn apply(&self, runtime: &str, value: &str) -> String {
        match self {
            Conversion::NoOp => value.to_string(),
            _ => format!("{}({})", self.display(runtime), value),
        }
    }
}

/// Helper returned by [`Conversion::display`].
pub struct ConversionDisplay<'a> {
    conversion: &'a Conversion,
    runtime: &'a str,
}

impl fmt::Display for ConversionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.runtime;
        match self.conversion {
            Conversion::NoOp => Ok(()),
            Conversion::Narrow { target } => write!(f, "({})", target),
            Conversion::NullableDefault { target } => write!(f, "{}::CreateDefault", target),
            Conversion::NullCast { target } => write!(f, "static_cast<{} >", target),
            Conversion::UserDefined { token } => f.write_str(token),
            Conversion::Box { target } => write!(f, "{}::Box<{} >", r, target),
            Conversion::BoxEnum { target, enum_name } => {
                write!(f, "{}::BoxEnum<{}, {} >", r, target, enum_name)
            }
            Conversion::Unbox {
                target,
                boxable: false,
            } => write!(f, "{}::Unbox<{} >", r, target),
            Conversion::Unbox {
                target,
                boxable: true,
            } => write!(
                f,
                "{}::Unbox<{}::BaseTypeWrapper<{} >::BoxeableType >",
                r, r, target
            ),
            Conversion::InterfaceCast { target } => write!(f, "{}::InterfaceCast<{} >", r, target),
            Conversion::Downcast { target } => write!(f, "{}::Cast<{} >", r, target),
            Conversion::EnumCast { target } => write!(f, "{}::EnumCast<{} >", r, target),
            Conversion::Unchecked { target } => write!(f, "{}::UnsafeCast<{} >", r, target),
            Conversion::Reinterpret { target } => write!(f, "{}::ReinterpretCast<{} >", r, target),
        }
    }
}

/// The conversion chosen for a pair, with the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastDecision {
    pub rule: &'static str,
    pub conversion: Conversion,
}

/// Conversion needed to store a `src` value into a `dst` slot.
pub fn resolve_cast(
    registry: &mut TypeRegistry<'_>,
    dst: LocalTypeId,
    src: LocalTypeId,
) -> Conversion {
    explain_cast(registry, dst, src).conversion
}

/// Like [`resolve_cast`], also naming the rule that fired.
pub fn explain_cast(
    registry: &mut TypeRegistry<'_>,
    dst: LocalTypeId,
    src: LocalTypeId,
) -> CastDecision {
    let either_resolved =
        registry.get(dst).type_info.is_some() || registry.get(src).type_info.is_some();
    let user_conversion = if dst != src && either_resolved {
        find_conversion(registry, src, dst)
    } else {
        None
    };

    let registry = &*registry;
    let dst = registry.get(dst);
    let src = registry.get(src);
    let query = CastQuery {
        dst,
        src,
        dst_info: dst.type_info.map(|id| registry.info(id)),
        src_info: src.type_info.map(|id| registry.info(id)),
        user_conversion,
    };

    for rule in CAST_RULES {
        if (rule.applies)(&query) {
            let conversion = (rule.action)(&query);
            tracing::trace!(
                rule = rule.name,
                dst = %dst.full_name,
                src = %src.full_name,
                "cast rule fired"
            );
            return CastDecision {
                rule: rule.name,
                conversion,
            };
        }
    }

    tracing::trace!(
        rule = FALLBACK_RULE,
        dst = %dst.full_name,
        src = %src.full_name,
        "no cast rule matched"
    );
    CastDecision {
        rule: FALLBACK_RULE,
        conversion: Conversion::NoOp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: &str = "::Runtime";

    fn target(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn renders_every_token() {
        let t = "::App::Item";
        let rendered: Vec<String> = vec![
            Conversion::NoOp,
            Conversion::Narrow { target: target("::System::Char") },
            Conversion::NullableDefault { target: target("::System::Nullable__G1<::System::Int32 >") },
            Conversion::NullCast { target: target("::App::Item *") },
            Conversion::UserDefined { token: target("::App::Money::op_Implicit__System__Int32") },
            Conversion::Box { target: target(t) },
            Conversion::BoxEnum { target: target("::System::Object"), enum_name: target("::App::Color") },
            Conversion::Unbox { target: target("::App::Point"), boxable: false },
            Conversion::Unbox { target: target("::System::Int32"), boxable: true },
            Conversion::InterfaceCast { target: target("::App::IShape") },
            Conversion::Downcast { target: target(t) },
            Conversion::EnumCast { target: target("::App::Color") },
            Conversion::Unchecked { target: target("::System::Int64") },
            Conversion::Reinterpret { target: target("::System::Byte *") },
        ]
        .iter()
        .map(|c| format!("[{}]", c.token(R)))
        .collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        []
        [(::System::Char)]
        [::System::Nullable__G1<::System::Int32 >::CreateDefault]
        [static_cast<::App::Item * >]
        [::App::Money::op_Implicit__System__Int32]
        [::Runtime::Box<::App::Item >]
        [::Runtime::BoxEnum<::System::Object, ::App::Color >]
        [::Runtime::Unbox<::App::Point >]
        [::Runtime::Unbox<::Runtime::BaseTypeWrapper<::System::Int32 >::BoxeableType >]
        [::Runtime::InterfaceCast<::App::IShape >]
        [::Runtime::Cast<::App::Item >]
        [::Runtime::EnumCast<::App::Color >]
        [::Runtime::UnsafeCast<::System::Int64 >]
        [::Runtime::ReinterpretCast<::System::Byte * >]
        ");
    }

    #[test]
    fn apply_wraps_value() {
        let cast = Conversion::Downcast { target: target("::App::Item") };
        assert_eq!(cast.apply("::Rt", "obj"), "::Rt::Cast<::App::Item >(obj)");
        assert_eq!(Conversion::NoOp.apply(R, "obj"), "obj");
    }
}
