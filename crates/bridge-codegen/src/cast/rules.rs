//! The ordered cast decision table.
//!
//! Each rule is a predicate and an action over a [`CastQuery`]. Rules are
//! tried top to bottom; the first match wins. When nothing matches, the
//! engine falls back to [`FALLBACK_RULE`], a deliberate no-op.

use bridge_types::{Builtin, LocalType, TypeInfo, TypeKind, UserConversion};

use super::Conversion;

/// Name reported when no rule matched.
pub const FALLBACK_RULE: &str = "fallback";

const NULLABLE_PREFIX: &str = "::System::Nullable__G1<";
const GENERIC_ARRAY_PREFIX: &str = "::System::Array__G<";

/// Everything a rule may look at.
pub struct CastQuery<'a> {
    pub dst: &'a LocalType,
    pub src: &'a LocalType,
    pub dst_info: Option<&'a TypeInfo>,
    pub src_info: Option<&'a TypeInfo>,
    /// Operator found between the two types, if either side is declared.
    pub user_conversion: Option<UserConversion>,
}

impl CastQuery<'_> {
    fn target(&self) -> String {
        self.dst.full_name.clone()
    }

    fn dst_kind(&self) -> Option<TypeKind> {
        self.dst_info.map(|i| i.kind)
    }

    fn src_kind(&self) -> Option<TypeKind> {
        self.src_info.map(|i| i.kind)
    }

    /// At least one side did not resolve to a declaration.
    fn partial(&self) -> bool {
        self.dst_info.is_none() || self.src_info.is_none()
    }

    fn both_known(&self) -> bool {
        !self.partial()
    }

    fn src_is(&self, builtin: Builtin) -> bool {
        self.src.builtin == Some(builtin)
    }

    fn dst_is(&self, builtin: Builtin) -> bool {
        self.dst.builtin == Some(builtin)
    }
}

/// One row of the decision table.
pub struct CastRule {
    pub name: &'static str,
    pub applies: fn(&CastQuery<'_>) -> bool,
    pub action: fn(&CastQuery<'_>) -> Conversion,
}

pub const CAST_RULES: &[CastRule] = &[
    // ── Trivial ──
    CastRule {
        name: "identical",
        applies: |q| q.dst.id == q.src.id,
        action: |_| Conversion::NoOp,
    },
    CastRule {
        name: "int32-narrowing",
        applies: |q| {
            q.src_is(Builtin::Int32)
                && (q.dst_is(Builtin::Char) || q.dst_is(Builtin::UInt16) || q.dst_is(Builtin::Int16))
        },
        action: |q| Conversion::Narrow { target: q.target() },
    },
    // ── Null source ──
    CastRule {
        name: "null-to-nullable",
        applies: |q| q.src.is_null() && q.dst.full_name.starts_with(NULLABLE_PREFIX),
        action: |q| Conversion::NullableDefault { target: q.target() },
    },
    CastRule {
        name: "null-to-pointer",
        applies: |q| q.src.is_null() && q.dst.is_pointer_spelled(),
        action: |_| Conversion::NoOp,
    },
    CastRule {
        name: "null-cast",
        applies: |q| q.src.is_null(),
        action: |q| Conversion::NullCast {
            target: format!("{} *", q.dst.full_name),
        },
    },
    // ── User-defined operators ──
    CastRule {
        name: "user-conversion",
        applies: |q| q.user_conversion.is_some(),
        action: |q| match &q.user_conversion {
            Some(found) => Conversion::UserDefined {
                token: found.token(),
            },
            None => Conversion::NoOp,
        },
    },
    // ── One side unresolved ──
    CastRule {
        name: "partial-to-interface",
        applies: |q| q.partial() && q.dst_kind() == Some(TypeKind::Interface),
        action: |q| Conversion::InterfaceCast { target: q.target() },
    },
    CastRule {
        name: "pointer-to-struct",
        applies: |q| q.partial() && q.dst_kind() == Some(TypeKind::Struct) && q.src.is_pointer(),
        action: |q| Conversion::Reinterpret { target: q.target() },
    },
    CastRule {
        name: "from-type-parameter",
        applies: |q| q.src.is_generic_param() && !q.dst.is_generic_param(),
        action: |q| match q.dst_kind() {
            Some(TypeKind::Class) | Some(TypeKind::Delegate) => Conversion::Box { target: q.target() },
            Some(TypeKind::Interface) => Conversion::InterfaceCast { target: q.target() },
            Some(TypeKind::Struct) | Some(TypeKind::Enum) => Conversion::Unbox {
                target: q.target(),
                boxable: q.dst.is_primitive,
            },
            None => Conversion::Unchecked { target: q.target() },
        },
    },
    CastRule {
        name: "to-type-parameter",
        applies: |q| q.dst.is_generic_param(),
        action: |q| match q.src_kind() {
            Some(TypeKind::Class) | Some(TypeKind::Delegate) => Conversion::Unbox {
                target: q.target(),
                boxable: true,
            },
            Some(TypeKind::Interface) => Conversion::InterfaceCast { target: q.target() },
            // A value source boxes into the open parameter.
            Some(TypeKind::Struct) | Some(TypeKind::Enum) => Conversion::Box { target: q.target() },
            None => Conversion::Unchecked { target: q.target() },
        },
    },
    CastRule {
        name: "partial-to-delegate",
        applies: |q| q.partial() && q.dst_kind() == Some(TypeKind::Delegate),
        action: |_| Conversion::NoOp,
    },
    // ── Both sides declared ──
    CastRule {
        name: "value-to-enum",
        applies: |q| {
            q.both_known() && q.src.is_value_type() && q.dst_kind() == Some(TypeKind::Enum)
        },
        action: |q| Conversion::EnumCast { target: q.target() },
    },
    CastRule {
        name: "value-to-value",
        applies: |q| q.both_known() && q.src.is_value_type() && q.dst.is_value_type(),
        action: |q| Conversion::Unchecked { target: q.target() },
    },
    CastRule {
        name: "reference-to-interface",
        applies: |q| {
            q.both_known()
                && !q.src.is_value_type()
                && !q.dst.is_value_type()
                && (q.dst_kind() == Some(TypeKind::Interface)
                    || (q.dst_kind() == Some(TypeKind::Class)
                        && q.src_kind() == Some(TypeKind::Interface)))
        },
        action: |q| Conversion::InterfaceCast { target: q.target() },
    },
    CastRule {
        name: "reference-downcast",
        applies: |q| q.both_known() && !q.src.is_value_type() && !q.dst.is_value_type(),
        action: |q| Conversion::Downcast { target: q.target() },
    },
    CastRule {
        name: "box-enum",
        applies: |q| q.both_known() && q.src_kind() == Some(TypeKind::Enum) && !q.dst.is_value_type(),
        action: |q| match q.src_info {
            Some(src) => Conversion::BoxEnum {
                target: q.target(),
                enum_name: src.full_name.clone(),
            },
            None => Conversion::Box { target: q.target() },
        },
    },
    CastRule {
        name: "box",
        applies: |q| q.both_known() && q.src.is_value_type() && !q.dst.is_value_type(),
        action: |q| Conversion::Box { target: q.target() },
    },
    CastRule {
        name: "unbox",
        applies: |q| q.both_known() && !q.src.is_value_type() && q.dst.is_value_type(),
        action: |q| Conversion::Unbox {
            target: q.target(),
            boxable: q.dst.is_primitive,
        },
    },
    // ── Structural ──
    CastRule {
        name: "from-array",
        applies: |q| q.src.is_array(),
        action: |_| Conversion::NoOp,
    },
    CastRule {
        name: "to-generic-array",
        applies: |q| q.dst.full_name.starts_with(GENERIC_ARRAY_PREFIX),
        action: |q| {
            let mut target = q.target();
            if target.ends_with('&') {
                // Arrays passed by reference are cast as pointers.
                target.pop();
                target.push('*');
            }
            Conversion::Unchecked { target }
        },
    },
    CastRule {
        name: "to-pointer",
        applies: |q| q.dst.is_pointer() && !q.src.is_pointer(),
        action: |q| Conversion::Reinterpret { target: q.target() },
    },
];
