//! Predefined types the backend knows by spelling.
//!
//! These are seeded into the registry before any source type is seen. Each
//! one waits, unresolved, until a source type with the same spelling shows
//! up; the entry is then adopted for that type instead of creating a
//! duplicate.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Builtin {
    UInt32,
    UInt16,
    Int16,
    Int64,
    UInt64,
    Byte,
    SByte,
    Boolean,
    Single,
    Double,
    Decimal,
    Char,
    Int32,
    String,
    CharPointer,
    Object,
    Delegate,
    IEnumerable,
    IEnumerator,
    IDisposable,
    Void,
    Nullable,
}

impl Builtin {
    /// Seeding order.
    pub const ALL: [Builtin; 22] = [
        Builtin::UInt32,
        Builtin::UInt16,
        Builtin::Int16,
        Builtin::Int64,
        Builtin::UInt64,
        Builtin::Byte,
        Builtin::SByte,
        Builtin::Boolean,
        Builtin::Single,
        Builtin::Double,
        Builtin::Decimal,
        Builtin::Char,
        Builtin::Int32,
        Builtin::String,
        Builtin::CharPointer,
        Builtin::Object,
        Builtin::Delegate,
        Builtin::IEnumerable,
        Builtin::IEnumerator,
        Builtin::IDisposable,
        Builtin::Void,
        Builtin::Nullable,
    ];

    pub fn spelling(self) -> &'static str {
        match self {
            Builtin::UInt32 => "::System::UInt32",
            Builtin::UInt16 => "::System::UInt16",
            Builtin::Int16 => "::System::Int16",
            Builtin::Int64 => "::System::Int64",
            Builtin::UInt64 => "::System::UInt64",
            Builtin::Byte => "::System::Byte",
            Builtin::SByte => "::System::SByte",
            Builtin::Boolean => "::System::Boolean",
            Builtin::Single => "::System::Single",
            Builtin::Double => "::System::Double",
            Builtin::Decimal => "::System::Decimal",
            Builtin::Char => "::System::Char",
            Builtin::Int32 => "::System::Int32",
            Builtin::String => "::System::String",
            Builtin::CharPointer => "::System::Char *",
            Builtin::Object => "::System::Object",
            Builtin::Delegate => "::System::Delegate",
            Builtin::IEnumerable => "::System::Collections::IEnumerable",
            Builtin::IEnumerator => "::System::Collections::IEnumerator",
            Builtin::IDisposable => "::System::IDisposable",
            Builtin::Void => "::System::Void",
            Builtin::Nullable => "::System::Nullable__G1",
        }
    }

    /// Numeric, boolean and character types map onto target primitives.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Builtin::UInt32
                | Builtin::UInt16
                | Builtin::Int16
                | Builtin::Int64
                | Builtin::UInt64
                | Builtin::Byte
                | Builtin::SByte
                | Builtin::Boolean
                | Builtin::Single
                | Builtin::Double
                | Builtin::Decimal
                | Builtin::Char
                | Builtin::Int32
        )
    }

    pub fn from_spelling(spelling: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.spelling() == spelling)
    }

    /// Types a value of this primitive type can be obtained from, best
    /// match first. The type itself always comes first. Non-numeric types
    /// only accept themselves.
    pub fn widening_sources(self) -> &'static [Builtin] {
        use Builtin::*;
        match self {
            Int16 => &[Int16, SByte, Byte],
            UInt16 => &[UInt16, Char, Byte],
            Int32 => &[Int32, Int16, UInt16, Char, SByte, Byte],
            UInt32 => &[UInt32, UInt16, Char, Byte],
            Int64 => &[Int64, Int32, UInt32, Int16, UInt16, Char, SByte, Byte],
            UInt64 => &[UInt64, UInt32, UInt16, Char, Byte],
            Single => &[
                Single, Decimal, Int64, UInt64, Int32, UInt32, Int16, UInt16, Char, Byte, SByte,
            ],
            Double => &[
                Double, Decimal, Single, Int64, UInt64, Int32, UInt32, Int16, UInt16, Char, SByte,
                Byte,
            ],
            Decimal => &[
                Decimal, Double, Single, Int64, UInt64, Int32, UInt32, Int16, UInt16, Char, SByte,
                Byte,
            ],
            Boolean => &[Boolean],
            Byte => &[Byte],
            SByte => &[SByte],
            Char => &[Char],
            String => &[String],
            CharPointer => &[CharPointer],
            Object => &[Object],
            Delegate => &[Delegate],
            IEnumerable => &[IEnumerable],
            IEnumerator => &[IEnumerator],
            IDisposable => &[IDisposable],
            Void => &[Void],
            Nullable => &[Nullable],
        }
    }
}
