//! Identifier sanitizing and mangling for target declarations.
//!
//! Source names may collide with target keywords, standard macros, or
//! well-known runtime identifiers, and may contain characters that are not
//! legal in a target identifier. [`NameFixup`] turns them into valid,
//! collision-free identifiers.
//!
//! User code is expected not to use names containing `__`, so every
//! generated affix is built from double underscores.

use rustc_hash::FxHashSet;

/// Scope separator of the target language.
pub const SCOPE_SEPARATOR: &str = "::";

/// Replacement for every character that cannot appear in an identifier.
const PLACEHOLDER: char = '_';

/// Generic decoration and anonymous-construct punctuation.
const INVALID_CHARS: &[char] = &['<', '>', '{', '}', '-', '$', '=', '.', ' '];

/// The extended set also covers the argument separator of synthesized names.
const EXT_INVALID_CHARS: &[char] = &['<', '>', '{', '}', '-', '$', '.', '=', ',', ' '];

/// Target keywords, standard macros, and runtime identifiers.
const RESERVED: &[&str] = &[
    // keywords
    "break", "case", "catch", "class", "const", "const_cast", "continue", "default", "delete",
    "do", "dynamic_cast", "else", "enum", "explicit", "extern", "for", "friend", "goto", "if",
    "inline", "mutable", "namespace", "new", "NULL", "operator", "private", "protected", "public",
    "register", "reinterpret_cast", "return", "signed", "sizeof", "static", "static_cast",
    "struct", "switch", "template", "this", "throw", "try", "typedef", "typename", "union",
    "unsigned", "using", "virtual", "volatile", "while",
    // builtin types and literals
    "bool", "char", "double", "false", "float", "int", "long", "short", "true", "void",
    // vendor extensions
    "finally", "asm", "naked",
    // standard macros
    "stdin", "stdout", "stderr", "__FILE__", "__LINE__", "EOF", "OVERFLOW", "_OVERFLOW",
    // global functions that read like namespaces
    "pow",
];

/// Sanitizes raw source names into target identifiers.
#[derive(Debug, Clone)]
pub struct NameFixup {
    reserved: FxHashSet<String>,
}

impl Default for NameFixup {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl NameFixup {
    /// Build the reserved set from the built-in list plus `extra`.
    pub fn new(extra: &[String]) -> Self {
        let reserved = RESERVED
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned())
            .collect();
        NameFixup { reserved }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Returns `raw` unchanged unless it is reserved, in which case it is
    /// wrapped as `__raw__`. The result is never itself reserved, so applying
    /// this twice is the same as applying it once.
    pub fn safe_name(&self, raw: &str) -> String {
        let mut name = raw.to_string();
        while self.is_reserved(&name) {
            name = format!("__{}__", name);
        }
        name
    }

    /// Apply [`safe_name`](Self::safe_name) to every `::` segment.
    pub fn safe_full_name(&self, full_name: &str) -> String {
        full_name
            .split(SCOPE_SEPARATOR)
            .map(|segment| self.safe_name(segment))
            .collect::<Vec<_>>()
            .join(SCOPE_SEPARATOR)
    }

    /// Replace illegal characters by `_`, then make the result safe.
    pub fn unmangle_name(&self, text: &str) -> String {
        self.unmangle_with(text, INVALID_CHARS)
    }

    /// Like [`unmangle_name`](Self::unmangle_name), for method names.
    ///
    /// Compiler-synthesized names start with a bracketed marker such as
    /// `<Main>b__0`. The marker and the remainder are cleaned separately
    /// with the extended character set and rejoined. Without a marker the
    /// name is cleaned with the extended set when `extended` is set, and is
    /// only made safe otherwise.
    pub fn unmangle_method_name(&self, text: &str, extended: bool) -> String {
        if text.starts_with('<') {
            if let Some(end) = text.find('>') {
                let (marker, rest) = text.split_at(end + 1);
                let joined = format!(
                    "{}{}",
                    replace_chars(marker, EXT_INVALID_CHARS),
                    replace_chars(rest, EXT_INVALID_CHARS)
                );
                return self.safe_name(&joined);
            }
            if !extended {
                return self.unmangle_name(text);
            }
        }
        if extended {
            self.unmangle_with(text, EXT_INVALID_CHARS)
        } else {
            self.safe_name(text)
        }
    }

    /// Name of a user-defined conversion operator.
    ///
    /// `method_name` is the operator's own name (`op_Implicit`) and
    /// `destination` the full spelling of the type it returns. Scope
    /// separators, pointer and reference suffixes are mapped to fixed
    /// tokens so operators returning different types never collide.
    pub fn conversion_method_name(&self, method_name: &str, destination: &str) -> String {
        let mangled = destination
            .replace(SCOPE_SEPARATOR, "__")
            .replace(" *", "__P__")
            .replace('&', "__R__");
        self.safe_name(&format!("{}{}", method_name, mangled))
    }

    fn unmangle_with(&self, text: &str, invalid: &[char]) -> String {
        self.safe_name(&replace_chars(text, invalid))
    }
}

fn replace_chars(text: &str, invalid: &[char]) -> String {
    text.chars()
        .map(|c| if invalid.contains(&c) { PLACEHOLDER } else { c })
        .collect()
}

/// Append the generic arity marker: `List` with one parameter is `List__G1`.
pub fn with_generic_arity(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{}__G{}", name, arity)
    }
}

/// Turn a dotted namespace into a rooted, sanitized scope: `System.IO`
/// becomes `::System::IO`. The global namespace is empty.
pub fn scoped_namespace(fixup: &NameFixup, dotted: &str) -> String {
    if dotted.is_empty() {
        return String::new();
    }
    let segments: Vec<String> = dotted.split('.').map(|s| fixup.safe_name(s)).collect();
    format!("{}{}", SCOPE_SEPARATOR, segments.join(SCOPE_SEPARATOR))
}
