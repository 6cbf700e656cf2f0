//! Run-wide tables of synthetic names.
//!
//! Both tables live for one compilation run, only ever grow, and are owned
//! by the session that threads them through the whole-program pass.

use rustc_hash::FxHashMap;

/// Unique names for interface adapter ("wrapper") classes.
///
/// A wrapper is identified by the interface's full name and the type that
/// declares it. The first full name to need a given short form under an
/// owner gets the plain short form. Any other full name that collides on
/// the same short form under the same owner gets a numeric suffix, counted
/// from zero per (short form, owner).
#[derive(Debug, Clone)]
pub struct WrapperNames {
    prefix: String,
    /// (interface full name, owner) -> assigned name.
    assigned: FxHashMap<(String, String), String>,
    /// (short form, owner) -> next collision suffix.
    collisions: FxHashMap<(String, String), u32>,
}

impl Default for WrapperNames {
    fn default() -> Self {
        Self::new("Wrapper__")
    }
}

impl WrapperNames {
    pub fn new(prefix: &str) -> Self {
        WrapperNames {
            prefix: prefix.to_string(),
            assigned: FxHashMap::default(),
            collisions: FxHashMap::default(),
        }
    }

    /// Wrapper name for the interface `full_name` (short name `name`) inside
    /// `owner`. Asking again with the same full name and owner returns the
    /// same name.
    pub fn wrapper_name(&mut self, full_name: &str, name: &str, owner: &str) -> String {
        let full_key = (full_name.to_string(), owner.to_string());
        if let Some(existing) = self.assigned.get(&full_key) {
            return existing.clone();
        }

        let short = format!("{}{}", self.prefix, name);
        let short_key = (short.clone(), owner.to_string());
        let assigned = match self.collisions.get_mut(&short_key) {
            Some(count) => {
                let suffixed = format!("{}__{}", short, count);
                *count += 1;
                suffixed
            }
            None => {
                self.collisions.insert(short_key, 0);
                short
            }
        };
        tracing::trace!(full_name, owner, wrapper = %assigned, "assigned wrapper name");
        self.assigned.insert(full_key, assigned.clone());
        assigned
    }

    /// Number of distinct wrappers handed out so far.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Counters for compiler-introduced locals and anonymous constructs.
#[derive(Debug, Default, Clone)]
pub struct SyntheticNames {
    temporaries: u32,
    anonymous_classes: u32,
    anonymous_methods: u32,
}

impl SyntheticNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// `__temp0__`, `__temp1__`, ...
    pub fn temporary(&mut self) -> String {
        let n = bump(&mut self.temporaries);
        format!("__temp{}__", n)
    }

    pub fn anonymous_class(&mut self) -> String {
        let n = bump(&mut self.anonymous_classes);
        format!("__AnonymousClass{}__", n)
    }

    pub fn anonymous_method(&mut self) -> String {
        let n = bump(&mut self.anonymous_methods);
        format!("__AnonymousMethod{}__", n)
    }
}

fn bump(counter: &mut u32) -> u32 {
    let n = *counter;
    *counter += 1;
    n
}
