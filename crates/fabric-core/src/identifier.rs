//! Interned identifiers for block types and block names.
//!
//! Block keys are compared and hashed constantly during resolution, so names
//! are interned once and carried around as a small [`Copy`] symbol.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Process-wide string interner.
///
/// Only strings live here; block definitions are never registered globally.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An interned identifier such as a block type (`text`, `ref`) or a block name.
///
/// # Examples
///
/// ```
/// use fabric_core::identifier::Id;
///
/// let text = Id::new("text");
/// assert_eq!(text, "text");
/// assert_eq!(text, Id::new("text"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Runs `f` with the string this identifier was created from.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = interner();
        f(interner.resolve(self.0).unwrap_or_default())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.with_str(str::to_owned);
        f.write_str(&value)
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|value| value == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_new_interns_equal_strings() {
        let id1 = Id::new("intro");
        let id2 = Id::new("intro");
        let id3 = Id::new("outro");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "intro");
    }

    #[test]
    fn test_display() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
    }

    #[test]
    fn test_from_str_and_into() {
        let parsed: Id = "chapter".parse().unwrap();
        let converted: Id = "chapter".into();

        assert_eq!(parsed, converted);
    }

    #[test]
    fn test_hash_lookup() {
        let mut map = HashMap::new();
        map.insert(Id::new("key1"), "value1");
        map.insert(Id::new("key2"), "value2");

        assert_eq!(map.get(&Id::new("key1")), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_ids_are_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| Id::new("shared")))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Id::new("shared"));
        }
    }
}
