use crate::settings::MINIMUM_STRING_TABLE_CAPACITY;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A unique identifier for an interned string, represented as a u32 for memory efficiency.
/// This provides type safety to prevent mixing string IDs with other integer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Compare this interned string with a string slice without allocating.
    #[inline]
    pub fn eq_str(self, table: &StringTable, other: &str) -> bool {
        table.resolve(self) == other
    }

    #[inline]
    pub fn resolve(self, table: &StringTable) -> &str {
        table.resolve(self)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Stores every identifier of a translation once.
///
/// - Vec<Rc<str>> for O(1) ID→string resolution
/// - FxHashMap<Rc<str>, StringId> for O(1) string→ID lookup during interning
///
/// One table lives for one translation, so ids are never compared across parses.
#[derive(Debug, Clone)]
pub struct StringTable {
    strings: Vec<Rc<str>>,
    string_to_id: FxHashMap<Rc<str>, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity + MINIMUM_STRING_TABLE_CAPACITY;
        Self {
            strings: Vec::with_capacity(capacity),
            string_to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Intern a string slice, returning its unique ID.
    /// If the string already exists, returns the existing ID.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }

        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.strings.len() as u32);
        let shared: Rc<str> = Rc::from(s);

        self.strings.push(Rc::clone(&shared));
        self.string_to_id.insert(shared, new_id);

        new_id
    }

    /// Look up an id without interning.
    pub fn get(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_twice_returns_the_same_id() {
        let mut table = StringTable::new();
        let first = table.intern("gl_Position");
        let second = table.intern("gl_Position");

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert!(first.eq_str(&table, "gl_Position"));
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("albedo");
        let b = table.intern("normal");

        assert_ne!(a, b);
        assert_eq!(table.resolve(b), "normal");
        assert_eq!(table.get("albedo"), Some(a));
        assert_eq!(table.get("missing"), None);
    }
}
