//! Immutable, chainable query views over discovered records.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use attrix_common::{AttributeRecord, NamePattern, TargetKind};
use indexmap::IndexMap;

/// An ordered, read-only view over attribute records.
///
/// Every filter returns a new view and leaves the receiver untouched. Cloning
/// a view is cheap; the records are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeCollection {
    records: Arc<[AttributeRecord]>,
}

impl AttributeCollection {
    /// Creates a view over `records`, keeping their order.
    pub fn new(records: Vec<AttributeRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Keeps records whose attribute type equals any of `types`.
    pub fn with_attribute_types<S: AsRef<str>>(&self, types: &[S]) -> Self {
        self.filter(|r| types.iter().any(|t| trim(t.as_ref()) == r.attribute_type))
    }

    /// Keeps records whose owner type equals any of `types`.
    pub fn with_owner_types<S: AsRef<str>>(&self, types: &[S]) -> Self {
        self.filter(|r| types.iter().any(|t| trim(t.as_ref()) == r.owner_type))
    }

    /// Keeps records whose owner type matches `pattern`: an exact name, or a
    /// prefix when the pattern ends with `*`.
    pub fn in_namespace(&self, pattern: &str) -> Self {
        let pattern = NamePattern::new(pattern);
        self.filter(|r| pattern.matches(&r.owner_type))
    }

    /// Keeps records attached to any of `kinds`.
    pub fn with_target_kinds(&self, kinds: &[TargetKind]) -> Self {
        self.filter(|r| kinds.contains(&r.target.kind))
    }

    /// Keeps records whose attribute type contains `needle`.
    pub fn attribute_contains(&self, needle: &str) -> Self {
        self.filter(|r| r.attribute_type.contains(needle))
    }

    /// Keeps records whose owner type contains `needle`.
    pub fn owner_contains(&self, needle: &str) -> Self {
        self.filter(|r| r.owner_type.contains(needle))
    }

    /// Keeps records matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&AttributeRecord) -> bool) -> Self {
        Self::new(self.iter().filter(|r| predicate(r)).cloned().collect())
    }

    /// Maps every record, in order.
    pub fn map<T>(&self, f: impl FnMut(&AttributeRecord) -> T) -> Vec<T> {
        self.iter().map(f).collect()
    }

    /// Groups records by key. Groups appear in order of their first record.
    pub fn group_by<K: Hash + Eq>(
        &self,
        mut key: impl FnMut(&AttributeRecord) -> K,
    ) -> IndexMap<K, AttributeCollection> {
        let mut groups: IndexMap<K, Vec<AttributeRecord>> = IndexMap::new();
        for record in self.iter() {
            groups.entry(key(record)).or_default().push(record.clone());
        }
        groups
            .into_iter()
            .map(|(k, records)| (k, Self::new(records)))
            .collect()
    }

    /// Returns a view sorted by key. Records with equal keys keep their order.
    pub fn sort_by<K: Ord>(&self, key: impl FnMut(&AttributeRecord) -> K) -> Self {
        let mut records = self.to_vec();
        records.sort_by_key(key);
        Self::new(records)
    }

    /// Keeps the first record for every distinct key.
    pub fn unique_by<K: Hash + Eq>(&self, mut key: impl FnMut(&AttributeRecord) -> K) -> Self {
        let mut seen = HashSet::new();
        self.filter(|r| seen.insert(key(r)))
    }

    /// Returns the first record.
    pub fn first(&self) -> Option<&AttributeRecord> {
        self.records.first()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Alias of [`len`](Self::len).
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Returns `true` if the view holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies the records into a vector.
    pub fn to_vec(&self) -> Vec<AttributeRecord> {
        self.records.to_vec()
    }

    /// Returns the records as a slice.
    pub fn as_slice(&self) -> &[AttributeRecord] {
        &self.records
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeRecord> {
        self.records.iter()
    }
}

fn trim(name: &str) -> &str {
    name.trim_start_matches('\\')
}

impl From<Vec<AttributeRecord>> for AttributeCollection {
    fn from(records: Vec<AttributeRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<AttributeRecord> for AttributeCollection {
    fn from_iter<I: IntoIterator<Item = AttributeRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttributeCollection {
    type Item = &'a AttributeRecord;
    type IntoIter = std::slice::Iter<'a, AttributeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for AttributeCollection {
    type Item = AttributeRecord;
    type IntoIter = std::vec::IntoIter<AttributeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_vec().into_iter()
    }
}
