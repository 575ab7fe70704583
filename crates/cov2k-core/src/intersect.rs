//! AND-combination of independently fetched candidate lists.
//!
//! Resolvers evaluate each filter on its own and register the resulting
//! list here. The intersection keeps the first registered list's order and
//! duplicate shape, restricted to records whose identifier appears in
//! every other list.

use std::collections::HashSet;
use std::hash::Hash;

/// Result of [`FilterIntersection::intersect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intersection<T> {
    /// No filter contributed; the caller should fetch everything.
    NotFiltered,
    /// Filters contributed but nothing survived.
    Empty,
    Filtered(Vec<T>),
}

impl<T> Intersection<T> {
    /// The surviving records, or `None` when no filter was registered.
    pub fn into_records(self) -> Option<Vec<T>> {
        match self {
            Intersection::NotFiltered => None,
            Intersection::Empty => Some(Vec::new()),
            Intersection::Filtered(records) => Some(records),
        }
    }

    fn from_list(records: Vec<T>) -> Self {
        if records.is_empty() {
            Intersection::Empty
        } else {
            Intersection::Filtered(records)
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterIntersection<T> {
    filters: Vec<(String, Vec<T>)>,
}

impl<T> Default for FilterIntersection<T> {
    fn default() -> Self {
        Self { filters: Vec::new() }
    }
}

impl<T> FilterIntersection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the candidates produced by filter `key`.
    ///
    /// A missing or empty key means the caller did not supply that filter
    /// and is ignored. Registering the same key again replaces its list in
    /// place.
    pub fn add_filter(&mut self, key: Option<&str>, records: Vec<T>) {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        match self.filters.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = records,
            None => self.filters.push((key.to_string(), records)),
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn intersect<K, E, F>(self, mut id_of: F) -> Result<Intersection<T>, E>
    where
        K: Eq + Hash,
        F: FnMut(&T) -> Result<K, E>,
    {
        let mut filters = self.filters.into_iter();
        let Some((_, anchor)) = filters.next() else {
            return Ok(Intersection::NotFiltered);
        };
        let rest: Vec<Vec<T>> = filters.map(|(_, records)| records).collect();
        if rest.is_empty() {
            return Ok(Intersection::from_list(anchor));
        }

        let mut surviving: HashSet<K> = anchor.iter().map(&mut id_of).collect::<Result<_, E>>()?;
        for records in &rest {
            if surviving.is_empty() {
                break;
            }
            let ids: HashSet<K> = records.iter().map(&mut id_of).collect::<Result<_, E>>()?;
            surviving.retain(|id| ids.contains(id));
        }

        let mut kept = Vec::new();
        for record in anchor {
            if surviving.contains(&id_of(&record)?) {
                kept.push(record);
            }
        }
        Ok(Intersection::from_list(kept))
    }
}
