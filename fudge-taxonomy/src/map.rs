/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Map-backed taxonomy realizations.
//!
//! [`MapTaxonomy`] holds the bijection in two hash maps for O(1) lookup in
//! either direction; [`MapTaxonomyResolver`] serves a fixed set of
//! taxonomies keyed by id. Both are built once and read concurrently.

use crate::{Taxonomy, TaxonomyResolver};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A taxonomy backed by a pair of hash maps.
///
/// Later insertions win when a name or ordinal is bound twice, matching
/// the additive registration policy used elsewhere in the codec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTaxonomy {
    by_ordinal: HashMap<i16, String>,
    by_name: HashMap<String, i16>,
}

impl MapTaxonomy {
    /// Creates an empty taxonomy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a name to an ordinal, replacing earlier bindings of either.
    pub fn insert(&mut self, name: impl Into<String>, ordinal: i16) {
        let name = name.into();
        self.by_ordinal.insert(ordinal, name.clone());
        self.by_name.insert(name, ordinal);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, ordinal: i16) -> Self {
        self.insert(name, ordinal);
        self
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if the taxonomy has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<(String, i16)> for MapTaxonomy {
    fn from_iter<I: IntoIterator<Item = (String, i16)>>(iter: I) -> Self {
        let mut taxonomy = Self::new();
        for (name, ordinal) in iter {
            taxonomy.insert(name, ordinal);
        }
        taxonomy
    }
}

impl Taxonomy for MapTaxonomy {
    fn field_name(&self, ordinal: i16) -> Option<&str> {
        self.by_ordinal.get(&ordinal).map(String::as_str)
    }

    fn field_ordinal(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }
}

/// A resolver serving a fixed set of map-backed taxonomies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapTaxonomyResolver {
    taxonomies: HashMap<i16, MapTaxonomy>,
}

impl MapTaxonomyResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a taxonomy under an id, replacing any earlier one.
    pub fn register(&mut self, taxonomy_id: i16, taxonomy: MapTaxonomy) {
        self.taxonomies.insert(taxonomy_id, taxonomy);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, taxonomy_id: i16, taxonomy: MapTaxonomy) -> Self {
        self.register(taxonomy_id, taxonomy);
        self
    }
}

impl TaxonomyResolver for MapTaxonomyResolver {
    fn resolve(&self, taxonomy_id: i16) -> Option<&dyn Taxonomy> {
        self.taxonomies
            .get(&taxonomy_id)
            .map(|taxonomy| taxonomy as &dyn Taxonomy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        let taxonomy = MapTaxonomy::new().with("id", 1).with("name", 2);

        assert_eq!(taxonomy.field_ordinal("id"), Some(1));
        assert_eq!(taxonomy.field_ordinal("name"), Some(2));
        assert_eq!(taxonomy.field_name(1), Some("id"));
        assert_eq!(taxonomy.field_name(2), Some("name"));

        assert_eq!(taxonomy.field_ordinal("missing"), None);
        assert_eq!(taxonomy.field_name(3), None);
    }

    #[test]
    fn test_later_binding_wins() {
        let taxonomy = MapTaxonomy::new().with("a", 1).with("a", 2);
        assert_eq!(taxonomy.field_ordinal("a"), Some(2));
        assert_eq!(taxonomy.field_name(2), Some("a"));
    }

    #[test]
    fn test_resolver() {
        let resolver = MapTaxonomyResolver::new().with(7, MapTaxonomy::new().with("x", 1));

        let taxonomy = resolver.resolve(7).unwrap();
        assert_eq!(taxonomy.field_ordinal("x"), Some(1));
        assert!(resolver.resolve(8).is_none());
    }

    #[test]
    fn test_from_iterator() {
        let taxonomy: MapTaxonomy = vec![("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(taxonomy.len(), 2);
        assert_eq!(taxonomy.field_name(2), Some("b"));
    }
}
