/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Fudge Taxonomy
//!
//! Field name/ordinal taxonomies for the Fudge message codec.
//!
//! A taxonomy is a partial bijection between human-readable field names
//! and compact 16-bit ordinals, scoped by a taxonomy id carried in the
//! message envelope. Writers use it to substitute ordinals for names on
//! the wire; readers use it to recover names from ordinals.
//!
//! This crate provides:
//! - [`Taxonomy`]: the lookup interface, both directions nullable
//! - [`TaxonomyResolver`]: maps an envelope's taxonomy id to a taxonomy
//! - [`MapTaxonomy`] / [`MapTaxonomyResolver`]: map-backed realizations

pub mod map;

pub use map::{MapTaxonomy, MapTaxonomyResolver};

/// A bidirectional mapping between field names and ordinals.
///
/// Both directions are partial: a lookup may return `None`, in which case
/// the caller falls back to whatever identifier it already holds.
pub trait Taxonomy {
    /// Returns the name mapped to an ordinal, if any.
    fn field_name(&self, ordinal: i16) -> Option<&str>;

    /// Returns the ordinal mapped to a name, if any.
    fn field_ordinal(&self, name: &str) -> Option<i16>;
}

/// Produces taxonomies from the 16-bit ids carried in envelopes.
///
/// Resolvers are shared by every stream of a context, so they must be
/// safe for concurrent lookup.
pub trait TaxonomyResolver: Send + Sync {
    /// Returns the taxonomy for an id, or `None` if the id is not known.
    fn resolve(&self, taxonomy_id: i16) -> Option<&dyn Taxonomy>;
}

/// A resolver that knows no taxonomies.
///
/// The default for contexts that never compress names; every lookup
/// returns `None` and fields travel with whatever identifiers they were
/// given.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTaxonomyResolver;

impl TaxonomyResolver for NullTaxonomyResolver {
    fn resolve(&self, _taxonomy_id: i16) -> Option<&dyn Taxonomy> {
        None
    }
}
