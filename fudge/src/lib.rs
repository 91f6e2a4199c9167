/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Fudge
//!
//! A self-describing, hierarchical binary message codec for Rust.
//!
//! A Fudge message is an ordered sequence of typed fields, each
//! optionally identified by a name, a 16-bit ordinal, both, or neither.
//! Messages nest, frames carry their own lengths, and a taxonomy can
//! substitute compact ordinals for names on the wire without changing
//! the logical schema.
//!
//! ## Quick Start
//!
//! ```rust
//! use fudge::prelude::*;
//!
//! let context = FudgeContext::new();
//!
//! let mut msg = MutableMsg::new();
//! msg.add(Some("name"), None, "example");
//! msg.add(Some("count"), Some(1), 42i32);
//!
//! let bytes = context.to_bytes(&msg)?;
//! let decoded = context.from_bytes(&bytes)?;
//! assert_eq!(decoded.message().as_msg().get_by_name("name").unwrap().get::<String>(),
//!            Some("example".to_string()));
//! # Ok::<(), fudge::core::FudgeError>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: fields, values, containers, and error definitions
//! - [`taxonomy`]: name/ordinal taxonomies and resolvers
//! - [`wire`]: the binary wire layer: streams, sizing, lazy containers

pub mod core {
    //! Fields, values, containers, and error definitions.
    pub use fudge_core::*;
}

pub mod taxonomy {
    //! Name/ordinal taxonomies and resolvers.
    pub use fudge_taxonomy::*;
}

pub mod wire {
    //! The binary wire layer: streams, sizing and lazy containers.
    pub use fudge_wire::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fudge_core::{
        msg_eq, ConversionError, DecodeError, EncodeError, Field, FieldValue, FromFieldValue,
        FudgeDate, FudgeDateTime, FudgeEnvelope, FudgeError, FudgeMsg, FudgeTime, MsgValue,
        MutableMsg, Precision, Result, StateError, WireType,
    };

    // Taxonomies
    pub use fudge_taxonomy::{
        MapTaxonomy, MapTaxonomyResolver, NullTaxonomyResolver, Taxonomy, TaxonomyResolver,
    };

    // Wire layer
    pub use fudge_wire::{
        EncodedMsg, FudgeContext, FudgeContextBuilder, FudgeStreamElement, FudgeStreamReader,
        FudgeStreamWriter, TypeDictionary,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let context = FudgeContext::new();
        let mut msg = MutableMsg::new();
        msg.add(Some("greeting"), None, "hello");

        let bytes = context.to_bytes(&msg).unwrap();
        let decoded = context.from_bytes(&bytes).unwrap();
        assert!(msg_eq(decoded.message().as_msg(), &msg));
    }

    #[test]
    fn test_taxonomy_roundtrip_through_facade() {
        let resolver = MapTaxonomyResolver::new().with(1, MapTaxonomy::new().with("price", 4));
        let context = FudgeContext::builder()
            .with_taxonomy_resolver(resolver)
            .build();

        let mut msg = MutableMsg::new();
        msg.add(Some("price"), None, 99.5f64);

        let bytes = context.to_bytes_with_taxonomy(&msg, 1).unwrap();
        let decoded = context.from_bytes(&bytes).unwrap();
        let field = decoded.message().as_msg().get_by_name("price").unwrap();
        assert_eq!(field.ordinal(), Some(4));
        assert_eq!(field.get::<f64>(), Some(99.5));
    }
}
