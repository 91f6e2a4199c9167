/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Process-scope binding of the type dictionary and taxonomy resolver.
//!
//! A [`FudgeContext`] is configured once through its builder and is
//! immutable afterwards; the mutation surface simply does not exist on
//! the built value. Contexts are cheap to clone and safe to share across
//! threads, while the readers and writers they produce are each confined
//! to a single stream.

use crate::dictionary::TypeDictionary;
use crate::reader::FudgeStreamReader;
use crate::size;
use crate::writer::FudgeStreamWriter;
use bytes::Bytes;
use fudge_core::error::{DecodeError, Result};
use fudge_core::message::{FudgeEnvelope, FudgeMsg};
use fudge_taxonomy::{NullTaxonomyResolver, Taxonomy, TaxonomyResolver};
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

struct ContextInner {
    type_dictionary: TypeDictionary,
    taxonomy_resolver: Box<dyn TaxonomyResolver>,
}

/// Shared configuration for encoding and decoding Fudge streams.
#[derive(Clone)]
pub struct FudgeContext {
    inner: Arc<ContextInner>,
}

impl FudgeContext {
    /// Creates a context with the standard type dictionary and no
    /// taxonomies.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a context.
    #[must_use]
    pub fn builder() -> FudgeContextBuilder {
        FudgeContextBuilder {
            type_dictionary: TypeDictionary::new(),
            taxonomy_resolver: Box::new(NullTaxonomyResolver),
        }
    }

    /// Returns the type dictionary.
    #[must_use]
    pub fn type_dictionary(&self) -> &TypeDictionary {
        &self.inner.type_dictionary
    }

    /// Returns the taxonomy resolver.
    #[must_use]
    pub fn taxonomy_resolver(&self) -> &dyn TaxonomyResolver {
        self.inner.taxonomy_resolver.as_ref()
    }

    /// Resolves a taxonomy id through the configured resolver.
    #[must_use]
    pub fn taxonomy(&self, taxonomy_id: i16) -> Option<&dyn Taxonomy> {
        self.inner.taxonomy_resolver.resolve(taxonomy_id)
    }

    /// Creates a stream reader over a byte source.
    pub fn new_reader<R: Read>(&self, source: R) -> FudgeStreamReader<R> {
        FudgeStreamReader::new(source, self.clone())
    }

    /// Creates a stream writer over a byte sink.
    pub fn new_writer<W: Write>(&self, sink: W) -> FudgeStreamWriter<W> {
        FudgeStreamWriter::new(sink, self.clone())
    }

    /// Encodes a message into a fresh envelope with zeroed metadata and
    /// no taxonomy.
    ///
    /// # Errors
    /// Any encoding error from the stream writer.
    pub fn to_bytes(&self, msg: &dyn FudgeMsg) -> Result<Bytes> {
        self.to_bytes_with_taxonomy(msg, 0)
    }

    /// Encodes a message into a fresh envelope under a taxonomy id.
    ///
    /// # Errors
    /// Any encoding error from the stream writer.
    pub fn to_bytes_with_taxonomy(&self, msg: &dyn FudgeMsg, taxonomy_id: i16) -> Result<Bytes> {
        let capacity = size::envelope_size(self.taxonomy(taxonomy_id), msg);
        let mut buf = Vec::with_capacity(capacity);
        let mut writer = self.new_writer(&mut buf);
        writer.set_taxonomy_id(taxonomy_id);
        writer.write_msg(msg)?;
        drop(writer);
        Ok(Bytes::from(buf))
    }

    /// Decodes one envelope from a byte slice into an eager message.
    ///
    /// # Errors
    /// Any decoding error from the stream reader; an empty input is
    /// reported as an unexpected end of stream.
    pub fn from_bytes(&self, data: &[u8]) -> Result<FudgeEnvelope> {
        let mut reader = self.new_reader(Cursor::new(data));
        reader
            .read_envelope()?
            .ok_or_else(|| DecodeError::UnexpectedEof.into())
    }
}

impl Default for FudgeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FudgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FudgeContext")
            .field("type_dictionary", &self.inner.type_dictionary)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FudgeContext`].
///
/// All registration happens here; building consumes the configuration,
/// so a built context can never be mutated.
pub struct FudgeContextBuilder {
    type_dictionary: TypeDictionary,
    taxonomy_resolver: Box<dyn TaxonomyResolver>,
}

impl FudgeContextBuilder {
    /// Replaces the type dictionary.
    #[must_use]
    pub fn with_type_dictionary(mut self, type_dictionary: TypeDictionary) -> Self {
        self.type_dictionary = type_dictionary;
        self
    }

    /// Applies additional registrations to the current type dictionary.
    #[must_use]
    pub fn configure_types(mut self, configure: impl FnOnce(&mut TypeDictionary)) -> Self {
        configure(&mut self.type_dictionary);
        self
    }

    /// Replaces the taxonomy resolver.
    #[must_use]
    pub fn with_taxonomy_resolver(
        mut self,
        taxonomy_resolver: impl TaxonomyResolver + 'static,
    ) -> Self {
        self.taxonomy_resolver = Box::new(taxonomy_resolver);
        self
    }

    /// Freezes the configuration into a context.
    #[must_use]
    pub fn build(self) -> FudgeContext {
        FudgeContext {
            inner: Arc::new(ContextInner {
                type_dictionary: self.type_dictionary,
                taxonomy_resolver: self.taxonomy_resolver,
            }),
        }
    }
}
