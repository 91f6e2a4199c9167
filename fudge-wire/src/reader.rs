/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Pull-style stream reader.
//!
//! The reader is a state machine over the envelope and nested fields of a
//! Fudge stream. Each call to [`FudgeStreamReader::next`] advances to the
//! next element; accessors report the current element's identifiers and
//! value. Nested messages push byte-bounded frames onto a processing
//! stack: reads are checked against the innermost frame, and exhausting a
//! frame pops it and surfaces the sub-message end.
//!
//! Unknown variable-width type ids are surfaced as raw-byte values
//! tagged with the id; an unknown id claiming a fixed width is an error,
//! because its width cannot be known.

use crate::prefix;
use crate::value;
use crate::FudgeContext;
use bytes::Bytes;
use fudge_core::error::{DecodeError, Result, StateError};
use fudge_core::field::{Field, FieldValue};
use fudge_core::message::{FudgeEnvelope, MutableMsg};
use fudge_core::types::WireType;
use std::io::{Cursor, Read};
use tracing::{debug, trace};

/// One element of the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FudgeStreamElement {
    /// An envelope header was read; metadata accessors are valid.
    MessageEnvelope,
    /// A field with an immediately available value.
    SimpleField,
    /// A sub-message field begins; descend with `next` or skip it.
    SubmessageFieldStart,
    /// The innermost sub-message ended.
    SubmessageFieldEnd,
}

/// Streaming decoder for Fudge envelopes and fields.
///
/// Scoped to a single byte source and not safe for concurrent use. A
/// reader either expects envelope headers (the default) or iterates the
/// fields of one in-memory message range, which is how skipped
/// sub-messages are re-read.
#[derive(Debug)]
pub struct FudgeStreamReader<R: Read> {
    source: R,
    context: FudgeContext,
    /// Bytes consumed from the source so far.
    consumed: u64,
    /// Absolute end offsets of the open frames, outermost first.
    frames: Vec<u64>,
    expects_envelope: bool,
    element: Option<FudgeStreamElement>,
    processing_directives: u8,
    schema_version: u8,
    taxonomy_id: i16,
    envelope_size: i32,
    field_type: Option<WireType>,
    field_name: Option<String>,
    field_ordinal: Option<i16>,
    field_value: Option<FieldValue>,
    /// The full message range when wrapping an in-memory slice.
    backing: Option<Bytes>,
}

impl<R: Read> FudgeStreamReader<R> {
    /// Creates a reader over a byte source expecting envelope headers.
    pub fn new(source: R, context: FudgeContext) -> Self {
        Self {
            source,
            context,
            consumed: 0,
            frames: Vec::new(),
            expects_envelope: true,
            element: None,
            processing_directives: 0,
            schema_version: 0,
            taxonomy_id: 0,
            envelope_size: 0,
            field_type: None,
            field_name: None,
            field_ordinal: None,
            field_value: None,
            backing: None,
        }
    }

    /// Returns the context this reader decodes under.
    #[must_use]
    pub fn context(&self) -> &FudgeContext {
        &self.context
    }

    /// Advances to the next stream element.
    ///
    /// Returns `Ok(None)` at a clean end of stream: before an envelope
    /// header, or once a wrapped message range is exhausted. Several
    /// envelopes may follow one another on the same stream.
    ///
    /// # Errors
    /// [`DecodeError`] for malformed or truncated input, or the
    /// underlying I/O error.
    pub fn next(&mut self) -> Result<Option<FudgeStreamElement>> {
        loop {
            match self.frames.last().copied() {
                None => {
                    if !self.expects_envelope {
                        return Ok(None);
                    }
                    return self.read_envelope_header();
                }
                Some(end) if self.consumed >= end => {
                    self.frames.pop();
                    self.clear_field();
                    if self.frames.is_empty() {
                        if self.expects_envelope {
                            // envelope finished; look for the next one
                            continue;
                        }
                        self.element = None;
                        return Ok(None);
                    }
                    self.element = Some(FudgeStreamElement::SubmessageFieldEnd);
                    return Ok(Some(FudgeStreamElement::SubmessageFieldEnd));
                }
                Some(end) => return self.read_field(end).map(Some),
            }
        }
    }

    /// Returns true if more elements remain within the current envelope
    /// or wrapped message range.
    #[must_use]
    pub fn has_next(&self) -> bool {
        match self.frames.as_slice() {
            [] => false,
            [only] => self.consumed < *only,
            _ => true,
        }
    }

    /// Returns the element produced by the last call to
    /// [`next`](Self::next).
    #[must_use]
    pub const fn current_element(&self) -> Option<FudgeStreamElement> {
        self.element
    }

    /// Returns the current envelope's processing directives byte.
    #[must_use]
    pub const fn processing_directives(&self) -> u8 {
        self.processing_directives
    }

    /// Returns the current envelope's schema version byte.
    #[must_use]
    pub const fn schema_version(&self) -> u8 {
        self.schema_version
    }

    /// Returns the current envelope's taxonomy id.
    #[must_use]
    pub const fn taxonomy_id(&self) -> i16 {
        self.taxonomy_id
    }

    /// Returns the current envelope's declared total size.
    #[must_use]
    pub const fn envelope_size(&self) -> i32 {
        self.envelope_size
    }

    /// Returns the current field's wire type.
    #[must_use]
    pub const fn field_type(&self) -> Option<WireType> {
        self.field_type
    }

    /// Returns the current field's name.
    ///
    /// When the field arrived with only an ordinal and the envelope's
    /// taxonomy maps it, this is the resolved name.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    /// Returns the current field's ordinal.
    #[must_use]
    pub const fn field_ordinal(&self) -> Option<i16> {
        self.field_ordinal
    }

    /// Returns the current field's value; `None` for sub-message starts.
    #[must_use]
    pub const fn field_value(&self) -> Option<&FieldValue> {
        self.field_value.as_ref()
    }

    /// Builds the current simple field as a container field.
    #[must_use]
    pub fn current_field(&self) -> Option<Field> {
        if self.element != Some(FudgeStreamElement::SimpleField) {
            return None;
        }
        Some(Field::new(
            self.field_type?,
            self.field_value.clone()?,
            self.field_name.clone(),
            self.field_ordinal,
        ))
    }

    /// Skips the sub-message whose start was just surfaced, returning an
    /// independent reader over its bytes.
    ///
    /// The identifier accessors keep reporting the skipped field, and the
    /// next call to [`next`](Self::next) continues with its first
    /// sibling. The returned reader iterates the sub-message's fields
    /// without decoding them here, which is how the encoded-backed
    /// container defers work.
    ///
    /// # Errors
    /// [`StateError::NotAtSubMessage`] if the current element is not a
    /// sub-message start, or a decode error if the payload is truncated.
    pub fn skip_message_field(&mut self) -> Result<FudgeStreamReader<Cursor<Bytes>>> {
        if self.element != Some(FudgeStreamElement::SubmessageFieldStart) {
            return Err(StateError::NotAtSubMessage.into());
        }
        // the frame pushed by the sub-message start is the innermost
        let end = self.frames.pop().unwrap_or(self.consumed);
        let size = (end - self.consumed) as usize;
        let mut buf = vec![0u8; size];
        value::read_exact(&mut self.source, &mut buf)?;
        self.consumed += size as u64;
        // identifier accessors stay valid, but the element is consumed
        self.element = None;
        trace!("skipped sub-message of {} bytes", size);
        Ok(FudgeStreamReader::wrap_msg(
            Bytes::from(buf),
            self.context.clone(),
        ))
    }

    /// Reads one complete envelope into an eager message.
    ///
    /// Returns `Ok(None)` at a clean end of stream.
    ///
    /// # Errors
    /// Any decode error from the element stream.
    pub fn read_envelope(&mut self) -> Result<Option<FudgeEnvelope>> {
        match self.next()? {
            None => return Ok(None),
            Some(FudgeStreamElement::MessageEnvelope) => {}
            Some(_) => return Err(StateError::EnvelopeNotStarted.into()),
        }
        let mut stack: Vec<(MutableMsg, Option<String>, Option<i16>)> =
            vec![(MutableMsg::new(), None, None)];
        while self.has_next() {
            match self.next()? {
                Some(FudgeStreamElement::SimpleField) => {
                    if let Some(field) = self.current_field() {
                        if let Some((msg, _, _)) = stack.last_mut() {
                            msg.add_field(field);
                        }
                    }
                }
                Some(FudgeStreamElement::SubmessageFieldStart) => {
                    stack.push((
                        MutableMsg::new(),
                        self.field_name.clone(),
                        self.field_ordinal,
                    ));
                }
                Some(FudgeStreamElement::SubmessageFieldEnd) => {
                    if let Some((inner, name, ordinal)) = stack.pop() {
                        if let Some((msg, _, _)) = stack.last_mut() {
                            msg.add_sub_message(name.as_deref(), ordinal, inner);
                        }
                    }
                }
                Some(FudgeStreamElement::MessageEnvelope) | None => break,
            }
        }
        let (message, _, _) = stack.remove(0);
        Ok(Some(FudgeEnvelope::with_metadata(
            self.processing_directives,
            self.schema_version,
            message,
        )))
    }

    /// Releases the underlying byte source.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.source
    }

    fn clear_field(&mut self) {
        self.field_type = None;
        self.field_name = None;
        self.field_ordinal = None;
        self.field_value = None;
    }

    /// Checks that `needed` bytes fit within the innermost frame.
    fn check_frame(&self, end: u64, needed: usize) -> Result<()> {
        let remaining = (end - self.consumed) as usize;
        if needed > remaining {
            return Err(DecodeError::Truncated { needed, remaining }.into());
        }
        Ok(())
    }

    fn read_envelope_header(&mut self) -> Result<Option<FudgeStreamElement>> {
        // distinguish a clean end of stream from a truncated header
        let mut first = [0u8; 1];
        loop {
            match self.source.read(&mut first) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        let mut rest = [0u8; 7];
        value::read_exact(&mut self.source, &mut rest)?;

        self.processing_directives = first[0];
        self.schema_version = rest[0];
        self.taxonomy_id = i16::from_be_bytes([rest[1], rest[2]]);
        let total_size = i32::from_be_bytes([rest[3], rest[4], rest[5], rest[6]]);
        if total_size < 8 {
            return Err(DecodeError::InvalidEnvelopeSize { size: total_size }.into());
        }
        self.envelope_size = total_size;
        self.consumed += 8;
        self.frames.push(self.consumed + (total_size as u64 - 8));
        self.clear_field();
        self.element = Some(FudgeStreamElement::MessageEnvelope);
        debug!(
            "envelope header read: taxonomy {}, total size {}",
            self.taxonomy_id, total_size
        );
        Ok(Some(FudgeStreamElement::MessageEnvelope))
    }

    fn read_field(&mut self, end: u64) -> Result<FudgeStreamElement> {
        self.check_frame(end, 2)?;
        let prefix_byte = value::read_u8(&mut self.source)?;
        let type_id = value::read_u8(&mut self.source)?;
        self.consumed += 2;

        let field_prefix = prefix::decompose(prefix_byte);
        let wire_type = match self.context.type_dictionary().wire_type(type_id) {
            Some(wire_type) => {
                if wire_type.fixed_size().is_some() != field_prefix.fixed_width {
                    return Err(DecodeError::PrefixTypeMismatch {
                        prefix: prefix_byte,
                        type_id,
                    }
                    .into());
                }
                wire_type
            }
            None if field_prefix.fixed_width => {
                return Err(DecodeError::UnknownFixedWidthType { type_id }.into())
            }
            None => WireType::Other {
                type_id,
                fixed_size: None,
            },
        };

        let ordinal = if field_prefix.has_ordinal {
            self.check_frame(end, 2)?;
            let ordinal = value::read_i16(&mut self.source)?;
            self.consumed += 2;
            Some(ordinal)
        } else {
            None
        };

        let mut name = if field_prefix.has_name {
            self.check_frame(end, 1)?;
            let length = value::read_u8(&mut self.source)? as usize;
            self.consumed += 1;
            self.check_frame(end, length)?;
            let mut buf = vec![0u8; length];
            value::read_exact(&mut self.source, &mut buf)?;
            self.consumed += length as u64;
            Some(String::from_utf8(buf).map_err(DecodeError::from)?)
        } else {
            None
        };

        // resolve the counterpart identifier through the taxonomy
        if name.is_none() {
            if let Some(ordinal) = ordinal {
                name = self
                    .context
                    .taxonomy(self.taxonomy_id)
                    .and_then(|taxonomy| taxonomy.field_name(ordinal))
                    .map(str::to_string);
            }
        }

        let size = if let Some(fixed) = wire_type.fixed_size() {
            fixed
        } else {
            match field_prefix.var_size_bytes {
                0 => 0,
                1 => {
                    self.check_frame(end, 1)?;
                    let size = value::read_u8(&mut self.source)? as usize;
                    self.consumed += 1;
                    size
                }
                2 => {
                    self.check_frame(end, 2)?;
                    let size = value::read_u16(&mut self.source)? as usize;
                    self.consumed += 2;
                    size
                }
                _ => {
                    self.check_frame(end, 4)?;
                    let size = value::read_i32(&mut self.source)?;
                    self.consumed += 4;
                    if size < 0 {
                        return Err(DecodeError::SizeOverflow {
                            size: size as u32 as u64,
                        }
                        .into());
                    }
                    size as usize
                }
            }
        };
        self.check_frame(end, size)?;

        self.field_type = Some(wire_type);
        self.field_name = name;
        self.field_ordinal = ordinal;

        if wire_type == WireType::SubMessage {
            self.frames.push(self.consumed + size as u64);
            self.field_value = None;
            self.element = Some(FudgeStreamElement::SubmessageFieldStart);
            trace!("sub-message field start: {} bytes", size);
            return Ok(FudgeStreamElement::SubmessageFieldStart);
        }

        let field_value = value::read_value(&mut self.source, wire_type, size)?;
        self.consumed += size as u64;
        self.field_value = Some(field_value);
        self.element = Some(FudgeStreamElement::SimpleField);
        trace!("field read: type {}, {} payload bytes", type_id, size);
        Ok(FudgeStreamElement::SimpleField)
    }
}

impl FudgeStreamReader<Cursor<Bytes>> {
    /// Creates a reader over one in-memory message range: a sequence of
    /// fields with no envelope header.
    pub fn wrap_msg(data: Bytes, context: FudgeContext) -> Self {
        let mut reader = Self::new(Cursor::new(data.clone()), context);
        reader.expects_envelope = false;
        reader.frames.push(data.len() as u64);
        reader.backing = Some(data);
        reader
    }

    /// Returns the backing message range, when wrapping one.
    #[must_use]
    pub fn encoded(&self) -> Option<Bytes> {
        self.backing.clone()
    }
}
