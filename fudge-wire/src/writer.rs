/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Pull-style stream writer.
//!
//! The writer consumes an envelope header followed by field events and
//! emits wire bytes. It budgets the envelope with the size calculator and
//! rejects any field that would overrun the declared total size before a
//! single byte of it is written, so a failed call leaves the stream
//! consistent.
//!
//! When a taxonomy is active and a field's name maps to an ordinal, the
//! ordinal is emitted and the name dropped. An explicitly supplied
//! ordinal is authoritative and is never overwritten by the taxonomy.

use crate::prefix;
use crate::size;
use crate::value;
use crate::FudgeContext;
use fudge_core::error::{EncodeError, Result, StateError};
use fudge_core::field::{Field, FieldValue};
use fudge_core::message::{FudgeEnvelope, FudgeMsg};
use fudge_core::types::WireType;
use std::io::Write;
use tracing::{debug, trace};

/// Writer state: outside any envelope, or inside one with a byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// No envelope open; the next event must be an envelope header.
    Idle,
    /// Inside an envelope with this many field bytes still to write.
    InEnvelope {
        /// Unwritten field bytes of the declared total size.
        remaining: usize,
    },
}

/// Streaming encoder for Fudge envelopes and fields.
///
/// Scoped to a single byte sink; the current taxonomy id is retained
/// across envelopes written to the same stream. Not safe for concurrent
/// use.
#[derive(Debug)]
pub struct FudgeStreamWriter<W: Write> {
    sink: W,
    context: FudgeContext,
    taxonomy_id: i16,
    state: WriterState,
}

impl<W: Write> FudgeStreamWriter<W> {
    /// Creates a writer over a byte sink.
    pub fn new(sink: W, context: FudgeContext) -> Self {
        Self {
            sink,
            context,
            taxonomy_id: 0,
            state: WriterState::Idle,
        }
    }

    /// Returns the taxonomy id stamped into envelope headers.
    #[must_use]
    pub const fn taxonomy_id(&self) -> i16 {
        self.taxonomy_id
    }

    /// Sets the taxonomy id for subsequent envelopes.
    pub fn set_taxonomy_id(&mut self, taxonomy_id: i16) {
        self.taxonomy_id = taxonomy_id;
    }

    /// Returns the context this writer encodes under.
    #[must_use]
    pub fn context(&self) -> &FudgeContext {
        &self.context
    }

    /// Writes the 8-byte envelope header and opens the field budget.
    ///
    /// # Arguments
    /// * `processing_directives` - Application-defined directives byte
    /// * `schema_version` - Application-defined schema version byte
    /// * `total_size` - Total envelope size including this header
    ///
    /// # Errors
    /// [`StateError::EnvelopeAlreadyOpen`] if an envelope is open;
    /// [`EncodeError::InvalidEnvelopeSize`] if `total_size` is below the
    /// header size.
    pub fn write_envelope_header(
        &mut self,
        processing_directives: u8,
        schema_version: u8,
        total_size: i32,
    ) -> Result<()> {
        if self.state != WriterState::Idle {
            return Err(StateError::EnvelopeAlreadyOpen.into());
        }
        if total_size < size::ENVELOPE_HEADER_SIZE as i32 {
            return Err(EncodeError::InvalidEnvelopeSize { size: total_size }.into());
        }
        self.sink.write_all(&[processing_directives, schema_version])?;
        self.sink.write_all(&self.taxonomy_id.to_be_bytes())?;
        self.sink.write_all(&total_size.to_be_bytes())?;

        let remaining = total_size as usize - size::ENVELOPE_HEADER_SIZE;
        debug!(
            "envelope header written: taxonomy {}, {} field bytes budgeted",
            self.taxonomy_id, remaining
        );
        if remaining > 0 {
            self.state = WriterState::InEnvelope { remaining };
        }
        Ok(())
    }

    /// Writes one field.
    ///
    /// The field's encoded size is checked against the envelope budget
    /// before anything is emitted. Sub-message values recurse; their
    /// bytes count against this field's size.
    ///
    /// # Errors
    /// [`StateError::EnvelopeNotStarted`] outside an envelope; an
    /// [`EncodeError`] for oversized names or values, unregistered type
    /// ids, or budget overrun.
    pub fn write_field(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
        wire_type: WireType,
        value: &FieldValue,
    ) -> Result<()> {
        let WriterState::InEnvelope { remaining } = self.state else {
            return Err(StateError::EnvelopeNotStarted.into());
        };
        if let Some(name) = name {
            if name.len() > 255 {
                return Err(EncodeError::NameTooLong { length: name.len() }.into());
            }
        }
        if let WireType::Other { type_id, .. } = wire_type {
            let writable = matches!(value, FieldValue::Unknown { .. });
            if !writable && self.context.type_dictionary().wire_type(type_id).is_none() {
                return Err(EncodeError::UnknownWireType { type_id }.into());
            }
        }
        value::check_value(wire_type, value)?;
        let field_size = {
            let taxonomy = self.context.taxonomy(self.taxonomy_id);
            if wire_type.is_variable() {
                let value_size = size::variable_size(taxonomy, wire_type, value);
                if value_size > i32::MAX as usize {
                    return Err(EncodeError::ValueTooLarge { size: value_size }.into());
                }
            }
            size::calculate_field_size(taxonomy, name, ordinal, wire_type, value)
        };
        if field_size > remaining {
            return Err(EncodeError::EnvelopeOverrun {
                needed: field_size,
                remaining,
            }
            .into());
        }

        let (eff_name, eff_ordinal) = self.substitute(name, ordinal);
        self.emit_field(eff_name, eff_ordinal, wire_type, value)?;

        trace!("field written: type {}, {} bytes", wire_type.type_id(), field_size);
        let remaining = remaining - field_size;
        if remaining == 0 {
            debug!("envelope complete");
            self.state = WriterState::Idle;
        } else {
            self.state = WriterState::InEnvelope { remaining };
        }
        Ok(())
    }

    /// Writes a field as held in a container.
    ///
    /// # Errors
    /// As [`write_field`](Self::write_field).
    pub fn write_field_ref(&mut self, field: &Field) -> Result<()> {
        self.write_field(
            field.name(),
            field.ordinal(),
            field.wire_type(),
            field.value(),
        )
    }

    /// Writes every field of a message against the open envelope.
    ///
    /// A container exposing its pre-computed encoded form passes through
    /// verbatim, without decoding a field; the size calculator applies
    /// the same shortcut, so the budget stays consistent.
    ///
    /// # Errors
    /// As [`write_field`](Self::write_field).
    pub fn write_fields(&mut self, msg: &dyn FudgeMsg) -> Result<()> {
        if let Some(encoded) = msg.encoded() {
            if encoded.is_empty() {
                return Ok(());
            }
            let WriterState::InEnvelope { remaining } = self.state else {
                return Err(StateError::EnvelopeNotStarted.into());
            };
            if encoded.len() > remaining {
                return Err(EncodeError::EnvelopeOverrun {
                    needed: encoded.len(),
                    remaining,
                }
                .into());
            }
            self.sink.write_all(&encoded)?;
            let remaining = remaining - encoded.len();
            if remaining == 0 {
                debug!("envelope complete");
                self.state = WriterState::Idle;
            } else {
                self.state = WriterState::InEnvelope { remaining };
            }
            return Ok(());
        }
        for field in msg.iter_fields() {
            self.write_field_ref(&field)?;
        }
        Ok(())
    }

    /// Writes a complete envelope with zeroed metadata, computing the
    /// total size from the message.
    ///
    /// # Errors
    /// As the header and field writes.
    pub fn write_msg(&mut self, msg: &dyn FudgeMsg) -> Result<()> {
        self.write_msg_envelope(0, 0, msg)
    }

    /// Writes a complete envelope, computing the total size from the
    /// message.
    ///
    /// # Errors
    /// As the header and field writes.
    pub fn write_envelope(&mut self, envelope: &FudgeEnvelope) -> Result<()> {
        self.write_msg_envelope(
            envelope.processing_directives(),
            envelope.schema_version(),
            envelope.message().as_msg(),
        )
    }

    fn write_msg_envelope(
        &mut self,
        processing_directives: u8,
        schema_version: u8,
        msg: &dyn FudgeMsg,
    ) -> Result<()> {
        let total = {
            let taxonomy = self.context.taxonomy(self.taxonomy_id);
            size::envelope_size(taxonomy, msg)
        };
        if total > i32::MAX as usize {
            return Err(EncodeError::ValueTooLarge { size: total }.into());
        }
        self.write_envelope_header(processing_directives, schema_version, total as i32)?;
        self.write_fields(msg)
    }

    /// Flushes the underlying sink.
    ///
    /// # Errors
    /// Any I/O error from the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Releases the underlying sink.
    ///
    /// # Errors
    /// [`StateError::EnvelopeIncomplete`] if an envelope is still open.
    pub fn into_inner(self) -> Result<W> {
        match self.state {
            WriterState::Idle => Ok(self.sink),
            WriterState::InEnvelope { remaining } => {
                Err(StateError::EnvelopeIncomplete { remaining }.into())
            }
        }
    }

    /// Applies the taxonomy's name-to-ordinal substitution.
    ///
    /// An explicit ordinal is kept as the emitted value; the name is
    /// dropped whenever the taxonomy can represent it.
    fn substitute<'a>(
        &self,
        name: Option<&'a str>,
        ordinal: Option<i16>,
    ) -> (Option<&'a str>, Option<i16>) {
        if let (Some(name_str), Some(taxonomy)) =
            (name, self.context.taxonomy(self.taxonomy_id))
        {
            if let Some(tax_ordinal) = taxonomy.field_ordinal(name_str) {
                return (None, ordinal.or(Some(tax_ordinal)));
            }
        }
        (name, ordinal)
    }

    /// Emits one field without budget accounting; the caller has already
    /// validated and sized it.
    fn emit_field(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
        wire_type: WireType,
        value: &FieldValue,
    ) -> Result<()> {
        let fixed = wire_type.fixed_size().is_some();
        let value_size = if fixed {
            0
        } else {
            let taxonomy = self.context.taxonomy(self.taxonomy_id);
            size::variable_size(taxonomy, wire_type, value)
        };

        let prefix_byte = prefix::compose(fixed, value_size, ordinal.is_some(), name.is_some());
        self.sink.write_all(&[prefix_byte, wire_type.type_id()])?;
        if let Some(ordinal) = ordinal {
            self.sink.write_all(&ordinal.to_be_bytes())?;
        }
        if let Some(name) = name {
            self.sink.write_all(&[name.len() as u8])?;
            self.sink.write_all(name.as_bytes())?;
        }
        if !fixed {
            match prefix::size_prefix_width(value_size) {
                1 => self.sink.write_all(&[value_size as u8])?,
                2 => self.sink.write_all(&(value_size as u16).to_be_bytes())?,
                _ => self.sink.write_all(&(value_size as u32).to_be_bytes())?,
            }
        }
        match value {
            FieldValue::Message(msg) => {
                let msg = msg.as_msg();
                if let Some(encoded) = msg.encoded() {
                    // Already-encoded containers pass through verbatim.
                    self.sink.write_all(&encoded)?;
                } else {
                    for child in msg.iter_fields() {
                        let (child_name, child_ordinal) =
                            self.substitute(child.name(), child.ordinal());
                        self.emit_field(
                            child_name,
                            child_ordinal,
                            child.wire_type(),
                            child.value(),
                        )?;
                    }
                }
            }
            other => value::write_value(&mut self.sink, wire_type, other)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fudge_core::message::MutableMsg;
    use fudge_taxonomy::{MapTaxonomy, MapTaxonomyResolver};

    fn context_with_taxonomy() -> FudgeContext {
        let resolver = MapTaxonomyResolver::new().with(1, MapTaxonomy::new().with("x", 7));
        FudgeContext::builder().with_taxonomy_resolver(resolver).build()
    }

    #[test]
    fn test_field_before_envelope_is_rejected() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        let err = writer
            .write_field(None, None, WireType::Int, &FieldValue::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::State(StateError::EnvelopeNotStarted)
        ));
    }

    #[test]
    fn test_envelope_header_layout() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        writer.set_taxonomy_id(0x0102);
        writer.write_envelope_header(0xAA, 0xBB, 8).unwrap();
        let buf = writer.into_inner().unwrap();
        assert_eq!(buf, [0xAA, 0xBB, 0x01, 0x02, 0x00, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn test_double_header_is_rejected() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        writer.write_envelope_header(0, 0, 11).unwrap();
        let err = writer.write_envelope_header(0, 0, 11).unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::State(StateError::EnvelopeAlreadyOpen)
        ));
    }

    #[test]
    fn test_undersized_envelope_is_rejected() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        let err = writer.write_envelope_header(0, 0, 7).unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::InvalidEnvelopeSize { size: 7 })
        ));
    }

    #[test]
    fn test_budget_overrun_writes_nothing() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        // budget of 3 field bytes: an int field needs 6
        writer.write_envelope_header(0, 0, 11).unwrap();
        let err = writer
            .write_field(None, None, WireType::Int, &FieldValue::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::EnvelopeOverrun {
                needed: 6,
                remaining: 3
            })
        ));
        let err = writer.into_inner().unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::State(StateError::EnvelopeIncomplete { remaining: 3 })
        ));
    }

    #[test]
    fn test_indicator_field_bytes() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        writer.write_envelope_header(0, 0, 12).unwrap();
        writer
            .write_field(None, Some(5), WireType::Indicator, &FieldValue::Indicator)
            .unwrap();
        let buf = writer.into_inner().unwrap();
        // prefix: fixed + ordinal; type id 0; ordinal 5; no payload
        assert_eq!(&buf[8..], [0x90, 0x00, 0x00, 0x05]);
    }

    #[test]
    fn test_taxonomy_substitutes_name() {
        let context = context_with_taxonomy();
        let mut writer = context.new_writer(Vec::new());
        writer.set_taxonomy_id(1);
        writer.write_envelope_header(0, 0, 8 + 8).unwrap();
        writer
            .write_field(Some("x"), None, WireType::Int, &FieldValue::Int(42))
            .unwrap();
        let buf = writer.into_inner().unwrap();
        // prefix: fixed + ordinal, no name; ordinal 7; int payload
        assert_eq!(&buf[8..], [0x90, 0x04, 0x00, 0x07, 0x00, 0x00, 0x00, 0x2A]);
    }

    #[test]
    fn test_explicit_ordinal_wins_over_taxonomy() {
        let context = context_with_taxonomy();
        let mut writer = context.new_writer(Vec::new());
        writer.set_taxonomy_id(1);
        writer.write_envelope_header(0, 0, 8 + 8).unwrap();
        writer
            .write_field(Some("x"), Some(9), WireType::Int, &FieldValue::Int(42))
            .unwrap();
        let buf = writer.into_inner().unwrap();
        assert_eq!(&buf[8..12], [0x90, 0x04, 0x00, 0x09]);
    }

    #[test]
    fn test_type_mismatch_is_rejected_before_writing() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        writer.write_envelope_header(0, 0, 20).unwrap();
        let err = writer
            .write_field(None, None, WireType::Int, &FieldValue::Boolean(true))
            .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::InvalidValue { type_id: 4, .. })
        ));
        // nothing beyond the header reached the sink
        let err = writer.into_inner().unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::State(StateError::EnvelopeIncomplete { remaining: 12 })
        ));
    }

    #[test]
    fn test_oversized_name_is_rejected_before_writing() {
        let context = FudgeContext::new();
        let mut writer = context.new_writer(Vec::new());
        writer.write_envelope_header(0, 0, 1000).unwrap();
        let name = "n".repeat(256);
        let err = writer
            .write_field(Some(&name), None, WireType::Int, &FieldValue::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::NameTooLong { length: 256 })
        ));
    }

    #[test]
    fn test_write_msg_computes_size() {
        let context = FudgeContext::new();
        let mut msg = MutableMsg::new();
        msg.add(Some("b"), None, true);

        let mut writer = context.new_writer(Vec::new());
        writer.write_msg(&msg).unwrap();
        let buf = writer.into_inner().unwrap();
        assert_eq!(buf.len(), 13);
        assert_eq!(&buf[4..8], 13i32.to_be_bytes());
    }

    #[test]
    fn test_taxonomy_retained_across_envelopes() {
        let context = context_with_taxonomy();
        let mut writer = context.new_writer(Vec::new());
        writer.set_taxonomy_id(1);

        let mut msg = MutableMsg::new();
        msg.add(Some("x"), None, 1i32);
        writer.write_msg(&msg).unwrap();
        writer.write_msg(&msg).unwrap();

        let buf = writer.into_inner().unwrap();
        // both envelopes substituted the name, so both are 8 + 8 bytes
        assert_eq!(buf.len(), 32);
        assert_eq!(buf[2..4], 1i16.to_be_bytes());
        assert_eq!(buf[18..20], 1i16.to_be_bytes());
    }
}
