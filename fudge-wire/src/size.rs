/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Encoded-size prediction.
//!
//! Calculates the exact byte length a field, message or envelope will
//! occupy on the wire without producing any bytes. The writer budgets
//! envelopes with these numbers, so the calculation and the actual
//! encoding must agree for every input.

use crate::prefix;
use crate::value;
use fudge_core::field::{Field, FieldValue};
use fudge_core::message::FudgeMsg;
use fudge_core::types::WireType;
use fudge_taxonomy::Taxonomy;

/// Envelope header length: directives, version, taxonomy id, total size.
pub const ENVELOPE_HEADER_SIZE: usize = 8;

/// Calculates the encoded size of one field, header and payload.
///
/// # Arguments
/// * `taxonomy` - The taxonomy in use, `None` if no taxonomy
/// * `name` - The field name, `None` if unnamed
/// * `ordinal` - The field ordinal, `None` if none
/// * `wire_type` - The field's wire type
/// * `value` - The field value
///
/// When the taxonomy maps the name to an ordinal the name is dropped in
/// favour of the ordinal, exactly as the writer will emit it.
#[must_use]
pub fn calculate_field_size(
    taxonomy: Option<&dyn Taxonomy>,
    name: Option<&str>,
    ordinal: Option<i16>,
    wire_type: WireType,
    value: &FieldValue,
) -> usize {
    // prefix byte and type id byte
    let mut size = 2;
    let mut has_ordinal = ordinal.is_some();
    let mut has_name = name.is_some();
    if let (Some(name), Some(taxonomy)) = (name, taxonomy) {
        if taxonomy.field_ordinal(name).is_some() {
            has_ordinal = true;
            has_name = false;
        }
    }
    if has_ordinal {
        size += 2;
    }
    if has_name {
        // one byte for the length, then the UTF-8 bytes
        size += 1;
        if let Some(name) = name {
            size += name.len();
        }
    }
    match wire_type.fixed_size() {
        Some(fixed) => size += fixed,
        None => {
            let value_size = variable_size(taxonomy, wire_type, value);
            size += value_size + prefix::size_prefix_width(value_size);
        }
    }
    size
}

/// Calculates the encoded size of a field as held in a container.
#[must_use]
pub fn field_size(taxonomy: Option<&dyn Taxonomy>, field: &Field) -> usize {
    calculate_field_size(
        taxonomy,
        field.name(),
        field.ordinal(),
        field.wire_type(),
        field.value(),
    )
}

/// Calculates the encoded size of a message as the sum of its fields.
///
/// A container that exposes its pre-computed encoded form short-circuits
/// to that form's length.
#[must_use]
pub fn message_size(taxonomy: Option<&dyn Taxonomy>, msg: &dyn FudgeMsg) -> usize {
    if let Some(encoded) = msg.encoded() {
        return encoded.len();
    }
    msg.iter_fields()
        .map(|field| field_size(taxonomy, &field))
        .sum()
}

/// Calculates the encoded size of a message including the envelope header.
#[must_use]
pub fn envelope_size(taxonomy: Option<&dyn Taxonomy>, msg: &dyn FudgeMsg) -> usize {
    ENVELOPE_HEADER_SIZE + message_size(taxonomy, msg)
}

/// Returns the payload size of a variable-width value, descending into
/// sub-messages under the same taxonomy.
pub(crate) fn variable_size(
    taxonomy: Option<&dyn Taxonomy>,
    wire_type: WireType,
    value: &FieldValue,
) -> usize {
    debug_assert!(wire_type.is_variable());
    match value {
        FieldValue::Message(msg) => message_size(taxonomy, msg.as_msg()),
        other => value::variable_value_size(other),
    }
}
