/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message containers for Fudge fields.
//!
//! This module provides:
//! - [`FudgeMsg`]: Object-safe read interface over an ordered field list
//! - [`MutableMsg`]: The eagerly-built realization, mutable during build
//! - [`MsgValue`]: How a nested message is held inside a field value
//! - [`FudgeEnvelope`]: A message paired with its envelope metadata
//!
//! Containers preserve insertion order and permit duplicate names and
//! ordinals. The encoded-backed lazy realization lives in the wire crate
//! and plugs in through the [`FudgeMsg`] trait.

use crate::field::{Field, FieldValue, FromFieldValue};
use crate::types::WireType;
use bytes::Bytes;
use std::fmt;
use std::rc::Rc;

/// Field list backing storage.
///
/// `MsgValue::Mutable(MutableMsg)` nests inside `FieldValue::Message`, which
/// is itself a variant of `Field`'s value — an inline-storage collection
/// here (e.g. `SmallVec`) would make `Field` infinite-sized, since `Vec`'s
/// heap indirection is what breaks that cycle.
pub(crate) type FieldList = Vec<Field>;

/// Read interface over an ordered sequence of fields.
///
/// Implementations return field clones rather than references so that
/// lazily-decoded containers can materialize fields on demand. Clones are
/// cheap for buffer-backed payloads.
pub trait FudgeMsg {
    /// Returns the number of fields.
    ///
    /// For a lazy container this forces a full decode.
    fn num_fields(&self) -> usize;

    /// Returns true if the message has no fields.
    fn is_empty(&self) -> bool {
        self.num_fields() == 0
    }

    /// Returns the field at `index`, decoding only as far as needed.
    fn get_by_index(&self, index: usize) -> Option<Field>;

    /// Returns the first field with the given name.
    fn get_by_name(&self, name: &str) -> Option<Field>;

    /// Returns the first field with the given ordinal.
    fn get_by_ordinal(&self, ordinal: i16) -> Option<Field>;

    /// Returns every field with the given name, in insertion order.
    fn get_all_by_name(&self, name: &str) -> Vec<Field>;

    /// Returns every field with the given ordinal, in insertion order.
    fn get_all_by_ordinal(&self, ordinal: i16) -> Vec<Field>;

    /// Iterates over all fields in insertion order.
    fn iter_fields(&self) -> Box<dyn Iterator<Item = Field> + '_>;

    /// Returns the pre-computed encoded form, if this container is backed
    /// by one.
    fn encoded(&self) -> Option<Bytes> {
        None
    }
}

/// Compares two message containers by field sequence.
///
/// This is the equality used across realizations: a lazy container equals
/// an eager one holding the same fields in the same order.
#[must_use]
pub fn msg_eq(a: &dyn FudgeMsg, b: &dyn FudgeMsg) -> bool {
    a.iter_fields().eq(b.iter_fields())
}

/// A nested message held inside a field value.
///
/// The mutable arm is the eagerly-built container; the immutable arm
/// carries shared read-only realizations such as the encoded-backed lazy
/// container. Equality is field-sequence equality across both arms.
#[derive(Clone)]
pub enum MsgValue {
    /// An owned, eagerly-built message.
    Mutable(MutableMsg),
    /// A shared immutable message realization.
    Immutable(Rc<dyn FudgeMsg>),
}

impl MsgValue {
    /// Returns the message behind this value.
    #[must_use]
    pub fn as_msg(&self) -> &dyn FudgeMsg {
        match self {
            Self::Mutable(msg) => msg,
            Self::Immutable(msg) => msg.as_ref(),
        }
    }

    /// Returns the mutable container, if this value owns one.
    #[must_use]
    pub fn as_mutable(&self) -> Option<&MutableMsg> {
        match self {
            Self::Mutable(msg) => Some(msg),
            Self::Immutable(_) => None,
        }
    }

    /// Returns a mutable reference to the container, if this value owns
    /// one. Immutable realizations reject mutation by construction.
    pub fn as_mutable_mut(&mut self) -> Option<&mut MutableMsg> {
        match self {
            Self::Mutable(msg) => Some(msg),
            Self::Immutable(_) => None,
        }
    }

    /// Copies the fields into an eagerly-built container.
    ///
    /// For a lazy realization this forces a full decode.
    #[must_use]
    pub fn to_mutable(&self) -> MutableMsg {
        match self {
            Self::Mutable(msg) => msg.clone(),
            Self::Immutable(msg) => {
                let mut out = MutableMsg::new();
                for field in msg.iter_fields() {
                    out.add_field(field);
                }
                out
            }
        }
    }
}

impl PartialEq for MsgValue {
    fn eq(&self, other: &Self) -> bool {
        msg_eq(self.as_msg(), other.as_msg())
    }
}

impl fmt::Debug for MsgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutable(msg) => f.debug_tuple("Mutable").field(msg).finish(),
            Self::Immutable(_) => f.write_str("Immutable(..)"),
        }
    }
}

impl From<MutableMsg> for MsgValue {
    fn from(msg: MutableMsg) -> Self {
        Self::Mutable(msg)
    }
}

/// An eagerly-built, ordered field container.
///
/// Mutable while being assembled and treated as frozen once handed to a
/// writer. Duplicate names and ordinals are permitted; insertion order is
/// preserved and is the order fields appear on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutableMsg {
    fields: FieldList,
}

impl MutableMsg {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: FieldList::new(),
        }
    }

    /// Adds a field with the value's default wire type.
    ///
    /// # Arguments
    /// * `name` - Optional field name
    /// * `ordinal` - Optional field ordinal
    /// * `value` - The value; anything convertible into a [`FieldValue`]
    pub fn add(&mut self, name: Option<&str>, ordinal: Option<i16>, value: impl Into<FieldValue>) {
        let value = value.into();
        let wire_type = value.default_wire_type();
        self.fields.push(Field::new(
            wire_type,
            value,
            name.map(str::to_string),
            ordinal,
        ));
    }

    /// Adds a field with an explicit wire type.
    ///
    /// Use this when the default mapping is not wanted, such as forcing a
    /// variable-width encoding for a byte array of canonical length.
    pub fn add_typed(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
        wire_type: WireType,
        value: FieldValue,
    ) {
        self.fields.push(Field::new(
            wire_type,
            value,
            name.map(str::to_string),
            ordinal,
        ));
    }

    /// Adds an already-constructed field.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Adds a nested message field.
    pub fn add_sub_message(&mut self, name: Option<&str>, ordinal: Option<i16>, msg: MutableMsg) {
        self.add_typed(
            name,
            ordinal,
            WireType::SubMessage,
            FieldValue::Message(MsgValue::Mutable(msg)),
        );
    }

    /// Returns the first mutable sub-message with the given identifiers,
    /// adding an empty one if none exists.
    pub fn ensure_sub_message(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
    ) -> &mut MutableMsg {
        let position = self.fields.iter().position(|field| {
            field.name() == name
                && field.ordinal() == ordinal
                && matches!(field.value(), FieldValue::Message(MsgValue::Mutable(_)))
        });
        let index = match position {
            Some(index) => index,
            None => {
                self.add_sub_message(name, ordinal, MutableMsg::new());
                self.fields.len() - 1
            }
        };
        match self.fields[index].value_mut() {
            FieldValue::Message(MsgValue::Mutable(msg)) => msg,
            _ => unreachable!("position matched a mutable sub-message"),
        }
    }

    /// Removes every field with the given name.
    pub fn remove_by_name(&mut self, name: &str) {
        self.fields.retain(|field| field.name() != Some(name));
    }

    /// Removes every field with the given ordinal.
    pub fn remove_by_ordinal(&mut self, ordinal: i16) {
        self.fields.retain(|field| field.ordinal() != Some(ordinal));
    }

    /// Removes all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Returns the fields as a slice.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Extracts the first value with the given name convertible to `T`.
    ///
    /// Conversion failures are treated as absence; use the type
    /// dictionary for secondary-type conversions.
    #[must_use]
    pub fn get_value<T: FromFieldValue>(&self, name: &str) -> Option<T> {
        self.fields
            .iter()
            .filter(|field| field.name() == Some(name))
            .find_map(Field::get)
    }

    /// Extracts the first value with the given ordinal convertible to `T`.
    #[must_use]
    pub fn get_value_by_ordinal<T: FromFieldValue>(&self, ordinal: i16) -> Option<T> {
        self.fields
            .iter()
            .filter(|field| field.ordinal() == Some(ordinal))
            .find_map(Field::get)
    }
}

impl FudgeMsg for MutableMsg {
    fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn get_by_index(&self, index: usize) -> Option<Field> {
        self.fields.get(index).cloned()
    }

    fn get_by_name(&self, name: &str) -> Option<Field> {
        self.fields
            .iter()
            .find(|field| field.name() == Some(name))
            .cloned()
    }

    fn get_by_ordinal(&self, ordinal: i16) -> Option<Field> {
        self.fields
            .iter()
            .find(|field| field.ordinal() == Some(ordinal))
            .cloned()
    }

    fn get_all_by_name(&self, name: &str) -> Vec<Field> {
        self.fields
            .iter()
            .filter(|field| field.name() == Some(name))
            .cloned()
            .collect()
    }

    fn get_all_by_ordinal(&self, ordinal: i16) -> Vec<Field> {
        self.fields
            .iter()
            .filter(|field| field.ordinal() == Some(ordinal))
            .cloned()
            .collect()
    }

    fn iter_fields(&self) -> Box<dyn Iterator<Item = Field> + '_> {
        Box::new(self.fields.iter().cloned())
    }
}

/// A message paired with its envelope metadata.
///
/// The taxonomy id is not stored here: it belongs to the writer, which
/// stamps it into the 8-byte header when the envelope is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FudgeEnvelope {
    processing_directives: u8,
    schema_version: u8,
    message: MsgValue,
}

impl FudgeEnvelope {
    /// Wraps a message with zeroed metadata.
    #[must_use]
    pub fn new(message: impl Into<MsgValue>) -> Self {
        Self {
            processing_directives: 0,
            schema_version: 0,
            message: message.into(),
        }
    }

    /// Wraps a message with explicit metadata.
    #[must_use]
    pub fn with_metadata(
        processing_directives: u8,
        schema_version: u8,
        message: impl Into<MsgValue>,
    ) -> Self {
        Self {
            processing_directives,
            schema_version,
            message: message.into(),
        }
    }

    /// Returns the processing directives byte.
    #[inline]
    #[must_use]
    pub const fn processing_directives(&self) -> u8 {
        self.processing_directives
    }

    /// Returns the schema version byte.
    #[inline]
    #[must_use]
    pub const fn schema_version(&self) -> u8 {
        self.schema_version
    }

    /// Returns the wrapped message.
    #[must_use]
    pub fn message(&self) -> &MsgValue {
        &self.message
    }

    /// Consumes the envelope and returns the wrapped message.
    #[must_use]
    pub fn into_message(self) -> MsgValue {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut msg = MutableMsg::new();
        msg.add(Some("name"), None, "value");
        msg.add(None, Some(9), 42i32);

        assert_eq!(msg.num_fields(), 2);
        assert!(!msg.is_empty());
        assert_eq!(
            msg.get_by_name("name").unwrap().value(),
            &FieldValue::String("value".to_string())
        );
        assert_eq!(
            msg.get_by_ordinal(9).unwrap().value(),
            &FieldValue::Int(42)
        );
        assert!(msg.get_by_name("missing").is_none());
    }

    #[test]
    fn test_duplicate_names_preserve_order() {
        let mut msg = MutableMsg::new();
        msg.add(Some("boolean"), None, true);
        msg.add(Some("boolean"), None, false);

        let first = msg.get_by_name("boolean").unwrap();
        assert_eq!(first.value(), &FieldValue::Boolean(true));

        let all = msg.get_all_by_name("boolean");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value(), &FieldValue::Boolean(true));
        assert_eq!(all[1].value(), &FieldValue::Boolean(false));
    }

    #[test]
    fn test_remove() {
        let mut msg = MutableMsg::new();
        msg.add(Some("a"), Some(1), 1i32);
        msg.add(Some("a"), None, 2i32);
        msg.add(Some("b"), Some(1), 3i32);

        msg.remove_by_name("a");
        assert_eq!(msg.num_fields(), 1);
        assert_eq!(msg.get_by_name("b").unwrap().value(), &FieldValue::Int(3));

        msg.remove_by_ordinal(1);
        assert!(msg.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut msg = MutableMsg::new();
        msg.add(None, None, 1i32);
        msg.clear();
        assert!(msg.is_empty());
    }

    #[test]
    fn test_sub_message() {
        let mut inner = MutableMsg::new();
        inner.add(Some("x"), None, 1i32);

        let mut outer = MutableMsg::new();
        outer.add_sub_message(Some("inner"), None, inner.clone());

        let field = outer.get_by_name("inner").unwrap();
        assert_eq!(field.wire_type(), WireType::SubMessage);
        let nested = field.value().as_message().unwrap();
        assert!(msg_eq(nested.as_msg(), &inner));
    }

    #[test]
    fn test_ensure_sub_message_creates_then_reuses() {
        let mut msg = MutableMsg::new();
        msg.ensure_sub_message(Some("sub"), None).add(None, None, 1i32);
        msg.ensure_sub_message(Some("sub"), None).add(None, None, 2i32);

        assert_eq!(msg.num_fields(), 1);
        let field = msg.get_by_name("sub").unwrap();
        let nested = field.value().as_message().unwrap();
        assert_eq!(nested.as_msg().num_fields(), 2);
    }

    #[test]
    fn test_typed_getters() {
        let mut msg = MutableMsg::new();
        msg.add(Some("n"), None, 42i32);
        msg.add(Some("s"), None, "text");

        assert_eq!(msg.get_value::<i64>("n"), Some(42));
        assert_eq!(msg.get_value::<String>("s"), Some("text".to_string()));
        // Conversion failure reads as absence.
        assert_eq!(msg.get_value::<bool>("n"), None);
    }

    #[test]
    fn test_typed_getter_skips_inconvertible_duplicates() {
        let mut msg = MutableMsg::new();
        msg.add(Some("v"), None, "text");
        msg.add(Some("v"), None, true);
        assert_eq!(msg.get_value::<bool>("v"), Some(true));
    }

    #[test]
    fn test_msg_value_equality_across_arms() {
        let mut msg = MutableMsg::new();
        msg.add(Some("a"), None, 1i32);

        let mutable = MsgValue::Mutable(msg.clone());
        let immutable = MsgValue::Immutable(Rc::new(msg));
        assert_eq!(mutable, immutable);
    }

    #[test]
    fn test_envelope_metadata() {
        let envelope = FudgeEnvelope::with_metadata(1, 2, MutableMsg::new());
        assert_eq!(envelope.processing_directives(), 1);
        assert_eq!(envelope.schema_version(), 2);
        assert!(envelope.message().as_msg().is_empty());
    }
}
