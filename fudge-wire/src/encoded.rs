/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Lazy message container backed by its encoded form.
//!
//! An [`EncodedMsg`] wraps a message byte range and decodes fields only
//! when they are inspected. Decoded fields accumulate in an append-only
//! buffer; iteration replays the buffer and then advances the decoder,
//! never both at once. Sub-messages met during decoding are wrapped over
//! their skipped sub-ranges rather than parsed, so routing an outer
//! message never pays for its interior.
//!
//! The container is immutable by construction and is not safe for
//! concurrent traversal.

use crate::reader::{FudgeStreamElement, FudgeStreamReader};
use crate::FudgeContext;
use bytes::Bytes;
use fudge_core::error::FudgeError;
use fudge_core::field::{Field, FieldValue, FromFieldValue};
use fudge_core::message::{msg_eq, FudgeMsg, MsgValue};
use fudge_core::types::WireType;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::Cursor;
use std::rc::Rc;
use tracing::warn;

/// An immutable message decoded on demand from its encoded byte range.
pub struct EncodedMsg {
    context: FudgeContext,
    data: Bytes,
    fields: RefCell<Vec<Field>>,
    reader: RefCell<Option<FudgeStreamReader<Cursor<Bytes>>>>,
    complete: Cell<bool>,
    error: RefCell<Option<FudgeError>>,
}

impl EncodedMsg {
    /// Creates a container over an encoded message range.
    ///
    /// # Arguments
    /// * `data` - The message bytes: a sequence of fields with no
    ///   envelope header or length prefix
    /// * `context` - The context used to decode fields on demand
    pub fn new(data: impl Into<Bytes>, context: FudgeContext) -> Self {
        let data = data.into();
        Self {
            context,
            complete: Cell::new(data.is_empty()),
            data,
            fields: RefCell::new(Vec::new()),
            reader: RefCell::new(None),
            error: RefCell::new(None),
        }
    }

    /// Creates a container over a reader wrapping a message range,
    /// typically the result of a sub-message skip.
    #[must_use]
    pub fn from_reader(reader: FudgeStreamReader<Cursor<Bytes>>) -> Self {
        let context = reader.context().clone();
        let data = reader.encoded().unwrap_or_default();
        Self {
            context,
            complete: Cell::new(!reader.has_next()),
            data,
            fields: RefCell::new(Vec::new()),
            reader: RefCell::new(Some(reader)),
            error: RefCell::new(None),
        }
    }

    /// Returns the decode error that ended a lazy traversal early, if
    /// the backing range turned out to be malformed.
    pub fn error(&self) -> Option<FudgeError> {
        self.error.borrow_mut().take()
    }

    /// Extracts the first value with the given name convertible to `T`,
    /// consulting the context's type dictionary for secondary types.
    ///
    /// Decoding stops at the first convertible match; conversion
    /// failures read as absence.
    #[must_use]
    pub fn get_value<T: FromFieldValue + Any>(&self, name: &str) -> Option<T> {
        self.iter_fields()
            .filter(|field| field.name() == Some(name))
            .find_map(|field| self.context.type_dictionary().convert(&field).ok())
    }

    /// Extracts the first value with the given ordinal convertible to
    /// `T`, consulting the context's type dictionary.
    #[must_use]
    pub fn get_value_by_ordinal<T: FromFieldValue + Any>(&self, ordinal: i16) -> Option<T> {
        self.iter_fields()
            .filter(|field| field.ordinal() == Some(ordinal))
            .find_map(|field| self.context.type_dictionary().convert(&field).ok())
    }

    /// Decodes one more field, appending it to the buffer.
    fn decode_next(&self) -> Option<Field> {
        if self.complete.get() {
            return None;
        }
        let mut reader_slot = self.reader.borrow_mut();
        let reader = reader_slot.get_or_insert_with(|| {
            FudgeStreamReader::wrap_msg(self.data.clone(), self.context.clone())
        });
        let field = match reader.next() {
            Ok(Some(FudgeStreamElement::SimpleField)) => reader.current_field(),
            Ok(Some(FudgeStreamElement::SubmessageFieldStart)) => {
                match reader.skip_message_field() {
                    Ok(sub) => {
                        let nested = EncodedMsg::from_reader(sub);
                        Some(Field::new(
                            WireType::SubMessage,
                            FieldValue::Message(MsgValue::Immutable(Rc::new(nested))),
                            reader.field_name().map(str::to_string),
                            reader.field_ordinal(),
                        ))
                    }
                    Err(err) => {
                        warn!("lazy decode aborted: {}", err);
                        *self.error.borrow_mut() = Some(err);
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(err) => {
                warn!("lazy decode aborted: {}", err);
                *self.error.borrow_mut() = Some(err);
                None
            }
        };
        match field {
            Some(field) => {
                if !reader.has_next() {
                    self.complete.set(true);
                }
                self.fields.borrow_mut().push(field.clone());
                Some(field)
            }
            None => {
                self.complete.set(true);
                None
            }
        }
    }

    /// Decodes up to and including the field at `index`.
    fn decode_to_index(&self, index: usize) {
        while self.fields.borrow().len() <= index && !self.complete.get() {
            if self.decode_next().is_none() {
                break;
            }
        }
    }

    /// Decodes the remainder of the range.
    fn decode_all(&self) {
        while !self.complete.get() {
            if self.decode_next().is_none() {
                break;
            }
        }
    }
}

impl FudgeMsg for EncodedMsg {
    fn num_fields(&self) -> usize {
        self.decode_all();
        self.fields.borrow().len()
    }

    fn is_empty(&self) -> bool {
        if !self.complete.get() && self.fields.borrow().is_empty() {
            self.decode_next();
        }
        self.fields.borrow().is_empty()
    }

    fn get_by_index(&self, index: usize) -> Option<Field> {
        self.decode_to_index(index);
        self.fields.borrow().get(index).cloned()
    }

    fn get_by_name(&self, name: &str) -> Option<Field> {
        self.iter_fields().find(|field| field.name() == Some(name))
    }

    fn get_by_ordinal(&self, ordinal: i16) -> Option<Field> {
        self.iter_fields()
            .find(|field| field.ordinal() == Some(ordinal))
    }

    fn get_all_by_name(&self, name: &str) -> Vec<Field> {
        self.iter_fields()
            .filter(|field| field.name() == Some(name))
            .collect()
    }

    fn get_all_by_ordinal(&self, ordinal: i16) -> Vec<Field> {
        self.iter_fields()
            .filter(|field| field.ordinal() == Some(ordinal))
            .collect()
    }

    fn iter_fields(&self) -> Box<dyn Iterator<Item = Field> + '_> {
        Box::new(EncodedMsgIter {
            msg: self,
            index: 0,
        })
    }

    fn encoded(&self) -> Option<Bytes> {
        Some(self.data.clone())
    }
}

/// Iterator that replays the decoded buffer, then advances the decoder.
struct EncodedMsgIter<'a> {
    msg: &'a EncodedMsg,
    index: usize,
}

impl Iterator for EncodedMsgIter<'_> {
    type Item = Field;

    fn next(&mut self) -> Option<Field> {
        let replayed = self.msg.fields.borrow().get(self.index).cloned();
        let field = match replayed {
            Some(field) => Some(field),
            None if !self.msg.complete.get() => self.msg.decode_next(),
            None => None,
        };
        if field.is_some() {
            self.index += 1;
        }
        field
    }
}

impl PartialEq for EncodedMsg {
    fn eq(&self, other: &Self) -> bool {
        msg_eq(self, other)
    }
}

impl fmt::Debug for EncodedMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedMsg")
            .field("data_len", &self.data.len())
            .field("decoded", &self.fields.borrow().len())
            .field("complete", &self.complete.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fudge_core::message::MutableMsg;
    use fudge_core::msg_eq;

    /// Encodes a message and returns its field bytes without the
    /// envelope header.
    fn encode_fields(context: &FudgeContext, msg: &MutableMsg) -> Bytes {
        let bytes = context.to_bytes(msg).unwrap();
        bytes.slice(8..)
    }

    fn sample_msg() -> MutableMsg {
        let mut inner = MutableMsg::new();
        inner.add(None, None, 1i32);
        inner.add(None, None, 2i32);

        let mut msg = MutableMsg::new();
        msg.add(Some("first"), None, true);
        msg.add_sub_message(Some("sub"), None, inner);
        msg.add(Some("last"), Some(3), "tail");
        msg
    }

    #[test]
    fn test_iteration_matches_eager_decode() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context.clone());
        assert!(msg_eq(&encoded, &original));
    }

    #[test]
    fn test_get_by_name_stops_decoding() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context);

        let field = encoded.get_by_name("first").unwrap();
        assert_eq!(field.value(), &FieldValue::Boolean(true));
        // only the matched field has been materialized
        assert_eq!(encoded.fields.borrow().len(), 1);
        assert!(!encoded.complete.get());
    }

    #[test]
    fn test_get_by_index_decodes_minimally() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context);

        let field = encoded.get_by_index(1).unwrap();
        assert_eq!(field.name(), Some("sub"));
        assert_eq!(encoded.fields.borrow().len(), 2);
        assert!(!encoded.complete.get());

        // indexes already decoded replay without further work
        assert_eq!(encoded.get_by_index(0).unwrap().name(), Some("first"));
        assert!(encoded.get_by_index(10).is_none());
    }

    #[test]
    fn test_is_empty_decodes_at_most_one_field() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context.clone());
        assert!(!encoded.is_empty());
        assert_eq!(encoded.fields.borrow().len(), 1);

        let empty = EncodedMsg::new(Bytes::new(), context);
        assert!(empty.is_empty());
        assert_eq!(empty.num_fields(), 0);
    }

    #[test]
    fn test_sub_message_stays_encoded() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context);

        let field = encoded.get_by_name("sub").unwrap();
        let FieldValue::Message(MsgValue::Immutable(_)) = field.value() else {
            panic!("sub-message should wrap its encoded range");
        };
        // the nested fields still read correctly through the wrapper
        let nested = field.value().as_message().unwrap();
        assert_eq!(nested.as_msg().num_fields(), 2);
        assert_eq!(
            nested.as_msg().get_by_index(1).unwrap().value(),
            &FieldValue::Int(2)
        );
    }

    #[test]
    fn test_encoded_returns_backing_range() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let data = encode_fields(&context, &original);
        let encoded = EncodedMsg::new(data.clone(), context);
        assert_eq!(encoded.encoded().unwrap(), data);
    }

    #[test]
    fn test_num_fields_forces_full_decode() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let encoded = EncodedMsg::new(encode_fields(&context, &original), context);
        assert_eq!(encoded.num_fields(), 3);
        assert!(encoded.complete.get());
    }

    #[test]
    fn test_reencoding_uses_backing_bytes() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let bytes = context.to_bytes(&original).unwrap();
        let encoded = EncodedMsg::new(bytes.slice(8..), context.clone());

        // writing the lazy container reproduces the original bytes
        // without decoding a single field
        let rewritten = context.to_bytes(&encoded).unwrap();
        assert_eq!(rewritten, bytes);
        assert_eq!(encoded.fields.borrow().len(), 0);
    }

    #[test]
    fn test_typed_getter_with_secondary_type() {
        let context = FudgeContext::new();
        let mut msg = MutableMsg::new();
        msg.add(
            Some("when"),
            None,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        let encoded = EncodedMsg::new(encode_fields(&context, &msg), context);

        let date: chrono::NaiveDate = encoded.get_value("when").unwrap();
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(encoded.get_value::<bool>("when"), None);
    }

    #[test]
    fn test_malformed_range_surfaces_error_and_truncates() {
        let context = FudgeContext::new();
        // a valid boolean field followed by a truncated int field
        let encoded = EncodedMsg::new(vec![0x80u8, 1, 1, 0x80, 4, 0], context);

        let fields: Vec<Field> = encoded.iter_fields().collect();
        assert_eq!(fields.len(), 1);
        assert!(encoded.error().is_some());
    }

    #[test]
    fn test_equality_with_eager_container() {
        let context = FudgeContext::new();
        let original = sample_msg();
        let lazy = EncodedMsg::new(encode_fields(&context, &original), context);
        // interleave partial decoding with the comparison
        let _ = lazy.get_by_index(0);
        assert!(msg_eq(&lazy, &original));
    }
}
