/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the Fudge message codec.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all Fudge operations.

use thiserror::Error;

/// Result type alias using [`FudgeError`] as the error type.
pub type Result<T> = std::result::Result<T, FudgeError>;

/// Top-level error type for all Fudge operations.
#[derive(Debug, Error)]
pub enum FudgeError {
    /// Error while decoding a Fudge stream.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error while encoding a Fudge stream.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error converting a field value to a requested type.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Reader or writer used outside its legal state.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// I/O error from the underlying byte source or sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while decoding a Fudge stream.
///
/// These are fatal to the stream being read: once raised, the stream
/// position is undefined and the reader must be discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte source ended before a complete unit could be read.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A field extends past the end of its enclosing message or envelope.
    #[error("truncated field: need {needed} bytes, {remaining} remain in frame")]
    Truncated {
        /// Bytes needed to complete the current read.
        needed: usize,
        /// Bytes remaining in the enclosing frame.
        remaining: usize,
    },

    /// The field prefix disagrees with the width class of the field type.
    #[error("prefix 0x{prefix:02x} inconsistent with type {type_id}")]
    PrefixTypeMismatch {
        /// The prefix byte as read.
        prefix: u8,
        /// The field type id as read.
        type_id: u8,
    },

    /// A fixed-width field used a type id with no registered width.
    #[error("unknown fixed-width type id {type_id}")]
    UnknownFixedWidthType {
        /// The unrecognised type id.
        type_id: u8,
    },

    /// The envelope declared an impossible total size.
    #[error("invalid envelope size {size}")]
    InvalidEnvelopeSize {
        /// The declared total size, including the 8-byte header.
        size: i32,
    },

    /// A value size prefix exceeded the representable maximum.
    #[error("value size {size} exceeds maximum")]
    SizeOverflow {
        /// The declared value size.
        size: u64,
    },

    /// A value payload did not decode under its declared type.
    #[error("invalid value for type {type_id}: {reason}")]
    InvalidFieldValue {
        /// The declared type id.
        type_id: u8,
        /// Description of why the payload is invalid.
        reason: String,
    },

    /// A field name was not valid UTF-8.
    #[error("invalid utf-8 in field name")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors that occur while encoding a Fudge stream.
///
/// These are caller-input errors raised before any bytes are written for
/// the offending field, so the stream remains consistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field name exceeded the 255-byte UTF-8 limit.
    #[error("field name too long: {length} bytes exceeds maximum 255")]
    NameTooLong {
        /// The UTF-8 encoded length of the name.
        length: usize,
    },

    /// A value's encoded size exceeded the representable maximum.
    #[error("value too large: {size} bytes exceeds maximum")]
    ValueTooLarge {
        /// The encoded size of the value.
        size: usize,
    },

    /// No wire type is registered for the given type id.
    #[error("no wire type registered for type id {type_id}")]
    UnknownWireType {
        /// The unregistered type id.
        type_id: u8,
    },

    /// A value does not match the wire type it was declared with.
    #[error("value does not match wire type {type_id}: {reason}")]
    InvalidValue {
        /// The declared type id.
        type_id: u8,
        /// Description of the mismatch.
        reason: String,
    },

    /// A field would overrun the envelope's declared total size.
    #[error("envelope overrun: field needs {needed} bytes, {remaining} remain")]
    EnvelopeOverrun {
        /// Encoded size of the field being written.
        needed: usize,
        /// Bytes remaining in the envelope budget.
        remaining: usize,
    },

    /// The envelope declared an impossible total size.
    #[error("invalid envelope size {size}")]
    InvalidEnvelopeSize {
        /// The declared total size, including the 8-byte header.
        size: i32,
    },
}

/// Errors converting a field value to a requested type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The dictionary has no direct or secondary path for the conversion.
    #[error("cannot convert {value_kind} value to {target}")]
    Unsupported {
        /// The kind of the stored value.
        value_kind: &'static str,
        /// The requested target type name.
        target: &'static str,
    },
}

/// Errors raised when a reader or writer is used outside its legal state.
///
/// These indicate a programming bug in the caller; the stream is unusable
/// after one is raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A field was written before the envelope header.
    #[error("field written before envelope header")]
    EnvelopeNotStarted,

    /// An envelope header was written while one is still open.
    #[error("envelope header written inside an open envelope")]
    EnvelopeAlreadyOpen,

    /// The writer was closed with unwritten envelope budget.
    #[error("envelope incomplete: {remaining} bytes unwritten")]
    EnvelopeIncomplete {
        /// Bytes remaining in the envelope budget.
        remaining: usize,
    },

    /// A sub-message operation was requested outside a sub-message start.
    #[error("reader is not positioned at a sub-message field")]
    NotAtSubMessage,
}
