/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Fudge Core
//!
//! Core types, containers, and error definitions for the Fudge binary
//! message codec.
//!
//! This crate provides the fundamental building blocks used across all
//! Fudge crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field types**: `Field`, `FieldValue`, and typed access through
//!   `FromFieldValue`
//! - **Message containers**: the `FudgeMsg` read interface and the
//!   eagerly-built `MutableMsg`
//! - **Wire types**: the stable type-id table and the packed date/time
//!   value types
//!
//! A message is an ordered sequence of fields; each field carries a typed
//! value and may be identified by a name, an ordinal, both, or neither.
//! Messages nest through sub-message fields.

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{
    ConversionError, DecodeError, EncodeError, FudgeError, Result, StateError,
};
pub use field::{Field, FieldValue, FromFieldValue};
pub use message::{msg_eq, FudgeEnvelope, FudgeMsg, MsgValue, MutableMsg};
pub use types::{FudgeDate, FudgeDateTime, FudgeTime, Precision, WireType};
