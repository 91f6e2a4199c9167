/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The type dictionary: type-id registry, secondary types and value
//! conversion.
//!
//! This module provides:
//! - [`TypeDictionary`]: resolves type ids to wire types, including ids
//!   registered at context construction
//! - Secondary types: adapter pairs that carry a Rust type to and from a
//!   primary wire value
//! - `convert`/`can_convert`: typed access over the direct, widening and
//!   secondary paths
//!
//! The dictionary is assembled while a context is being configured and is
//! frozen once the context is built; nothing here mutates afterwards.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fudge_core::error::ConversionError;
use fudge_core::field::{Field, FieldValue, FromFieldValue};
use fudge_core::types::WireType;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

type ToPrimaryFn = Box<dyn Fn(&dyn Any) -> Option<FieldValue> + Send + Sync>;
type FromPrimaryFn = Box<dyn Fn(&FieldValue) -> Option<Box<dyn Any>> + Send + Sync>;

/// A registered secondary type: a pair of pure adapters between a Rust
/// type and a primary wire value.
struct SecondaryType {
    wire_type: WireType,
    to_primary: ToPrimaryFn,
    from_primary: FromPrimaryFn,
}

/// Maps type ids to wire types and Rust types to conversion paths.
///
/// Registration is additive while the owning context is being built; a
/// type id or Rust type registered twice resolves to the most recent
/// entry. Lookups of unregistered ids return `None`, signalling the
/// caller to pick a type explicitly or fail.
pub struct TypeDictionary {
    registered: HashMap<u8, WireType>,
    secondary: HashMap<TypeId, SecondaryType>,
}

impl TypeDictionary {
    /// Creates a dictionary with no registrations beyond the built-ins.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            registered: HashMap::new(),
            secondary: HashMap::new(),
        }
    }

    /// Creates the standard dictionary: built-in wire types plus the
    /// chrono calendar types as secondaries of date, time and datetime.
    #[must_use]
    pub fn new() -> Self {
        let mut dictionary = Self::empty();
        dictionary.register_secondary::<NaiveDate>(
            WireType::Date,
            |date| Some(FieldValue::Date((*date).into())),
            |value| match value {
                FieldValue::Date(date) => date.to_naive_date(),
                FieldValue::DateTime(datetime) => datetime.date.to_naive_date(),
                _ => None,
            },
        );
        dictionary.register_secondary::<NaiveTime>(
            WireType::Time,
            |time| Some(FieldValue::Time((*time).into())),
            |value| match value {
                FieldValue::Time(time) => time.to_naive_time(),
                FieldValue::DateTime(datetime) => datetime.time.to_naive_time(),
                _ => None,
            },
        );
        dictionary.register_secondary::<NaiveDateTime>(
            WireType::DateTime,
            |datetime| Some(FieldValue::DateTime((*datetime).into())),
            |value| match value {
                FieldValue::DateTime(datetime) => datetime.to_naive_date_time(),
                _ => None,
            },
        );
        dictionary
    }

    /// Registers a type id outside the built-in set.
    ///
    /// # Arguments
    /// * `type_id` - The one-byte id
    /// * `fixed_size` - The fixed width in bytes, or `None` for
    ///   variable-width payloads
    ///
    /// Values of such types round-trip as raw bytes. Registering an id
    /// again replaces the earlier entry.
    pub fn register_type(&mut self, type_id: u8, fixed_size: Option<u32>) {
        self.registered
            .insert(type_id, WireType::Other { type_id, fixed_size });
    }

    /// Registers a secondary type for `T`.
    ///
    /// # Arguments
    /// * `wire_type` - The primary type the adapters target
    /// * `to_primary` - Converts a `T` into the primary value
    /// * `from_primary` - Recovers a `T` from a primary value
    pub fn register_secondary<T: Any + Send + Sync>(
        &mut self,
        wire_type: WireType,
        to_primary: fn(&T) -> Option<FieldValue>,
        from_primary: fn(&FieldValue) -> Option<T>,
    ) {
        self.secondary.insert(
            TypeId::of::<T>(),
            SecondaryType {
                wire_type,
                to_primary: Box::new(move |any| {
                    any.downcast_ref::<T>().and_then(to_primary)
                }),
                from_primary: Box::new(move |value| {
                    from_primary(value).map(|v| Box::new(v) as Box<dyn Any>)
                }),
            },
        );
    }

    /// Resolves a type id to a wire type.
    ///
    /// Ids registered on this dictionary take precedence over the
    /// built-in table, so a registration can also reinterpret an
    /// otherwise unassigned id.
    #[must_use]
    pub fn wire_type(&self, type_id: u8) -> Option<WireType> {
        self.registered
            .get(&type_id)
            .copied()
            .or_else(|| WireType::from_id(type_id))
    }

    /// Returns the wire type a value encodes as.
    ///
    /// Unknown payloads resolve through the registered ids so that a
    /// fixed-width registration is honoured on re-encode.
    #[must_use]
    pub fn type_for_value(&self, value: &FieldValue) -> WireType {
        match value {
            FieldValue::Unknown { type_id, .. } => self
                .wire_type(*type_id)
                .unwrap_or(WireType::Other {
                    type_id: *type_id,
                    fixed_size: None,
                }),
            other => other.default_wire_type(),
        }
    }

    /// Converts a secondary value into its primary wire form.
    ///
    /// # Returns
    /// The primary wire type and value, or `None` if `T` has no secondary
    /// registration or the adapter rejects this value.
    #[must_use]
    pub fn to_primary<T: Any>(&self, value: &T) -> Option<(WireType, FieldValue)> {
        let entry = self.secondary.get(&TypeId::of::<T>())?;
        let primary = (entry.to_primary)(value)?;
        Some((entry.wire_type, primary))
    }

    /// Returns true if [`convert`](Self::convert) would succeed for `T`.
    #[must_use]
    pub fn can_convert<T: FromFieldValue + Any>(&self, field: &Field) -> bool {
        self.convert::<T>(field).is_ok()
    }

    /// Converts a field's value to `T`.
    ///
    /// Tries the direct and widening primary conversions first, then the
    /// registered secondary path.
    ///
    /// # Errors
    /// [`ConversionError::Unsupported`] if neither path applies.
    pub fn convert<T: FromFieldValue + Any>(&self, field: &Field) -> Result<T, ConversionError> {
        if let Some(value) = T::from_field_value(field.value()) {
            return Ok(value);
        }
        if let Some(entry) = self.secondary.get(&TypeId::of::<T>()) {
            if let Some(boxed) = (entry.from_primary)(field.value()) {
                if let Ok(value) = boxed.downcast::<T>() {
                    return Ok(*value);
                }
            }
        }
        Err(ConversionError::Unsupported {
            value_kind: field.value().kind_name(),
            target: std::any::type_name::<T>(),
        })
    }
}

impl Default for TypeDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDictionary")
            .field("registered", &self.registered)
            .field("secondary_types", &self.secondary.len())
            .finish()
    }
}
