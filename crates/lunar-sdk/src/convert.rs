//! Value conversion between host types and runtime values
//!
//! Pushing is total for well-formed host values ([`ToValue`]); reading is
//! partial ([`FromValue`]) and succeeds only when the runtime value's
//! dynamic type is compatible with the requested host type.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

use lunar_engine::{Function, Table, TableRef, Value};

use crate::error::{MarshalError, MarshalResult};

// ============================================================================
// Conversion Traits
// ============================================================================

/// Convert from a host type to a runtime value.
///
/// Implement this trait to allow your type to be pushed and returned from a
/// native function.
pub trait ToValue {
    /// Convert to a runtime value, failing if the value is unrepresentable.
    fn to_value(self) -> MarshalResult<Value>;
}

/// Convert from a runtime value to a host type.
///
/// Implement this trait to allow your type to be read from the stack and
/// received as a native function argument.
pub trait FromValue: Sized {
    /// Host type name used in conversion error messages
    const TYPE_NAME: &'static str;

    /// Convert from a runtime value, returning `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;

    /// Convert from a stack slot that may be absent (invalid index).
    fn from_slot(slot: Option<&Value>) -> Option<Self> {
        slot.and_then(Self::from_value)
    }
}

/// The `nil` singleton, as a host value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nil;

// ============================================================================
// Passthrough
// ============================================================================

impl ToValue for Value {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(self)
    }
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ToValue for Nil {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Nil)
    }
}

impl FromValue for Nil {
    const TYPE_NAME: &'static str = "nil";

    fn from_value(value: &Value) -> Option<Self> {
        value.is_nil().then_some(Nil)
    }
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

impl ToValue for bool {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Boolean(self))
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(self) -> MarshalResult<Value> {
                    i64::try_from(self).map(Value::Integer).map_err(|_| {
                        MarshalError::Unrepresentable(format!(
                            "{} {} does not fit in an integer",
                            stringify!($ty),
                            self
                        ))
                    })
                }
            }

            impl FromValue for $ty {
                const TYPE_NAME: &'static str = "integer";

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_integer().and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToValue for f64 {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Number(self))
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl ToValue for f32 {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Number(f64::from(self)))
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        let n = value.as_number()?;
        // Finite values beyond the f32 range would round to infinity
        if n.is_finite() && n.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(n as f32)
    }
}

// ============================================================================
// Text
// ============================================================================

impl ToValue for &str {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::string(self))
    }
}

impl ToValue for &String {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::string(self))
    }
}

impl ToValue for String {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::from(self))
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

// Shares the runtime's buffer: no bytes are copied in either direction.
impl ToValue for Rc<str> {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::String(self))
    }
}

impl FromValue for Rc<str> {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_rc_str().cloned()
    }
}

// ============================================================================
// Optional
// ============================================================================

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(self) -> MarshalResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Nil),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Nil => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_slot(slot: Option<&Value>) -> Option<Self> {
        match slot {
            Some(value) => Self::from_value(value),
            None => Some(None),
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

impl ToValue for TableRef {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Table(self))
    }
}

impl FromValue for TableRef {
    const TYPE_NAME: &'static str = "table";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_table().cloned()
    }
}

impl ToValue for Function {
    fn to_value(self) -> MarshalResult<Value> {
        Ok(Value::Function(self))
    }
}

impl FromValue for Function {
    const TYPE_NAME: &'static str = "function";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_function().cloned()
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Store one collection entry.
///
/// A table cannot hold nil, so a `None` element or map value would vanish on
/// the way in and a sequence would be cut short at it on the way out.
fn set_entry(table: &mut Table, key: Value, value: Value) -> MarshalResult<()> {
    if value.is_nil() {
        return Err(MarshalError::Unrepresentable(format!(
            "nil entry at key {}",
            key
        )));
    }
    table
        .set(key, value)
        .map_err(|e| MarshalError::Unrepresentable(e.to_string()))
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(self) -> MarshalResult<Value> {
        let mut table = Table::with_capacity(self.len());
        for (i, item) in self.into_iter().enumerate() {
            set_entry(&mut table, Value::Integer(i as i64 + 1), item.to_value()?)?;
        }
        Ok(Value::Table(TableRef::from_table(table)))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const TYPE_NAME: &'static str = "table";

    fn from_value(value: &Value) -> Option<Self> {
        let table = value.as_table()?.borrow();
        let items = (1..=table.len() as i64)
            .map(|i| T::from_value(&table.get_index(i)))
            .collect();
        items
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(self) -> MarshalResult<Value> {
        let mut table = Table::with_capacity(self.len());
        for (k, v) in self {
            set_entry(&mut table, k.to_value()?, v.to_value()?)?;
        }
        Ok(Value::Table(TableRef::from_table(table)))
    }
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    const TYPE_NAME: &'static str = "table";

    fn from_value(value: &Value) -> Option<Self> {
        let table = value.as_table()?.borrow();
        let entries = table
            .pairs()
            .map(|(k, v)| Some((K::from_value(&k)?, V::from_value(v)?)))
            .collect();
        entries
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(self) -> MarshalResult<Value> {
        let mut table = Table::with_capacity(self.len());
        for (k, v) in self {
            set_entry(&mut table, k.to_value()?, v.to_value()?)?;
        }
        Ok(Value::Table(TableRef::from_table(table)))
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    const TYPE_NAME: &'static str = "table";

    fn from_value(value: &Value) -> Option<Self> {
        let table = value.as_table()?.borrow();
        let entries = table
            .pairs()
            .map(|(k, v)| Some((K::from_value(&k)?, V::from_value(v)?)))
            .collect();
        entries
    }
}

// ============================================================================
// Tests
// ============================================================================
