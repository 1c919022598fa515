//! Runtime value representation
//!
//! Values are dynamically typed. Primitives are stored inline; strings,
//! tables and functions are reference-counted handles, so cloning a
//! `Value` never copies string bytes or table contents.

use std::fmt;
use std::rc::Rc;

use crate::function::Function;
use crate::table::TableRef;

/// A single stack slot's contents.
#[derive(Clone, Default)]
pub enum Value {
    /// The nil singleton
    #[default]
    Nil,
    /// Boolean value
    Boolean(bool),
    /// Integer subtype of `number`
    Integer(i64),
    /// Float subtype of `number`
    Number(f64),
    /// Immutable UTF-8 string
    String(Rc<str>),
    /// Shared table handle
    Table(TableRef),
    /// Callable value
    Function(Function),
}

/// Dynamic type tag of a stack slot.
///
/// `None` is not a value: it is what an invalid or absent index reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Index does not address a slot
    None,
    /// `nil`
    Nil,
    /// `boolean`
    Boolean,
    /// `number` (integer or float)
    Number,
    /// `string`
    String,
    /// `table`
    Table,
    /// `function`
    Function,
}

impl ValueType {
    /// Runtime type name, as used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::None => "no value",
            ValueType::Nil => "nil",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Table => "table",
            ValueType::Function => "function",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Dynamic type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) | Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Table(_) => ValueType::Table,
            Value::Function(_) => ValueType::Function,
        }
    }

    /// Runtime type name of this value
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Check if value is nil
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Check if value can be called
    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Get as boolean if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer.
    ///
    /// Floats are accepted only when they hold an exact integral value that
    /// fits in an `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n) => float_to_integer(*n),
            _ => None,
        }
    }

    /// Get as float; integers are widened
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the string contents if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the shared string buffer if this is a string
    pub fn as_rc_str(&self) -> Option<&Rc<str>> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the table handle if this is a table
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Get the function handle if this is a function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
}

/// Convert a float to an integer if the conversion is exact.
pub(crate) fn float_to_integer(n: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if n.fract() == 0.0 && n >= -LIMIT && n < LIMIT {
        Some(n as i64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(i), Value::Number(n)) | (Value::Number(n), Value::Integer(i)) => {
                float_to_integer(*n) == Some(*i)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Value::Nil"),
            Value::Boolean(b) => write!(f, "Value::Boolean({})", b),
            Value::Integer(i) => write!(f, "Value::Integer({})", i),
            Value::Number(n) => write!(f, "Value::Number({})", n),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::Table(t) => write!(f, "Value::Table({:p})", t.as_ptr()),
            Value::Function(func) => write!(f, "Value::Function({:p})", func.as_ptr()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Table(t) => write!(f, "table: {:p}", t.as_ptr()),
            Value::Function(func) => write!(f, "function: {:p}", func.as_ptr()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<TableRef> for Value {
    fn from(t: TableRef) -> Self {
        Value::Table(t)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::Boolean(true).type_name(), "boolean");
        assert_eq!(Value::Integer(1).type_name(), "number");
        assert_eq!(Value::Number(1.5).type_name(), "number");
        assert_eq!(Value::string("x").type_name(), "string");
        assert_eq!(Value::Table(TableRef::new()).type_name(), "table");
        assert_eq!(ValueType::None.name(), "no value");
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Number(7.0).as_integer(), Some(7));
        assert_eq!(Value::Number(7.5).as_integer(), None);
        assert_eq!(Value::Number(f64::NAN).as_integer(), None);
        assert_eq!(Value::Number(1e19).as_integer(), None);
        assert_eq!(Value::string("7").as_integer(), None);
    }

    #[test]
    fn test_number_equality() {
        assert_eq!(Value::Integer(3), Value::Number(3.0));
        assert_ne!(Value::Integer(3), Value::Number(3.5));
        assert_ne!(Value::Integer(1), Value::Boolean(true));
        assert_ne!(Value::Nil, Value::Boolean(false));
    }

    #[test]
    fn test_table_identity() {
        let t = TableRef::new();
        assert_eq!(Value::Table(t.clone()), Value::Table(t));
        assert_ne!(Value::Table(TableRef::new()), Value::Table(TableRef::new()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Integer(-4).to_string(), "-4");
        assert_eq!(Value::string("hi").to_string(), "hi");
    }
}
