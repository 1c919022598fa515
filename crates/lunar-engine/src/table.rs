//! Tables: the runtime's only aggregate type
//!
//! A table maps any non-nil, non-NaN value to a value. Sequences are tables
//! whose keys are the integers `1..=n`.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{EngineError, EngineResult};
use crate::function::Function;
use crate::value::{float_to_integer, Value};

/// Normalized table key.
///
/// Floats with an integral value are stored as integers so that `t[1]` and
/// `t[1.0]` address the same entry. Tables and functions key by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
enum Key {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(Rc<str>),
    Table(TableRef),
    Function(Function),
}

impl Key {
    fn from_value(value: &Value) -> EngineResult<Self> {
        match value {
            Value::Nil => Err(EngineError::InvalidKey("nil")),
            Value::Boolean(b) => Ok(Key::Boolean(*b)),
            Value::Integer(i) => Ok(Key::Integer(*i)),
            Value::Number(n) if n.is_nan() => Err(EngineError::InvalidKey("NaN")),
            Value::Number(n) => Ok(match float_to_integer(*n) {
                Some(i) => Key::Integer(i),
                None => Key::Float(n.to_bits()),
            }),
            Value::String(s) => Ok(Key::String(s.clone())),
            Value::Table(t) => Ok(Key::Table(t.clone())),
            Value::Function(f) => Ok(Key::Function(f.clone())),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Key::Boolean(b) => Value::Boolean(*b),
            Key::Integer(i) => Value::Integer(*i),
            Key::Float(bits) => Value::Number(f64::from_bits(*bits)),
            Key::String(s) => Value::String(s.clone()),
            Key::Table(t) => Value::Table(t.clone()),
            Key::Function(f) => Value::Function(f.clone()),
        }
    }
}

/// Table contents
#[derive(Default)]
pub struct Table {
    entries: FxHashMap<Key, Value>,
    /// Keys `1..=border` are present and `border + 1` is absent
    border: usize,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            border: 0,
        }
    }

    /// Get the value stored at `key`, or nil
    pub fn get(&self, key: &Value) -> Value {
        match Key::from_value(key) {
            Ok(k) => self.entries.get(&k).cloned().unwrap_or(Value::Nil),
            Err(_) => Value::Nil,
        }
    }

    /// Get the value stored at integer `index`, or nil
    pub fn get_index(&self, index: i64) -> Value {
        self.entries
            .get(&Key::Integer(index))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// Store `value` at `key`. Storing nil removes the entry.
    pub fn set(&mut self, key: Value, value: Value) -> EngineResult<()> {
        let key = Key::from_value(&key)?;
        let position = match &key {
            Key::Integer(i) if *i >= 1 => usize::try_from(*i).ok(),
            _ => None,
        };
        if value.is_nil() {
            self.entries.remove(&key);
            if let Some(pos) = position.filter(|&pos| pos <= self.border) {
                self.border = pos - 1;
            }
        } else {
            self.entries.insert(key, value);
            if position == Some(self.border + 1) {
                self.extend_border();
            }
        }
        Ok(())
    }

    /// Advance the border over keys that were stored ahead of it
    fn extend_border(&mut self) {
        while self.entries.contains_key(&Key::Integer(self.border as i64 + 1)) {
            self.border += 1;
        }
    }

    /// Border of the sequence part: number of consecutive integer keys from 1
    #[inline]
    pub fn len(&self) -> usize {
        self.border
    }

    /// Number of entries, sequence or not
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append at `len() + 1`
    pub fn push(&mut self, value: Value) -> EngineResult<()> {
        let next = self.len() as i64 + 1;
        self.set(Value::Integer(next), value)
    }

    /// Iterate over all entries in unspecified order
    pub fn pairs(&self) -> impl Iterator<Item = (Value, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.to_value(), v))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("entries", &self.entries.len())
            .field("len", &self.len())
            .finish()
    }
}

/// Shared handle to a table.
///
/// Equality and hashing use identity, not contents.
#[derive(Clone, Default)]
pub struct TableRef(Rc<RefCell<Table>>);

impl TableRef {
    /// Create a handle to a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing table contents
    pub fn from_table(table: Table) -> Self {
        TableRef(Rc::new(RefCell::new(table)))
    }

    /// Borrow the table contents
    pub fn borrow(&self) -> Ref<'_, Table> {
        self.0.borrow()
    }

    /// Mutably borrow the table contents
    pub fn borrow_mut(&self) -> RefMut<'_, Table> {
        self.0.borrow_mut()
    }

    /// Raw pointer, for identity display
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state);
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableRef({:p})", self.as_ptr())
    }
}
