//! Decoded value model.
//!
//! Arrays and hashes are reference-counted so that back-references in the
//! stream decode to shared values, and self-referencing structures decode to
//! real cycles. Cyclic graphs are not freed by dropping the root; call
//! [`Value::release`] when done with one.

use std::borrow::Cow;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Shared, mutable sequence storage.
pub type Array = Rc<RefCell<Vec<Value>>>;
/// Shared, mutable mapping storage.
pub type Hash = Rc<RefCell<BTreeMap<Key, Value>>>;

/// One decoded value.
#[derive(Clone)]
pub enum Value {
	/// Undefined scalar.
	Null,
	/// Immortal yes/no.
	Bool(bool),
	/// Integer record or integer-looking scalar.
	Int(i64),
	/// Double record or float-looking scalar.
	Float(f64),
	/// Text scalar.
	String(String),
	/// Scalar that is neither numeric nor 7-bit text.
	Bytes(Vec<u8>),
	/// Ordered sequence.
	Array(Array),
	/// Key/value mapping.
	Hash(Hash),
	/// Version-string components.
	VString(Vec<u64>),
	/// Raw capture of a hook-serialized object.
	Hook(HookFrame),
	/// Unresolved back-reference to an object index.
	///
	/// Only exists while a stream is being decoded; `decode` never returns it.
	PendingRef(u32),
}

/// Object kind recorded in the low bits of a hook record's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
	/// Hooked object is a scalar.
	Scalar,
	/// Hooked object is an array.
	Array,
	/// Hooked object is a hash.
	Hash,
	/// Hooked object is a magic "extra" type.
	Extra,
}

impl HookKind {
	/// Decode the two-bit type field of hook flags.
	pub fn from_flags(flags: u8) -> Self {
		match flags & 0x03 {
			0 => Self::Scalar,
			1 => Self::Array,
			2 => Self::Hash,
			_ => Self::Extra,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Scalar => "scalar",
			Self::Array => "array",
			Self::Hash => "hash",
			Self::Extra => "extra",
		}
	}
}

/// Positional arguments captured from a hook record.
///
/// Argument 0 is the frozen string payload (when non-empty); arguments 1..N are
/// the objects listed by the record.
#[derive(Debug, Clone, PartialEq)]
pub struct HookFrame {
	/// Captured object kind.
	pub kind: HookKind,
	/// Positional arguments by index.
	pub args: BTreeMap<u32, Value>,
}

/// Hash key.
#[derive(Clone)]
pub enum Key {
	/// Raw key bytes.
	Bytes(Vec<u8>),
	/// Text key.
	Text(String),
	/// Integer key (only produced when key guessing is enabled).
	Int(i64),
	/// Float key (only produced when key guessing is enabled).
	Float(f64),
}

impl Key {
	/// Convert a guessed scalar into a key, keeping `raw` when the guess is not key-like.
	pub fn from_guess(value: Value, raw: &[u8]) -> Self {
		match value {
			Value::Int(v) => Self::Int(v),
			Value::Float(v) => Self::Float(v),
			Value::String(v) => Self::Text(v),
			Value::Bytes(v) => Self::Bytes(v),
			_ => Self::Bytes(raw.to_vec()),
		}
	}

	/// Bytes written for this key on the wire.
	pub fn to_bytes(&self) -> Cow<'_, [u8]> {
		match self {
			Self::Bytes(v) => Cow::Borrowed(v),
			Self::Text(v) => Cow::Borrowed(v.as_bytes()),
			Self::Int(v) => Cow::Owned(v.to_string().into_bytes()),
			Self::Float(v) => Cow::Owned(format!("{v:?}").into_bytes()),
		}
	}

	/// Return the key as text when it is text or valid UTF-8 bytes.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(v) => Some(v),
			Self::Bytes(v) => std::str::from_utf8(v).ok(),
			_ => None,
		}
	}

	fn rank(&self) -> u8 {
		match self {
			Self::Bytes(_) => 0,
			Self::Text(_) => 1,
			Self::Int(_) => 2,
			Self::Float(_) => 3,
		}
	}
}

impl Ord for Key {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
			(Self::Text(a), Self::Text(b)) => a.cmp(b),
			(Self::Int(a), Self::Int(b)) => a.cmp(b),
			(Self::Float(a), Self::Float(b)) => a.total_cmp(b),
			_ => self.rank().cmp(&other.rank()),
		}
	}
}

impl PartialOrd for Key {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for Key {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Key {}

impl fmt::Debug for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bytes(v) => write!(f, "b\"{}\"", v.escape_ascii()),
			Self::Text(v) => write!(f, "{v:?}"),
			Self::Int(v) => write!(f, "{v}"),
			Self::Float(v) => write!(f, "{v:?}"),
		}
	}
}

impl From<&str> for Key {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

impl From<String> for Key {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&[u8]> for Key {
	fn from(value: &[u8]) -> Self {
		Self::Bytes(value.to_vec())
	}
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl Value {
	/// Build an array value.
	pub fn array(items: Vec<Value>) -> Self {
		Self::Array(Rc::new(RefCell::new(items)))
	}

	/// Build a hash value.
	pub fn hash<K: Into<Key>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
		let map = entries.into_iter().map(|(key, value)| (key.into(), value)).collect();
		Self::Hash(Rc::new(RefCell::new(map)))
	}

	/// Stable lowercase kind label.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::Bytes(_) => "bytes",
			Self::Array(_) => "array",
			Self::Hash(_) => "hash",
			Self::VString(_) => "vstring",
			Self::Hook(_) => "hook",
			Self::PendingRef(_) => "pending_ref",
		}
	}

	/// Whether this is [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Integer payload.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Numeric payload widened to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Float(v) => Some(*v),
			Self::Int(v) => Some(*v as f64),
			_ => None,
		}
	}

	/// Text payload.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}

	/// Shared array storage.
	pub fn as_array(&self) -> Option<&Array> {
		match self {
			Self::Array(v) => Some(v),
			_ => None,
		}
	}

	/// Shared hash storage.
	pub fn as_hash(&self) -> Option<&Hash> {
		match self {
			Self::Hash(v) => Some(v),
			_ => None,
		}
	}

	/// Look up a hash entry by name, trying the raw-bytes key before the text key.
	pub fn get(&self, key: &str) -> Option<Value> {
		let map = self.as_hash()?.borrow();
		map.get(&Key::Bytes(key.as_bytes().to_vec()))
			.or_else(|| map.get(&Key::Text(key.to_owned())))
			.cloned()
	}

	/// Return an array element.
	pub fn at(&self, index: usize) -> Option<Value> {
		self.as_array()?.borrow().get(index).cloned()
	}

	/// Length of sized values: characters for text, bytes, elements, or entries.
	pub fn len(&self) -> Option<usize> {
		match self {
			Self::String(v) => Some(v.chars().count()),
			Self::Bytes(v) => Some(v.len()),
			Self::Array(v) => Some(v.borrow().len()),
			Self::Hash(v) => Some(v.borrow().len()),
			_ => None,
		}
	}

	/// Whether both values are the same shared container.
	pub fn same_as(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
			(Self::Hash(a), Self::Hash(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Empty every container reachable from this value, breaking reference cycles.
	pub fn release(self) {
		let mut seen = HashSet::new();
		release_inner(self, &mut seen);
	}
}

fn release_inner(value: Value, seen: &mut HashSet<usize>) {
	match value {
		Value::Array(items) => {
			if !seen.insert(Rc::as_ptr(&items) as usize) {
				return;
			}
			let drained = std::mem::take(&mut *items.borrow_mut());
			for item in drained {
				release_inner(item, seen);
			}
		}
		Value::Hash(map) => {
			if !seen.insert(Rc::as_ptr(&map) as usize) {
				return;
			}
			let drained = std::mem::take(&mut *map.borrow_mut());
			for (_, item) in drained {
				release_inner(item, seen);
			}
		}
		Value::Hook(frame) => {
			for (_, item) in frame.args {
				release_inner(item, seen);
			}
		}
		_ => {}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		eq_guarded(self, other, &mut Vec::new())
	}
}

/// Structural equality that treats re-entered container pairs as equal.
fn eq_guarded(left: &Value, right: &Value, stack: &mut Vec<(usize, usize)>) -> bool {
	match (left, right) {
		(Value::Null, Value::Null) => true,
		(Value::Bool(a), Value::Bool(b)) => a == b,
		(Value::Int(a), Value::Int(b)) => a == b,
		(Value::Float(a), Value::Float(b)) => a == b,
		(Value::String(a), Value::String(b)) => a == b,
		(Value::Bytes(a), Value::Bytes(b)) => a == b,
		(Value::VString(a), Value::VString(b)) => a == b,
		(Value::PendingRef(a), Value::PendingRef(b)) => a == b,
		(Value::Hook(a), Value::Hook(b)) => {
			a.kind == b.kind
				&& a.args.len() == b.args.len()
				&& a.args.iter().zip(b.args.iter()).all(|((ka, va), (kb, vb))| ka == kb && eq_guarded(va, vb, stack))
		}
		(Value::Array(a), Value::Array(b)) => {
			if Rc::ptr_eq(a, b) {
				return true;
			}
			let pair = (Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize);
			if stack.contains(&pair) {
				return true;
			}
			stack.push(pair);
			let (xs, ys) = (a.borrow(), b.borrow());
			let equal = xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| eq_guarded(x, y, stack));
			stack.pop();
			equal
		}
		(Value::Hash(a), Value::Hash(b)) => {
			if Rc::ptr_eq(a, b) {
				return true;
			}
			let pair = (Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize);
			if stack.contains(&pair) {
				return true;
			}
			stack.push(pair);
			let (xs, ys) = (a.borrow(), b.borrow());
			let equal = xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|((ka, va), (kb, vb))| ka == kb && eq_guarded(va, vb, stack));
			stack.pop();
			equal
		}
		_ => false,
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let stack = RefCell::new(Vec::new());
		Guarded { value: self, stack: &stack }.fmt(f)
	}
}

/// Debug adapter that prints re-entered containers as `[...]` / `{...}`.
struct Guarded<'a> {
	value: &'a Value,
	stack: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for Guarded<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.value {
			Value::Null => f.write_str("Null"),
			Value::Bool(v) => write!(f, "Bool({v})"),
			Value::Int(v) => write!(f, "Int({v})"),
			Value::Float(v) => write!(f, "Float({v:?})"),
			Value::String(v) => write!(f, "{v:?}"),
			Value::Bytes(v) => write!(f, "b\"{}\"", v.escape_ascii()),
			Value::VString(parts) => {
				f.write_str("v")?;
				for (idx, part) in parts.iter().enumerate() {
					if idx > 0 {
						f.write_str(".")?;
					}
					write!(f, "{part}")?;
				}
				Ok(())
			}
			Value::PendingRef(idx) => write!(f, "PendingRef({idx})"),
			Value::Hook(frame) => {
				write!(f, "Hook({}) ", frame.kind.as_str())?;
				f.debug_map()
					.entries(frame.args.iter().map(|(idx, value)| (idx, Guarded { value, stack: self.stack })))
					.finish()
			}
			Value::Array(items) => {
				let addr = Rc::as_ptr(items) as usize;
				if self.stack.borrow().contains(&addr) {
					return f.write_str("[...]");
				}
				self.stack.borrow_mut().push(addr);
				let items = items.borrow();
				let result = f.debug_list().entries(items.iter().map(|value| Guarded { value, stack: self.stack })).finish();
				self.stack.borrow_mut().pop();
				result
			}
			Value::Hash(map) => {
				let addr = Rc::as_ptr(map) as usize;
				if self.stack.borrow().contains(&addr) {
					return f.write_str("{...}");
				}
				self.stack.borrow_mut().push(addr);
				let map = map.borrow();
				let result = f
					.debug_map()
					.entries(map.iter().map(|(key, value)| (key, Guarded { value, stack: self.stack })))
					.finish();
				self.stack.borrow_mut().pop();
				result
			}
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<Vec<u8>> for Value {
	fn from(value: Vec<u8>) -> Self {
		Self::Bytes(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::array(value)
	}
}
