use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::codec::{Result, StorableError, Value};

/// Arena of decoded objects indexed by allocation order.
///
/// Slots are reserved before a record's payload is decoded so that indices
/// match the writer's numbering even when nested records allocate first.
#[derive(Debug, Default)]
pub struct ObjectTable {
	slots: Vec<Option<Value>>,
}

impl ObjectTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocate the next slot and return its index.
	pub fn reserve(&mut self) -> u32 {
		let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
		self.slots.push(None);
		index
	}

	/// Populate a reserved slot. Unreserved indices are ignored.
	pub fn store(&mut self, index: u32, value: Value) {
		if let Some(slot) = self.slots.get_mut(index as usize) {
			*slot = Some(value);
		}
	}

	/// Return the value in a slot, if reserved and populated.
	pub fn get(&self, index: u32) -> Option<Value> {
		self.slots.get(index as usize)?.clone()
	}

	/// Number of reserved slots.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether no slot has been reserved.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Follow placeholder chains to a concrete value.
	///
	/// Unpopulated slots and chains that loop back on themselves resolve to
	/// [`Value::Null`].
	pub fn resolve(&self, index: u32) -> Value {
		let mut current = index;
		for _ in 0..=self.slots.len() {
			match self.get(current) {
				Some(Value::PendingRef(next)) => current = next,
				Some(value) => return value,
				None => return Value::Null,
			}
		}
		Value::Null
	}

	/// Replace every placeholder reachable from `root` or from any table entry.
	pub fn fixup(&self, root: &mut Value) {
		let mut visited = HashSet::new();
		self.walk(root, &mut visited);
		for slot in self.slots.iter().flatten() {
			let mut entry = slot.clone();
			self.walk(&mut entry, &mut visited);
		}
		debug!(objects = self.slots.len(), containers = visited.len(), "resolved back-references");
	}

	fn walk(&self, value: &mut Value, visited: &mut HashSet<usize>) {
		if let Value::PendingRef(index) = *value {
			*value = self.resolve(index);
		}

		match value {
			Value::Array(items) => {
				let items = Rc::clone(items);
				if !visited.insert(Rc::as_ptr(&items) as usize) {
					return;
				}
				let mut items = items.borrow_mut();
				for item in items.iter_mut() {
					self.walk(item, visited);
				}
			}
			Value::Hash(map) => {
				let map = Rc::clone(map);
				if !visited.insert(Rc::as_ptr(&map) as usize) {
					return;
				}
				let mut map = map.borrow_mut();
				for item in map.values_mut() {
					self.walk(item, visited);
				}
			}
			Value::Hook(frame) => {
				for arg in frame.args.values_mut() {
					if let Value::PendingRef(index) = *arg {
						*arg = self.resolve(index);
					}
				}
			}
			_ => {}
		}
	}
}

/// Class names in registration order, for bless-by-index lookups.
#[derive(Debug, Default)]
pub struct ClassRegistry {
	names: Vec<Vec<u8>>,
}

impl ClassRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a class name and return its index.
	pub fn register(&mut self, name: &[u8]) -> usize {
		self.names.push(name.to_vec());
		self.names.len() - 1
	}

	/// Look up a registered class name.
	pub fn get(&self, index: u64) -> Result<&[u8]> {
		usize::try_from(index)
			.ok()
			.and_then(|idx| self.names.get(idx))
			.map(Vec::as_slice)
			.ok_or(StorableError::ClassIndexOutOfRange {
				index,
				len: self.names.len(),
			})
	}

	/// Number of registered names.
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Whether no name has been registered.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}
