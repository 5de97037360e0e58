use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::codec::{
	ClassRegistry, Cursor, Endianness, HookFrame, HookKind, Key, NumericLayout, ObjectTable, Opcode, Result, ScalarGuesser, StorableError, StreamHeader,
	TypeGuess, Value,
};

const HOOK_LARGE_CLASSLEN: u8 = 0x04;
const HOOK_LARGE_STRLEN: u8 = 0x08;
const HOOK_LARGE_LISTLEN: u8 = 0x10;
const HOOK_IDX_CLASSNAME: u8 = 0x20;
const HOOK_NEED_RECURSE: u8 = 0x40;
const HOOK_HAS_LIST: u8 = 0x80;

/// Decode behavior controls.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Maximum record nesting depth.
	pub max_depth: u32,
	/// Run hash keys through the scalar guesser instead of keeping raw bytes.
	pub guess_keys: bool,
	/// Fail on hook and flag-hash records instead of capturing them best-effort.
	pub strict: bool,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: Self::DEFAULT_MAX_DEPTH,
			guess_keys: false,
			strict: false,
		}
	}
}

impl DecodeOptions {
	/// Default nesting bound, safe on a 2 MiB thread stack in debug builds.
	pub const DEFAULT_MAX_DEPTH: u32 = 128;

	/// Preset that refuses partially understood records.
	pub fn strict() -> Self {
		Self {
			strict: true,
			..Self::default()
		}
	}
}

/// Decode a stream with default options and the default scalar guesser.
pub fn decode(bytes: &[u8]) -> Result<Value> {
	decode_with(bytes, &DecodeOptions::default(), &TypeGuess)
}

/// Decode a stream with explicit options and scalar policy.
///
/// The container magic is optional; the version header is not.
pub fn decode_with(bytes: &[u8], opt: &DecodeOptions, guesser: &dyn ScalarGuesser) -> Result<Value> {
	let mut cursor = Cursor::new(bytes);
	let header = StreamHeader::parse(&mut cursor)?;

	let mut decoder = Decoder {
		cursor,
		layout: header.layout,
		objects: ObjectTable::new(),
		classes: ClassRegistry::new(),
		saw_backref: false,
		depth: 0,
		opt,
		guesser,
	};

	let mut root = decoder.retrieve()?;
	if decoder.saw_backref {
		decoder.objects.fixup(&mut root);
	}
	if decoder.cursor.remaining() > 0 {
		debug!(at = decoder.cursor.pos(), trailing = decoder.cursor.remaining(), "ignoring bytes after root record");
	}
	Ok(root)
}

/// Per-call decode state.
struct Decoder<'a, 'o> {
	cursor: Cursor<'a>,
	layout: NumericLayout,
	objects: ObjectTable,
	classes: ClassRegistry,
	saw_backref: bool,
	depth: u32,
	opt: &'o DecodeOptions,
	guesser: &'o dyn ScalarGuesser,
}

impl Decoder<'_, '_> {
	/// Read one record, reserving its object slot before the payload.
	fn retrieve(&mut self) -> Result<Value> {
		if self.depth >= self.opt.max_depth {
			return Err(StorableError::DepthExceeded { max_depth: self.opt.max_depth });
		}

		let at = self.cursor.pos();
		let byte = self.cursor.read_u8()?;
		let op = Opcode::from_byte(byte).ok_or(StorableError::UnknownOpcode { opcode: byte, at })?;
		trace!(opcode = op.name(), at, depth = self.depth, "record");

		let slot = op.claims_slot().then(|| self.objects.reserve());
		self.depth += 1;
		let value = self.dispatch(op);
		self.depth -= 1;
		let value = value?;

		if let Some(slot) = slot {
			self.objects.store(slot, value.clone());
		}
		Ok(value)
	}

	/// Every arm is a single call so the recursive frame stays small.
	fn dispatch(&mut self, op: Opcode) -> Result<Value> {
		match op {
			Opcode::Object => self.backref(),
			Opcode::LargeScalar => self.large_scalar(),
			Opcode::Scalar => self.small_scalar(),
			Opcode::Array => self.array(),
			Opcode::Hash => self.hash(),
			Opcode::Ref | Opcode::Overload | Opcode::TiedArray | Opcode::TiedHash | Opcode::TiedScalar => self.retrieve(),
			Opcode::Undef | Opcode::SvUndef => Ok(Value::Null),
			Opcode::Integer | Opcode::Double | Opcode::Byte | Opcode::NetInt => self.number(op),
			Opcode::SvYes => Ok(Value::Bool(true)),
			Opcode::SvNo => Ok(Value::Bool(false)),
			Opcode::Bless => self.bless(),
			Opcode::IxBless => self.ix_bless(),
			Opcode::Hook => self.hook(),
			Opcode::TiedKey => self.tied_key(),
			Opcode::TiedIdx => self.tied_idx(),
			Opcode::Utf8Str | Opcode::LargeUtf8Str => self.utf8(op == Opcode::LargeUtf8Str),
			Opcode::FlagHash => self.flag_hash(),
			Opcode::VString | Opcode::LargeVString => self.vstring(op == Opcode::LargeVString),
		}
	}

	/// Record length: size-width for the large variants, one byte otherwise.
	fn record_len(&mut self, large: bool) -> Result<usize> {
		if large {
			self.layout.read_len(&mut self.cursor)
		} else {
			Ok(usize::from(self.cursor.read_u8()?))
		}
	}

	#[inline(never)]
	fn number(&mut self, op: Opcode) -> Result<Value> {
		let value = match op {
			Opcode::Integer => Value::Int(self.layout.read_long(&mut self.cursor)?),
			Opcode::Double => Value::Float(self.layout.read_float(&mut self.cursor)?),
			Opcode::Byte => Value::Int(i64::from(self.cursor.read_u8()?) - 128),
			_ => Value::Int(i64::from(self.cursor.read_i32(Endianness::Big)?)),
		};
		Ok(value)
	}

	#[inline(never)]
	fn bless(&mut self) -> Result<Value> {
		let len = usize::from(self.cursor.read_u8()?);
		let name = self.cursor.read_exact(len)?;
		self.classes.register(name);
		self.retrieve()
	}

	#[inline(never)]
	fn ix_bless(&mut self) -> Result<Value> {
		let index = self.cursor.read_u8()?;
		self.classes.get(u64::from(index))?;
		self.retrieve()
	}

	#[inline(never)]
	fn tied_key(&mut self) -> Result<Value> {
		let value = self.retrieve()?;
		self.retrieve()?;
		Ok(value)
	}

	#[inline(never)]
	fn tied_idx(&mut self) -> Result<Value> {
		let value = self.retrieve()?;
		NumericLayout::read_network_u32(&mut self.cursor)?;
		Ok(value)
	}

	fn backref(&mut self) -> Result<Value> {
		let index = NumericLayout::read_network_u32(&mut self.cursor)?;
		if index as usize >= self.objects.len() {
			return Err(StorableError::BackrefOutOfRange {
				index,
				allocated: self.objects.len(),
			});
		}
		self.saw_backref = true;
		Ok(Value::PendingRef(index))
	}

	#[inline(never)]
	fn large_scalar(&mut self) -> Result<Value> {
		let len = self.layout.read_len(&mut self.cursor)?;
		let raw = self.cursor.read_exact(len)?;
		Ok(self.guesser.guess(raw))
	}

	#[inline(never)]
	fn small_scalar(&mut self) -> Result<Value> {
		let len = usize::from(self.cursor.read_u8()?);
		let raw = self.cursor.read_exact(len)?;
		Ok(self.guesser.guess(raw))
	}

	#[inline(never)]
	fn utf8(&mut self, large: bool) -> Result<Value> {
		let len = self.record_len(large)?;
		let at = self.cursor.pos();
		let raw = self.cursor.read_exact(len)?;
		std::str::from_utf8(raw)
			.map(|text| Value::String(text.to_owned()))
			.map_err(|_| StorableError::InvalidUtf8 { at })
	}

	#[inline(never)]
	fn vstring(&mut self, large: bool) -> Result<Value> {
		let len = self.record_len(large)?;
		let at = self.cursor.pos();
		let raw = self.cursor.read_exact(len)?;
		parse_vstring(raw).map(Value::VString).ok_or(StorableError::InvalidVString { at })
	}

	fn array(&mut self) -> Result<Value> {
		let count = self.layout.read_len(&mut self.cursor)?;
		let mut items = Vec::with_capacity(count.min(self.cursor.remaining()));
		for _ in 0..count {
			items.push(self.retrieve()?);
		}
		Ok(Value::array(items))
	}

	/// Hash entries are stored value first, then the length-prefixed key.
	fn hash(&mut self) -> Result<Value> {
		let count = self.layout.read_len(&mut self.cursor)?;
		let mut map = BTreeMap::new();
		for _ in 0..count {
			let value = self.retrieve()?;
			let key = self.read_key()?;
			map.insert(key, value);
		}
		Ok(Value::Hash(Rc::new(RefCell::new(map))))
	}

	#[inline(never)]
	fn flag_hash(&mut self) -> Result<Value> {
		if self.opt.strict {
			return Err(StorableError::UnsupportedFeature { feature: "flag hash" });
		}

		let _hash_flags = self.cursor.read_u8()?;
		let count = self.layout.read_len(&mut self.cursor)?;
		let mut map = BTreeMap::new();
		for _ in 0..count {
			let value = self.retrieve()?;
			let _key_flags = self.cursor.read_u8()?;
			let key = self.read_key()?;
			map.insert(key, value);
		}
		Ok(Value::Hash(Rc::new(RefCell::new(map))))
	}

	fn read_key(&mut self) -> Result<Key> {
		let len = self.layout.read_len(&mut self.cursor)?;
		let raw = self.cursor.read_exact(len)?;
		if self.opt.guess_keys {
			Ok(Key::from_guess(self.guesser.guess(raw), raw))
		} else {
			Ok(Key::Bytes(raw.to_vec()))
		}
	}

	#[inline(never)]
	fn hook(&mut self) -> Result<Value> {
		if self.opt.strict {
			return Err(StorableError::UnsupportedFeature { feature: "hook" });
		}

		let mut flags = self.cursor.read_u8()?;
		while flags & HOOK_NEED_RECURSE != 0 {
			self.retrieve()?;
			flags = self.cursor.read_u8()?;
		}

		if flags & HOOK_IDX_CLASSNAME != 0 {
			let index = if flags & HOOK_LARGE_CLASSLEN != 0 {
				u64::from(NumericLayout::read_network_u32(&mut self.cursor)?)
			} else {
				u64::from(self.cursor.read_u8()?)
			};
			self.classes.get(index)?;
		} else {
			let len = self.record_len(flags & HOOK_LARGE_CLASSLEN != 0)?;
			let name = self.cursor.read_exact(len)?;
			self.classes.register(name);
		}

		let mut args = BTreeMap::new();
		let payload_len = self.record_len(flags & HOOK_LARGE_STRLEN != 0)?;
		if payload_len > 0 {
			let raw = self.cursor.read_exact(payload_len)?;
			args.insert(0, self.guesser.guess(raw));
		}

		if flags & HOOK_HAS_LIST != 0 {
			let count = self.record_len(flags & HOOK_LARGE_LISTLEN != 0)?;
			for position in 1..=count {
				let index = NumericLayout::read_network_u32(&mut self.cursor)?;
				let arg = self.objects.get(index).unwrap_or(Value::Null);
				args.insert(u32::try_from(position).unwrap_or(u32::MAX), arg);
			}
		}

		let kind = HookKind::from_flags(flags);
		trace!(kind = kind.as_str(), args = args.len(), "hook frame");
		Ok(Value::Hook(HookFrame { kind, args }))
	}
}

/// Split a version-string payload such as `v1.22.333` into its components.
///
/// The leading byte is dropped, so a literal written without the `v` (`1.2.3`)
/// leaves an empty first piece. Empty pieces are skipped.
fn parse_vstring(raw: &[u8]) -> Option<Vec<u64>> {
	let body = raw.get(1..).unwrap_or_default();
	let text = std::str::from_utf8(body).ok()?;
	text.split('.').filter(|part| !part.is_empty()).map(|part| part.parse::<u64>().ok()).collect()
}

#[cfg(test)]
mod tests;
