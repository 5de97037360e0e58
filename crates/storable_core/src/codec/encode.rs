use crate::codec::{DecodeOptions, FILE_MAGIC, Opcode, Result, StorableError, Value};

/// Largest magnitude written as scalar text rather than a double record.
const FLOAT_TEXT_LIMIT: f64 = 2_147_483_647.0;

/// Encode behavior controls.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
	/// Prefix the stream with the `pst0` container magic.
	pub container_magic: bool,
	/// Raw magic and minor version bytes; the magic byte should mark network order.
	pub version: Option<(u8, u8)>,
	/// Precede arrays and hashes below the root with a reference record.
	pub nested_refs: bool,
	/// Maximum container nesting depth.
	pub max_depth: u32,
}

impl Default for EncodeOptions {
	fn default() -> Self {
		Self {
			container_magic: true,
			version: Some((5, 9)),
			nested_refs: false,
			max_depth: DecodeOptions::DEFAULT_MAX_DEPTH,
		}
	}
}

impl EncodeOptions {
	/// Record body only: no magic, no version bytes.
	pub fn body_only() -> Self {
		Self {
			container_magic: false,
			version: None,
			..Self::default()
		}
	}

	/// In-memory "frozen" form: version bytes without the container magic.
	pub fn frozen() -> Self {
		Self {
			container_magic: false,
			..Self::default()
		}
	}
}

/// Encode a value as a network-order file stream.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
	encode_with(value, &EncodeOptions::default())
}

/// Encode a value with explicit prefix and nesting options.
pub fn encode_with(value: &Value, opt: &EncodeOptions) -> Result<Vec<u8>> {
	let mut encoder = Encoder { out: Vec::new(), opt, depth: 0 };
	if opt.container_magic {
		encoder.out.extend_from_slice(FILE_MAGIC);
	}
	if let Some((magic, minor)) = opt.version {
		encoder.out.extend_from_slice(&[magic, minor]);
	}
	encoder.write(value)?;
	Ok(encoder.out)
}

struct Encoder<'o> {
	out: Vec<u8>,
	opt: &'o EncodeOptions,
	depth: u32,
}

impl Encoder<'_> {
	fn write(&mut self, value: &Value) -> Result<()> {
		if self.depth >= self.opt.max_depth {
			return Err(StorableError::DepthExceeded { max_depth: self.opt.max_depth });
		}
		self.depth += 1;
		let result = self.write_record(value);
		self.depth -= 1;
		result
	}

	fn write_record(&mut self, value: &Value) -> Result<()> {
		match value {
			Value::Hash(map) => {
				self.nested_ref();
				let map = map.borrow();
				self.op(Opcode::Hash);
				self.count(map.len())?;
				for (key, item) in map.iter() {
					self.write(item)?;
					let key = key.to_bytes();
					self.count(key.len())?;
					self.out.extend_from_slice(&key);
				}
			}
			Value::Array(items) => {
				self.nested_ref();
				let items = items.borrow();
				self.op(Opcode::Array);
				self.count(items.len())?;
				for item in items.iter() {
					self.write(item)?;
				}
			}
			Value::Bool(flag) => self.int(i64::from(*flag))?,
			Value::Int(int) => self.int(*int)?,
			Value::Float(float) => {
				if float.abs() > FLOAT_TEXT_LIMIT {
					self.op(Opcode::Double);
					self.out.extend_from_slice(&float.to_be_bytes());
				} else {
					self.scalar(format!("{float:?}").as_bytes())?;
				}
			}
			Value::Null => self.op(Opcode::Undef),
			Value::String(text) if !text.is_ascii() => {
				self.op(Opcode::LargeUtf8Str);
				self.count(text.len())?;
				self.out.extend_from_slice(text.as_bytes());
			}
			Value::String(text) => self.scalar(text.as_bytes())?,
			Value::Bytes(raw) => self.scalar(raw)?,
			Value::VString(_) | Value::Hook(_) | Value::PendingRef(_) => {
				return Err(StorableError::UnsupportedType { kind: value.kind() });
			}
		}
		Ok(())
	}

	/// Integers pick the narrowest record: biased byte, network int, then text.
	fn int(&mut self, value: i64) -> Result<()> {
		if let Ok(byte) = small_int_byte(value) {
			self.op(Opcode::Byte);
			self.out.push(byte);
		} else if let Ok(net) = i32::try_from(value) {
			self.op(Opcode::NetInt);
			self.out.extend_from_slice(&net.to_be_bytes());
		} else {
			self.scalar(value.to_string().as_bytes())?;
		}
		Ok(())
	}

	/// Short scalar when the payload fits a one-byte length, long scalar otherwise.
	fn scalar(&mut self, raw: &[u8]) -> Result<()> {
		match u8::try_from(raw.len()) {
			Ok(len) => {
				self.op(Opcode::Scalar);
				self.out.push(len);
			}
			Err(_) => {
				self.op(Opcode::LargeScalar);
				self.count(raw.len())?;
			}
		}
		self.out.extend_from_slice(raw);
		Ok(())
	}

	fn count(&mut self, len: usize) -> Result<()> {
		let len = u32::try_from(len).map_err(|_| StorableError::OutOfRange {
			value: i64::try_from(len).unwrap_or(i64::MAX),
			repr: "u32 length",
		})?;
		self.out.extend_from_slice(&len.to_be_bytes());
		Ok(())
	}

	fn nested_ref(&mut self) {
		if self.opt.nested_refs && self.depth > 1 {
			self.op(Opcode::Ref);
		}
	}

	fn op(&mut self, op: Opcode) {
		self.out.push(op.byte());
	}
}

/// Bias a value in `-127..=127` into the byte record payload.
fn small_int_byte(value: i64) -> Result<u8> {
	if -128 < value && value < 128 {
		Ok((value + 128) as u8)
	} else {
		Err(StorableError::OutOfRange { value, repr: "signed byte" })
	}
}
