use crate::codec::Value;

/// Policy that turns untyped scalar payloads into values.
///
/// Applied to plain scalar records, hook payload strings and, when
/// [`DecodeOptions::guess_keys`](crate::codec::DecodeOptions::guess_keys) is
/// set, hash keys. Typed numeric records and UTF-8 records bypass it.
pub trait ScalarGuesser {
	/// Interpret one raw scalar payload.
	fn guess(&self, raw: &[u8]) -> Value;
}

/// Default policy: integer, then float, then 7-bit text, then raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeGuess;

/// Policy that never retypes scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

/// Policy that yields UTF-8 text where possible and raw bytes otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Text;

impl ScalarGuesser for TypeGuess {
	fn guess(&self, raw: &[u8]) -> Value {
		let Ok(text) = std::str::from_utf8(raw) else {
			return Value::Bytes(raw.to_vec());
		};

		if let Some(value) = guess_number(text) {
			return value;
		}
		if text.is_ascii() {
			return Value::String(text.to_owned());
		}
		Value::Bytes(raw.to_vec())
	}
}

impl ScalarGuesser for RawBytes {
	fn guess(&self, raw: &[u8]) -> Value {
		Value::Bytes(raw.to_vec())
	}
}

impl ScalarGuesser for Utf8Text {
	fn guess(&self, raw: &[u8]) -> Value {
		match std::str::from_utf8(raw) {
			Ok(text) => Value::String(text.to_owned()),
			Err(_) => Value::Bytes(raw.to_vec()),
		}
	}
}

/// Numeric reading of scalar text, if any.
///
/// Integral floats are only returned as integers when the text itself is an
/// integer literal; `"5.0"` and `"1e3"` stay text, as do integer literals that
/// overflow `i64`. Non-finite spellings (`"inf"`, `"nan"`) and overflowing
/// exponents (`"1e400"`) are floats.
fn guess_number(text: &str) -> Option<Value> {
	if let Ok(int) = text.parse::<i64>() {
		if int.to_string() == text {
			return Some(Value::Int(int));
		}
	}

	let trimmed = text.trim();
	let float = trimmed.parse::<f64>().ok()?;
	if !float.is_finite() || float.fract() != 0.0 {
		return Some(Value::Float(float));
	}
	trimmed.parse::<i64>().ok().map(Value::Int)
}
