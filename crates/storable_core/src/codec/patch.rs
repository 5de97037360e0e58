//! In-place edits of serialized hashes.
//!
//! Only top-level hashes in network order are supported. Existing keys are
//! rewritten byte-for-byte, so the replacement must encode to the same record
//! type (and, for sized values, the same length) as the value it replaces. Any
//! sharing or class information elsewhere in the stream is preserved.

use tracing::debug;

use crate::codec::{Cursor, EncodeOptions, Endianness, Opcode, Result, StorableError, StreamHeader, Value, decode, encode_with};

/// Set `key` in a serialized top-level hash to `value`.
pub fn modify_hash(serialized: &[u8], key: &str, value: &Value) -> Result<Vec<u8>> {
	let encoded = encode_with(value, &EncodeOptions::body_only())?;
	patch(serialized, key, Some(value), &encoded)
}

/// Set `key` to an already-encoded record, skipping the length check.
pub fn modify_hash_raw(serialized: &[u8], key: &str, encoded: &[u8]) -> Result<Vec<u8>> {
	patch(serialized, key, None, encoded)
}

fn patch(serialized: &[u8], key: &str, value: Option<&Value>, encoded: &[u8]) -> Result<Vec<u8>> {
	let mut cursor = Cursor::new(serialized);
	let header = StreamHeader::parse(&mut cursor)?;
	if !header.netorder {
		return Err(StorableError::PatchRejected {
			reason: "stream is not in network order",
		});
	}
	let root_at = cursor.pos();
	if serialized.get(root_at) != Some(&Opcode::Hash.byte()) {
		return Err(StorableError::PatchRejected {
			reason: "root record is not a hash",
		});
	}
	let count_at = root_at + 1;

	let root = decode(serialized)?;
	let existing = root.get(key);
	let mut key_record = encoded_len(key.len())?.to_vec();
	key_record.extend_from_slice(key.as_bytes());

	let patched = match &existing {
		Some(existing) => replace_value(serialized, &key_record, existing, value, encoded),
		None => append_entry(serialized, count_at, &key_record, encoded),
	};
	root.release();

	debug!(key, replaced = existing.is_some(), "patched hash");
	patched
}

fn replace_value(serialized: &[u8], key_record: &[u8], existing: &Value, value: Option<&Value>, encoded: &[u8]) -> Result<Vec<u8>> {
	let mut hits = serialized
		.windows(key_record.len())
		.enumerate()
		.filter(|(_, window)| *window == key_record)
		.map(|(at, _)| at);
	let (Some(key_at), None) = (hits.next(), hits.next()) else {
		return Err(StorableError::PatchRejected {
			reason: "key encoding is not unique in the stream",
		});
	};

	if let Some(new_len) = value.and_then(Value::len) {
		if existing.len() != Some(new_len) {
			return Err(StorableError::PatchRejected {
				reason: "replacement length differs from the existing value",
			});
		}
	}

	let value_at = key_at.checked_sub(encoded.len()).ok_or(StorableError::PatchRejected {
		reason: "replacement is longer than the stream prefix",
	})?;
	if encoded.first() != serialized.get(value_at) {
		return Err(StorableError::PatchRejected {
			reason: "replacement record type differs from the existing value",
		});
	}

	Ok([&serialized[..value_at], encoded, &serialized[key_at..]].concat())
}

fn append_entry(serialized: &[u8], count_at: usize, key_record: &[u8], encoded: &[u8]) -> Result<Vec<u8>> {
	let mut cursor = Cursor::new(serialized);
	cursor.rewind_to(count_at);
	let count = cursor.read_u32(Endianness::Big)?;
	let count = count.checked_add(1).ok_or(StorableError::PatchRejected {
		reason: "hash entry count overflows",
	})?;

	let mut out = Vec::with_capacity(serialized.len() + encoded.len() + key_record.len());
	out.extend_from_slice(&serialized[..count_at]);
	out.extend_from_slice(&count.to_be_bytes());
	out.extend_from_slice(&serialized[count_at + 4..]);
	out.extend_from_slice(encoded);
	out.extend_from_slice(key_record);
	Ok(out)
}

fn encoded_len(len: usize) -> Result<[u8; 4]> {
	u32::try_from(len).map(u32::to_be_bytes).map_err(|_| StorableError::OutOfRange {
		value: i64::try_from(len).unwrap_or(i64::MAX),
		repr: "u32 length",
	})
}
