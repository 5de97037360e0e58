use crate::codec::{Endianness, Result, StorableError};

/// Simple bounded forward cursor over an immutable byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Move back to an earlier offset returned by [`Cursor::pos`].
	///
	/// Offsets past the end clamp to the end of the buffer.
	pub fn rewind_to(&mut self, pos: usize) {
		self.pos = pos.min(self.bytes.len());
	}

	/// Return up to `n` upcoming bytes without consuming them.
	pub fn peek(&self, n: usize) -> &'a [u8] {
		let end = self.pos.saturating_add(n).min(self.bytes.len());
		&self.bytes[self.pos..end]
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(StorableError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read one unsigned byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_exact(1)?[0])
	}

	/// Read a `u16` using the selected endianness.
	pub fn read_u16(&mut self, endianness: Endianness) -> Result<u16> {
		let buf = self.read_array::<2>()?;
		Ok(match endianness {
			Endianness::Little => u16::from_le_bytes(buf),
			Endianness::Big => u16::from_be_bytes(buf),
		})
	}

	/// Read a `u32` using the selected endianness.
	pub fn read_u32(&mut self, endianness: Endianness) -> Result<u32> {
		let buf = self.read_array::<4>()?;
		Ok(match endianness {
			Endianness::Little => u32::from_le_bytes(buf),
			Endianness::Big => u32::from_be_bytes(buf),
		})
	}

	/// Read a `u64` using the selected endianness.
	pub fn read_u64(&mut self, endianness: Endianness) -> Result<u64> {
		let buf = self.read_array::<8>()?;
		Ok(match endianness {
			Endianness::Little => u64::from_le_bytes(buf),
			Endianness::Big => u64::from_be_bytes(buf),
		})
	}

	/// Read an `i16` using the selected endianness.
	pub fn read_i16(&mut self, endianness: Endianness) -> Result<i16> {
		let buf = self.read_array::<2>()?;
		Ok(match endianness {
			Endianness::Little => i16::from_le_bytes(buf),
			Endianness::Big => i16::from_be_bytes(buf),
		})
	}

	/// Read an `i32` using the selected endianness.
	pub fn read_i32(&mut self, endianness: Endianness) -> Result<i32> {
		let buf = self.read_array::<4>()?;
		Ok(match endianness {
			Endianness::Little => i32::from_le_bytes(buf),
			Endianness::Big => i32::from_be_bytes(buf),
		})
	}

	/// Read an `i64` using the selected endianness.
	pub fn read_i64(&mut self, endianness: Endianness) -> Result<i64> {
		let buf = self.read_array::<8>()?;
		Ok(match endianness {
			Endianness::Little => i64::from_le_bytes(buf),
			Endianness::Big => i64::from_be_bytes(buf),
		})
	}

	/// Read an IEEE-754 single using the selected endianness.
	pub fn read_f32(&mut self, endianness: Endianness) -> Result<f32> {
		Ok(f32::from_bits(self.read_u32(endianness)?))
	}

	/// Read an IEEE-754 double using the selected endianness.
	pub fn read_f64(&mut self, endianness: Endianness) -> Result<f64> {
		Ok(f64::from_bits(self.read_u64(endianness)?))
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use crate::codec::{Cursor, Endianness, ErrorKind, StorableError};

	#[test]
	fn read_exact_advances_and_reports_eof() {
		let mut cursor = Cursor::new(b"abcde");
		assert_eq!(cursor.read_exact(2).expect("two bytes"), b"ab");
		assert_eq!(cursor.pos(), 2);
		assert_eq!(cursor.remaining(), 3);

		let err = cursor.read_exact(4).expect_err("short read fails");
		assert!(matches!(err, StorableError::UnexpectedEof { at: 2, need: 4, rem: 3 }));
		assert_eq!(err.kind(), ErrorKind::Truncated);
		assert_eq!(cursor.pos(), 2, "failed read must not move the cursor");
	}

	#[test]
	fn peek_and_rewind_support_header_probing() {
		let mut cursor = Cursor::new(b"pst0\x05\x09");
		assert_eq!(cursor.peek(4), b"pst0");
		assert_eq!(cursor.peek(64), b"pst0\x05\x09");

		let mark = cursor.pos();
		let _ = cursor.read_exact(4).expect("magic");
		cursor.rewind_to(mark);
		assert_eq!(cursor.read_u8().expect("first byte"), b'p');
	}

	#[test]
	fn fixed_width_reads_honor_endianness() {
		let bytes = [0x01, 0x02, 0x03, 0x04];
		assert_eq!(Cursor::new(&bytes).read_u32(Endianness::Big).expect("u32"), 0x0102_0304);
		assert_eq!(Cursor::new(&bytes).read_u32(Endianness::Little).expect("u32"), 0x0403_0201);
		assert_eq!(Cursor::new(&[0xff, 0xfe]).read_i16(Endianness::Big).expect("i16"), -2);
		assert_eq!(Cursor::new(&1.5_f64.to_le_bytes()).read_f64(Endianness::Little).expect("f64"), 1.5);
		assert_eq!(Cursor::new(&0.25_f32.to_be_bytes()).read_f32(Endianness::Big).expect("f32"), 0.25);
	}
}
