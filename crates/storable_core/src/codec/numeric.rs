use crate::codec::{Cursor, Endianness, Result, StorableError};

/// Integer widths the header may declare for size and long fields.
pub const INTEGER_WIDTHS: [u8; 3] = [2, 4, 8];
/// Float widths the header may declare for native doubles.
pub const FLOAT_WIDTHS: [u8; 2] = [4, 8];

/// Byte order and field widths negotiated by the stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericLayout {
	/// Byte order of size, long, and double fields.
	pub endianness: Endianness,
	/// Width of size/count fields in bytes.
	pub int_size: u8,
	/// Width of native integer records in bytes.
	pub long_size: u8,
	/// Width of native double records in bytes.
	pub nv_size: u8,
}

impl NumericLayout {
	/// Layout used by network-order streams.
	pub const NETWORK: Self = Self {
		endianness: Endianness::Big,
		int_size: 4,
		long_size: 8,
		nv_size: 8,
	};

	/// Build a layout, rejecting widths outside the supported tables.
	pub fn new(endianness: Endianness, int_size: u8, long_size: u8, nv_size: u8) -> Result<Self> {
		if !INTEGER_WIDTHS.contains(&int_size) {
			return Err(StorableError::UnsupportedWidth { field: "int", size: int_size });
		}
		if !INTEGER_WIDTHS.contains(&long_size) {
			return Err(StorableError::UnsupportedWidth { field: "long", size: long_size });
		}
		if nv_size > 8 {
			return Err(StorableError::FloatTooWide { size: nv_size });
		}
		if !FLOAT_WIDTHS.contains(&nv_size) {
			return Err(StorableError::UnsupportedWidth { field: "double", size: nv_size });
		}

		Ok(Self {
			endianness,
			int_size,
			long_size,
			nv_size,
		})
	}

	/// Read an unsigned size/count field.
	pub fn read_size(&self, cursor: &mut Cursor<'_>) -> Result<u64> {
		match self.int_size {
			2 => Ok(u64::from(cursor.read_u16(self.endianness)?)),
			4 => Ok(u64::from(cursor.read_u32(self.endianness)?)),
			8 => cursor.read_u64(self.endianness),
			size => Err(StorableError::UnsupportedWidth { field: "int", size }),
		}
	}

	/// Read a size field and narrow it to a byte length.
	///
	/// Lengths beyond `usize` saturate so the following read reports truncation.
	pub fn read_len(&self, cursor: &mut Cursor<'_>) -> Result<usize> {
		Ok(usize::try_from(self.read_size(cursor)?).unwrap_or(usize::MAX))
	}

	/// Read a signed native integer record.
	pub fn read_long(&self, cursor: &mut Cursor<'_>) -> Result<i64> {
		match self.long_size {
			2 => Ok(i64::from(cursor.read_i16(self.endianness)?)),
			4 => Ok(i64::from(cursor.read_i32(self.endianness)?)),
			8 => cursor.read_i64(self.endianness),
			size => Err(StorableError::UnsupportedWidth { field: "long", size }),
		}
	}

	/// Read a native double record, widening singles.
	pub fn read_float(&self, cursor: &mut Cursor<'_>) -> Result<f64> {
		match self.nv_size {
			4 => Ok(f64::from(cursor.read_f32(self.endianness)?)),
			8 => cursor.read_f64(self.endianness),
			size => Err(StorableError::UnsupportedWidth { field: "double", size }),
		}
	}

	/// Read a big-endian `u32`, regardless of the negotiated byte order.
	pub fn read_network_u32(cursor: &mut Cursor<'_>) -> Result<u32> {
		cursor.read_u32(Endianness::Big)
	}
}

#[cfg(test)]
mod tests {
	use crate::codec::{Cursor, Endianness, ErrorKind, NumericLayout, StorableError};

	#[test]
	fn network_layout_reads_big_endian_fields() {
		let layout = NumericLayout::NETWORK;
		let mut bytes = Vec::new();
		bytes.extend_from_slice(&7_u32.to_be_bytes());
		bytes.extend_from_slice(&(-9_i64).to_be_bytes());
		bytes.extend_from_slice(&2.5_f64.to_be_bytes());

		let mut cursor = Cursor::new(&bytes);
		assert_eq!(layout.read_size(&mut cursor).expect("size"), 7);
		assert_eq!(layout.read_long(&mut cursor).expect("long"), -9);
		assert_eq!(layout.read_float(&mut cursor).expect("double"), 2.5);
		assert_eq!(cursor.remaining(), 0);
	}

	#[test]
	fn native_layout_honors_widths() {
		let layout = NumericLayout::new(Endianness::Little, 2, 4, 4).expect("layout");
		let mut bytes = Vec::new();
		bytes.extend_from_slice(&300_u16.to_le_bytes());
		bytes.extend_from_slice(&(-70_000_i32).to_le_bytes());
		bytes.extend_from_slice(&0.5_f32.to_le_bytes());

		let mut cursor = Cursor::new(&bytes);
		assert_eq!(layout.read_size(&mut cursor).expect("size"), 300);
		assert_eq!(layout.read_long(&mut cursor).expect("long"), -70_000);
		assert_eq!(layout.read_float(&mut cursor).expect("float"), 0.5);
	}

	#[test]
	fn network_u32_ignores_negotiated_order() {
		let mut cursor = Cursor::new(&[0, 0, 1, 0]);
		assert_eq!(NumericLayout::read_network_u32(&mut cursor).expect("u32"), 256);
	}

	#[test]
	fn rejects_unknown_widths() {
		let err = NumericLayout::new(Endianness::Big, 3, 8, 8).expect_err("int width 3");
		assert!(matches!(err, StorableError::UnsupportedWidth { field: "int", size: 3 }));
		let err = NumericLayout::new(Endianness::Big, 4, 16, 8).expect_err("long width 16");
		assert!(matches!(err, StorableError::UnsupportedWidth { field: "long", size: 16 }));
		let err = NumericLayout::new(Endianness::Big, 4, 8, 16).expect_err("double width 16");
		assert!(matches!(err, StorableError::FloatTooWide { size: 16 }));
		assert_eq!(err.kind(), ErrorKind::Decode);
	}

	#[test]
	fn short_numeric_read_is_truncation() {
		let mut cursor = Cursor::new(&[0, 0]);
		let err = NumericLayout::NETWORK.read_float(&mut cursor).expect_err("short double");
		assert_eq!(err.kind(), ErrorKind::Truncated);
	}
}
