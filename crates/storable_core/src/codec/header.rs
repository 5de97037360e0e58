use tracing::debug;

use crate::codec::{Cursor, NumericLayout, Result};

/// Container magic written by file-based stores.
pub const FILE_MAGIC: &[u8; 4] = b"pst0";

/// Byte-order signatures that mean little-endian (32-bit and 64-bit x86).
const LITTLE_ENDIAN_SIGNATURES: [&[u8]; 2] = [b"1234", b"12345678"];

/// Byte order of multi-byte header-governed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// Little-endian byte order.
	Little,
	/// Big-endian (network) byte order.
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Negotiated stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
	/// Whether the stream started with the `pst0` container magic.
	pub container: bool,
	/// Whether the stream was written in network order.
	pub netorder: bool,
	/// Major format version (magic byte shifted right by one).
	pub major: u8,
	/// Minor format version.
	pub minor: u8,
	/// Architecture byte-order signature; absent for network-order streams.
	pub byteorder: Option<Box<[u8]>>,
	/// Pointer width in bytes; informational only.
	pub ptr_size: u8,
	/// Byte order and widths for the rest of the stream.
	pub layout: NumericLayout,
}

impl StreamHeader {
	/// First version whose native headers carry a double-width byte.
	pub const NV_SIZE_SINCE: (u8, u8) = (2, 2);
	/// Pointer width assumed for network-order streams.
	pub const NETWORK_PTR_SIZE: u8 = 4;

	/// Parse the header at the cursor, leaving it at the first record opcode.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		let container = probe_file_magic(cursor);

		let magic = cursor.read_u8()?;
		let netorder = magic & 1 == 1;
		let major = magic >> 1;
		let minor = cursor.read_u8()?;

		let header = if netorder {
			Self {
				container,
				netorder,
				major,
				minor,
				byteorder: None,
				ptr_size: Self::NETWORK_PTR_SIZE,
				layout: NumericLayout::NETWORK,
			}
		} else {
			let len = usize::from(cursor.read_u8()?);
			let byteorder = cursor.read_exact(len)?;
			let endianness = if LITTLE_ENDIAN_SIGNATURES.iter().any(|signature| *signature == byteorder) {
				Endianness::Little
			} else {
				Endianness::Big
			};

			let sizes = cursor.read_exact(3)?;
			let (int_size, long_size, ptr_size) = (sizes[0], sizes[1], sizes[2]);
			let nv_size = if (major, minor) >= Self::NV_SIZE_SINCE { cursor.read_u8()? } else { 8 };

			Self {
				container,
				netorder,
				major,
				minor,
				byteorder: Some(byteorder.into()),
				ptr_size,
				layout: NumericLayout::new(endianness, int_size, long_size, nv_size)?,
			}
		};

		debug!(
			container = header.container,
			netorder = header.netorder,
			major = header.major,
			minor = header.minor,
			endianness = header.layout.endianness.as_str(),
			int_size = header.layout.int_size,
			long_size = header.layout.long_size,
			nv_size = header.layout.nv_size,
			"negotiated header"
		);
		Ok(header)
	}

	/// Return `(major, minor)`.
	pub fn version(&self) -> (u8, u8) {
		(self.major, self.minor)
	}
}

/// Consume the container magic if present, otherwise leave the cursor untouched.
fn probe_file_magic(cursor: &mut Cursor<'_>) -> bool {
	let mark = cursor.pos();
	match cursor.read_exact(FILE_MAGIC.len()) {
		Ok(magic) if magic == FILE_MAGIC => true,
		_ => {
			cursor.rewind_to(mark);
			false
		}
	}
}
