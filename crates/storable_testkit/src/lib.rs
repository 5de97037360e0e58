//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Byte-level writer for synthetic Storable streams.
///
/// Size fields and native integers follow the widths declared by the chosen
/// header; back-reference indices are always big-endian.
#[derive(Debug, Clone)]
pub struct StreamBuilder {
	bytes: Vec<u8>,
	little: bool,
	int_size: u8,
	long_size: u8,
}

impl StreamBuilder {
	/// Network-order stream header (`05 09`) without container magic.
	pub fn network() -> Self {
		Self::body().bytes(&[0x05, 0x09])
	}

	/// Network-order stream with the `pst0` container magic.
	pub fn network_file() -> Self {
		Self::body().bytes(b"pst0").bytes(&[0x05, 0x09])
	}

	/// Native little-endian header with 4-byte sizes and 8-byte longs.
	pub fn native_le64() -> Self {
		let mut builder = Self::body().bytes(&[0x04, 0x0b, 0x08]).bytes(b"12345678").bytes(&[4, 8, 8, 8]);
		builder.little = true;
		builder.long_size = 8;
		builder
	}

	/// Native big-endian header with 4-byte sizes and 4-byte longs.
	pub fn native_be32() -> Self {
		let mut builder = Self::body().bytes(&[0x04, 0x0b, 0x04]).bytes(b"4321").bytes(&[4, 4, 4, 8]);
		builder.long_size = 4;
		builder
	}

	/// Headerless body using network widths.
	pub fn body() -> Self {
		Self {
			bytes: Vec::new(),
			little: false,
			int_size: 4,
			long_size: 8,
		}
	}

	/// Append one raw byte.
	pub fn byte(mut self, byte: u8) -> Self {
		self.bytes.push(byte);
		self
	}

	/// Append raw bytes.
	pub fn bytes(mut self, bytes: &[u8]) -> Self {
		self.bytes.extend_from_slice(bytes);
		self
	}

	/// Append a size field in the declared width and order.
	pub fn size(self, value: u64) -> Self {
		let encoded = self.sized(value, self.int_size);
		self.bytes(&encoded)
	}

	/// Append a big-endian `u32`.
	pub fn net_u32(self, value: u32) -> Self {
		self.bytes(&value.to_be_bytes())
	}

	/// Short scalar record (`0x0a`).
	pub fn scalar(self, raw: &[u8]) -> Self {
		let len = u8::try_from(raw.len()).expect("short scalar fits one length byte");
		self.byte(0x0a).byte(len).bytes(raw)
	}

	/// Long scalar record (`0x01`).
	pub fn large_scalar(self, raw: &[u8]) -> Self {
		self.byte(0x01).size(raw.len() as u64).bytes(raw)
	}

	/// Short UTF-8 record (`0x17`).
	pub fn utf8(self, text: &str) -> Self {
		let len = u8::try_from(text.len()).expect("short utf8 fits one length byte");
		self.byte(0x17).byte(len).bytes(text.as_bytes())
	}

	/// Array header (`0x02`); elements follow.
	pub fn array(self, count: u64) -> Self {
		self.byte(0x02).size(count)
	}

	/// Hash header (`0x03`); entries follow as value then [`StreamBuilder::key`].
	pub fn hash(self, count: u64) -> Self {
		self.byte(0x03).size(count)
	}

	/// Length-prefixed hash key.
	pub fn key(self, raw: &[u8]) -> Self {
		self.size(raw.len() as u64).bytes(raw)
	}

	/// Reference wrapper (`0x04`); the referent follows.
	pub fn reference(self) -> Self {
		self.byte(0x04)
	}

	/// Already-seen object record (`0x00`).
	pub fn backref(self, index: u32) -> Self {
		self.byte(0x00).net_u32(index)
	}

	/// Undefined scalar (`0x05`).
	pub fn undef(self) -> Self {
		self.byte(0x05)
	}

	/// Biased byte record (`0x08`) for values in `-128..=127`.
	pub fn small_int(self, value: i8) -> Self {
		self.byte(0x08).byte((i16::from(value) + 128) as u8)
	}

	/// Network integer record (`0x09`).
	pub fn net_int(self, value: i32) -> Self {
		self.byte(0x09).bytes(&value.to_be_bytes())
	}

	/// Native integer record (`0x06`) in the declared long width.
	pub fn integer(self, value: i64) -> Self {
		let encoded = self.sized(value as u64, self.long_size);
		self.byte(0x06).bytes(&encoded)
	}

	/// Native double record (`0x07`).
	pub fn double(self, value: f64) -> Self {
		let encoded = if self.little { value.to_le_bytes() } else { value.to_be_bytes() };
		self.byte(0x07).bytes(&encoded)
	}

	/// Class blessing by name (`0x11`); the blessed record follows.
	pub fn bless(self, class: &str) -> Self {
		let len = u8::try_from(class.len()).expect("class name fits one length byte");
		self.byte(0x11).byte(len).bytes(class.as_bytes())
	}

	/// Class blessing by registry index (`0x12`); the blessed record follows.
	pub fn ix_bless(self, index: u8) -> Self {
		self.byte(0x12).byte(index)
	}

	/// Finished stream bytes.
	pub fn finish(self) -> Vec<u8> {
		self.bytes
	}

	fn sized(&self, value: u64, width: u8) -> Vec<u8> {
		let width = usize::from(width);
		if self.little {
			value.to_le_bytes()[..width].to_vec()
		} else {
			value.to_be_bytes()[8 - width..].to_vec()
		}
	}
}
