use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, StorableError>;

/// Coarse failure class for a [`StorableError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The stream ended before a record was complete.
	Truncated,
	/// The stream is structurally invalid.
	Decode,
	/// A recognized record whose semantics are not implemented (strict mode only).
	UnsupportedFeature,
	/// A value shape with no wire representation.
	UnsupportedType,
	/// A value out of range for the chosen wire representation.
	Range,
	/// Filesystem failure.
	Io,
}

/// Errors produced while decoding, encoding, and patching Storable streams.
#[derive(Debug, Error)]
pub enum StorableError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Opcode byte is not part of the record table.
	#[error("unknown opcode 0x{opcode:02x} at offset {at}")]
	UnknownOpcode {
		/// Offending opcode byte.
		opcode: u8,
		/// Offset of the opcode byte.
		at: usize,
	},
	/// Bless-by-index or hook record referenced a class that was never registered.
	#[error("class index out of range: idx={index}, registered={len}")]
	ClassIndexOutOfRange {
		/// Requested registry index.
		index: u64,
		/// Number of registered class names.
		len: usize,
	},
	/// Already-seen-object record pointed at an index not allocated yet.
	#[error("back-reference out of range: idx={index}, allocated={allocated}")]
	BackrefOutOfRange {
		/// Referenced object index.
		index: u32,
		/// Objects allocated so far.
		allocated: usize,
	},
	/// Header declared a float width wider than 8 bytes.
	#[error("cannot handle {size} byte doubles")]
	FloatTooWide {
		/// Declared float width.
		size: u8,
	},
	/// Header declared an integer or float width outside the supported table.
	#[error("unsupported {field} width {size}")]
	UnsupportedWidth {
		/// Header field carrying the width.
		field: &'static str,
		/// Declared width in bytes.
		size: u8,
	},
	/// UTF-8 tagged scalar did not hold valid UTF-8.
	#[error("invalid utf-8 scalar at offset {at}")]
	InvalidUtf8 {
		/// Offset of the scalar payload.
		at: usize,
	},
	/// Version-string record had a non-numeric component.
	#[error("invalid vstring at offset {at}")]
	InvalidVString {
		/// Offset of the vstring payload.
		at: usize,
	},
	/// Recursion depth exceeded configured limit.
	#[error("depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Strict mode refused a record whose semantics are only partially understood.
	#[error("unsupported feature: {feature}")]
	UnsupportedFeature {
		/// Record family.
		feature: &'static str,
	},
	/// Value shape has no wire representation.
	#[error("unable to serialize value of kind {kind}")]
	UnsupportedType {
		/// Value kind label.
		kind: &'static str,
	},
	/// Value does not fit the selected wire representation.
	#[error("value {value} out of range for {repr}")]
	OutOfRange {
		/// Offending value.
		value: i64,
		/// Wire representation label.
		repr: &'static str,
	},
	/// Hash patch precondition failed.
	#[error("hash patch rejected: {reason}")]
	PatchRejected {
		/// Violated precondition.
		reason: &'static str,
	},
}

impl StorableError {
	/// Map this error to its failure class.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::UnexpectedEof { .. } => ErrorKind::Truncated,
			Self::UnknownOpcode { .. }
			| Self::ClassIndexOutOfRange { .. }
			| Self::BackrefOutOfRange { .. }
			| Self::FloatTooWide { .. }
			| Self::UnsupportedWidth { .. }
			| Self::InvalidUtf8 { .. }
			| Self::InvalidVString { .. }
			| Self::DepthExceeded { .. } => ErrorKind::Decode,
			Self::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
			Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
			Self::OutOfRange { .. } | Self::PatchRejected { .. } => ErrorKind::Range,
		}
	}
}
