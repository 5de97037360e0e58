/// Record tags understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
	/// Already-seen object, by table index.
	Object,
	/// Scalar with size-width length.
	LargeScalar,
	/// Array with size-width count.
	Array,
	/// Hash with size-width count.
	Hash,
	/// Reference to the following record.
	Ref,
	/// Undefined scalar.
	Undef,
	/// Native-width signed integer.
	Integer,
	/// Native-width double.
	Double,
	/// Biased signed byte.
	Byte,
	/// Big-endian signed 32-bit integer.
	NetInt,
	/// Scalar with 1-byte length.
	Scalar,
	/// Tied array wrapper.
	TiedArray,
	/// Tied hash wrapper.
	TiedHash,
	/// Tied scalar wrapper.
	TiedScalar,
	/// Immortal undef.
	SvUndef,
	/// Immortal true.
	SvYes,
	/// Immortal false.
	SvNo,
	/// Blessed by class name.
	Bless,
	/// Blessed by class registry index.
	IxBless,
	/// Hook-serialized object.
	Hook,
	/// Overloaded reference wrapper.
	Overload,
	/// Tied hash element.
	TiedKey,
	/// Tied array element.
	TiedIdx,
	/// UTF-8 text with 1-byte length.
	Utf8Str,
	/// UTF-8 text with size-width length.
	LargeUtf8Str,
	/// Hash carrying per-key flags.
	FlagHash,
	/// Version string with 1-byte length.
	VString,
	/// Version string with size-width length.
	LargeVString,
}

impl Opcode {
	/// Map a tag byte to an opcode.
	pub fn from_byte(byte: u8) -> Option<Self> {
		Some(match byte {
			0x00 => Self::Object,
			0x01 => Self::LargeScalar,
			0x02 => Self::Array,
			0x03 => Self::Hash,
			0x04 => Self::Ref,
			0x05 => Self::Undef,
			0x06 => Self::Integer,
			0x07 => Self::Double,
			0x08 => Self::Byte,
			0x09 => Self::NetInt,
			0x0a => Self::Scalar,
			0x0b => Self::TiedArray,
			0x0c => Self::TiedHash,
			0x0d => Self::TiedScalar,
			0x0e => Self::SvUndef,
			0x0f => Self::SvYes,
			0x10 => Self::SvNo,
			0x11 => Self::Bless,
			0x12 => Self::IxBless,
			0x13 => Self::Hook,
			0x14 => Self::Overload,
			0x15 => Self::TiedKey,
			0x16 => Self::TiedIdx,
			0x17 => Self::Utf8Str,
			0x18 => Self::LargeUtf8Str,
			0x19 => Self::FlagHash,
			0x1d => Self::VString,
			0x1e => Self::LargeVString,
			_ => return None,
		})
	}

	/// Wire tag byte.
	pub fn byte(self) -> u8 {
		match self {
			Self::Object => 0x00,
			Self::LargeScalar => 0x01,
			Self::Array => 0x02,
			Self::Hash => 0x03,
			Self::Ref => 0x04,
			Self::Undef => 0x05,
			Self::Integer => 0x06,
			Self::Double => 0x07,
			Self::Byte => 0x08,
			Self::NetInt => 0x09,
			Self::Scalar => 0x0a,
			Self::TiedArray => 0x0b,
			Self::TiedHash => 0x0c,
			Self::TiedScalar => 0x0d,
			Self::SvUndef => 0x0e,
			Self::SvYes => 0x0f,
			Self::SvNo => 0x10,
			Self::Bless => 0x11,
			Self::IxBless => 0x12,
			Self::Hook => 0x13,
			Self::Overload => 0x14,
			Self::TiedKey => 0x15,
			Self::TiedIdx => 0x16,
			Self::Utf8Str => 0x17,
			Self::LargeUtf8Str => 0x18,
			Self::FlagHash => 0x19,
			Self::VString => 0x1d,
			Self::LargeVString => 0x1e,
		}
	}

	/// Stable uppercase record name, as used in trace output.
	pub fn name(self) -> &'static str {
		match self {
			Self::Object => "OBJECT",
			Self::LargeScalar => "LSCALAR",
			Self::Array => "ARRAY",
			Self::Hash => "HASH",
			Self::Ref => "REF",
			Self::Undef => "UNDEF",
			Self::Integer => "INTEGER",
			Self::Double => "DOUBLE",
			Self::Byte => "BYTE",
			Self::NetInt => "NETINT",
			Self::Scalar => "SCALAR",
			Self::TiedArray => "TIED_ARRAY",
			Self::TiedHash => "TIED_HASH",
			Self::TiedScalar => "TIED_SCALAR",
			Self::SvUndef => "SV_UNDEF",
			Self::SvYes => "SV_YES",
			Self::SvNo => "SV_NO",
			Self::Bless => "BLESS",
			Self::IxBless => "IX_BLESS",
			Self::Hook => "HOOK",
			Self::Overload => "OVERLOAD",
			Self::TiedKey => "TIED_KEY",
			Self::TiedIdx => "TIED_IDX",
			Self::Utf8Str => "UTF8STR",
			Self::LargeUtf8Str => "LUTF8STR",
			Self::FlagHash => "FLAG_HASH",
			Self::VString => "VSTRING",
			Self::LargeVString => "LVSTRING",
		}
	}

	/// Whether the record occupies a slot in the object table.
	///
	/// Back-references and pure wrappers do not; the record they wrap takes
	/// the slot instead.
	pub fn claims_slot(self) -> bool {
		!matches!(
			self,
			Self::Object | Self::TiedArray | Self::TiedHash | Self::TiedScalar | Self::Bless | Self::IxBless
		)
	}
}
