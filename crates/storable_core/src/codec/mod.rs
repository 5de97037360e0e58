mod bytes;
mod decode;
mod encode;
mod error;
mod file;
mod guess;
mod header;
mod numeric;
mod objects;
mod opcode;
mod patch;
mod value;

/// Bounded byte cursor.
pub use bytes::Cursor;
/// Record-tree decoding entry points and options.
pub use decode::{DecodeOptions, decode, decode_with};
/// Value encoding entry points and options.
pub use encode::{EncodeOptions, encode, encode_with};
/// Error and result aliases.
pub use error::{ErrorKind, Result, StorableError};
/// Container-file retrieval.
pub use file::{decode_file, decode_file_with};
/// Scalar typing policies.
pub use guess::{RawBytes, ScalarGuesser, TypeGuess, Utf8Text};
/// Stream header representation.
pub use header::{Endianness, FILE_MAGIC, StreamHeader};
/// Negotiated numeric widths.
pub use numeric::{FLOAT_WIDTHS, INTEGER_WIDTHS, NumericLayout};
/// Object and class tables used while decoding.
pub use objects::{ClassRegistry, ObjectTable};
/// Record tag table.
pub use opcode::Opcode;
/// In-place hash patching.
pub use patch::{modify_hash, modify_hash_raw};
/// Decoded value types.
pub use value::{Array, Hash, HookFrame, HookKind, Key, Value};
