use std::path::Path;

use tracing::debug;

use crate::codec::{DecodeOptions, FILE_MAGIC, Result, ScalarGuesser, TypeGuess, Value, decode_with};

/// Read and decode a container-prefixed file.
///
/// Returns `Ok(None)` when the file does not start with the `pst0` magic.
pub fn decode_file(path: impl AsRef<Path>) -> Result<Option<Value>> {
	decode_file_with(path, &DecodeOptions::default(), &TypeGuess)
}

/// Read and decode a container-prefixed file with explicit options.
pub fn decode_file_with(path: impl AsRef<Path>, opt: &DecodeOptions, guesser: &dyn ScalarGuesser) -> Result<Option<Value>> {
	let path = path.as_ref();
	let bytes = std::fs::read(path)?;
	if !bytes.starts_with(FILE_MAGIC) {
		debug!(path = %path.display(), "no container magic");
		return Ok(None);
	}

	debug!(path = %path.display(), len = bytes.len(), "retrieving");
	decode_with(&bytes, opt, guesser).map(Some)
}
