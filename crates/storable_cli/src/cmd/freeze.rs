use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use storable::codec::{EncodeOptions, encode_with};
use tracing::debug;

use crate::cmd::util::json_to_value;

#[derive(clap::Args)]
pub struct Args {
	/// JSON input file; stdin when omitted.
	#[arg(long)]
	pub input: Option<PathBuf>,
	#[arg(long)]
	pub output: PathBuf,
	/// Omit the `pst0` container magic.
	#[arg(long)]
	pub no_magic: bool,
	/// Wrap nested arrays and hashes in reference records.
	#[arg(long)]
	pub nested_refs: bool,
}

/// Encode JSON input and write the stream to `--output`.
pub fn run(args: Args) -> anyhow::Result<()> {
	let Args {
		input,
		output,
		no_magic,
		nested_refs,
	} = args;

	let text = read_input(input.as_deref())?;
	let json: serde_json::Value = serde_json::from_str(&text).context("input is not valid json")?;
	let opt = EncodeOptions {
		container_magic: !no_magic,
		nested_refs,
		..EncodeOptions::default()
	};
	let bytes = encode_with(&json_to_value(&json), &opt).context("failed to encode value")?;
	debug!(len = bytes.len(), magic = opt.container_magic, nested_refs, "encoded json input");
	std::fs::write(&output, &bytes).with_context(|| format!("failed to write {}", output.display()))?;

	println!("wrote {} bytes to {}", bytes.len(), output.display());
	Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
	match path {
		Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
		None => {
			let mut buf = String::new();
			std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
			Ok(buf)
		}
	}
}

#[cfg(test)]
mod tests;
