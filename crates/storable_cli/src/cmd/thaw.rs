use std::path::PathBuf;

use anyhow::Context;
use storable::codec::decode_with;

use crate::cmd::print::{PrintOptions, print_value};
use crate::cmd::util::{DecodeArgs, emit_json, value_to_json};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[command(flatten)]
	pub decode: DecodeArgs,
	#[arg(long)]
	pub json: bool,
}

/// Decode a stream whether or not it carries the container magic.
pub fn run(args: Args) -> anyhow::Result<()> {
	let Args { path, decode, json } = args;

	let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
	let value = decode_with(&bytes, &decode.options(), decode.guesser()).with_context(|| format!("failed to thaw {}", path.display()))?;

	let shown = if json {
		emit_json(&ThawJson {
			path: path.display().to_string(),
			kind: value.kind(),
			value: value_to_json(&value),
		})
	} else {
		println!("path: {}", path.display());
		println!("kind: {}", value.kind());
		print_value(&value, PrintOptions::default());
		Ok(())
	};
	value.release();
	shown
}

#[derive(serde::Serialize)]
struct ThawJson {
	path: String,
	kind: &'static str,
	value: serde_json::Value,
}
