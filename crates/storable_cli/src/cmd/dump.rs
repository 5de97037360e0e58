use std::path::PathBuf;

use anyhow::Context;
use storable::codec::{Value, decode_file_with};

use crate::cmd::print::{PrintOptions, print_value};
use crate::cmd::util::{DecodeArgs, emit_json, value_to_json};

#[derive(clap::Args)]
pub struct Args {
	#[arg(required = true)]
	pub paths: Vec<PathBuf>,
	#[command(flatten)]
	pub decode: DecodeArgs,
	#[arg(long)]
	pub json: bool,
}

/// Retrieve each container-prefixed file and print its value.
pub fn run(args: Args) -> anyhow::Result<()> {
	let Args { paths, decode, json } = args;
	let opt = decode.options();

	let mut entries: Vec<(PathBuf, Option<Value>)> = Vec::with_capacity(paths.len());
	for path in paths {
		let value = decode_file_with(&path, &opt, decode.guesser()).with_context(|| format!("failed to retrieve {}", path.display()))?;
		entries.push((path, value));
	}

	if json {
		let payload: Vec<DumpJson> = entries
			.iter()
			.map(|(path, value)| DumpJson {
				path: path.display().to_string(),
				retrieved: value.is_some(),
				value: value.as_ref().map(value_to_json),
			})
			.collect();
		release_all(entries);
		return emit_json(&payload);
	}

	for (path, value) in &entries {
		println!("path: {}", path.display());
		match value {
			Some(value) => print_value(value, PrintOptions::default()),
			None => println!("skipped: no container magic"),
		}
	}
	release_all(entries);
	Ok(())
}

/// Drop decoded values, emptying shared containers so cycles are freed.
fn release_all(entries: Vec<(PathBuf, Option<Value>)>) {
	for value in entries.into_iter().filter_map(|(_, value)| value) {
		value.release();
	}
}

#[derive(serde::Serialize)]
struct DumpJson {
	path: String,
	retrieved: bool,
	value: Option<serde_json::Value>,
}
