use std::rc::Rc;

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, json};
use storable::codec::{DecodeOptions, Key, RawBytes, ScalarGuesser, TypeGuess, Utf8Text, Value};

/// Placeholder emitted where a container re-enters one of its ancestors.
pub(crate) const CYCLE_MARKER: &str = "<cycle>";

/// Scalar typing policy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScalarMode {
	/// Numbers, then ASCII text, then raw bytes.
	Guess,
	/// Raw bytes only.
	Bytes,
	/// UTF-8 text where valid, raw bytes otherwise.
	Utf8,
}

/// Decode flags shared by reading commands.
#[derive(Debug, Clone, clap::Args)]
pub struct DecodeArgs {
	/// Maximum record nesting depth.
	#[arg(long, default_value_t = DecodeOptions::default().max_depth)]
	pub max_depth: u32,
	/// Type hash keys with the scalar policy instead of keeping raw bytes.
	#[arg(long)]
	pub guess_keys: bool,
	/// Fail on hook and flag-hash records.
	#[arg(long)]
	pub strict: bool,
	/// Scalar typing policy.
	#[arg(long, value_enum, default_value_t = ScalarMode::Guess)]
	pub scalars: ScalarMode,
}

impl DecodeArgs {
	/// Library options for these flags.
	pub fn options(&self) -> DecodeOptions {
		DecodeOptions {
			max_depth: self.max_depth,
			guess_keys: self.guess_keys,
			strict: self.strict,
		}
	}

	/// Scalar policy for these flags.
	pub fn guesser(&self) -> &'static dyn ScalarGuesser {
		match self.scalars {
			ScalarMode::Guess => &TypeGuess,
			ScalarMode::Bytes => &RawBytes,
			ScalarMode::Utf8 => &Utf8Text,
		}
	}
}

/// Pretty-print a payload as JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> anyhow::Result<()> {
	let text = serde_json::to_string_pretty(payload).context("failed to serialize json output")?;
	println!("{text}");
	Ok(())
}

/// Render a hash key as display text.
pub(crate) fn key_label(key: &Key) -> String {
	match key {
		Key::Text(text) => text.clone(),
		Key::Bytes(raw) => String::from_utf8_lossy(raw).into_owned(),
		Key::Int(int) => int.to_string(),
		Key::Float(float) => format!("{float:?}"),
	}
}

/// Render version-string components as `v1.2.3`.
pub(crate) fn vstring_label(parts: &[u64]) -> String {
	let joined: Vec<String> = parts.iter().map(u64::to_string).collect();
	format!("v{}", joined.join("."))
}

/// Convert a decoded value to JSON, marking re-entered containers.
pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
	to_json(value, &mut Vec::new())
}

fn to_json(value: &Value, stack: &mut Vec<usize>) -> serde_json::Value {
	match value {
		Value::Null => serde_json::Value::Null,
		Value::Bool(flag) => serde_json::Value::Bool(*flag),
		Value::Int(int) => serde_json::Value::from(*int),
		Value::Float(float) => serde_json::Number::from_f64(*float)
			.map(serde_json::Value::Number)
			.unwrap_or_else(|| serde_json::Value::String(float.to_string())),
		Value::String(text) => serde_json::Value::String(text.clone()),
		Value::Bytes(raw) => json!({ "$bytes": hex(raw) }),
		Value::VString(parts) => serde_json::Value::String(vstring_label(parts)),
		Value::PendingRef(index) => json!({ "$ref": index }),
		Value::Hook(frame) => {
			let args: Map<String, serde_json::Value> = frame.args.iter().map(|(idx, arg)| (idx.to_string(), to_json(arg, stack))).collect();
			json!({ "$hook": frame.kind.as_str(), "args": args })
		}
		Value::Array(items) => {
			let addr = Rc::as_ptr(items) as usize;
			if stack.contains(&addr) {
				return serde_json::Value::String(CYCLE_MARKER.to_owned());
			}
			stack.push(addr);
			let out = items.borrow().iter().map(|item| to_json(item, stack)).collect();
			stack.pop();
			serde_json::Value::Array(out)
		}
		Value::Hash(map) => {
			let addr = Rc::as_ptr(map) as usize;
			if stack.contains(&addr) {
				return serde_json::Value::String(CYCLE_MARKER.to_owned());
			}
			stack.push(addr);
			let out: Map<String, serde_json::Value> = map.borrow().iter().map(|(key, item)| (key_label(key), to_json(item, stack))).collect();
			stack.pop();
			serde_json::Value::Object(out)
		}
	}
}

/// Convert JSON input into a value for encoding.
pub(crate) fn json_to_value(json: &serde_json::Value) -> Value {
	match json {
		serde_json::Value::Null => Value::Null,
		serde_json::Value::Bool(flag) => Value::Bool(*flag),
		serde_json::Value::Number(number) => match number.as_i64() {
			Some(int) => Value::Int(int),
			None => number.as_f64().map_or(Value::Null, Value::Float),
		},
		serde_json::Value::String(text) => Value::String(text.clone()),
		serde_json::Value::Array(items) => Value::array(items.iter().map(json_to_value).collect()),
		serde_json::Value::Object(map) => Value::hash(map.iter().map(|(key, item)| (key.as_str(), json_to_value(item)))),
	}
}

fn hex(raw: &[u8]) -> String {
	raw.iter().map(|byte| format!("{byte:02x}")).collect()
}
