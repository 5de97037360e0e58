use std::rc::Rc;

use storable::codec::Value;

use crate::cmd::util::{CYCLE_MARKER, key_label, vstring_label};

/// Output truncation and formatting limits for decoded values.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
	/// Maximum number of elements or entries printed per container.
	pub max_array_items: usize,
	/// Maximum recursive print depth for nested containers.
	pub max_print_depth: u32,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_string_len: 200,
			max_array_items: 16,
			max_print_depth: 8,
		}
	}
}

/// Print one decoded value tree to stdout.
pub fn print_value(value: &Value, options: PrintOptions) {
	print!("{}", render_value(value, options));
}

/// Render one decoded value tree as indented lines.
pub fn render_value(value: &Value, options: PrintOptions) -> String {
	let mut out = String::new();
	render(&mut out, value, 0, 0, options, &mut Vec::new());
	out
}

fn render(out: &mut String, value: &Value, indent: usize, depth: u32, options: PrintOptions, stack: &mut Vec<usize>) {
	let pad = " ".repeat(indent);
	match value {
		Value::Null => line(out, &pad, "null"),
		Value::Bool(v) => line(out, &pad, v),
		Value::Int(v) => line(out, &pad, v),
		Value::Float(v) => line(out, &pad, v),
		Value::String(v) => line(out, &pad, format_args!("\"{}\"", truncate(v, options.max_string_len))),
		Value::Bytes(v) => line(out, &pad, format_args!("bytes[{}]", v.len())),
		Value::VString(parts) => line(out, &pad, vstring_label(parts)),
		Value::PendingRef(index) => line(out, &pad, format_args!("ref #{index}")),
		Value::Hook(frame) => {
			if depth >= options.max_print_depth {
				line(out, &pad, format_args!("hook({}) {{ ... }}", frame.kind.as_str()));
				return;
			}
			line(out, &pad, format_args!("hook({}) {{", frame.kind.as_str()));
			for (idx, arg) in &frame.args {
				render_field(out, &idx.to_string(), arg, indent, depth, options, stack);
			}
			line(out, &pad, "}");
		}
		Value::Array(items) => {
			let addr = Rc::as_ptr(items) as usize;
			if stack.contains(&addr) {
				line(out, &pad, CYCLE_MARKER);
				return;
			}
			let items = items.borrow();
			if depth >= options.max_print_depth {
				line(out, &pad, format_args!("[... {} items]", items.len()));
				return;
			}

			stack.push(addr);
			line(out, &pad, "[");
			for item in items.iter().take(options.max_array_items) {
				render(out, item, indent + 2, depth + 1, options, stack);
			}
			if items.len() > options.max_array_items {
				line(out, &pad, format_args!("  ... {} more", items.len() - options.max_array_items));
			}
			line(out, &pad, "]");
			stack.pop();
		}
		Value::Hash(map) => {
			let addr = Rc::as_ptr(map) as usize;
			if stack.contains(&addr) {
				line(out, &pad, CYCLE_MARKER);
				return;
			}
			let map = map.borrow();
			if depth >= options.max_print_depth {
				line(out, &pad, format_args!("{{ ... {} entries }}", map.len()));
				return;
			}

			stack.push(addr);
			line(out, &pad, "{");
			for (key, item) in map.iter().take(options.max_array_items) {
				render_field(out, &key_label(key), item, indent, depth, options, stack);
			}
			if map.len() > options.max_array_items {
				line(out, &pad, format_args!("  ... {} more entries", map.len() - options.max_array_items));
			}
			line(out, &pad, "}");
			stack.pop();
		}
	}
}

/// Scalars stay on the label line; containers start on the next one.
fn render_field(out: &mut String, label: &str, value: &Value, indent: usize, depth: u32, options: PrintOptions, stack: &mut Vec<usize>) {
	let pad = " ".repeat(indent);
	if matches!(value, Value::Array(_) | Value::Hash(_) | Value::Hook(_)) {
		line(out, &pad, format_args!("  {label} ="));
		render(out, value, indent + 4, depth + 1, options, stack);
	} else {
		out.push_str(&format!("{pad}  {label} = "));
		render(out, value, 0, depth + 1, options, stack);
	}
}

fn line(out: &mut String, pad: &str, text: impl std::fmt::Display) {
	out.push_str(&format!("{pad}{text}\n"));
}

fn truncate(input: &str, max_len: usize) -> String {
	if input.chars().count() <= max_len {
		return input.to_owned();
	}
	let out: String = input.chars().take(max_len).collect();
	format!("{out}...")
}
