use std::path::PathBuf;

use anyhow::Context;
use storable::codec::{Cursor, Opcode, StreamHeader};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print the negotiated header and the first record tag.
pub fn run(args: Args) -> anyhow::Result<()> {
	let Args { path, json } = args;

	let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
	let mut cursor = Cursor::new(&bytes);
	let header = StreamHeader::parse(&mut cursor).with_context(|| format!("failed to parse header of {}", path.display()))?;
	let root_record = cursor.peek(1).first().map(|byte| match Opcode::from_byte(*byte) {
		Some(op) => op.name().to_owned(),
		None => format!("0x{byte:02x}"),
	});
	let (major, minor) = header.version();
	let byteorder = header.byteorder.as_deref().map(|raw| String::from_utf8_lossy(raw).into_owned());

	if json {
		return emit_json(&InfoJson {
			path: path.display().to_string(),
			container: header.container,
			netorder: header.netorder,
			version: format!("{major}.{minor}"),
			byteorder,
			endianness: header.layout.endianness.as_str(),
			int_size: header.layout.int_size,
			long_size: header.layout.long_size,
			ptr_size: header.ptr_size,
			nv_size: header.layout.nv_size,
			header_len: cursor.pos(),
			total_len: bytes.len(),
			root_record,
		});
	}

	println!("path: {}", path.display());
	println!("container: {}", header.container);
	println!("netorder: {}", header.netorder);
	println!("version: {major}.{minor}");
	println!("byteorder: {}", byteorder.as_deref().unwrap_or("-"));
	println!("endianness: {}", header.layout.endianness.as_str());
	println!("int_size: {}", header.layout.int_size);
	println!("long_size: {}", header.layout.long_size);
	println!("ptr_size: {}", header.ptr_size);
	println!("nv_size: {}", header.layout.nv_size);
	println!("header_len: {}", cursor.pos());
	println!("total_len: {}", bytes.len());
	println!("root_record: {}", root_record.as_deref().unwrap_or("-"));
	Ok(())
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	container: bool,
	netorder: bool,
	version: String,
	byteorder: Option<String>,
	endianness: &'static str,
	int_size: u8,
	long_size: u8,
	ptr_size: u8,
	nv_size: u8,
	header_len: usize,
	total_len: usize,
	root_record: Option<String>,
}
