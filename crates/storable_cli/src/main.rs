#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "storable", about = "Perl Storable inspection and conversion tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode container-prefixed files, skipping any without the magic.
	Dump(cmd::dump::Args),
	/// Decode an in-memory (frozen) stream.
	Thaw(cmd::thaw::Args),
	/// Encode JSON as a Storable stream.
	Freeze(cmd::freeze::Args),
	/// Print the negotiated stream header.
	Info(cmd::info::Args),
}

fn main() {
	init_tracing();
	if let Err(err) = run() {
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}

fn run() -> anyhow::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Dump(args) => cmd::dump::run(args),
		Commands::Thaw(args) => cmd::thaw::run(args),
		Commands::Freeze(args) => cmd::freeze::run(args),
		Commands::Info(args) => cmd::info::run(args),
	}
}

/// Log to stderr, filtered by `STORABLE_LOG` (default `warn`).
fn init_tracing() {
	let filter = EnvFilter::try_from_env("STORABLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
