/// Container-file dump command.
pub mod dump;
/// JSON to Storable conversion command.
pub mod freeze;
/// Stream header command.
pub mod info;
/// Value tree printing.
pub mod print;
/// In-memory stream decode command.
pub mod thaw;
/// Shared argument and JSON helpers.
pub mod util;

#[cfg(test)]
mod test_support;
