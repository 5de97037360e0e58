//! Reader and writer for Perl Storable binary streams.

/// Header negotiation, record decoding, encoding, and hash patching.
pub mod codec;
