//! Two-tier schema catalog cache (§4.2, §6): memory, then file, then the
//! database's own catalog, with concurrent fetches for the same warehouse
//! coalesced into one call.

mod assemble;
mod file;
mod memory;
mod paths;
mod retriever;

pub use retriever::SchemaCache;
