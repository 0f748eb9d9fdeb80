//! CDP command vocabulary: typed constructors for the JSON payloads the core
//! actually sends and parses.
//!
//! Every type here is pure data — no I/O, no `Connection` access. Callers
//! pass the `*Params` value to [`crate::Connection::execute_command`] with
//! the matching CDP method string and decode the response as the matching
//! `*Result` type.

pub mod browser;
pub mod dom;
pub mod emulation;
pub mod fetch;
pub mod input;
pub mod network;
pub mod page;
pub mod runtime;
pub mod storage;
pub mod target;
