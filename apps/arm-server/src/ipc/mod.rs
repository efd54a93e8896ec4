//! Unix-domain-socket IPC: newline-delimited JSON in, periodic JSON state
//! broadcasts out.

pub mod protocol;
pub mod server;
