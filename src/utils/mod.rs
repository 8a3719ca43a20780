//! Shared utilities: Arrow column extraction, file I/O, logging and test fixtures

pub mod arrow;
pub mod io;
pub mod logging;
pub mod test;
