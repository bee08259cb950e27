//! Shared plumbing for the menurag binaries: logging setup and CSV I/O.
pub mod csv_io;
pub mod logging;
