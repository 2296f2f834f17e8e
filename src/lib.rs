// lib.rs - reconpipe library
// Purpose: sequential recon stage runner and the Kali installer behind the
//          `recon` and `recon-install` binaries

pub mod artifacts;
pub mod console;
pub mod error;
pub mod executor;
pub mod host;
pub mod installer;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod target;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
