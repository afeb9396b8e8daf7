mod common;
mod error;
mod pdm;
mod termination;
#[cfg(test)]
mod tests;
mod traits;

pub use common::*;
pub use error::{Error, Result};
pub use pdm::solve;
pub use termination::*;
pub use traits::*;
