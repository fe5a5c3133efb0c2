//! Configuration: environment-driven settings plus the controlled
//! vocabularies (role names, status strings) shared by every layer.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
