//! Loadtest command handlers.
//!
//! This module contains handlers for the generate and load commands.

pub mod generate;
pub mod load;
pub mod logging;

pub use generate::{generate_into, run_generate, GenerateArgs};
pub use load::{load_into, run_load};
pub use logging::mask_connection_password;
