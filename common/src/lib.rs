//! Shared building blocks for `dug`.
//!
//! * [`config`]: scan timing, probe mode and capture settings.
//! * [`error`]: the error taxonomy shared by the codec, the capture layer and the scanner.
//! * [`network`]: interface validation, subnet planning and discovery records.

pub mod config;
pub mod error;
pub mod network;
