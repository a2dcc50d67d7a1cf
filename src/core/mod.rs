//! Keystroke decoding and binding resolution.

pub mod binding;
pub mod error;
pub mod keycodes;
pub mod register;
