//! Force sensor implementations

pub mod hx711;
pub mod load_cell;

pub use hx711::{Gain, Hx711};
pub use load_cell::{AdcReader, LoadCell};
