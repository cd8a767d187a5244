//! Domain types, wire codec, vital-sign generators and alert rules for the
//! patient vitals simulator. Pure logic only; no I/O or shared state.

pub mod alert;
pub mod condition_names;
pub mod error;
pub mod generators;
pub mod reading;
pub mod rules;
pub mod types;
pub mod wire;
