//! Control algorithms — pure state, no I/O.

pub mod hysteresis;
