//! Core utilities: calendar arithmetic for monthly amortization.

pub mod dates;
