//! Outer surfaces of the CLI driver.

pub mod csv;
