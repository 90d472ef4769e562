//! Concrete collaborators: an in-memory session and navigator, and a
//! simulated remote banking service.

pub mod in_memory;
pub mod simulator;
