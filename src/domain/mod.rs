//! Domain types for guided transaction flows: kinds and their step plans,
//! amounts and PINs, the flow state record, and the ports the engine talks
//! to.

pub mod amount;
pub mod flow;
pub mod pin;
pub mod plan;
pub mod ports;
pub mod transaction;
