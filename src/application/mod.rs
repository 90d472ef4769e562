//! Application layer: the flow controller and the gateways it sequences.
//!
//! `TransactionFlowController` owns one flow's state and walks it through the
//! step plan of its kind. Each remote step goes through its own gateway
//! (`VerificationGateway`, `QuoteGateway`, `AuthorizationGate`), and the
//! `BalanceReconciler` is the only path that writes the session balance.

pub mod authorization;
pub mod controller;
pub mod driver;
pub mod quote;
pub mod reconciler;
pub mod verification;
