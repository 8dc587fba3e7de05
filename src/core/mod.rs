//! Core business logic - framework-agnostic ledger, competition and achievement operations.
//!
//! Everything here is generic over SeaORM's `ConnectionTrait` (and `TransactionTrait`
//! where a transaction is opened), so callers can pass a pooled connection or an
//! enclosing transaction.

pub mod achievement;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod market;
pub mod notification;
pub mod scorer;
pub mod settlement;
pub mod user;
pub mod video;
