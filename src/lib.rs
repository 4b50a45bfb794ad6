//! Automated ETH bridging between testnet pairs.
//!
//! A [`sequencer::BridgeController`] drives repeated bridge calls in
//! alternating directions through a [`client::ChainClient`], while the
//! [`console`] renders logs, balances and menus.

pub mod activity;
pub mod balances;
pub mod bindings;
pub mod calls;
pub mod chain;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod sequencer;
pub mod wait;
