//! `wallet` declares the cryptographic capabilities the exchange engine consumes without
//! implementing them
pub mod types;

pub use types::{CredentialWallet, ProofWallet, WalletError};

#[cfg(test)]
pub(crate) mod fake;
