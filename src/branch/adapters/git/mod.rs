//! Git subprocess adapters.
//!
//! Both adapters shell out to the `git` binary through `tokio::process`, with
//! prompts disabled and standard input closed.

mod checkout;
mod cli;

pub use checkout::LocalCheckout;
pub use cli::GitCli;
