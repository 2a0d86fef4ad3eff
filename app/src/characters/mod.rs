//! Runtime characters produced from configurations.

mod alice;
mod bob;
mod ursula;

pub use alice::{Alice, AliceParameters};
pub use bob::{Bob, BobParameters};
pub use ursula::{Ursula, UrsulaParameters};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid policy threshold: m={m} must not exceed n={n}")]
    InvalidPolicyThreshold { m: u16, n: u16 },
}
