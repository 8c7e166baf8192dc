//! Centralized error type for the notepoll umbrella crate.
//!
//! Wraps both subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Note(#[from] notepoll_core::Error),

    #[error("Bridge: {0}")]
    Bridge(#[from] notepoll_io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
