//! Error type for the waveplug umbrella crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] waveplug_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
