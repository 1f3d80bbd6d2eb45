use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Channel(#[from] herald_channels::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
