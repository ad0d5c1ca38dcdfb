use thiserror::Error;

/// Why a status update did not make it to the output device.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError<E> {
    #[error("status device rejected the update")]
    Device(E),
}
