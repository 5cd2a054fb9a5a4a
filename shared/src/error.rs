use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("failed to encode packet: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode packet: {0}")]
    Decode(#[source] bincode::Error),

    #[error("packet of {size} bytes exceeds the {limit} byte datagram limit")]
    TooLarge { size: usize, limit: usize },
}
