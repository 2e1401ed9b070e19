pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors produced while decoding a tracker payload.
///
/// The decoder never logs or recovers internally; every failure is returned
/// to the caller as one of these values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload split into fewer blocks than a packet carries.
    #[error("invalid number of blocks: {found}")]
    InvalidBlockCount { found: usize },
    /// The status flags block carried no bytes.
    #[error("status flags block is empty")]
    EmptyFlagsBlock,
    /// The voltage block is not a finite base-10 number.
    #[error("invalid voltage text: {text:?}")]
    InvalidVoltage { text: String },
    /// A packed timestamp does not compose into a valid calendar instant.
    #[error("packed timestamp {packed} is out of calendar range")]
    TimestampOutOfRange { packed: u32 },
}
