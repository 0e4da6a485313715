pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading or running a program.
///
/// A failed operation never commits a partial State; the State that was passed in
/// remains the last valid one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Illegal opcode: {opcode:04X}")]
    IllegalOpcode { opcode: u16 },

    #[error("Stack underflow: RET at {pc:#06X} with no pending CALL")]
    StackUnderflow { pc: u16 },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Can't convert {0} to BCD, expected a value in 0..=255")]
    BcdOutOfRange(i32),

    #[error("Unable to (de)serialize state: {0}")]
    Serialization(#[from] serde_json::Error),
}
