/// Errors that can occur while building or parsing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The encoded frame exceeds the configured frame buffer.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An escape byte was not followed by a second escape byte.
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
