pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing flag argument, or an unrecognized flag. The caller is
    /// expected to print the usage text after the message.
    #[error("{message}")]
    Usage { message: String },

    /// A layout engine or output device could not be resolved. The message
    /// already carries the list of available alternatives.
    #[error("{message}")]
    PluginResolution { message: String },

    /// The legacy `GRAYLING_FILE_PATH` sandbox toggle is set. This mechanism
    /// is insecure and must never silently activate, so startup aborts
    /// before any argument is parsed.
    #[error(
        "$GRAYLING_FILE_PATH environment variable set; exiting\n\nThis sandboxing mechanism is no longer supported"
    )]
    SandboxEnv,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage { .. } => 1,
            Error::PluginResolution { .. } => 2,
            Error::SandboxEnv => 1,
            Error::Io(_) => 1,
        }
    }

    /// Whether the CLI should follow the message with the usage text.
    pub fn prints_usage(&self) -> bool {
        matches!(self, Error::Usage { .. })
    }
}
