use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Cart accessed outside of a mounted CartProvider")]
    NotInitialized,

    #[error("Cart restoration was never started")]
    RestoreNotStarted,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Stored cart under '{key}' is corrupted: {message}")]
    CorruptedSnapshot { key: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Storage,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CartError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotInitialized | Self::RestoreNotStarted => ErrorCategory::Usage,
            Self::Storage { .. } | Self::IoError(_) => ErrorCategory::Storage,
            Self::SerializationError(_) | Self::CorruptedSnapshot { .. } => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::Runtime { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Usage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::NotInitialized => "Mount a CartProvider before calling cart()",
            Self::RestoreNotStarted => "Call restore() or spawn_restore() before waiting on the cart",
            Self::Storage { .. } | Self::IoError(_) => {
                "Check that the data directory exists and is writable"
            }
            Self::SerializationError(_) | Self::CorruptedSnapshot { .. } => {
                "Remove the stored cart file or set persistence.on_corrupt = \"empty\""
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Review the configuration file and CLI flags",
            Self::Runtime { .. } => "Create the cart from within a Tokio runtime",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Usage => format!("Internal usage error: {}", self),
            ErrorCategory::Storage => format!("Could not access cart storage: {}", self),
            ErrorCategory::Data => format!("Saved cart could not be read: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
