use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read password: {0}")]
    Prompt(String),

    #[error("Failed to find local IP address: {0}")]
    AddressResolution(String),

    #[error("Failed to generate capability token: {0}")]
    TokenGeneration(#[from] rand::Error),

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start background process: {0}")]
    Detachment(#[source] std::io::Error),

    #[error("Invalid password handoff from parent process: {0}")]
    Handoff(String),

    #[error("Error serving HTML: {0}")]
    DeliveryWrite(String),
}

impl AppError {
    pub fn address_resolution<S: Into<String>>(msg: S) -> Self {
        Self::AddressResolution(msg.into())
    }

    pub fn prompt<S: Into<String>>(msg: S) -> Self {
        Self::Prompt(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
