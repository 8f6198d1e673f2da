/// Hard failures: the operation could not be attempted at all.
///
/// Upstream rejections are not errors; they are reported as `None`/`false`
/// by the individual operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication required")]
    AuthenticationRequired,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
