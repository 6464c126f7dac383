pub type SessionResult<T> = Result<T, SessionError>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("device error: {0}")]
    Device(String),

    #[error("kernel error: {0}")]
    Kernel(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl SessionError {
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        assert!(SessionError::device("x")
            .to_string()
            .contains("device error:"));
        assert!(SessionError::kernel("x")
            .to_string()
            .contains("kernel error:"));
        assert!(SessionError::config("x")
            .to_string()
            .contains("configuration error:"));
    }

    #[test]
    fn test_002() {
        let base = std::io::Error::other("boom");
        let err = SessionError::from(base);
        assert!(err.to_string().contains("boom"));
    }
}
