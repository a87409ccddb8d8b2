use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("navigation failed: {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("javascript evaluation failed: {0}")]
    JsEval(String),

    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error(transparent)]
    Core(#[from] okta_auth::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Short category name carried into structured failure payloads, so a
    /// caller can distinguish launch trouble from mid-flight driver errors
    /// without parsing prose.
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::BrowserLaunch(_) => "BrowserLaunch",
            AuthError::Navigation { .. } => "Navigation",
            AuthError::JsEval(_) => "JsEval",
            AuthError::Cdp(_) => "Cdp",
            AuthError::Core(_) => "Store",
            AuthError::Io(_) => "Io",
            AuthError::Json(_) => "Json",
        }
    }
}
