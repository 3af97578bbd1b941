use std::fmt;

/// Main error type for paygate-core
#[derive(Debug)]
pub enum Error {
    /// Configuration errors
    Config(String),

    /// Database errors (SQLx wrapped)
    Database(sqlx::Error),

    /// HTTP/network errors talking to a processor or the token service
    Network(String),

    /// Request validation errors. Carries a stable machine code
    /// (defaults to `VALIDATION_ERROR`) alongside the message, the
    /// same shape as `Payment`, so call sites that need a specific
    /// code from the §7 input taxonomy (e.g. `INVALID_REFUND_AMOUNT`)
    /// can surface it while still mapping to HTTP 400.
    Validation { code: String, message: String },

    /// Entity not found. Carries a stable machine code (defaults to
    /// `NOT_FOUND`) so call sites can surface e.g.
    /// `PAYMENT_METHOD_NOT_FOUND` / `SUBSCRIPTION_NOT_FOUND` while
    /// still mapping to HTTP 404.
    NotFound { code: String, message: String },

    /// Payment processing / decline errors. Carries the stable machine
    /// code alongside the human message so callers can branch on it.
    Payment { code: String, message: String },

    /// Cache (Redis) errors
    Cache(String),

    /// Request is well-formed but cannot be processed as-is (e.g. a
    /// refund whose original transaction has no processor tx id).
    Unprocessable(String),

    /// Serialization errors
    Serialization(serde_json::Error),

    /// IO errors
    Io(std::io::Error),

    /// Generic errors with description
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Database(e) => write!(f, "database error: {}", e),
            Error::Network(msg) => write!(f, "network error: {}", msg),
            Error::Validation { message, .. } => write!(f, "validation error: {}", message),
            Error::NotFound { message, .. } => write!(f, "not found: {}", message),
            Error::Payment { code, message } => write!(f, "payment error [{}]: {}", code, message),
            Error::Cache(msg) => write!(f, "cache error: {}", msg),
            Error::Unprocessable(msg) => write!(f, "unprocessable: {}", msg),
            Error::Serialization(e) => write!(f, "serialization error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Other(msg) => write!(f, "error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(e) => Some(e),
            Error::Serialization(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Error::Database(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Network(error.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(error: uuid::Error) -> Self {
        Error::validation(format!("invalid id: {}", error))
    }
}

impl Error {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Error::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Error::Validation {
            code: "VALIDATION_ERROR".to_string(),
            message: msg.into(),
        }
    }

    /// Validation error carrying a specific machine code from the §7
    /// input taxonomy (e.g. `codes::INVALID_REFUND_AMOUNT`) instead of
    /// the generic `VALIDATION_ERROR`.
    pub fn validation_code<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Error::Validation {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Error::NotFound {
            code: "NOT_FOUND".to_string(),
            message: msg.into(),
        }
    }

    /// Not-found error carrying a specific machine code from the §7
    /// input taxonomy (e.g. `codes::PAYMENT_METHOD_NOT_FOUND`) instead
    /// of the generic `NOT_FOUND`.
    pub fn not_found_code<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Error::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn cache<T: Into<String>>(msg: T) -> Self {
        Error::Cache(msg.into())
    }

    pub fn unprocessable<T: Into<String>>(msg: T) -> Self {
        Error::Unprocessable(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        Error::Network(msg.into())
    }

    /// Construct a payment/decline error carrying the machine code from
    /// §7 of the error taxonomy (e.g. `PAYMENT_METHOD_NOT_FOUND`,
    /// `PROCESSORS_UNAVAILABLE`, or a processor-supplied decline code).
    pub fn payment<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Error::Payment {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable machine code for this error, used by the decline
    /// classifier and returned to machine callers alongside the
    /// mapped user-facing message.
    pub fn code(&self) -> &str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Network(_) => "NETWORK_ERROR",
            Error::Validation { code, .. } => code,
            Error::NotFound { code, .. } => code,
            Error::Payment { code, .. } => code,
            Error::Cache(_) => "CACHE_ERROR",
            Error::Unprocessable(_) => "UNPROCESSABLE",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Other(_) => "ORCHESTRATOR_ERROR",
        }
    }

    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::Payment { .. } => 402,
            Error::Unprocessable(_) => 422,
            Error::Config(_) => 500,
            Error::Database(_) => 500,
            Error::Cache(_) => 500,
            Error::Serialization(_) => 500,
            Error::Io(_) => 500,
            Error::Network(_) => 503,
            Error::Other(_) => 500,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Database(_) => "database",
            Error::Network(_) => "network",
            Error::Validation { .. } => "validation",
            Error::NotFound { .. } => "not_found",
            Error::Payment { .. } => "payment",
            Error::Cache(_) => "cache",
            Error::Unprocessable(_) => "unprocessable",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }
}
