//! Error types for the uiforge core library.
//!
//! Each module boundary has its own error enum to provide clear error
//! boundaries. The library uses `thiserror` for structured, typed errors.
//! Every error maps onto a stable four-digit [`ErrorCode`] that the HTTP
//! surface exposes to clients.

/// Stable four-digit error codes, grouped by concern.
///
/// 4000–4099 validation, 4100–4199 authentication, 4290 throttling,
/// 5000–5099 upstream LLM, 5100–5199 generation, 5900–5999 internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Image payload has an unsupported or undeclared MIME type.
    InvalidImage,
    /// Decoded image exceeds the configured size cap.
    ImageTooLarge,
    /// Image payload is not valid base64 or not decodable.
    InvalidImageEncoding,
    /// Description shorter than the minimum after sanitization.
    DescriptionTooShort,
    /// Stack identifier not present in the template registry.
    UnknownStackIdentifier,
    /// No credential supplied where one is required.
    MissingCredential,
    /// Supplied credential is not in the allowed set.
    InvalidCredential,
    /// Token bucket refused the request.
    RateLimited,
    /// Upstream LLM rejected our credential.
    UpstreamAuth,
    /// Upstream LLM quota exhausted.
    UpstreamQuota,
    /// Network-level failure reaching the upstream LLM.
    UpstreamNetwork,
    /// Upstream LLM response could not be decoded.
    UpstreamDecode,
    /// Envelope still malformed after the recovery chain.
    InvalidEnvelope,
    /// One or more stages produced no usable output.
    StageEmpty,
    /// The pipeline produced no usable output at all.
    GenerationFailed,
    /// Service configuration is invalid.
    Configuration,
    /// Unexpected internal invariant breach.
    Internal,
}

impl ErrorCode {
    /// The numeric code.
    pub fn code(self) -> u16 {
        match self {
            Self::InvalidImage => 4000,
            Self::ImageTooLarge => 4001,
            Self::InvalidImageEncoding => 4002,
            Self::DescriptionTooShort => 4010,
            Self::UnknownStackIdentifier => 4020,
            Self::MissingCredential => 4100,
            Self::InvalidCredential => 4101,
            Self::RateLimited => 4290,
            Self::UpstreamAuth => 5000,
            Self::UpstreamQuota => 5001,
            Self::UpstreamNetwork => 5002,
            Self::UpstreamDecode => 5003,
            Self::InvalidEnvelope => 5004,
            Self::StageEmpty => 5100,
            Self::GenerationFailed => 5101,
            Self::Configuration => 5900,
            Self::Internal => 5901,
        }
    }

    /// The wire form, e.g. `ERR_4000`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidImage => "ERR_4000",
            Self::ImageTooLarge => "ERR_4001",
            Self::InvalidImageEncoding => "ERR_4002",
            Self::DescriptionTooShort => "ERR_4010",
            Self::UnknownStackIdentifier => "ERR_4020",
            Self::MissingCredential => "ERR_4100",
            Self::InvalidCredential => "ERR_4101",
            Self::RateLimited => "ERR_4290",
            Self::UpstreamAuth => "ERR_5000",
            Self::UpstreamQuota => "ERR_5001",
            Self::UpstreamNetwork => "ERR_5002",
            Self::UpstreamDecode => "ERR_5003",
            Self::InvalidEnvelope => "ERR_5004",
            Self::StageEmpty => "ERR_5100",
            Self::GenerationFailed => "ERR_5101",
            Self::Configuration => "ERR_5900",
            Self::Internal => "ERR_5901",
        }
    }

    /// Short stable kind string for the error body.
    pub fn kind(self) -> &'static str {
        match self {
            Self::InvalidImage
            | Self::ImageTooLarge
            | Self::InvalidImageEncoding
            | Self::DescriptionTooShort
            | Self::UnknownStackIdentifier => "validation_error",
            Self::MissingCredential | Self::InvalidCredential => "authentication_error",
            Self::RateLimited => "rate_limit_exceeded",
            Self::UpstreamAuth
            | Self::UpstreamQuota
            | Self::UpstreamNetwork
            | Self::UpstreamDecode
            | Self::InvalidEnvelope => "upstream_error",
            Self::StageEmpty | Self::GenerationFailed => "generation_error",
            Self::Configuration | Self::Internal => "internal_error",
        }
    }

    /// The HTTP status this code is served with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidImage
            | Self::ImageTooLarge
            | Self::InvalidImageEncoding
            | Self::DescriptionTooShort
            | Self::UnknownStackIdentifier => 400,
            Self::MissingCredential | Self::InvalidCredential => 401,
            Self::RateLimited => 429,
            Self::UpstreamAuth | Self::UpstreamQuota => 502,
            Self::UpstreamNetwork | Self::UpstreamDecode | Self::InvalidEnvelope => 502,
            Self::StageEmpty | Self::GenerationFailed => 500,
            Self::Configuration | Self::Internal => 500,
        }
    }
}

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration field is absent.
    #[error("missing required config field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {source}")]
    ParseError {
        /// The underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors rejecting a request before any LLM call is made.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Image MIME type is unsupported or undeclared.
    #[error("unsupported image type: {message}")]
    InvalidImage {
        /// What was sniffed (or why sniffing failed).
        message: String,
    },

    /// Decoded image exceeds the configured cap.
    #[error("image size {size} bytes exceeds maximum {max} bytes")]
    ImageTooLarge {
        /// Decoded size in bytes.
        size: usize,
        /// Configured maximum in bytes.
        max: usize,
    },

    /// Image payload could not be base64-decoded.
    #[error("invalid image encoding: {message}")]
    InvalidImageEncoding {
        /// Details from the decoder.
        message: String,
    },

    /// Description is below the minimum length after sanitization.
    #[error("description too short: {length} chars, minimum {minimum}")]
    DescriptionTooShort {
        /// Post-sanitization character count.
        length: usize,
        /// Required minimum.
        minimum: usize,
    },

    /// A stack identifier is not in the template registry.
    #[error("unknown {field} identifier: '{value}'")]
    UnknownStackIdentifier {
        /// Which part of the stack triple failed (frontend/backend/database/architecture).
        field: &'static str,
        /// The value as supplied.
        value: String,
    },
}

impl RequestError {
    /// The stable error code for this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidImage { .. } => ErrorCode::InvalidImage,
            Self::ImageTooLarge { .. } => ErrorCode::ImageTooLarge,
            Self::InvalidImageEncoding { .. } => ErrorCode::InvalidImageEncoding,
            Self::DescriptionTooShort { .. } => ErrorCode::DescriptionTooShort,
            Self::UnknownStackIdentifier { .. } => ErrorCode::UnknownStackIdentifier,
        }
    }
}

/// Errors from interacting with the upstream multimodal LLM.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request to the LLM endpoint failed.
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// LLM API returned an error response.
    #[error("LLM API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// LLM provider rate limit hit.
    #[error("LLM rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The upstream rejected our credential.
    #[error("LLM authentication failed: {message}")]
    Auth {
        /// Details from the API.
        message: String,
    },

    /// The upstream account has exhausted its quota.
    #[error("LLM quota exhausted: {message}")]
    Quota {
        /// Details from the API.
        message: String,
    },

    /// The call exceeded the per-stage timeout.
    #[error("LLM call timed out after {seconds}s")]
    Timeout {
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// LLM response body could not be decoded.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The response envelope was still malformed after recovery.
    #[error("invalid response envelope: {0}")]
    Envelope(String),

    /// No LLM provider configured.
    #[error("no LLM provider configured")]
    NotConfigured,
}

impl LlmError {
    /// Whether retrying this failure could succeed.
    ///
    /// Rate limits, 5xx responses, network errors, timeouts, and decode
    /// failures are transient; auth, quota, and malformed-prompt rejections
    /// are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) | Self::RateLimited { .. } | Self::Timeout { .. } | Self::Parse(_) => {
                true
            }
            Self::Api { status, .. } => *status >= 500,
            Self::Auth { .. } | Self::Quota { .. } | Self::Envelope(_) | Self::NotConfigured => {
                false
            }
        }
    }

    /// The stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Auth { .. } => ErrorCode::UpstreamAuth,
            Self::Quota { .. } => ErrorCode::UpstreamQuota,
            Self::Request(_) | Self::Timeout { .. } | Self::RateLimited { .. } => {
                ErrorCode::UpstreamNetwork
            }
            Self::Parse(_) => ErrorCode::UpstreamDecode,
            Self::Envelope(_) => ErrorCode::InvalidEnvelope,
            Self::Api { .. } | Self::NotConfigured => ErrorCode::UpstreamAuth,
        }
    }
}

/// Errors from the optional vector-store adapter.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// HTTP request to the index failed.
    #[error("vector store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The index returned an error response.
    #[error("vector store error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the index.
        message: String,
    },

    /// The index response could not be decoded.
    #[error("failed to parse vector store response: {0}")]
    Parse(String),
}

/// Errors from the generation pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Stage 1 (architecture plan) failed; without a plan no later stage can run.
    #[error("architecture analysis failed: {source}")]
    PlanFailed {
        /// The underlying LLM failure.
        #[source]
        source: LlmError,
    },

    /// The pipeline completed but produced no files at all.
    #[error("generation produced no usable output")]
    NoOutput,

    /// A non-recoverable upstream failure outside any stage.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl GenerationError {
    /// The stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PlanFailed { source } => source.code(),
            Self::NoOutput => ErrorCode::GenerationFailed,
            Self::Llm(e) => e.code(),
        }
    }
}
