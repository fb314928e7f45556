//! Error types for the Armory client library.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ArmoryError>;

/// Comprehensive error type for all Armory API operations
#[derive(Error, Debug)]
pub enum ArmoryError {
    /// Network or HTTP-related errors, including non-success status codes
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The bounded retry policy gave up
    #[error("Request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The response body could not be parsed as XML
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, input: String },

    /// Filesystem errors from the response cache
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response was fetched but could not be persisted to the cache
    #[error("Failed to write cache entry: {source}")]
    CacheWrite {
        #[source]
        source: std::io::Error,
        body: Vec<u8>,
    },

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    UrlParsing(#[from] url::ParseError),

    /// Service reported `noCharacter`
    #[error("Character not found")]
    CharacterNotFound,

    /// Service reported `noGuild`
    #[error("Guild not found")]
    GuildNotFound,

    /// Service reported `noTeam`
    #[error("Arena team not found")]
    ArenaTeamNotFound,

    /// Service reported `noItem`
    #[error("Item not found")]
    ItemNotFound,

    /// Service reported an error code this library does not know about
    #[error("Unmapped service error code: {code}")]
    UnmappedServiceError { code: String },

    /// Search type outside the recognised set
    #[error("Invalid search type: {search_type}")]
    InvalidSearchType { search_type: String },

    /// Search was attempted without a search string
    #[error("No search string given")]
    NoSearchString,

    /// Arena team size outside {2, 3, 5}
    #[error("Invalid arena team size {size}, must be one of 2, 3 or 5")]
    InvalidArenaTeamSize { size: u32 },

    /// A result kind was used where it has no meaning
    #[error("Invalid result kind for this request: {kind}")]
    InvalidResultKind { kind: String },

    /// The response had no error code but lacked the expected content
    #[error("Response from {endpoint} is missing its content")]
    MissingContent { endpoint: String },

    /// A URL that was not built against either configured region host
    #[error("URL does not belong to a known region host: {url}")]
    UnknownHost { url: String },

    /// A value model could not be built from its XML node
    #[error("Could not extract <{node}>: {message}")]
    Extraction { node: String, message: String },
}

impl ArmoryError {
    /// Create a new malformed response error
    pub fn malformed(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            input: input.into(),
        }
    }

    /// Create a new missing content error
    pub fn missing_content(endpoint: impl Into<String>) -> Self {
        Self::MissingContent {
            endpoint: endpoint.into(),
        }
    }

    /// Create a new extraction error
    pub fn extraction(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Map an `errCode` attribute value to its error.
    ///
    /// Unknown codes are never dropped; they surface as [`ArmoryError::UnmappedServiceError`].
    pub fn from_service_code(code: &str) -> Self {
        match code {
            "noCharacter" => Self::CharacterNotFound,
            "noGuild" => Self::GuildNotFound,
            "noTeam" => Self::ArenaTeamNotFound,
            "noItem" => Self::ItemNotFound,
            other => Self::UnmappedServiceError {
                code: other.to_string(),
            },
        }
    }

    /// Check if this error is retryable (temporary)
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArmoryError::Network(_))
    }

    /// Check if this error was reported by the service inside a valid document
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            ArmoryError::CharacterNotFound
                | ArmoryError::GuildNotFound
                | ArmoryError::ArenaTeamNotFound
                | ArmoryError::ItemNotFound
                | ArmoryError::UnmappedServiceError { .. }
        )
    }

    /// Check if this error was caused by bad caller input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ArmoryError::InvalidSearchType { .. }
                | ArmoryError::NoSearchString
                | ArmoryError::InvalidArenaTeamSize { .. }
                | ArmoryError::InvalidResultKind { .. }
        )
    }
}
