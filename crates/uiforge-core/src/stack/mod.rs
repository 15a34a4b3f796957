//! Technology stack identifiers carried end-to-end through the pipeline.
//!
//! The frontend/backend/database sets are closed: a request naming an
//! identifier outside them is rejected before any LLM call. Adding support
//! for a new framework means adding an enum variant and a registry entry in
//! [`templates`], not subclassing anything.

pub mod templates;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

// ============================================================================
// Frontend
// ============================================================================

/// Supported frontend frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frontend {
    React,
    Vue,
    Angular,
    /// Plain HTML/CSS/JS without a framework.
    Html,
}

impl Frontend {
    /// All registered frontend identifiers.
    pub const ALL: [Frontend; 4] = [Self::React, Self::Vue, Self::Angular, Self::Html];

    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Angular => "angular",
            Self::Html => "html",
        }
    }

    /// Parse a user-supplied identifier (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value.trim().to_lowercase().as_str() {
            "react" => Ok(Self::React),
            "vue" => Ok(Self::Vue),
            "angular" => Ok(Self::Angular),
            "html" => Ok(Self::Html),
            _ => Err(RequestError::UnknownStackIdentifier {
                field: "frontend",
                value: value.to_string(),
            }),
        }
    }

    /// File extension for this frontend's entry/page files.
    pub fn source_extension(self) -> &'static str {
        match self {
            Self::React => "tsx",
            Self::Vue => "vue",
            Self::Angular => "ts",
            Self::Html => "html",
        }
    }
}

impl std::fmt::Display for Frontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Frontend {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<Frontend> for String {
    fn from(value: Frontend) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Supported backend frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Backend {
    FastApi,
    Flask,
    Express,
    Django,
    DotNet,
}

impl Backend {
    /// All registered backend identifiers.
    pub const ALL: [Backend; 5] = [
        Self::FastApi,
        Self::Flask,
        Self::Express,
        Self::Django,
        Self::DotNet,
    ];

    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FastApi => "fastapi",
            Self::Flask => "flask",
            Self::Express => "express",
            Self::Django => "django",
            Self::DotNet => "dotnet",
        }
    }

    /// Parse a user-supplied identifier (case-insensitive, accepts ".net").
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value.trim().to_lowercase().as_str() {
            "fastapi" => Ok(Self::FastApi),
            "flask" => Ok(Self::Flask),
            "express" | "node" | "nodejs" => Ok(Self::Express),
            "django" => Ok(Self::Django),
            "dotnet" | ".net" | "csharp" => Ok(Self::DotNet),
            _ => Err(RequestError::UnknownStackIdentifier {
                field: "backend",
                value: value.to_string(),
            }),
        }
    }

    /// Primary source language of this backend.
    pub fn language(self) -> &'static str {
        match self {
            Self::FastApi | Self::Flask | Self::Django => "python",
            Self::Express => "javascript",
            Self::DotNet => "csharp",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Backend {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<Backend> for String {
    fn from(value: Backend) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Database
// ============================================================================

/// Supported databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Database {
    PostgreSql,
    MySql,
    MongoDb,
    Sqlite,
    Redis,
}

impl Database {
    /// All registered database identifiers.
    pub const ALL: [Database; 5] = [
        Self::PostgreSql,
        Self::MySql,
        Self::MongoDb,
        Self::Sqlite,
        Self::Redis,
    ];

    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::MongoDb => "mongodb",
            Self::Sqlite => "sqlite",
            Self::Redis => "redis",
        }
    }

    /// Parse a user-supplied identifier (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "mysql" => Ok(Self::MySql),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "sqlite" => Ok(Self::Sqlite),
            "redis" => Ok(Self::Redis),
            _ => Err(RequestError::UnknownStackIdentifier {
                field: "database",
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Database {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<Database> for String {
    fn from(value: Database) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Architecture
// ============================================================================

/// Project layout architecture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Architecture {
    /// Single project tree with `src/server` and `src/client`.
    #[default]
    Monolithic,
    /// Separate `backend/` and `frontend/` trees.
    Microservices,
}

impl Architecture {
    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monolithic => "monolithic",
            Self::Microservices => "microservices",
        }
    }

    /// Parse a user-supplied identifier (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value.trim().to_lowercase().as_str() {
            "monolithic" | "monolith" => Ok(Self::Monolithic),
            "microservices" | "microservice" => Ok(Self::Microservices),
            _ => Err(RequestError::UnknownStackIdentifier {
                field: "architecture",
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Architecture {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<Architecture> for String {
    fn from(value: Architecture) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// TechStack
// ============================================================================

/// The stack configuration carried through every stage of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechStack {
    pub frontend: Frontend,
    pub backend: Backend,
    pub database: Database,
    #[serde(default)]
    pub architecture: Architecture,
}

impl TechStack {
    /// Parse a stack from user-supplied identifier strings.
    ///
    /// Fails with a typed validation error on the first unknown identifier;
    /// architecture defaults to monolithic when absent.
    pub fn parse(
        frontend: &str,
        backend: &str,
        database: &str,
        architecture: Option<&str>,
    ) -> Result<Self, RequestError> {
        Ok(Self {
            frontend: Frontend::parse(frontend)?,
            backend: Backend::parse(backend)?,
            database: Database::parse(database)?,
            architecture: match architecture {
                Some(a) => Architecture::parse(a)?,
                None => Architecture::default(),
            },
        })
    }

    /// Human-readable triple for prompts and logs, e.g.
    /// `react + fastapi + postgresql (monolithic)`.
    pub fn summary(&self) -> String {
        format!(
            "{} + {} + {} ({})",
            self.frontend, self.backend, self.database, self.architecture
        )
    }

    /// Canonical form used in cache fingerprints.
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.frontend, self.backend, self.database, self.architecture
        )
    }
}
