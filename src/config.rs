//! Configuration management for Course CMS.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (the legacy `PORT`, `DB_USER` and `DB_PASS`
//!   names, everything else with a `CMS_` prefix)
//! - Defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `CMS_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `CMS_MONGO_URI` - Full MongoDB connection string
//! - `DB_USER` / `DB_PASS` - Credentials used when no URI is given
//! - `CMS_DB_CLUSTER` - Cluster host used when no URI is given
//! - `CMS_DB_NAME` - Database name (default: fujiamaDB)
//! - `CMS_MEMORY_STORE` - Use the in-memory store instead of MongoDB
//! - `CMS_VIDEO_DIR` / `CMS_PDF_DIR` - Upload directories
//! - `CMS_MAX_JSON_BODY` - Maximum JSON request body in bytes
//! - `CMS_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::store::build_mongo_uri;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "fujiamaDB";

/// Default Atlas cluster host.
pub const DEFAULT_DB_CLUSTER: &str = "cluster0.d2rf7.mongodb.net";

/// Default application name reported to the cluster.
pub const DEFAULT_DB_APP_NAME: &str = "Cluster0";

/// Default directory for uploaded videos.
pub const DEFAULT_VIDEO_DIR: &str = "uploads";

/// Default directory for uploaded PDFs.
pub const DEFAULT_PDF_DIR: &str = "ebooks";

/// Default JSON body limit (16 MiB).
pub const DEFAULT_MAX_JSON_BODY: usize = 16 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Course CMS - REST backend for courses, e-books, users and media.
#[derive(Parser, Debug, Clone)]
#[command(name = "course-cms")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Verify the store and upload directories are usable, then exit.
    Check(CheckConfig),
}

/// Document store connection options, shared by `serve` and `check`.
#[derive(Args, Debug, Clone)]
pub struct StoreConfig {
    /// Full MongoDB connection string. Takes precedence over the
    /// credential options below.
    #[arg(long, env = "CMS_MONGO_URI")]
    pub mongo_uri: Option<String>,

    /// Database user, used to build the connection string.
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// Database password, used to build the connection string.
    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    /// Cluster host, used to build the connection string.
    #[arg(long, default_value = DEFAULT_DB_CLUSTER, env = "CMS_DB_CLUSTER")]
    pub db_cluster: String,

    /// Application name reported to the cluster.
    #[arg(long, default_value = DEFAULT_DB_APP_NAME, env = "CMS_DB_APP_NAME")]
    pub db_app_name: String,

    /// Database holding all collections.
    #[arg(long, default_value = DEFAULT_DB_NAME, env = "CMS_DB_NAME")]
    pub db_name: String,

    /// Keep all documents in process memory instead of MongoDB.
    ///
    /// Data is lost on exit. Intended for local development.
    #[arg(long, default_value_t = false, env = "CMS_MEMORY_STORE")]
    pub memory_store: bool,
}

impl StoreConfig {
    /// Validate that a MongoDB target can be resolved.
    pub fn validate(&self) -> Result<(), String> {
        self.mongo_uri().map(|_| ())
    }

    /// The connection string to use, or `None` when running in memory.
    pub fn mongo_uri(&self) -> Result<Option<String>, String> {
        if self.memory_store {
            return Ok(None);
        }
        if let Some(ref uri) = self.mongo_uri {
            if uri.trim().is_empty() {
                return Err("mongo_uri must not be empty".to_string());
            }
            return Ok(Some(uri.clone()));
        }
        match (&self.db_user, &self.db_pass) {
            (Some(user), Some(pass)) if !user.is_empty() => Ok(Some(build_mongo_uri(
                user,
                pass,
                &self.db_cluster,
                &self.db_app_name,
            ))),
            _ => Err("No database configured. Set --mongo-uri or CMS_MONGO_URI, \
                 or both DB_USER and DB_PASS, or use --memory-store"
                .to_string()),
        }
    }

    /// Description of the store target that is safe to log.
    pub fn describe(&self) -> String {
        if self.memory_store {
            "in-memory".to_string()
        } else if self.mongo_uri.is_some() {
            format!("mongodb (uri), database {}", self.db_name)
        } else {
            format!("mongodb {}, database {}", self.db_cluster, self.db_name)
        }
    }
}

/// Upload directory options, shared by `serve` and `check`.
#[derive(Args, Debug, Clone)]
pub struct MediaConfig {
    /// Directory for uploaded videos (served under /uploads).
    #[arg(long, default_value = DEFAULT_VIDEO_DIR, env = "CMS_VIDEO_DIR")]
    pub video_dir: PathBuf,

    /// Directory for uploaded PDFs (served under /ebooks).
    #[arg(long, default_value = DEFAULT_PDF_DIR, env = "CMS_PDF_DIR")]
    pub pdf_dir: PathBuf,
}

impl MediaConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.video_dir.as_os_str().is_empty() || self.pdf_dir.as_os_str().is_empty() {
            return Err("video_dir and pdf_dir must not be empty".to_string());
        }
        if self.video_dir == self.pdf_dir {
            return Err("video_dir and pdf_dir must be different directories".to_string());
        }
        Ok(())
    }
}

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CMS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Maximum JSON request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_JSON_BODY, env = "CMS_MAX_JSON_BODY")]
    pub max_json_body: usize,

    // =========================================================================
    // Store and Media
    // =========================================================================
    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub media: MediaConfig,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CMS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()?;
        self.media.validate()?;

        if self.max_json_body == 0 {
            return Err("max_json_body must be greater than 0".to_string());
        }

        if let Some(ref origins) = self.cors_origins {
            for origin in origins {
                if origin.parse::<http::HeaderValue>().is_err() || !origin.contains("://") {
                    return Err(format!("Invalid CORS origin: {}", origin));
                }
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Options for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub media: MediaConfig,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
