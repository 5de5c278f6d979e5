use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::api_model::Resource;
use crate::catalog::FormKind;
use crate::session::session_model::SessionRole;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "school-dashboard",
    version,
    about = "Multi-tenant school management dashboard client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend base URL
    #[arg(long, global = true, env = "SCHOOL_DASHBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Session file written by `session set`
    #[arg(long, global = true, env = "SCHOOL_DASHBOARD_SESSION")]
    pub session_file: Option<String>,

    /// Path to config file (default: school-dashboard.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available forms
    Forms,

    /// Show the fields a form renders for the given values
    Describe {
        #[arg(long, value_enum)]
        form: FormKind,

        /// Field values, e.g. --set type=Student
        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
    },

    /// Validate an input file against a form without contacting the backend
    Validate {
        #[arg(long, value_enum)]
        form: FormKind,

        /// YAML or JSON file of field values
        #[arg(long)]
        input: Option<String>,

        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
    },

    /// Create a record, or update one when --id is given
    Submit {
        #[arg(long, value_enum)]
        form: FormKind,

        /// YAML or JSON file of field values
        #[arg(long)]
        input: Option<String>,

        /// Record to edit; its current values are fetched first
        #[arg(long)]
        id: Option<String>,

        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,

        /// Files to upload, e.g. --file logo=./logo.png
        #[arg(long = "file", value_parser = parse_key_val)]
        file: Vec<(String, String)>,
    },

    /// List records of a resource
    List {
        #[arg(long, value_enum)]
        resource: Resource,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 25)]
        page_size: u32,

        #[arg(long)]
        search: Option<String>,

        /// Equality filters, e.g. --filter classId=7
        #[arg(long = "filter", value_parser = parse_key_val)]
        filter: Vec<(String, String)>,
    },

    /// Delete a record
    Delete {
        #[arg(long, value_enum)]
        resource: Resource,

        #[arg(long)]
        id: String,
    },

    /// Manage the stored session
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store tenant, token and roles (sign in)
    Set {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        token: String,

        #[arg(long = "role", value_enum)]
        roles: Vec<SessionRole>,

        #[arg(long)]
        school: Option<String>,
    },

    /// Print the stored session (token masked)
    Show,

    /// Remove the stored session (sign out)
    Clear,
}

/// Parse `key=value`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if k.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `school-dashboard.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// `None` when the timeout is 0 (client default).
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_trace_path")]
    pub path: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_trace_path(),
        }
    }
}

// Serde default helpers
fn default_base_url() -> String { "http://localhost:1337/api".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_session_path() -> String { ".school-dashboard/session.json".to_string() }
fn default_trace_path() -> String { "submit_trace.jsonl".to_string() }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("school-dashboard.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %config_path, error = %e, "malformed config, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Settings after merging CLI flags (and their env vars) over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub api_url: String,
    pub timeout: Option<Duration>,
    pub session_path: String,
    pub trace_path: Option<String>,
}

pub fn resolve_settings(cli: &Cli, config: &AppConfig) -> ResolvedSettings {
    ResolvedSettings {
        api_url: cli
            .api_url
            .clone()
            .unwrap_or_else(|| config.api.base_url.clone()),
        timeout: config.api.timeout(),
        session_path: cli
            .session_file
            .clone()
            .unwrap_or_else(|| config.session.path.clone()),
        trace_path: config.trace.enabled.then(|| config.trace.path.clone()),
    }
}
