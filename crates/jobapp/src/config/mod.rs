use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::workflows::ledger::MatchMode;
use crate::workflows::letter::EscapePolicy;
use crate::workflows::mailer::TlsMode;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "JOBAPP_CONFIG";
/// Settings file used when `JOBAPP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(skip)]
    pub environment: AppEnvironment,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    #[serde(default, alias = "db")]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load the settings file named by `JOBAPP_CONFIG` (or `config.json`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path(None))
    }

    /// Load a specific settings file and apply environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_path(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Resolve the settings path: explicit argument, then environment, then default.
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        dotenvy::dotenv().ok();
        env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Ok(value) = env::var("JOBAPP_ENV") {
            self.environment = AppEnvironment::from_str(&value);
        }
        if let Ok(level) = env::var("JOBAPP_LOG_LEVEL") {
            self.telemetry.log_level = level;
        }
        if let Ok(password) = env::var("JOBAPP_SMTP_PASSWORD") {
            self.mailer.sender_password = password;
        }
    }

    /// Reject settings the send pipeline cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool); 6] = [
            ("mailer.sender_email", self.mailer.sender_email.trim().is_empty()),
            (
                "mailer.smtp_server_address",
                self.mailer.smtp_server_address.trim().is_empty(),
            ),
            ("builder.texfile", self.builder.texfile.trim().is_empty()),
            (
                "builder.output_filename",
                self.builder.output_filename.trim().is_empty(),
            ),
            ("writer.texvars_path", self.writer.texvars_path.as_os_str().is_empty()),
            ("ledger.datafile_path", self.ledger.datafile_path.as_os_str().is_empty()),
        ];

        match checks.iter().find(|(_, missing)| *missing) {
            Some((setting, _)) => Err(ConfigError::MissingSetting(*setting)),
            None => Ok(()),
        }
    }

    /// Write the default settings document, refusing to clobber an existing file.
    pub fn write_default(path: impl AsRef<Path>, force: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        let config = Self::default();
        let document =
            serde_json::to_string_pretty(&config).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source: source.into(),
            })?;
        std::fs::write(path, document).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }
}

/// Letter variables and how they are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default = "default_required_variables")]
    pub required: Vec<String>,
    #[serde(default)]
    pub escape: EscapePolicy,
    #[serde(default)]
    pub fields: FieldMapping,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        let variables = [
            ("stateAgency", "AGENCY"),
            ("vacancyID", "00000"),
            ("hiringManager", "HIRING MANAGER"),
            ("vacancyTitle", "JOB TITLE"),
            ("theirStreetNumber", "1 NAME AVE"),
            ("theirCityStateZip", "CITY, NY 12345"),
            ("theirEmailAddress", "agency@example.gov"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        Self {
            variables,
            required: default_required_variables(),
            escape: EscapePolicy::default(),
            fields: FieldMapping::default(),
        }
    }
}

fn default_required_variables() -> Vec<String> {
    [
        "stateAgency",
        "vacancyID",
        "hiringManager",
        "vacancyTitle",
        "theirEmailAddress",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Names of the template variables that carry the application's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub identifier: String,
    pub title: String,
    pub organization: String,
    pub recipient_name: String,
    pub recipient_address: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            identifier: "vacancyID".to_string(),
            title: "vacancyTitle".to_string(),
            organization: "stateAgency".to_string(),
            recipient_name: "hiringManager".to_string(),
            recipient_address: "theirEmailAddress".to_string(),
        }
    }
}

/// Where the rendered variable file lands for the compiler to include.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    pub texvars_path: PathBuf,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            texvars_path: PathBuf::from("tex/texvars.tex"),
        }
    }
}

/// Document compiler invocation and artifact placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub texfile_dir: PathBuf,
    pub texfile: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub output_filename: String,
    #[serde(default)]
    pub builds_dir: Option<PathBuf>,
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_compile_timeout")]
    pub timeout_secs: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            texfile_dir: PathBuf::from("tex"),
            texfile: "cletter.tex".to_string(),
            output_dir: default_output_dir(),
            output_filename: "cover_letter".to_string(),
            builds_dir: None,
            compiler: default_compiler(),
            timeout_secs: default_compile_timeout(),
        }
    }
}

impl BuilderConfig {
    /// Output directory as seen from the current working directory.
    ///
    /// The compiler runs inside `texfile_dir`, so a relative `output_dir` is
    /// resolved against it.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.texfile_dir.join(&self.output_dir)
    }

    pub fn artifact_file_name(&self) -> String {
        format!("{}.pdf", self.output_filename)
    }

    /// Path the compiler writes the artifact to.
    pub fn compiled_artifact_path(&self) -> PathBuf {
        self.resolved_output_dir().join(self.artifact_file_name())
    }

    /// Destination directory for finished artifacts; an empty value counts as unset.
    pub fn builds_dir(&self) -> Option<&Path> {
        self.builds_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Path the artifact ends up at once the build finishes.
    pub fn final_artifact_path(&self) -> PathBuf {
        match self.builds_dir() {
            Some(dir) => dir.join(self.artifact_file_name()),
            None => self.compiled_artifact_path(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".output")
}

fn default_compiler() -> String {
    "pdflatex".to_string()
}

fn default_compile_timeout() -> u64 {
    120
}

/// Outbound mail settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_password: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_server_address: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    #[serde(default = "default_closing")]
    pub closing: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            sender_email: String::new(),
            sender_name: String::new(),
            sender_password: String::new(),
            smtp_server_address: default_smtp_host(),
            smtp_port: default_smtp_port(),
            tls: TlsMode::default(),
            timeout_secs: default_smtp_timeout(),
            attachments: Vec::new(),
            closing: default_closing(),
        }
    }
}

impl MailerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("sender_password", &"<redacted>")
            .field("smtp_server_address", &self.smtp_server_address)
            .field("smtp_port", &self.smtp_port)
            .field("tls", &self.tls)
            .field("timeout_secs", &self.timeout_secs)
            .field("attachments", &self.attachments)
            .field("closing", &self.closing)
            .finish()
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_closing() -> String {
    "Thank you for the consideration,".to_string()
}

/// Application ledger location and duplicate matching rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub datafile_path: PathBuf,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            datafile_path: PathBuf::from("applications.csv"),
            match_mode: MatchMode::default(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    AlreadyExists(PathBuf),
    MissingSetting(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, .. } => {
                write!(f, "unable to read settings file {}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "settings file {} is invalid: {}", path.display(), source)
            }
            ConfigError::Write { path, .. } => {
                write!(f, "unable to write settings file {}", path.display())
            }
            ConfigError::AlreadyExists(path) => {
                write!(f, "settings file {} already exists", path.display())
            }
            ConfigError::MissingSetting(setting) => write!(f, "{setting} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } | ConfigError::Write { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::AlreadyExists(_) | ConfigError::MissingSetting(_) => None,
        }
    }
}
