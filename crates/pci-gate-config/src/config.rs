// crates/pci-gate-config/src/config.rs
// ============================================================================
// Module: PCI Gate Configuration
// Description: Configuration loading and validation for the PCI gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: pci-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. The file selects policies
//! and names environment variables; it never carries secrets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use pci_gate_core::AuditWriter;
use pci_gate_core::EncryptionOptions;
use pci_gate_core::HashChainedFileAuditWriter;
use pci_gate_core::KeyMaterialPolicy;
use pci_gate_core::NoopAuditWriter;
use pci_gate_core::PaymentGateSettings;
use pci_gate_core::StderrAuditWriter;
use pci_gate_core::TransportPolicy;
use pci_gate_core::core::DEFAULT_KEY_VERSION;
use pci_gate_core::core::time::parse_rfc3339;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "pci-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PCI_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum key version label length.
pub const MAX_KEY_VERSION_LENGTH: usize = 64;
/// Maximum environment variable name length.
const MAX_ENV_VAR_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// File is not valid TOML for the model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Values violate validation rules.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Root of `pci-gate.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PciGateConfig {
    /// Metadata encryption settings.
    pub encryption: EncryptionConfig,
    /// Transport guard settings.
    pub transport: TransportConfig,
    /// Audit output settings.
    pub audit: AuditConfig,
    /// Self-assessment tracking.
    pub assessment: AssessmentConfig,
}

/// `[encryption]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Key version label written into new envelopes.
    pub key_version: String,
    /// Accepted key material encodings.
    pub key_material: KeyMaterialPolicy,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key_version: DEFAULT_KEY_VERSION.to_string(),
            key_material: KeyMaterialPolicy::Strict,
        }
    }
}

/// `[transport]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Accept plain HTTP on loopback hosts.
    pub allow_loopback: bool,
    /// Require idempotency keys on POST requests.
    pub require_idempotency_key: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let policy = TransportPolicy::default();
        Self {
            allow_loopback: policy.allow_loopback,
            require_idempotency_key: policy.require_idempotency_key,
        }
    }
}

/// Audit output destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Hash-chained JSON-lines file.
    File,
    /// Discard events.
    None,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Output destination.
    pub sink: AuditSinkKind,
    /// File path for the `file` sink.
    pub path: Option<PathBuf>,
    /// Environment variable holding the identifier hash key.
    pub hash_key_env: Option<String>,
}

/// `[assessment]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessmentConfig {
    /// Last completed self-assessment (RFC 3339).
    pub last_assessment_at: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl PciGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| env::var(name).ok())
    }

    /// Loads configuration resolving the default path through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolved = resolve_path(path, lookup)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encryption.validate()?;
        self.audit.validate()?;
        self.assessment.validate()
    }

    // ========================================================================
    // SECTION: Conversions
    // ========================================================================

    /// Returns the transport policy.
    #[must_use]
    pub const fn transport_policy(&self) -> TransportPolicy {
        TransportPolicy {
            allow_loopback: self.transport.allow_loopback,
            require_idempotency_key: self.transport.require_idempotency_key,
        }
    }

    /// Returns encryption options; key material is resolved per call.
    #[must_use]
    pub fn encryption_options(&self) -> EncryptionOptions {
        EncryptionOptions::default()
            .key_version(self.encryption.key_version.clone())
            .key_policy(self.encryption.key_material)
    }

    /// Reads the audit hash key through `lookup`.
    #[must_use]
    pub fn audit_hash_key_with<F>(&self, lookup: F) -> Option<Vec<u8>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = self.audit.hash_key_env.as_deref()?;
        lookup(name).filter(|value| !value.is_empty()).map(String::into_bytes)
    }

    /// Builds gate settings, reading the audit hash key from the environment.
    #[must_use]
    pub fn gate_settings(&self) -> PaymentGateSettings {
        PaymentGateSettings {
            transport: self.transport_policy(),
            encryption: self.encryption_options(),
            audit_hash_key: self.audit_hash_key_with(|name| env::var(name).ok()),
        }
    }

    /// Opens the configured audit writer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the sink cannot be opened.
    pub fn audit_writer(&self) -> Result<Arc<dyn AuditWriter>, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditWriter)),
            AuditSinkKind::None => Ok(Arc::new(NoopAuditWriter)),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for file sink".to_string())
                })?;
                let writer = HashChainedFileAuditWriter::open(path)
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(writer))
            }
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl EncryptionConfig {
    /// Validates the key version label.
    fn validate(&self) -> Result<(), ConfigError> {
        let version = self.key_version.as_str();
        if version.is_empty() {
            return Err(ConfigError::Invalid(
                "encryption.key_version must be non-empty".to_string(),
            ));
        }
        if version.len() > MAX_KEY_VERSION_LENGTH {
            return Err(ConfigError::Invalid("encryption.key_version too long".to_string()));
        }
        if !version.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')) {
            return Err(ConfigError::Invalid(
                "encryption.key_version must use [A-Za-z0-9._-]".to_string(),
            ));
        }
        Ok(())
    }
}

impl AuditConfig {
    /// Validates sink requirements and the hash key variable name.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                return Err(ConfigError::Invalid(
                    "audit.path is required for file sink".to_string(),
                ));
            }
            (_, Some(path)) => validate_path_string("audit.path", &path.to_string_lossy())?,
            _ => {}
        }
        if let Some(name) = &self.hash_key_env
            && !is_env_var_name(name)
        {
            return Err(ConfigError::Invalid(
                "audit.hash_key_env must be a valid environment variable name".to_string(),
            ));
        }
        Ok(())
    }
}

impl AssessmentConfig {
    /// Validates the assessment timestamp.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(value) = &self.last_assessment_at {
            parse_rfc3339(value).map_err(|_| {
                ConfigError::Invalid("assessment.last_assessment_at must be RFC 3339".to_string())
            })?;
        }
        Ok(())
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*` within the length limit.
fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_ENV_VAR_NAME_LENGTH
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Resolves the config path from the argument, the environment, or the default.
fn resolve_path<F>(path: Option<&Path>, lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_path(Path::new(trimmed))
        .map_err(|_| ConfigError::Invalid(format!("{field} exceeds path limits")))
}
