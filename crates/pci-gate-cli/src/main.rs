// crates/pci-gate-cli/src/main.rs
// ============================================================================
// Module: PCI Gate CLI
// Description: Operator command line for the PCI compliance gate.
// Purpose: Run payload scans, gate checks, encryption, audit, and compliance
//          tooling against local inputs.
// Dependencies: clap, pci-gate-config, pci-gate-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! The `pci-gate` binary exposes every gate control as a subcommand that reads
//! JSON from a file (or `-` for stdin) and prints JSON to stdout. Failures are
//! reported on stderr as `{"code": ..., "message": ...}` with a non-zero exit.
//!
//! Security posture: CLI inputs are untrusted; reads are size-bounded and
//! secrets are only taken from environment variables.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use pci_gate_config::PciGateConfig;
use pci_gate_config::config::CONFIG_ENV_VAR;
use pci_gate_config::config::DEFAULT_CONFIG_NAME;
use pci_gate_core::AuditEventInput;
use pci_gate_core::EncryptionEnvelope;
use pci_gate_core::GateDecision;
use pci_gate_core::PCI_COMPLIANCE_GUIDANCE;
use pci_gate_core::PaymentActor;
use pci_gate_core::PaymentGate;
use pci_gate_core::PaymentPermission;
use pci_gate_core::PaymentRequest;
use pci_gate_core::PciBreachIncidentInput;
use pci_gate_core::PciError;
use pci_gate_core::RequestContext;
use pci_gate_core::WebhookError;
use pci_gate_core::assert_no_raw_card_data;
use pci_gate_core::build_pci_security_headers;
use pci_gate_core::create_pci_audit_event;
use pci_gate_core::create_pci_breach_incident_response;
use pci_gate_core::decrypt_sensitive_payment_metadata;
use pci_gate_core::encrypt_sensitive_payment_metadata;
use pci_gate_core::extract_stripe_token_reference;
use pci_gate_core::get_quarterly_assessment_status;
use pci_gate_core::runtime::webhook::DEFAULT_WEBHOOK_TOLERANCE_SECS;
use pci_gate_core::sanitize_pci_payload;
use pci_gate_core::verify_audit_chain;
use pci_gate_core::verify_webhook_signature;
use pci_gate_core::write_pci_audit_event;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Limits and Constants
// ============================================================================

/// Maximum size of any JSON or text input.
const MAX_INPUT_BYTES: usize = 1024 * 1024;
/// Input path that selects stdin.
const STDIN_PATH: &str = "-";
/// Default environment variable holding the webhook signing secret.
const DEFAULT_WEBHOOK_SECRET_ENV: &str = "PCI_WEBHOOK_SECRET";
/// Error code for CLI-level failures (I/O, parsing, config).
const CLI_ERROR_CODE: &str = "PCI_CLI_ERROR";
/// Error code for rejected webhook deliveries.
const WEBHOOK_ERROR_CODE: &str = "PCI_WEBHOOK_REJECTED";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pci-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Path to `pci-gate.toml` (overrides `PCI_GATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fail if a JSON payload contains raw card data.
    Scan(InputArgs),
    /// Print a JSON payload with card data redacted.
    Sanitize(InputArgs),
    /// Extract the processor token reference from a JSON payload.
    Token(InputArgs),
    /// Run a full payment request document through the gate.
    Check(InputArgs),
    /// Encrypt sensitive metadata read from a text input.
    Encrypt(InputArgs),
    /// Decrypt an encryption envelope read from a JSON input.
    Decrypt(InputArgs),
    /// Report quarterly self-assessment status.
    Assessment(AssessmentCommand),
    /// Generate a breach incident response plan.
    Incident(InputArgs),
    /// Print the security response headers.
    Headers(HeadersCommand),
    /// Print the compliance guidance summary.
    Guidance,
    /// Audit trail utilities.
    Audit {
        /// Selected audit subcommand.
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Webhook utilities.
    Webhook {
        /// Selected webhook subcommand.
        #[command(subcommand)]
        command: WebhookCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Single-input arguments.
#[derive(Args, Debug)]
struct InputArgs {
    /// Input file path, or `-` for stdin.
    #[arg(long, short = 'i', value_name = "PATH", default_value = STDIN_PATH)]
    input: PathBuf,
}

/// Arguments for `assessment`.
#[derive(Args, Debug)]
struct AssessmentCommand {
    /// Last completed assessment (RFC 3339); defaults to the config value.
    #[arg(long, value_name = "TIMESTAMP")]
    last: Option<String>,
}

/// Arguments for `headers`.
#[derive(Args, Debug)]
struct HeadersCommand {
    /// Header override as `Name=Value` (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_header_pair)]
    overrides: Vec<(String, String)>,
}

/// Audit subcommands.
#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Build a redacted audit event and write it to the configured sink.
    Emit(InputArgs),
    /// Verify a hash-chained audit file.
    Verify(AuditVerifyCommand),
}

/// Arguments for `audit verify`.
#[derive(Args, Debug)]
struct AuditVerifyCommand {
    /// Audit file to verify.
    #[arg(long, value_name = "PATH")]
    path: PathBuf,
}

/// Webhook subcommands.
#[derive(Subcommand, Debug)]
enum WebhookCommand {
    /// Verify a signed webhook payload.
    Verify(WebhookVerifyCommand),
}

/// Arguments for `webhook verify`.
#[derive(Args, Debug)]
struct WebhookVerifyCommand {
    /// Raw payload file, or `-` for stdin.
    #[arg(long, value_name = "PATH", default_value = STDIN_PATH)]
    payload: PathBuf,
    /// Signature header value (`t=...,v1=...`).
    #[arg(long, value_name = "HEADER")]
    signature: String,
    /// Environment variable holding the signing secret.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_WEBHOOK_SECRET_ENV)]
    secret_env: String,
    /// Allowed clock skew in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_WEBHOOK_TOLERANCE_SECS)]
    tolerance: i64,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate,
}

/// JSON request document accepted by `check`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CheckDocument {
    /// HTTP method.
    method: String,
    /// Request URL.
    url: String,
    /// Request headers.
    #[serde(default)]
    headers: BTreeMap<String, String>,
    /// Acting principal.
    actor: PaymentActor,
    /// Required permission.
    permission: PaymentPermission,
    /// Request body.
    #[serde(default)]
    body: Value,
    /// Payment resource identifier.
    #[serde(default)]
    resource_id: Option<String>,
    /// Caller IP address.
    #[serde(default)]
    ip_address: Option<String>,
    /// Sensitive metadata to encrypt.
    #[serde(default)]
    sensitive_metadata: Option<String>,
}

impl CheckDocument {
    /// Converts the document into a gate request.
    fn into_request(self) -> PaymentRequest {
        let mut context = RequestContext::new(self.method, self.url);
        for (name, value) in self.headers {
            context = context.with_header(&name, value);
        }
        let mut request = PaymentRequest::new(context, self.actor, self.permission, self.body);
        request.resource_id = self.resource_id;
        request.ip_address = self.ip_address;
        request.sensitive_metadata = self.sensitive_metadata;
        request
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a stable code and message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Stable error code.
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a CLI-level error.
    fn new(message: impl Into<String>) -> Self {
        Self {
            code: CLI_ERROR_CODE,
            message: message.into(),
        }
    }

    /// Renders the error as a JSON line.
    fn to_json(&self) -> Value {
        json!({ "code": self.code, "message": self.message })
    }
}

impl From<PciError> for CliError {
    fn from(err: PciError) -> Self {
        Self {
            code: err.code_label(),
            message: err.to_string(),
        }
    }
}

impl From<WebhookError> for CliError {
    fn from(err: WebhookError) -> Self {
        Self {
            code: WEBHOOK_ERROR_CODE,
            message: err.to_string(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let output = match cli.command {
        Commands::Scan(args) => command_scan(&read_json_input(&args.input)?)?,
        Commands::Sanitize(args) => sanitize_pci_payload(&read_json_input(&args.input)?),
        Commands::Token(args) => {
            let token = extract_stripe_token_reference(&read_json_input(&args.input)?)?;
            to_json_value(&token)?
        }
        Commands::Check(args) => {
            let config = load_config(config_path)?;
            command_check(&config, read_json_as(&args.input)?).await?
        }
        Commands::Encrypt(args) => {
            let config = load_config(config_path)?;
            command_encrypt(&config, &read_text_input(&args.input)?)?
        }
        Commands::Decrypt(args) => {
            let config = load_config(config_path)?;
            command_decrypt(&config, &read_json_as(&args.input)?)?
        }
        Commands::Assessment(command) => {
            let config = load_config(config_path)?;
            command_assessment(&config, command.last.as_deref(), None)?
        }
        Commands::Incident(args) => {
            let input: PciBreachIncidentInput = read_json_as(&args.input)?;
            to_json_value(&create_pci_breach_incident_response(input))?
        }
        Commands::Headers(command) => command_headers(command.overrides),
        Commands::Guidance => to_json_value(&PCI_COMPLIANCE_GUIDANCE)?,
        Commands::Audit {
            command,
        } => match command {
            AuditCommand::Emit(args) => {
                let config = load_config(config_path)?;
                command_audit_emit(&config, read_json_as(&args.input)?).await?
            }
            AuditCommand::Verify(command) => {
                let records = verify_audit_chain(&command.path)
                    .map_err(|err| CliError::new(err.to_string()))?;
                json!({ "verified": true, "records": records })
            }
        },
        Commands::Webhook {
            command: WebhookCommand::Verify(command),
        } => command_webhook_verify(&command, |name| std::env::var(name).ok())?,
        Commands::Config {
            command: ConfigCommand::Validate,
        } => {
            load_config(config_path)?;
            json!({ "valid": true })
        }
    };
    write_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Scans a payload and reports it clean.
fn command_scan(payload: &Value) -> CliResult<Value> {
    assert_no_raw_card_data(payload)?;
    Ok(json!({ "clean": true }))
}

/// Runs a request document through a gate built from `config`.
async fn command_check(config: &PciGateConfig, document: CheckDocument) -> CliResult<Value> {
    let writer = config.audit_writer().map_err(|err| CliError::new(err.to_string()))?;
    let gate = PaymentGate::new(writer, config.gate_settings());
    let decision = gate.authorize(&document.into_request()).await?;
    decision_json(&decision)
}

/// Renders an accepted gate decision.
fn decision_json(decision: &GateDecision) -> CliResult<Value> {
    Ok(json!({
        "allowed": true,
        "token": to_json_value(&decision.token)?,
        "encryptedMetadata": to_json_value(&decision.encrypted_metadata)?,
        "auditEvent": to_json_value(&decision.audit_event)?,
    }))
}

/// Encrypts text with the configured key source.
fn command_encrypt(config: &PciGateConfig, plaintext: &str) -> CliResult<Value> {
    let envelope = encrypt_sensitive_payment_metadata(plaintext, &config.encryption_options())?;
    to_json_value(&envelope)
}

/// Decrypts an envelope with the configured key source.
fn command_decrypt(config: &PciGateConfig, envelope: &EncryptionEnvelope) -> CliResult<Value> {
    let plaintext = decrypt_sensitive_payment_metadata(envelope, &config.encryption_options())?;
    Ok(json!({ "plaintext": plaintext }))
}

/// Computes assessment status, preferring `last` over the config value.
fn command_assessment(
    config: &PciGateConfig,
    last: Option<&str>,
    now: Option<OffsetDateTime>,
) -> CliResult<Value> {
    let last = last.or(config.assessment.last_assessment_at.as_deref());
    let status = get_quarterly_assessment_status(last, now)?;
    to_json_value(&status)
}

/// Builds the header set from `Name=Value` overrides.
fn command_headers(overrides: Vec<(String, String)>) -> Value {
    let extra: BTreeMap<String, String> = overrides.into_iter().collect();
    let headers = build_pci_security_headers((!extra.is_empty()).then_some(&extra));
    Value::Object(headers.into_iter().map(|(name, value)| (name, Value::String(value))).collect())
}

/// Builds and persists a redacted audit event.
async fn command_audit_emit(config: &PciGateConfig, input: AuditEventInput) -> CliResult<Value> {
    let writer = config.audit_writer().map_err(|err| CliError::new(err.to_string()))?;
    let hash_key = config.audit_hash_key_with(|name| std::env::var(name).ok());
    let event = create_pci_audit_event(input, hash_key.as_deref())?;
    write_pci_audit_event(&event, writer.as_ref()).await?;
    to_json_value(&event)
}

/// Verifies a webhook delivery with a secret resolved through `lookup`.
fn command_webhook_verify<F>(command: &WebhookVerifyCommand, lookup: F) -> CliResult<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup(&command.secret_env)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CliError::new(format!("{} is not set", command.secret_env)))?;
    let payload = read_input(&command.payload)?;
    verify_webhook_signature(
        &payload,
        &command.signature,
        secret.as_bytes(),
        OffsetDateTime::now_utc(),
        command.tolerance,
    )?;
    Ok(json!({ "verified": true }))
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Loads configuration, falling back to defaults when no file is named and
/// the default file is absent.
fn load_config(path: Option<&Path>) -> CliResult<PciGateConfig> {
    let implicit = path.is_none()
        && std::env::var_os(CONFIG_ENV_VAR).is_none()
        && !Path::new(DEFAULT_CONFIG_NAME).exists();
    if implicit {
        return Ok(PciGateConfig::default());
    }
    PciGateConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Input
// ============================================================================

/// Errors returned by bounded reads.
#[derive(Debug)]
enum ReadLimitError {
    /// I/O failure.
    Io(std::io::Error),
    /// Input exceeds the configured limit.
    TooLarge {
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads from `reader` while enforcing a hard size limit.
fn read_bytes_with_limit<R: Read>(reader: R, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    let mut limited = reader.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads a file or stdin (`-`) with the input size limit.
fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    let result = if path.as_os_str() == STDIN_PATH {
        read_bytes_with_limit(std::io::stdin().lock(), MAX_INPUT_BYTES)
    } else {
        File::open(path)
            .map_err(ReadLimitError::Io)
            .and_then(|file| read_bytes_with_limit(file, MAX_INPUT_BYTES))
    };
    result.map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            limit,
        } => CliError::new(format!("{} exceeds the {limit} byte input limit", path.display())),
    })
}

/// Reads UTF-8 text input.
fn read_text_input(path: &Path) -> CliResult<String> {
    String::from_utf8(read_input(path)?)
        .map_err(|_| CliError::new(format!("{} is not valid utf-8", path.display())))
}

/// Reads JSON input as an untyped value.
fn read_json_input(path: &Path) -> CliResult<Value> {
    read_json_as(path)
}

/// Reads JSON input into `T`.
fn read_json_as<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let bytes = read_input(path)?;
    parse_json(&bytes).map_err(|err| CliError::new(format!("{}: {err}", path.display())))
}

/// Parses JSON bytes into `T`.
///
/// Only the error position is reported; serde messages can quote input values.
fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    serde_json::from_slice(bytes).map_err(|err| {
        format!("invalid json at line {} column {}", err.line(), err.column())
    })
}

/// Parses a `Name=Value` header override.
fn parse_header_pair(value: &str) -> Result<(String, String), String> {
    let (name, header_value) =
        value.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got {value}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name must be non-empty".to_string());
    }
    Ok((name.to_string(), header_value.trim().to_string()))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Serializes a value for output.
fn to_json_value<T: Serialize + ?Sized>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value).map_err(|err| CliError::new(format!("serialization failed: {err}")))
}

/// Writes pretty JSON to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("serialization failed: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error to stderr and returns a failure exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&err.to_json().to_string());
    ExitCode::FAILURE
}
