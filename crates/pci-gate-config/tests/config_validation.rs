//! Config loading and validation tests for pci-gate-config.
// crates/pci-gate-config/tests/config_validation.rs
// =============================================================================
// Module: Config Loading and Validation Tests
// Description: Validate defaults, limits, and fail-closed field rules.
// Purpose: Ensure minimal config is valid and invalid values are rejected.
// =============================================================================

use std::fs;
use std::path::Path;

use pci_gate_config::AuditSinkKind;
use pci_gate_config::ConfigError;
use pci_gate_config::PciGateConfig;
use pci_gate_config::config::MAX_CONFIG_FILE_SIZE;
use pci_gate_core::AuditEventInput;
use pci_gate_core::AuditOutcome;
use pci_gate_core::KeyMaterialPolicy;
use pci_gate_core::create_pci_audit_event;
use pci_gate_core::verify_audit_chain;
use pci_gate_core::write_pci_audit_event;

type TestResult = Result<(), String>;

/// Fails unless `result` is an error whose message contains `needle`.
fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let config = PciGateConfig::from_toml_str("").map_err(|err| err.to_string())?;
    if config.encryption.key_version != "v1" {
        return Err("default key version should be v1".to_string());
    }
    if config.encryption.key_material != KeyMaterialPolicy::Strict {
        return Err("key material should default to strict".to_string());
    }
    if !config.transport.allow_loopback || !config.transport.require_idempotency_key {
        return Err("transport defaults should match the gate defaults".to_string());
    }
    if config.audit.sink != AuditSinkKind::Stderr {
        return Err("audit sink should default to stderr".to_string());
    }
    Ok(())
}

#[test]
fn full_config_round_trips_into_gate_settings() -> TestResult {
    let config = PciGateConfig::from_toml_str(
        r#"
[encryption]
key_version = "2026-q3"
key_material = "allow_raw_utf8"

[transport]
allow_loopback = false
require_idempotency_key = true

[audit]
sink = "none"
hash_key_env = "PCI_AUDIT_HASH_KEY"

[assessment]
last_assessment_at = "2026-01-15T00:00:00Z"
"#,
    )
    .map_err(|err| err.to_string())?;
    let options = config.encryption_options();
    if options.key_version.as_deref() != Some("2026-q3") || options.key.is_some() {
        return Err("encryption options should carry the version and no key".to_string());
    }
    if options.key_policy != KeyMaterialPolicy::AllowRawUtf8 {
        return Err("key policy should be allow_raw_utf8".to_string());
    }
    if config.transport_policy().allow_loopback {
        return Err("loopback should be disabled".to_string());
    }
    let key = config.audit_hash_key_with(|name| {
        (name == "PCI_AUDIT_HASH_KEY").then(|| "hash-secret".to_string())
    });
    if key.as_deref() != Some(b"hash-secret".as_slice()) {
        return Err("hash key should be read from the named variable".to_string());
    }
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    assert_invalid(PciGateConfig::from_toml_str("[encryption]\nkey = \"abc\"\n"), "parse error")
}

#[test]
fn key_version_rules_are_enforced() -> TestResult {
    assert_invalid(
        PciGateConfig::from_toml_str("[encryption]\nkey_version = \"\"\n"),
        "key_version must be non-empty",
    )?;
    assert_invalid(
        PciGateConfig::from_toml_str("[encryption]\nkey_version = \"v 2\"\n"),
        "[A-Za-z0-9._-]",
    )?;
    let long = "v".repeat(65);
    assert_invalid(
        PciGateConfig::from_toml_str(&format!("[encryption]\nkey_version = \"{long}\"\n")),
        "key_version too long",
    )
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        PciGateConfig::from_toml_str("[audit]\nsink = \"file\"\n"),
        "audit.path is required",
    )
}

#[test]
fn hash_key_env_must_be_a_variable_name() -> TestResult {
    assert_invalid(
        PciGateConfig::from_toml_str("[audit]\nhash_key_env = \"1BAD-NAME\"\n"),
        "hash_key_env",
    )
}

#[test]
fn assessment_timestamp_must_parse() -> TestResult {
    assert_invalid(
        PciGateConfig::from_toml_str("[assessment]\nlast_assessment_at = \"yesterday\"\n"),
        "RFC 3339",
    )
}

#[test]
fn load_resolves_env_path_and_enforces_limits() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("gate.toml");
    fs::write(&path, "[transport]\nallow_loopback = false\n").map_err(|err| err.to_string())?;
    let env_path = path.to_string_lossy().to_string();
    let config = PciGateConfig::load_with(None, |name| {
        (name == "PCI_GATE_CONFIG").then(|| env_path.clone())
    })
    .map_err(|err| err.to_string())?;
    if config.transport.allow_loopback {
        return Err("config should be read from the env path".to_string());
    }

    let oversized = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_SIZE));
    fs::write(&oversized, padding).map_err(|err| err.to_string())?;
    assert_invalid(PciGateConfig::load(Some(&oversized)), "size limit")?;

    let binary = dir.path().join("bin.toml");
    fs::write(&binary, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(PciGateConfig::load(Some(&binary)), "utf-8")?;

    assert_invalid(PciGateConfig::load(Some(Path::new("/nonexistent/pci-gate.toml"))), "io error")
}

#[tokio::test]
async fn file_sink_opens_chained_writer() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let audit_path = dir.path().join("audit.jsonl");
    let text = format!("[audit]\nsink = \"file\"\npath = \"{}\"\n", audit_path.display());
    let config = PciGateConfig::from_toml_str(&text).map_err(|err| err.to_string())?;
    let writer = config.audit_writer().map_err(|err| err.to_string())?;
    let input = AuditEventInput::new("svc1", "payment.read", "payment", AuditOutcome::Success);
    let event = create_pci_audit_event(input, None).map_err(|err| err.to_string())?;
    write_pci_audit_event(&event, writer.as_ref()).await.map_err(|err| err.to_string())?;
    let count = verify_audit_chain(&audit_path).map_err(|err| err.to_string())?;
    if count != 1 {
        return Err(format!("expected one chained record, found {count}"));
    }
    Ok(())
}
