// crates/pci-gate-config/src/lib.rs
// ============================================================================
// Module: PCI Gate Config Library
// Description: Canonical config model and validation for the PCI gate.
// Purpose: Single source of truth for pci-gate.toml semantics.
// Dependencies: pci-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `pci-gate-config` defines the `pci-gate.toml` model, loads it with strict
//! size and path limits, and converts it into the option types the gate
//! consumes. Key material never lives in the file.
//!
//! Security posture: config inputs are untrusted and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AssessmentConfig;
pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::ConfigError;
pub use config::EncryptionConfig;
pub use config::PciGateConfig;
pub use config::TransportConfig;
