// crates/pci-gate-core/src/runtime/audit_sinks.rs
// ============================================================================
// Module: Audit Writers
// Description: Built-in JSON-lines implementations of the audit writer seam.
// Purpose: Provide stderr, tamper-evident file, in-memory, and no-op writers.
// Dependencies: async-trait, serde_json, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Every writer serializes events as one JSON object per line. The file writer
//! wraps each event in a chain envelope whose `hash` is the SHA-256 of the
//! previous hash followed by the event JSON. The chain starts from `"0"` and
//! resumes from the last line of an existing file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::core::audit::PaymentAuditEvent;
use crate::core::hashing::hash_bytes;
use crate::interfaces::AuditSinkError;
use crate::interfaces::AuditWriter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Previous-hash value of the first chained record.
pub const AUDIT_CHAIN_GENESIS: &str = "0";

// ============================================================================
// SECTION: Stderr Writer
// ============================================================================

/// Writes audit events as JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditWriter;

#[async_trait]
impl AuditWriter for StderrAuditWriter {
    async fn write(&self, event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        let line = serde_json::to_string(event)
            .map_err(|err| AuditSinkError::Serialization(err.to_string()))?;
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{line}").map_err(|err| AuditSinkError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: No-op Writer
// ============================================================================

/// Discards audit events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditWriter;

#[async_trait]
impl AuditWriter for NoopAuditWriter {
    async fn write(&self, _event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Memory Writer
// ============================================================================

/// Captures audit events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditWriter {
    /// Recorded events in write order.
    events: Mutex<Vec<PaymentAuditEvent>>,
}

impl MemoryAuditWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<PaymentAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditWriter for MemoryAuditWriter {
    async fn write(&self, event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| AuditSinkError::Rejected("memory audit writer poisoned".to_string()))?;
        events.push(event.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Hash-Chained File Writer
// ============================================================================

/// One line of a hash-chained audit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedAuditRecord {
    /// Recorded event.
    pub event: PaymentAuditEvent,
    /// Hash of the preceding record.
    pub prev_hash: String,
    /// Hash of `prev_hash` followed by the event JSON.
    pub hash: String,
}

/// Append-only, hash-chained JSON-lines audit file.
pub struct HashChainedFileAuditWriter {
    /// Append handle and the hash of the last written record.
    state: Mutex<ChainState>,
}

/// Mutable chain state guarded as one unit.
struct ChainState {
    /// Append handle.
    file: File,
    /// Hash of the last written record.
    last_hash: String,
}

impl HashChainedFileAuditWriter {
    /// Opens or creates a chained audit file and resumes its chain.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError`] when the file cannot be opened or an
    /// existing line does not parse.
    pub fn open(path: &Path) -> Result<Self, AuditSinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|err| AuditSinkError::Io(err.to_string()))?;
        let last_hash = load_last_hash(&file)?;
        Ok(Self {
            state: Mutex::new(ChainState {
                file,
                last_hash,
            }),
        })
    }

    /// Returns the hash of the last written record.
    #[must_use]
    pub fn last_hash(&self) -> Option<String> {
        self.state.lock().ok().map(|state| state.last_hash.clone())
    }
}

#[async_trait]
impl AuditWriter for HashChainedFileAuditWriter {
    async fn write(&self, event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuditSinkError::Rejected("audit chain lock poisoned".to_string()))?;
        let record = chain_record(event, &state.last_hash)?;
        let line = serde_json::to_string(&record)
            .map_err(|err| AuditSinkError::Serialization(err.to_string()))?;
        writeln!(state.file, "{line}").map_err(|err| AuditSinkError::Io(err.to_string()))?;
        state.file.flush().map_err(|err| AuditSinkError::Io(err.to_string()))?;
        state.last_hash = record.hash;
        Ok(())
    }
}

/// Builds the chained record for `event` following `prev_hash`.
///
/// # Errors
///
/// Returns [`AuditSinkError::Serialization`] when the event cannot be encoded.
pub fn chain_record(
    event: &PaymentAuditEvent,
    prev_hash: &str,
) -> Result<ChainedAuditRecord, AuditSinkError> {
    let payload =
        serde_json::to_vec(event).map_err(|err| AuditSinkError::Serialization(err.to_string()))?;
    let mut combined = prev_hash.as_bytes().to_vec();
    combined.extend_from_slice(&payload);
    Ok(ChainedAuditRecord {
        event: event.clone(),
        prev_hash: prev_hash.to_string(),
        hash: hash_bytes(&combined).value,
    })
}

/// Verifies every link of a chained audit file.
///
/// Returns the number of records checked.
///
/// # Errors
///
/// Returns [`AuditSinkError::Rejected`] naming the first broken line.
pub fn verify_audit_chain(path: &Path) -> Result<usize, AuditSinkError> {
    let file = File::open(path).map_err(|err| AuditSinkError::Io(err.to_string()))?;
    let mut prev_hash = AUDIT_CHAIN_GENESIS.to_string();
    let mut count = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| AuditSinkError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(&line)?;
        let expected = chain_record(&record.event, &prev_hash)?;
        if record.prev_hash != prev_hash || record.hash != expected.hash {
            return Err(AuditSinkError::Rejected(format!(
                "audit chain broken at line {}",
                index + 1
            )));
        }
        prev_hash = record.hash;
        count += 1;
    }
    Ok(count)
}

/// Reads the last record hash from an open chain file.
fn load_last_hash(file: &File) -> Result<String, AuditSinkError> {
    let reader = BufReader::new(file.try_clone().map_err(|err| AuditSinkError::Io(err.to_string()))?);
    let mut last_hash = AUDIT_CHAIN_GENESIS.to_string();
    for line in reader.lines() {
        let line = line.map_err(|err| AuditSinkError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        last_hash = parse_record(&line)?.hash;
    }
    Ok(last_hash)
}

/// Parses one chain line.
fn parse_record(line: &str) -> Result<ChainedAuditRecord, AuditSinkError> {
    serde_json::from_str(line).map_err(|err| AuditSinkError::Serialization(err.to_string()))
}
