// crates/pci-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Payment Gate
// Description: End-to-end enforcement for inbound payment requests.
// Purpose: Run every inline control in order and audit each outcome.
// Dependencies: serde_json, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`PaymentGate::authorize`] runs, in order: the transport guard (with the
//! actor's access check and the idempotency requirement), the raw card data
//! scan plus token extraction, and optional metadata encryption. Whatever the
//! result, one audit event is built and written:
//! - `success` when every control passed,
//! - `denied` when access control refused the actor,
//! - `failure` for every other rejection.
//!
//! A failed audit write turns a success into
//! [`PciError::AuditWriteFailed`]. Rejections are returned unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::actor::PaymentActor;
use crate::core::actor::PaymentPermission;
use crate::core::audit::AuditEventInput;
use crate::core::audit::AuditOutcome;
use crate::core::audit::PaymentAuditEvent;
use crate::core::envelope::EncryptionEnvelope;
use crate::core::error::PciError;
use crate::core::request::RequestContext;
use crate::core::token::StripeTokenReference;
use crate::interfaces::AuditWriter;
use crate::runtime::audit::create_pci_audit_event;
use crate::runtime::audit::write_pci_audit_event;
use crate::runtime::encryption::EncryptionOptions;
use crate::runtime::encryption::encrypt_sensitive_payment_metadata;
use crate::runtime::tokens::extract_stripe_token_reference;
use crate::runtime::transport::TransportPolicy;
use crate::runtime::transport::assert_request_security_with_policy;
use crate::runtime::transport::idempotency_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Resource type recorded for gate audit events.
pub const PAYMENT_RESOURCE_TYPE: &str = "payment";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Gate-wide settings.
#[derive(Debug, Clone, Default)]
pub struct PaymentGateSettings {
    /// Transport enforcement policy.
    pub transport: TransportPolicy,
    /// Encryption options for sensitive metadata.
    pub encryption: EncryptionOptions,
    /// Optional HMAC key for audit identifier digests.
    pub audit_hash_key: Option<Vec<u8>>,
}

// ============================================================================
// SECTION: Request / Decision
// ============================================================================

/// A payment request presented to the gate.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Transport-level request view.
    pub context: RequestContext,
    /// Authenticated actor.
    pub actor: PaymentActor,
    /// Permission the operation requires.
    pub permission: PaymentPermission,
    /// JSON request body.
    pub body: Value,
    /// Affected resource identifier, hashed in the audit trail.
    pub resource_id: Option<String>,
    /// Caller IP address, hashed in the audit trail.
    pub ip_address: Option<String>,
    /// Non-card metadata to encrypt for storage.
    pub sensitive_metadata: Option<String>,
}

impl PaymentRequest {
    /// Creates a request with no optional fields.
    #[must_use]
    pub fn new(
        context: RequestContext,
        actor: PaymentActor,
        permission: PaymentPermission,
        body: Value,
    ) -> Self {
        Self {
            context,
            actor,
            permission,
            body,
            resource_id: None,
            ip_address: None,
            sensitive_metadata: None,
        }
    }
}

/// Result of a request that passed every control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Extracted processor token.
    pub token: StripeTokenReference,
    /// Encrypted metadata, when requested.
    pub encrypted_metadata: Option<EncryptionEnvelope>,
    /// Audit event recorded for the request.
    pub audit_event: PaymentAuditEvent,
}

/// Controls that passed before audit.
struct Accepted {
    /// Extracted processor token.
    token: StripeTokenReference,
    /// Encrypted metadata, when requested.
    encrypted_metadata: Option<EncryptionEnvelope>,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Inline payment enforcement with an injected audit writer.
pub struct PaymentGate<W> {
    /// Audit persistence.
    writer: W,
    /// Gate settings.
    settings: PaymentGateSettings,
}

impl<W: AuditWriter> PaymentGate<W> {
    /// Creates a gate.
    pub fn new(writer: W, settings: PaymentGateSettings) -> Self {
        Self {
            writer,
            settings,
        }
    }

    /// Returns the audit writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Runs every control against `request` and records the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first control failure, or [`PciError::AuditWriteFailed`]
    /// when an accepted request could not be audited.
    pub async fn authorize(&self, request: &PaymentRequest) -> Result<GateDecision, PciError> {
        let result = self.evaluate(request);
        let event = self.audit_event(request, &result)?;
        let written = write_pci_audit_event(&event, &self.writer).await;
        let accepted = result?;
        written?;
        Ok(GateDecision {
            token: accepted.token,
            encrypted_metadata: accepted.encrypted_metadata,
            audit_event: event,
        })
    }

    /// Runs the inline controls.
    fn evaluate(&self, request: &PaymentRequest) -> Result<Accepted, PciError> {
        let context = request.context.clone().with_actor(request.actor.clone());
        assert_request_security_with_policy(
            &context,
            Some(request.permission),
            self.settings.transport,
        )?;
        let token = extract_stripe_token_reference(&request.body)?;
        let encrypted_metadata = request
            .sensitive_metadata
            .as_deref()
            .map(|plaintext| {
                encrypt_sensitive_payment_metadata(plaintext, &self.settings.encryption)
            })
            .transpose()?;
        Ok(Accepted {
            token,
            encrypted_metadata,
        })
    }

    /// Builds the audit event describing `result`.
    fn audit_event(
        &self,
        request: &PaymentRequest,
        result: &Result<Accepted, PciError>,
    ) -> Result<PaymentAuditEvent, PciError> {
        let mut metadata = Map::new();
        let (outcome, reason) = match result {
            Ok(accepted) => {
                metadata.insert(
                    "tokenType".to_string(),
                    Value::String(accepted.token.kind.as_str().to_string()),
                );
                if let Some(envelope) = &accepted.encrypted_metadata {
                    metadata.insert(
                        "keyVersion".to_string(),
                        Value::String(envelope.key_version.clone()),
                    );
                }
                (AuditOutcome::Success, None)
            }
            Err(err) => {
                metadata
                    .insert("errorCode".to_string(), Value::String(err.code_label().to_string()));
                let outcome = match err {
                    PciError::AccessDenied {
                        ..
                    } => AuditOutcome::Denied,
                    _ => AuditOutcome::Failure,
                };
                (outcome, Some(err.to_string()))
            }
        };
        let mut input = AuditEventInput::new(
            request.actor.id.clone(),
            audit_action(request.permission),
            PAYMENT_RESOURCE_TYPE,
            outcome,
        );
        input.resource_id.clone_from(&request.resource_id);
        input.ip_address.clone_from(&request.ip_address);
        input.request_id = idempotency_key(&request.context.headers).map(str::to_string);
        input.reason = reason;
        input.metadata = metadata;
        create_pci_audit_event(input, self.settings.audit_hash_key.as_deref())
    }
}

/// Returns the audit action label for a permission (`payments:create` maps
/// to `payment.create`).
#[must_use]
pub fn audit_action(permission: PaymentPermission) -> String {
    let verb = permission.as_str().rsplit(':').next().unwrap_or_default();
    format!("payment.{verb}")
}
