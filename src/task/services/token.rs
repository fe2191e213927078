//! Task-scoped bearer tokens for executor authentication.
//!
//! Tokens are stateless HMAC-SHA256 signatures; validation recomputes the
//! signature instead of looking anything up. Format:
//! `base64url(task_id:expiry_unix:hex_signature)` without padding. The
//! validity window doubles as the scheduling-plus-execution budget for the
//! external runner.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use mockable::Clock;
use sha2::Sha256;
use std::sync::Arc;

use crate::task::domain::TaskId;

type HmacSha256 = Hmac<Sha256>;

/// Generates and validates task-scoped bearer tokens.
#[derive(Clone)]
pub struct TaskTokenService {
    secret: Vec<u8>,
    budget_minutes: i64,
    clock: Arc<dyn Clock>,
}

impl TaskTokenService {
    /// Creates a token service over the application secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>, budget_minutes: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            budget_minutes,
            clock,
        }
    }

    /// Generates a bearer token scoped to the given task, valid for the
    /// configured budget window.
    #[must_use]
    pub fn generate(&self, task_id: TaskId) -> String {
        let expiry = self.clock.utc().timestamp() + self.budget_minutes * 60;
        let payload = format!("{task_id}:{expiry}");
        let signature = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{payload}:{signature}"))
    }

    /// Validates a bearer token against the task it claims to authorize.
    ///
    /// Rejects malformed tokens, tokens scoped to a different task, tokens
    /// at or past their expiry instant, and signature mismatches. The
    /// signature check is constant-time.
    #[must_use]
    pub fn validate(&self, token: &str, expected: TaskId) -> bool {
        let Ok(decoded) = URL_SAFE_NO_PAD.decode(token) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };

        let mut parts = decoded.splitn(3, ':');
        let (Some(id_part), Some(expiry_part), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        let Ok(token_task_id) = id_part.parse::<u64>() else {
            return false;
        };
        if TaskId::new(token_task_id) != expected {
            return false;
        }

        let Ok(expiry) = expiry_part.parse::<i64>() else {
            return false;
        };
        if self.clock.utc().timestamp() >= expiry {
            return false;
        }

        self.verify(&format!("{id_part}:{expiry_part}"), signature)
    }

    /// Hex-encoded HMAC-SHA256 over the payload.
    fn sign(&self, payload: &str) -> String {
        let mac = self.mac(payload);
        let digest = mac.finalize().into_bytes();
        digest.iter().fold(
            String::with_capacity(digest.len() * 2),
            |mut out, byte| {
                use std::fmt::Write;
                // Infallible for String; discard the Result to keep the fold simple.
                let _ = write!(out, "{byte:02x}");
                out
            },
        )
    }

    /// Constant-time signature verification.
    fn verify(&self, payload: &str, signature: &str) -> bool {
        let mut decoded = Vec::new();
        let mut rest = signature;
        while !rest.is_empty() {
            let Some((pair, tail)) = rest.split_at_checked(2) else {
                return false;
            };
            let Ok(byte) = u8::from_str_radix(pair, 16) else {
                return false;
            };
            decoded.push(byte);
            rest = tail;
        }
        self.mac(payload).verify_slice(&decoded).is_ok()
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        // HMAC accepts keys of any length, so construction cannot fail.
        #[expect(
            clippy::expect_used,
            reason = "HMAC-SHA256 accepts arbitrary key lengths"
        )]
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC key of any length");
        mac.update(payload.as_bytes());
        mac
    }
}

impl std::fmt::Debug for TaskTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTokenService")
            .field("budget_minutes", &self.budget_minutes)
            .finish_non_exhaustive()
    }
}
