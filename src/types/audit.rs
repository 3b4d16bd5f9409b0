use serde::{Deserialize, Serialize};

use crate::crypto::{sha256_hex, verify_signature};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub user_name: String,
}

/// A signed record describing a single file access event.
///
/// Immutable once signed: `signature` is base64 RSA-PKCS#1 v1.5 over the
/// canonical JSON of the remaining fields, `public_key` the PEM-encoded RSA
/// key of the signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub req_id: String,
    pub timestamp: i64,
    pub access_type: String,
    pub file_info: FileInfo,
    pub user_info: UserInfo,
    pub signature: String,
    pub public_key: String,
}

/// Borrowed view serialized for signing and leaf hashing.
///
/// The field declaration order *is* the canonical key order; `serde_json`
/// preserves struct order and emits compact output, so serializing this view
/// yields the exact byte string the wire contract requires:
/// `{"access_type":...,"file_info":{"file_id":...,"file_name":...},"req_id":...,"timestamp":N,"user_info":{"user_id":...,"user_name":...}}`
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    access_type: &'a str,
    file_info: &'a FileInfo,
    req_id: &'a str,
    timestamp: i64,
    user_info: &'a UserInfo,
}

impl Audit {
    /// Canonical JSON payload of the audit, excluding signature and key.
    pub fn canonical_payload(&self) -> String {
        serde_json::to_string(&CanonicalPayload {
            access_type: &self.access_type,
            file_info: &self.file_info,
            req_id: &self.req_id,
            timestamp: self.timestamp,
            user_info: &self.user_info,
        })
        .expect("serializing canonical audit payload")
    }

    /// Merkle leaf digest: SHA-256 hex of the canonical payload.
    pub fn leaf_hash(&self) -> String {
        sha256_hex(self.canonical_payload().as_bytes())
    }

    /// Check the embedded signature against the canonical payload.
    pub fn verify(&self) -> bool {
        verify_signature(
            self.canonical_payload().as_bytes(),
            &self.signature,
            &self.public_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Audit {
        Audit {
            req_id: "r1".to_string(),
            timestamp: 1_700_000_000,
            access_type: "READ".to_string(),
            file_info: FileInfo {
                file_id: "f1".to_string(),
                file_name: "x".to_string(),
            },
            user_info: UserInfo {
                user_id: "u1".to_string(),
                user_name: "alice".to_string(),
            },
            signature: String::new(),
            public_key: String::new(),
        }
    }

    #[test]
    fn canonical_payload_is_bit_exact() {
        assert_eq!(
            sample().canonical_payload(),
            "{\"access_type\":\"READ\",\"file_info\":{\"file_id\":\"f1\",\"file_name\":\"x\"},\
             \"req_id\":\"r1\",\"timestamp\":1700000000,\"user_info\":{\"user_id\":\"u1\",\
             \"user_name\":\"alice\"}}"
        );
    }

    #[test]
    fn canonical_payload_ignores_signature_fields() {
        let mut audit = sample();
        let payload = audit.canonical_payload();
        audit.signature = "AA==".to_string();
        audit.public_key = "pem".to_string();
        assert_eq!(audit.canonical_payload(), payload);
    }

    #[test]
    fn canonical_payload_escapes_string_values() {
        let mut audit = sample();
        audit.file_info.file_name = "quo\"te".to_string();
        assert!(audit.canonical_payload().contains("\"file_name\":\"quo\\\"te\""));
    }

    #[test]
    fn leaf_hash_is_digest_of_canonical_payload() {
        let audit = sample();
        assert_eq!(
            audit.leaf_hash(),
            sha256_hex(audit.canonical_payload().as_bytes())
        );
    }
}
