use base64ct::{Base64, Encoding};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Verify an RSA-PKCS#1 v1.5 / SHA-256 signature over `payload`.
///
/// The signature is base64 without line breaks; the key is a PEM-encoded RSA
/// public key in either SPKI (`BEGIN PUBLIC KEY`) or PKCS#1
/// (`BEGIN RSA PUBLIC KEY`) form. Any decoding or parsing failure verifies as
/// false.
pub fn verify_signature(payload: &[u8], signature_b64: &str, pubkey_pem: &str) -> bool {
    let Ok(raw) = Base64::decode_vec(signature_b64.trim()) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };
    let Some(public_key) = parse_public_key_pem(pubkey_pem) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(public_key)
        .verify(payload, &signature)
        .is_ok()
}

fn parse_public_key_pem(pem: &str) -> Option<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .ok()
        .or_else(|| RsaPublicKey::from_pkcs1_pem(pem).ok())
}
