//! # Webhook signatures
//!
//! The payment provider signs every webhook it sends us so that nobody else can mark an order as paid by posting a
//! forged notification to the webhook endpoint.
//!
//! The signature is an HMAC-SHA256 over the *exact* bytes of the serialized payload, keyed with the shared webhook
//! secret, and is sent as lowercase hex:
//!
//! ```text
//!    hex(HMAC-SHA256(secret, raw_body))
//! ```
//!
//! Re-serializing a parsed body will not, in general, reproduce the same bytes, so callers must verify against the
//! raw request body.
//!
//! These functions are pure. Deciding what to do when the secret has not been configured is up to the caller; an empty
//! secret is a misconfiguration, not a bad signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes the lowercase hex HMAC-SHA256 of `payload` keyed with `secret`.
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never fails
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the signature we expect for `payload`.
///
/// Lengths are compared first (they are not secret); equal-length values are then compared in constant time.
/// Any mismatch, including a length mismatch or a non-hex signature, simply returns `false`.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &[u8]) -> bool {
    let expected = sign_payload(payload, secret);
    if signature.len() != expected.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &[u8] = b"a-test-secret-that-is-at-least-32-bytes";

    #[test]
    fn known_vector() {
        let sig = sign_payload(b"The quick brown fox jumps over the lazy dog", b"key");
        assert_eq!(sig, "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8");
    }

    #[test]
    fn signatures_verify() {
        let payloads: [&[u8]; 4] = [b"", b"{}", br#"{"orderId":"o1","paymentId":"p1","status":"PAID"}"#, &[0u8, 255, 7]];
        for payload in payloads {
            let sig = sign_payload(payload, SECRET);
            assert_eq!(sig.len(), 64);
            assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            assert!(verify_signature(payload, &sig, SECRET));
        }
    }

    #[test]
    fn corrupted_signatures_are_rejected() {
        let payload = br#"{"orderId":"o1","paymentId":"p1","status":"PAID"}"#;
        let sig = sign_payload(payload, SECRET);
        // single flipped character
        let mut flipped = sig.clone().into_bytes();
        flipped[10] = if flipped[10] == b'0' { b'1' } else { b'0' };
        assert!(!verify_signature(payload, &String::from_utf8(flipped).unwrap(), SECRET));
        // wrong lengths
        assert!(!verify_signature(payload, &sig[..63], SECRET));
        assert!(!verify_signature(payload, &format!("{sig}0"), SECRET));
        assert!(!verify_signature(payload, "", SECRET));
        // uppercase hex is a different string
        assert!(!verify_signature(payload, &sig.to_uppercase(), SECRET));
        // wrong secret, tampered payload
        assert!(!verify_signature(payload, &sig, b"another-secret"));
        assert!(!verify_signature(br#"{"orderId":"o1","paymentId":"p1","status":"FAILED"}"#, &sig, SECRET));
    }
}
