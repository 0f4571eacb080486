//! Webhook signature verification
//!
//! Shopify signs each delivery with HMAC-SHA256 over the raw request body,
//! keyed by the app's shared secret, and sends the digest base64-encoded in
//! `X-Shopify-Hmac-Sha256`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn digest(secret: &str, body: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Header value the sender would attach to `body`
pub fn sign(secret: &str, body: &[u8]) -> String {
    STANDARD.encode(digest(secret, body))
}

/// Check `header` against the digest of `body`.
///
/// The comparison runs over the decoded digest bytes in constant time. A
/// header that is not valid base64 never matches.
pub fn verify(secret: &str, body: &[u8], header: &str) -> bool {
    let provided = match STANDARD.decode(header.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    digest(secret, body).ct_eq(&provided).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "shpss_test_secret";

    #[test]
    fn test_sign_then_verify() {
        let body = br#"{"id":1001,"total_price":"100.00"}"#;
        let header = sign(SECRET, body);
        assert!(verify(SECRET, body, &header));
    }

    #[test]
    fn test_known_digest() {
        // Published HMAC-SHA256 reference vector
        assert_eq!(
            sign("key", b"The quick brown fox jumps over the lazy dog"),
            "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg="
        );
    }

    #[test]
    fn test_any_secret_length_signs() {
        let body = b"{}";
        let long = "x".repeat(200);
        for secret in ["", "k", long.as_str()] {
            let header = sign(secret, body);
            assert_eq!(STANDARD.decode(&header).unwrap().len(), 32);
            assert!(verify(secret, body, &header));
        }
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign(SECRET, br#"{"total_price":"100.00"}"#);
        assert!(!verify(SECRET, br#"{"total_price":"900.00"}"#, &header));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let header = sign("other_secret", body);
        assert!(!verify(SECRET, body, &header));
    }

    #[test]
    fn test_garbage_header_rejected() {
        assert!(!verify(SECRET, b"{}", "not base64!"));
        assert!(!verify(SECRET, b"{}", ""));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let body = b"{}";
        let header = sign(SECRET, body);
        let truncated = STANDARD.encode(&STANDARD.decode(&header).unwrap()[..16]);
        assert!(!verify(SECRET, body, &truncated));
    }
}
