use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates a cryptographically random code verifier for PKCE.
///
/// Returns a 64-character URL-safe string (RFC 7636 compliant, 43-128 chars).
#[must_use]
pub fn generate_code_verifier() -> String {
    let random_bytes: [u8; 48] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates a cryptographically random `state` parameter.
///
/// Returns a 32-character URL-safe string (24 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 24] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generates an OIDC `nonce`, bound into the ID token by the provider.
#[must_use]
pub fn generate_nonce() -> String {
    let random_bytes: [u8; 24] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generates an opaque session identifier (256 bits).
#[must_use]
pub fn generate_session_id() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_code_verifier_length() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 64);
    }

    #[test]
    fn test_code_verifier_url_safe() {
        let verifier = generate_code_verifier();
        assert!(is_url_safe(&verifier), "verifier should be URL-safe: {verifier}");
    }

    #[test]
    fn test_code_challenge_deterministic() {
        let verifier = "test_verifier_string";
        assert_eq!(
            generate_code_challenge(verifier),
            generate_code_challenge(verifier)
        );
    }

    #[test]
    fn test_code_challenge_matches_rfc7636_vector() {
        // Appendix B of RFC 7636.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            generate_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_and_nonce_shape() {
        let state = generate_state();
        let nonce = generate_nonce();
        assert_eq!(state.len(), 32);
        assert_eq!(nonce.len(), 32);
        assert!(is_url_safe(&state));
        assert!(is_url_safe(&nonce));
    }

    #[test]
    fn test_values_unique_per_call() {
        assert_ne!(generate_state(), generate_state());
        assert_ne!(generate_nonce(), generate_nonce());
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn test_session_id_length() {
        assert_eq!(generate_session_id().len(), 43);
    }
}
