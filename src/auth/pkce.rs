use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 32;

/// A PKCE verifier and its S256 challenge (RFC 7636).
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

fn random_url_safe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a fresh verifier (32 random bytes, 43 URL-safe chars) with its challenge.
pub fn generate_verifier_and_challenge() -> PkcePair {
    let verifier = random_url_safe(VERIFIER_BYTES);
    let challenge = challenge_for(&verifier);
    PkcePair { verifier, challenge }
}

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Opaque CSRF token round-tripped through the authorization redirect.
pub fn generate_state() -> String {
    random_url_safe(STATE_BYTES)
}
