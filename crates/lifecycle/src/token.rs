use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, Result};
use crate::path::normalize_resource_path;
use crate::salt::derive_salt;

/// Current token schema version. Bump when the payload layout changes so
/// old tokens can be told apart from corrupted ones.
pub const TOKEN_VERSION: u32 = 1;

/// Opaque-but-decodable payload for a single uploaded resource.
///
/// Field names are deliberately short to keep tokens compact, and are a
/// fixed wire contract along with the declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenPayload {
    /// Token schema version.
    pub ver: u32,
    /// Owning knowledge-base id.
    pub kb_id: String,
    /// Normalized resource path.
    pub rp: String,
    /// Created-at epoch milliseconds.
    pub ca_ms: i64,
    /// 64-bit deterministic RNG salt.
    pub salt: u64,
}

/// Create a compact, URL-safe token representing a resource instance.
///
/// The token encodes version, kb id, normalized path, creation time, and a
/// salt derived from `(seed, kb_id, normalized path)`. Identical inputs
/// always produce the identical token.
pub fn encode_resource_token(
    kb_id: &str,
    resource_path: &str,
    created_at_ms: i64,
    seed: i64,
) -> Result<String> {
    let rp = normalize_resource_path(resource_path)?;
    let salt = derive_salt(seed, kb_id, &rp);
    let payload = TokenPayload {
        ver: TOKEN_VERSION,
        kb_id: kb_id.to_string(),
        rp,
        ca_ms: created_at_ms,
        salt,
    };
    let raw = serde_json::to_vec(&payload)
        .map_err(|e| LifecycleError::MalformedToken(format!("token serialization failed: {e}")))?;
    Ok(URL_SAFE.encode(raw))
}

/// Decode and validate a token back into a [`TokenPayload`].
///
/// Fails with [`LifecycleError::MalformedToken`] when the base64 or JSON is
/// broken, a field is missing or out of range, or the embedded path is not
/// normalization-stable (tamper detection). Fails with
/// [`LifecycleError::UnsupportedTokenVersion`] when the payload carries a
/// positive version other than [`TOKEN_VERSION`].
pub fn decode_resource_token(token: &str) -> Result<TokenPayload> {
    // Canonical padding is required: tokens are issued padded, and any
    // stripped or truncated tail must fail closed rather than decode.
    let raw = URL_SAFE
        .decode(token.as_bytes())
        .map_err(|_| LifecycleError::MalformedToken("token is not valid base64url".to_string()))?;

    let payload: TokenPayload = serde_json::from_slice(&raw)
        .map_err(|e| LifecycleError::MalformedToken(format!("token payload is invalid: {e}")))?;

    if payload.ver == 0 {
        return Err(LifecycleError::MalformedToken(
            "token version must be a positive integer".to_string(),
        ));
    }
    if payload.ver != TOKEN_VERSION {
        return Err(LifecycleError::UnsupportedTokenVersion(payload.ver));
    }

    // The path must round-trip through normalization unchanged; anything
    // else means the token was altered after issuance.
    match normalize_resource_path(&payload.rp) {
        Ok(rp) if rp == payload.rp => Ok(payload),
        _ => Err(LifecycleError::MalformedToken(
            "token resource path is not normalized".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salt::derive_salt;
    use pretty_assertions::assert_eq;

    #[test]
    fn roundtrip_preserves_identity_and_salt() {
        let token = encode_resource_token("kb-42", "./docs//Guide.MD", 1_700_000_000_000, 7)
            .unwrap();
        let payload = decode_resource_token(&token).unwrap();

        assert_eq!(payload.ver, TOKEN_VERSION);
        assert_eq!(payload.kb_id, "kb-42");
        assert_eq!(payload.rp, "docs/Guide.md");
        assert_eq!(payload.ca_ms, 1_700_000_000_000);
        assert_eq!(payload.salt, derive_salt(7, "kb-42", "docs/Guide.md"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_resource_token("kb", "a/b.txt", 1, 0).unwrap();
        let b = encode_resource_token("kb", "a/b.txt", 1, 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_tokens_with_stripped_padding() {
        // This 56-byte payload encodes to a token ending in exactly one '='.
        let raw = br#"{"ver":1,"kb_id":"kb","rp":"a/b.txt","ca_ms":1,"salt":1}"#;
        let token = URL_SAFE.encode(raw);
        assert!(token.ends_with('='));
        assert!(decode_resource_token(&token).is_ok());

        let stripped = token.trim_end_matches('=');
        assert!(matches!(
            decode_resource_token(stripped),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_resource_token("not/base64url!"),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_truncated_token() {
        let token = encode_resource_token("kb", "a/b.txt", 1, 0).unwrap();
        let truncated = &token[..token.len() / 2];
        assert!(matches!(
            decode_resource_token(truncated),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_flipped_payload_byte() {
        let token = encode_resource_token("kb", "a/b.txt", 1, 0).unwrap();
        let mut raw = URL_SAFE.decode(token.as_bytes()).unwrap();
        raw[0] ^= 0x01; // corrupt the leading '{'
        let tampered = URL_SAFE.encode(raw);
        assert!(matches!(
            decode_resource_token(&tampered),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let token = URL_SAFE.encode(b"definitely not json");
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let token = URL_SAFE.encode(br#"{"ver":1,"kb_id":"kb"}"#);
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_salt_beyond_u64() {
        let token = URL_SAFE.encode(
            br#"{"ver":1,"kb_id":"kb","rp":"a/b.txt","ca_ms":1,"salt":18446744073709551616}"#,
        );
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_version_zero_as_malformed() {
        let token =
            URL_SAFE.encode(br#"{"ver":0,"kb_id":"kb","rp":"a/b.txt","ca_ms":1,"salt":1}"#);
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_future_version_as_unsupported() {
        let token =
            URL_SAFE.encode(br#"{"ver":2,"kb_id":"kb","rp":"a/b.txt","ca_ms":1,"salt":1}"#);
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::UnsupportedTokenVersion(2))
        ));
    }

    #[test]
    fn rejects_unnormalized_embedded_path() {
        let token = URL_SAFE.encode(
            br#"{"ver":1,"kb_id":"kb","rp":"./a//B.TXT","ca_ms":1,"salt":1}"#,
        );
        assert!(matches!(
            decode_resource_token(&token),
            Err(LifecycleError::MalformedToken(_))
        ));
    }
}
