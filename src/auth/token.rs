use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::types::{AppError, Claims, Result, Role};

/// Stateless session token codec.
///
/// Tokens are compact HS256 JWTs (`header.payload.signature`, base64url)
/// signed with a process-wide secret supplied at construction. Possession of
/// a correctly signed, unexpired token is proof of identity; no session table
/// exists server-side, and there is no revocation list - a leaked token stays
/// valid until natural expiry.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
}

impl TokenCodec {
    /// Create a codec for `secret` issuing tokens valid for `lifetime_secs`.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard deadline; the default 60s leeway would let
        // just-expired tokens through.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs,
        }
    }

    /// Sign a session token for `subject` with `role`, injecting `iat` and
    /// `exp` from the configured lifetime.
    pub fn sign(&self, subject: &str, role: Role) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.lifetime_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// Malformed, forged, and expired tokens all collapse to the same
    /// `TokenInvalid` error; the cause is not distinguishable to callers.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-key-that-is-at-least-32-chars", 3600)
    }

    #[test]
    fn test_sign_then_verify_returns_claims() {
        let codec = codec();
        let token = codec.sign("user-123", Role::Member).expect("should sign");
        let claims = codec.verify(&token).expect("should verify");

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.role, Role::Member);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative lifetime puts exp in the past at sign time.
        let codec = TokenCodec::new("test-secret-key-that-is-at-least-32-chars", -10);
        let token = codec.sign("user-123", Role::Member).expect("should sign");

        assert!(matches!(codec.verify(&token), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = codec();
        let token = codec.sign("user-123", Role::Member).expect("should sign");

        let dot = token.rfind('.').expect("token has three segments");
        let (data, sig) = token.split_at(dot + 1);
        let mut sig: Vec<u8> = sig.bytes().collect();
        // Flip one bit of the first signature byte, staying in base64url
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{data}{}", String::from_utf8(sig).unwrap());

        assert!(matches!(
            codec.verify(&tampered),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec_a = TokenCodec::new("secret-one-that-is-32-chars-long!", 3600);
        let codec_b = TokenCodec::new("secret-two-that-is-32-chars-long!", 3600);

        let token = codec_a.sign("user-123", Role::Admin).expect("should sign");
        assert!(matches!(
            codec_b.verify(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert!(codec.verify("").is_err());
        assert!(codec.verify("only.two").is_err());
        assert!(codec.verify("too.many.parts.here").is_err());
        assert!(codec.verify("not-a-token").is_err());
    }
}
