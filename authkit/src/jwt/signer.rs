use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// Signs and validates short-lived access tokens.
///
/// Uses HS256 (HMAC with SHA-256). The key material is supplied once at
/// construction and never changes, so the signer is shareable process-wide
/// state with no interior mutability.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validity: Duration,
}

impl TokenSigner {
    /// Create a new token signer.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing key (at least 256 bits for HS256;
    ///   load from configuration, never hard-code)
    /// * `validity` - How long generated tokens remain valid
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            validity,
        }
    }

    /// Generate a signed access token for a subject.
    ///
    /// Embeds `sub`, `roles`, `iat`, and `exp = iat + validity`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn generate(&self, subject: &str, roles: &[String]) -> Result<String, JwtError> {
        let claims = Claims::new(subject, roles.to_vec(), self.validity);
        self.encode(&claims)
    }

    /// Encode pre-built claims into a signed token.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate a token and return its claims.
    ///
    /// Succeeds only if the signature verifies against the signer's key and
    /// the token has not expired. No leeway is applied to `exp`.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiry
    /// * `SignatureInvalid` - Signature does not verify against the key
    /// * `Malformed` - Token is not a structurally valid JWT
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    ErrorKind::InvalidSignature => JwtError::SignatureInvalid,
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}
