use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{GateConfig, KeyFamily};

// Errors returned by token verification. Only ever logged, never sent to the client.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Decoded payload of a verified token.
///
/// Claims are kept as an untyped JSON map: the gate does not know the application's claim
/// schema and passes everything through to downstream handlers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `sub` as a string, when present.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// `exp` as unix seconds, when present.
    pub fn expires_at(&self) -> Option<i64> {
        self.get("exp").and_then(Value::as_i64)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for VerifiedClaims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid verification key for {family:?}: {source}")]
    Invalid {
        family: KeyFamily,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("no algorithms configured")]
    NoAlgorithms,
}

/// Signature + standard claim verifier.
///
/// - Accepted algorithms are an explicit allowlist; the token header cannot widen it.
/// - `exp` is required and checked, `nbf` is checked when present.
/// - `iss` / `aud` are checked only when configured.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(config: &GateConfig) -> Result<Self, KeyError> {
        let first = *config.algorithms.first().ok_or(KeyError::NoAlgorithms)?;
        let family = KeyFamily::of(first);

        let key = config.verification_key.as_bytes();
        let decoding_key = match family {
            KeyFamily::Hmac => Ok(DecodingKey::from_secret(key)),
            KeyFamily::Rsa => DecodingKey::from_rsa_pem(key),
            KeyFamily::Ec => DecodingKey::from_ec_pem(key),
            KeyFamily::Ed => DecodingKey::from_ed_pem(key),
        }
        .map_err(|source| KeyError::Invalid { family, source })?;

        let mut validation = Validation::new(first);
        validation.algorithms = config.algorithms.clone();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            // Without an expected audience, a token carrying `aud` is still acceptable.
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify and decode a JWT.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let data =
            jsonwebtoken::decode::<VerifiedClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret-key-at-least-32-bytes";

    fn sign(claims: &Value, alg: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> Value {
        json!({
            "sub": "42",
            "exp": chrono::Utc::now().timestamp() + 3600,
            "iat": chrono::Utc::now().timestamp(),
            "roles": ["user"],
        })
    }

    fn verifier(config: GateConfig) -> TokenVerifier {
        TokenVerifier::new(&config).unwrap()
    }

    fn kind(err: VerifyError) -> ErrorKind {
        let VerifyError::Jwt(e) = err;
        e.into_kind()
    }

    #[test]
    fn given_valid_token_when_verified_then_claims_round_trip() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));
        let claims = valid_claims();
        let token = sign(&claims, Algorithm::HS256, SECRET);

        let verified = verifier.verify(&token).unwrap();

        assert_eq!(Value::Object(verified.clone().into_map()), claims);
        assert_eq!(verified.subject(), Some("42"));
    }

    #[test]
    fn given_wrong_secret_when_verified_then_invalid_signature() {
        let verifier = verifier(GateConfig::new("x-access-token", "another-secret-of-32-bytes-long!"));
        let token = sign(&valid_claims(), Algorithm::HS256, SECRET);

        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(kind(err), ErrorKind::InvalidSignature));
    }

    #[test]
    fn given_expired_token_when_verified_then_expired_signature() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));
        let mut claims = valid_claims();
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 3600);
        let token = sign(&claims, Algorithm::HS256, SECRET);

        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(kind(err), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn given_expired_token_within_leeway_when_verified_then_accepted() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET).with_leeway(120));
        let mut claims = valid_claims();
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 30);
        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn given_token_without_exp_when_verified_then_rejected() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));
        let token = sign(&json!({ "sub": "42" }), Algorithm::HS256, SECRET);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn given_algorithm_outside_allowlist_when_verified_then_rejected() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));
        let token = sign(&valid_claims(), Algorithm::HS512, SECRET);

        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(kind(err), ErrorKind::InvalidAlgorithm));
    }

    #[test]
    fn given_allowlist_with_two_algorithms_when_verified_then_both_accepted() {
        let verifier = verifier(
            GateConfig::new("x-access-token", SECRET)
                .with_algorithms(vec![Algorithm::HS256, Algorithm::HS512]),
        );

        for alg in [Algorithm::HS256, Algorithm::HS512] {
            let token = sign(&valid_claims(), alg, SECRET);
            assert!(verifier.verify(&token).is_ok(), "{alg:?} should be accepted");
        }
    }

    #[test]
    fn given_unsigned_token_when_verified_then_rejected() {
        // {"alg":"none","typ":"JWT"} . {"sub":"42","exp":9999999999} . <empty>
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiI0MiIsImV4cCI6OTk5OTk5OTk5OX0.";
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));

        assert!(verifier.verify(token).is_err());
    }

    #[test]
    fn given_malformed_token_when_verified_then_rejected() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));

        assert!(verifier.verify("not-a-jwt").is_err());
        assert!(verifier.verify("").is_err());
    }

    #[test]
    fn given_issuer_and_audience_when_verified_then_enforced() {
        let verifier = verifier(
            GateConfig::new("x-access-token", SECRET)
                .with_issuer("https://issuer.example")
                .with_audience("api"),
        );

        let mut claims = valid_claims();
        claims["iss"] = json!("https://issuer.example");
        claims["aud"] = json!("api");
        assert!(verifier.verify(&sign(&claims, Algorithm::HS256, SECRET)).is_ok());

        claims["aud"] = json!("other");
        let err = verifier
            .verify(&sign(&claims, Algorithm::HS256, SECRET))
            .unwrap_err();
        assert!(matches!(kind(err), ErrorKind::InvalidAudience));

        claims["aud"] = json!("api");
        claims["iss"] = json!("https://evil.example");
        let err = verifier
            .verify(&sign(&claims, Algorithm::HS256, SECRET))
            .unwrap_err();
        assert!(matches!(kind(err), ErrorKind::InvalidIssuer));
    }

    #[test]
    fn given_no_configured_audience_when_token_has_aud_then_accepted() {
        let verifier = verifier(GateConfig::new("x-access-token", SECRET));
        let mut claims = valid_claims();
        claims["aud"] = json!("anything");

        assert!(verifier.verify(&sign(&claims, Algorithm::HS256, SECRET)).is_ok());
    }

    #[test]
    fn given_garbage_rsa_key_when_building_then_key_error() {
        let config = GateConfig::new("x-access-token", "not a pem")
            .with_algorithms(vec![Algorithm::RS256]);

        assert!(matches!(
            TokenVerifier::new(&config),
            Err(KeyError::Invalid {
                family: KeyFamily::Rsa,
                ..
            })
        ));
    }

    #[test]
    fn given_empty_allowlist_when_building_then_no_algorithms() {
        let config = GateConfig::new("x-access-token", SECRET).with_algorithms(Vec::new());

        assert!(matches!(
            TokenVerifier::new(&config),
            Err(KeyError::NoAlgorithms)
        ));
    }
}
