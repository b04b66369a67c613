use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::session::TokenClaims;

/// Reads the identity claims of an access token without verifying the
/// signature. The backend verifies every request; expiry is checked by the
/// session store.
pub fn decode_claims(token: &str) -> AppResult<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            AppError::api(
                ApiErrorCode::InvalidResponse,
                format!("Token de acesso inválido: {err}"),
            )
        })
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("encode token")
}
