use crate::entity::user::UserRole;
use crate::model::auth::Claims;
use crate::model::global_error::{AppError, ErrorCode};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Clone)]
pub struct JwtUtils {
    secret: String,
}

#[derive(Debug)]
pub enum TokenVerifyResult {
    Valid(Claims),
    Expired,
    Invalid,
}

impl JwtUtils {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn generate_token(&self, user_id: i32, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::hours(ACCESS_TOKEN_TTL_HOURS))
            .ok_or_else(|| AppError::new(ErrorCode::TokenGenerationFailed))?;

        let role = match role {
            UserRole::Admin => "admin",
            UserRole::Citizen => "citizen",
        };
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    pub fn verify_token(&self, token: &str) -> TokenVerifyResult {
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => TokenVerifyResult::Valid(data.claims),
            Err(err) => match *err.kind() {
                ErrorKind::ExpiredSignature => TokenVerifyResult::Expired,
                _ => TokenVerifyResult::Invalid,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let jwt = JwtUtils::new("test-secret");
        let token = jwt.generate_token(7, UserRole::Admin).unwrap();
        match jwt.verify_token(&token) {
            TokenVerifyResult::Valid(claims) => {
                assert_eq!(claims.sub, "7");
                assert_eq!(claims.role, "admin");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn foreign_secret_is_invalid() {
        let token = JwtUtils::new("one").generate_token(1, UserRole::Citizen).unwrap();
        assert!(matches!(JwtUtils::new("two").verify_token(&token), TokenVerifyResult::Invalid));
    }

    #[test]
    fn expired_token_is_reported() {
        let secret = "test-secret";
        let past = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = Claims { sub: "1".into(), role: "citizen".into(), exp: past, iat: past };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        assert!(matches!(JwtUtils::new(secret).verify_token(&token), TokenVerifyResult::Expired));
    }
}
