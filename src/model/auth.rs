use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::user::UserRole;
use crate::model::global_error::{AppError, ErrorCode};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Claims {
    pub sub: String,      // user id
    pub role: String,     // "citizen" | "admin"
    pub exp: usize,       // expiry (unix timestamp)
    pub iat: usize,       // issued at (unix timestamp)
}

/// The already-authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: UserRole,
}

impl Actor {
    pub fn citizen(user_id: i32) -> Self {
        Self { user_id, role: UserRole::Citizen }
    }

    pub fn admin(user_id: i32) -> Self {
        Self { user_id, role: UserRole::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::NotEnoughPermission))
        }
    }
}

impl TryFrom<&Claims> for Actor {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::new(ErrorCode::InvalidAuthToken))?;

        let role = match claims.role.as_str() {
            "admin" => UserRole::Admin,
            "citizen" => UserRole::Citizen,
            _ => return Err(AppError::new(ErrorCode::InvalidAuthToken)),
        };

        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims { sub: sub.to_string(), role: role.to_string(), exp: 0, iat: 0 }
    }

    #[test]
    fn actor_from_claims() {
        let actor = Actor::try_from(&claims("42", "admin")).unwrap();
        assert_eq!(actor, Actor::admin(42));
        assert!(actor.require_admin().is_ok());

        let citizen = Actor::try_from(&claims("7", "citizen")).unwrap();
        assert_eq!(citizen.require_admin().unwrap_err().code(), ErrorCode::NotEnoughPermission);
    }

    #[test]
    fn malformed_claims_are_rejected() {
        assert!(Actor::try_from(&claims("abc", "citizen")).is_err());
        assert!(Actor::try_from(&claims("1", "refresh")).is_err());
    }
}
