use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::User;

pub fn generate_password(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn issue_token(user: &User, secret: &str, expire_hours: i64) -> Result<String> {
    let exp = (Utc::now() + Duration::hours(expire_hours)).timestamp();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        exp: exp.max(0) as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn user() -> User {
        User {
            id: 42,
            email: "kim@example.com".into(),
            password_hash: String::new(),
            name: "Kim".into(),
            role: UserRole::Admin,
            phone_number: None,
            address: None,
            city: None,
            postal_code: None,
            facebook_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let token = issue_token(&user(), "secret", 1).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "admin");
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&user(), "secret", -2).unwrap();
        assert!(matches!(
            decode_token(&token, "secret"),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn generated_password_has_requested_length() {
        let pw = generate_password(24);
        assert_eq!(pw.len(), 24);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
