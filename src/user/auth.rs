//! Password hashing and signed session tokens.

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::UserRole;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

mod mlms_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn hash(plain: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash_string = Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain, &password_hash)
            .is_ok())
    }
}

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String> {
    mlms_argon2::hash(plain.as_bytes())
}

/// Checks a plaintext password against a stored hash. Returns Ok(false) on
/// mismatch, Err only when the stored hash is malformed.
pub fn verify_password(plain: &str, target_hash: &str) -> Result<bool> {
    mlms_argon2::verify(plain.as_bytes(), target_hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i64,
    pub role: UserRole,
    pub exp: u64,
}

/// Issues and verifies the signed bearer tokens carried in the
/// Authorization header. Tokens embed user id and role and expire
/// after the configured TTL.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64, role: UserRole) -> Result<String> {
        let exp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + self.ttl.as_secs();
        let claims = TokenClaims {
            sub: user_id,
            role,
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| anyhow!("{}", err))
    }

    /// Returns None for any token that fails signature or expiry checks.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .ok()
    }
}
