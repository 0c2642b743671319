// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session tokens (HS512 JWT).
//!
//! Issuance only fails when the lifetime overflows the clock; validation is a total function
//! returning either the verified claims or the reason the token was rejected.
//! The current time is always supplied by the caller.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{Role, User, UserId};

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Kind of token. Refresh tokens can only be exchanged for new tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token issuer does not match")]
    WrongIssuer,
    #[error("token audience does not match")]
    WrongAudience,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

/// Verified contents of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Unique per issued token
    pub token_id: String,
    pub subject: UserId,
    pub issuer: String,
    pub audience: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub login_id: String,
    pub role: String,
    pub token_type: TokenType,
    pub is_guest: bool,
}

impl TokenClaims {
    pub fn is_access(&self) -> bool {
        self.token_type == TokenType::Access
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == TokenType::Refresh
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT payload as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    jti: String,
    sub: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
    #[serde(rename = "loginId")]
    login_id: String,
    role: String,
    #[serde(rename = "tokenType")]
    token_type: TokenType,
    #[serde(rename = "isGuest", default)]
    is_guest: bool,
}

/// Issues and validates tokens with a key fixed at construction.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.set_required_spec_claims(&["sub", "iss", "aud", "exp"]);
        // Expiry is checked against the caller-supplied clock instead.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_signing_key),
            decoding_key: DecodingKey::from_secret(&config.jwt_signing_key),
            validation,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a token for `subject` valid from `now` for `ttl`.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &self,
        subject: UserId,
        login_id: &str,
        role: &str,
        token_type: TokenType,
        is_guest: bool,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> anyhow::Result<IssuedToken> {
        // `exp` has whole-second resolution; report exactly what was signed.
        let expires_at = now
            .checked_add_signed(ttl)
            .and_then(|t| DateTime::from_timestamp(t.timestamp(), 0))
            .ok_or_else(|| anyhow::anyhow!("token lifetime {ttl} overflows from {now}"))?;
        let claims = JwtClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            login_id: login_id.to_string(),
            role: role.to_string(),
            token_type,
            is_guest,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)?;

        tracing::debug!(
            subject = %subject,
            token_type = ?token_type,
            is_guest,
            expires_at = %expires_at,
            "Issued token"
        );

        Ok(IssuedToken { token, expires_at })
    }

    pub fn generate_access_token(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> anyhow::Result<IssuedToken> {
        self.issue(
            user.id(),
            user.login_id().as_str(),
            user.role().code(),
            TokenType::Access,
            false,
            now,
            self.access_ttl,
        )
    }

    pub fn generate_refresh_token(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> anyhow::Result<IssuedToken> {
        self.issue(
            user.id(),
            user.login_id().as_str(),
            user.role().code(),
            TokenType::Refresh,
            false,
            now,
            self.refresh_ttl,
        )
    }

    /// Access token for a visitor without an account.
    pub fn generate_guest_token(
        &self,
        user_id: UserId,
        login_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<IssuedToken> {
        self.issue(
            user_id,
            login_id,
            Role::Guest.code(),
            TokenType::Access,
            true,
            now,
            self.access_ttl,
        )
    }

    /// Verify signature, issuer, audience and expiry as of `now`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
                ErrorKind::InvalidAudience => TokenError::WrongAudience,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;
        let claims = data.claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let subject = UserId::parse(&claims.sub).map_err(|_| TokenError::Malformed)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(TokenClaims {
            token_id: claims.jti,
            subject,
            issuer: claims.iss,
            audience: claims.aud,
            issued_at,
            expires_at,
            login_id: claims.login_id,
            role: claims.role,
            token_type: claims.token_type,
            is_guest: claims.is_guest,
        })
    }

    /// False for any token that fails validation.
    pub fn is_access_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.validate(token, now).is_ok_and(|c| c.is_access())
    }

    /// False for any token that fails validation.
    pub fn is_refresh_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.validate(token, now).is_ok_and(|c| c.is_refresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoginId;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn service() -> TokenService {
        TokenService::new(&Config::test_default())
    }

    fn service_with(f: impl FnOnce(&mut Config)) -> TokenService {
        let mut config = Config::test_default();
        f(&mut config);
        TokenService::new(&config)
    }

    fn issue_minute_token(svc: &TokenService, subject: UserId) -> IssuedToken {
        svc.issue(
            subject,
            "typist",
            "USER",
            TokenType::Access,
            false,
            t0(),
            Duration::seconds(60),
        )
        .unwrap()
    }

    fn user() -> User {
        User::create(
            UserId::generate(),
            LoginId::parse("typist").unwrap(),
            "hash".to_string(),
            Role::User,
            t0(),
        )
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let svc = service();
        let subject = UserId::generate();
        let issued = issue_minute_token(&svc, subject);

        let claims = svc
            .validate(&issued.token, t0() + Duration::seconds(30))
            .unwrap();

        assert_eq!(claims.subject, subject);
        assert_eq!(claims.login_id, "typist");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_guest);
        assert_eq!(claims.issuer, Config::test_default().jwt_issuer);
        assert_eq!(claims.audience, Config::test_default().jwt_audience);
        assert_eq!(claims.issued_at, t0());
        assert_eq!(claims.expires_at, t0() + Duration::seconds(60));
        assert_eq!(issued.expires_at, claims.expires_at);
    }

    #[test]
    fn test_expired_token() {
        let svc = service();
        let issued = issue_minute_token(&svc, UserId::generate());

        assert_eq!(
            svc.validate(&issued.token, t0() + Duration::seconds(61)),
            Err(TokenError::Expired)
        );
        // Exactly at expiry is no longer valid
        assert_eq!(
            svc.validate(&issued.token, t0() + Duration::seconds(60)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_key_is_bad_signature() {
        let issued = service().generate_access_token(&user(), t0()).unwrap();
        let other =
            service_with(|c| c.jwt_signing_key = b"another_key_that_is_32_bytes_long!".to_vec());

        assert_eq!(
            other.validate(&issued.token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_bad_signature() {
        let svc = service();
        let issued = svc.generate_access_token(&user(), t0()).unwrap();
        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        let forged = svc
            .generate_access_token(&user(), t0())
            .unwrap()
            .token
            .split('.')
            .nth(1)
            .map(String::from)
            .unwrap();
        parts[1] = forged;
        let tampered = parts.join(".");

        assert_eq!(svc.validate(&tampered, t0()), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_wrong_issuer_and_audience() {
        let foreign_issuer = service_with(|c| c.jwt_issuer = "someone-else".to_string());
        let foreign_audience = service_with(|c| c.jwt_audience = "another-app".to_string());
        let svc = service();

        let t1 = foreign_issuer.generate_access_token(&user(), t0()).unwrap();
        assert_eq!(svc.validate(&t1.token, t0()), Err(TokenError::WrongIssuer));

        let t2 = foreign_audience.generate_access_token(&user(), t0()).unwrap();
        assert_eq!(svc.validate(&t2.token, t0()), Err(TokenError::WrongAudience));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let svc = service();
        assert_eq!(svc.validate("", t0()), Err(TokenError::Malformed));
        assert_eq!(svc.validate("not.a.jwt", t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_access_and_refresh_tokens() {
        let svc = service();
        let u = user();
        let access = svc.generate_access_token(&u, t0()).unwrap();
        let refresh = svc.generate_refresh_token(&u, t0()).unwrap();

        assert!(svc.is_access_token(&access.token, t0()));
        assert!(!svc.is_refresh_token(&access.token, t0()));
        assert!(svc.is_refresh_token(&refresh.token, t0()));
        assert!(!svc.is_access_token(&refresh.token, t0()));

        assert_eq!(access.expires_at, t0() + svc.access_ttl());
        assert_eq!(refresh.expires_at, t0() + svc.refresh_ttl());
    }

    #[test]
    fn test_invalid_token_is_neither_kind() {
        let svc = service();
        let access = svc.generate_access_token(&user(), t0()).unwrap();
        let much_later = t0() + svc.access_ttl() + Duration::seconds(1);

        assert!(!svc.is_access_token(&access.token, much_later));
        assert!(!svc.is_refresh_token(&access.token, much_later));
        assert!(!svc.is_access_token("garbage", t0()));
    }

    #[test]
    fn test_guest_token() {
        let svc = service();
        let guest_id = UserId::generate();
        let issued = svc.generate_guest_token(guest_id, "guest-1234", t0()).unwrap();
        let claims = svc.validate(&issued.token, t0()).unwrap();

        assert_eq!(claims.subject, guest_id);
        assert_eq!(claims.role, "GUEST");
        assert!(claims.is_guest);
        assert!(claims.is_access());
        assert_eq!(claims.expires_at, t0() + svc.access_ttl());
    }

    #[test]
    fn test_tokens_issued_together_are_distinct() {
        let svc = service();
        let u = user();
        let a = svc.generate_refresh_token(&u, t0()).unwrap();
        let b = svc.generate_refresh_token(&u, t0()).unwrap();
        assert_ne!(a.token, b.token);

        let ca = svc.validate(&a.token, t0()).unwrap();
        let cb = svc.validate(&b.token, t0()).unwrap();
        assert_ne!(ca.token_id, cb.token_id);
    }

    #[test]
    fn test_expiry_is_reported_in_whole_seconds() {
        let svc = service();
        let now = t0() + Duration::milliseconds(750);
        let issued = svc
            .issue(
                UserId::generate(),
                "typist",
                "USER",
                TokenType::Access,
                false,
                now,
                Duration::seconds(60),
            )
            .unwrap();

        assert_eq!(issued.expires_at, t0() + Duration::seconds(60));
        let claims = svc.validate(&issued.token, now).unwrap();
        assert_eq!(issued.expires_at, claims.expires_at);
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let result = service().issue(
            UserId::generate(),
            "typist",
            "USER",
            TokenType::Access,
            false,
            t0(),
            Duration::seconds(9_000_000_000_000),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_user_claims_carry_login_and_role() {
        let svc = service();
        let u = user();
        let claims = svc
            .validate(&svc.generate_access_token(&u, t0()).unwrap().token, t0())
            .unwrap();
        assert_eq!(claims.subject, u.id());
        assert_eq!(claims.login_id, "typist");
        assert_eq!(claims.role, "USER");
    }
}
