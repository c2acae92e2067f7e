//! C9 — the authentication state machine. `AuthService` owns no process-wide
//! state beyond its injected collaborators; `Clock` is threaded through
//! construction so TTL/expiry behavior is deterministic under test.

use crate::device_trust::register_trust_after_mfa;
use crate::error::AuthError;
use crate::types::{phone_mask, DevOTPStore, LoginResult, MfaRequired, OTPSender, PhoneRequired, Tokens};
use crate::validate::{normalize_and_validate_email, normalize_device_fingerprint, validate_password_strength, validate_phone};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use zt_common::clock::Clock;
use zt_common::domain::{
    Device, Identity, IdentityProvider, MfaChallenge, MfaIntent, Repositories, Session, User, UserStatus,
};
use zt_crypto::{hash_refresh_token, refresh_tokens_equal, PasswordHasher, TokenProvider};
use zt_policy::PolicyEvaluator;

pub struct AuthServiceConfig {
    pub challenge_ttl: Duration,
    pub otp_return_to_client: bool,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::minutes(10),
            otp_return_to_client: false,
        }
    }
}

pub struct AuthService {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenProvider>,
    policy: Arc<dyn PolicyEvaluator>,
    clock: Arc<dyn Clock>,
    otp_sender: Option<Arc<dyn OTPSender>>,
    dev_otp_store: Option<Arc<dyn DevOTPStore>>,
    config: AuthServiceConfig,
}

impl AuthService {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenProvider>,
        policy: Arc<dyn PolicyEvaluator>,
        clock: Arc<dyn Clock>,
        otp_sender: Option<Arc<dyn OTPSender>>,
        dev_otp_store: Option<Arc<dyn DevOTPStore>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self { repos, hasher, tokens, policy, clock, otp_sender, dev_otp_store, config }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<String, AuthError> {
        let email = normalize_and_validate_email(email)?;
        validate_password_strength(password)?;

        if self.repos.users.get_by_email(&email).await.is_ok() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let now = self.now();
        let user_id = uuid::Uuid::new_v4().to_string();
        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|_| AuthError::Internal("password hash failure".to_string()))?;

        let user = User {
            id: user_id.clone(),
            email: email.clone(),
            name: name.unwrap_or_default().to_string(),
            status: UserStatus::Active,
            phone: None,
            phone_verified: false,
            created_at: now,
            updated_at: now,
        };
        self.repos.users.create(user).await.map_err(|_| AuthError::EmailAlreadyRegistered)?;

        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            provider: IdentityProvider::Local,
            provider_id: email,
            password_hash: Some(password_hash),
            created_at: now,
        };
        self.repos
            .identities
            .create(identity)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id, "user registered");
        Ok(user_id)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        org_id: &str,
        device_fingerprint: Option<&str>,
    ) -> Result<LoginResult, AuthError> {
        if email.trim().is_empty() || password.is_empty() || org_id.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = email.trim().to_lowercase();

        let user = self.repos.users.get_by_email(&email).await.map_err(|_| AuthError::InvalidCredentials)?;
        if user.status != UserStatus::Active {
            return Err(AuthError::InvalidCredentials);
        }
        let identity = self
            .repos
            .identities
            .get_local_by_provider_id(&email)
            .await
            .map_err(|_| AuthError::InvalidCredentials)?;
        let password_hash = identity.password_hash.as_deref().ok_or(AuthError::InvalidCredentials)?;
        if self.hasher.compare(password, password_hash).is_err() {
            return Err(AuthError::InvalidCredentials);
        }

        self.repos
            .memberships
            .get(&user.id, org_id)
            .await
            .map_err(|_| AuthError::NotOrgMember)?;

        let fingerprint = normalize_device_fingerprint(device_fingerprint);
        let (device, is_new_device) = self.get_or_create_device(&user.id, org_id, &fingerprint).await?;

        let platform = self.repos.platform_settings.get().await.unwrap_or_default();
        let org_settings = self.repos.org_mfa_settings.get_by_org(org_id).await.unwrap_or(None).unwrap_or_default();

        let now = self.now();
        let mfa = self
            .policy
            .evaluate_mfa(org_id, platform, org_settings, &device, &user, is_new_device, now)
            .await;

        if !mfa.mfa_required {
            let tokens = self.create_session(&user.id, org_id, &device.id, false, 0).await?;
            return Ok(LoginResult::Tokens(tokens));
        }

        if !user.has_phone() {
            let intent = MfaIntent {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user.id.clone(),
                org_id: org_id.to_string(),
                device_id: device.id.clone(),
                expires_at: now + self.config.challenge_ttl,
            };
            let intent_id = intent.id.clone();
            self.repos.mfa_intents.create(intent).await.map_err(|e| AuthError::Internal(e.to_string()))?;
            return Ok(LoginResult::PhoneRequired(PhoneRequired { intent_id }));
        }

        let phone = user.phone.clone().unwrap_or_default();
        self.issue_mfa_challenge(&user.id, org_id, &device.id, &phone).await.map(LoginResult::MfaRequired)
    }

    pub async fn submit_phone_and_request_mfa(&self, intent_id: &str, phone: &str) -> Result<MfaRequired, AuthError> {
        validate_phone(phone)?;

        let intent = self.repos.mfa_intents.get(intent_id).await.map_err(|_| AuthError::InvalidMFAIntent)?;
        self.repos.mfa_intents.delete(intent_id).await.ok();

        let now = self.now();
        if intent.is_expired(now) {
            return Err(AuthError::InvalidMFAIntent);
        }

        let user = self.repos.users.get_by_id(&intent.user_id).await.map_err(|_| AuthError::InvalidMFAIntent)?;
        if user.has_phone() {
            return Err(AuthError::InvalidMFAIntent);
        }

        self.issue_mfa_challenge(&intent.user_id, &intent.org_id, &intent.device_id, phone).await
    }

    pub async fn verify_mfa(&self, challenge_id: &str, otp: &str) -> Result<Tokens, AuthError> {
        if challenge_id.is_empty() || otp.is_empty() {
            return Err(AuthError::Validation { field: "otp", reason: "must not be empty" });
        }

        let challenge = self.repos.mfa_challenges.get(challenge_id).await.map_err(|_| AuthError::InvalidMFAChallenge)?;
        let now = self.now();
        if challenge.is_expired(now) {
            return Err(AuthError::ChallengeExpired);
        }
        if !zt_crypto::verify_otp(self.hasher.as_ref(), otp, &challenge.code_hash) {
            return Err(AuthError::InvalidOTP);
        }

        let mut user = self.repos.users.get_by_id(&challenge.user_id).await.map_err(|e| AuthError::Internal(e.to_string()))?;
        if !user.has_phone() {
            user.phone = Some(challenge.phone.clone());
            user.phone_verified = true;
            user.updated_at = now;
            self.repos.users.update(user.clone()).await.map_err(|e| AuthError::Internal(e.to_string()))?;
        }

        let device = self.repos.devices.get_by_id(&challenge.device_id).await.map_err(|e| AuthError::Internal(e.to_string()))?;
        let platform = self.repos.platform_settings.get().await.unwrap_or_default();
        let org_settings = self.repos.org_mfa_settings.get_by_org(&challenge.org_id).await.unwrap_or(None).unwrap_or_default();
        let mfa = self
            .policy
            .evaluate_mfa(&challenge.org_id, platform, org_settings, &device, &user, false, now)
            .await;

        let tokens = self
            .create_session(&challenge.user_id, &challenge.org_id, &challenge.device_id, mfa.register_trust_after_mfa, mfa.trust_ttl_days)
            .await?;

        self.repos.mfa_challenges.delete(challenge_id).await.ok();
        Ok(tokens)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens, AuthError> {
        let validated = self.tokens.validate(refresh_token).map_err(|_| AuthError::InvalidRefreshToken)?;

        let session = self
            .repos
            .sessions
            .get_by_id(&validated.session_id)
            .await
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        if session.revoked_at.is_some() {
            return Err(AuthError::InvalidRefreshToken);
        }

        if session.refresh_jti != validated.jti {
            let now = self.now();
            self.repos.sessions.revoke_all_by_user(&session.user_id, now).await.ok();
            return Err(AuthError::RefreshTokenReuse);
        }

        if !session.refresh_token_hash.is_empty() && !refresh_tokens_equal(refresh_token, &session.refresh_token_hash) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let now = self.now();
        self.repos.sessions.update_last_seen(&session.id, now).await.ok();

        let (access_token, access_exp) = self
            .tokens
            .issue_access_token(&session.user_id, &session.org_id, &session.id, now)
            .map_err(|_| AuthError::Internal("token issuance failure".to_string()))?;
        let (new_refresh, new_jti) = self
            .tokens
            .issue_refresh_token(&session.user_id, &session.org_id, &session.id, now)
            .map_err(|_| AuthError::Internal("token issuance failure".to_string()))?;
        let new_hash = hash_refresh_token(&new_refresh);

        self.repos
            .sessions
            .update_refresh_token(&session.id, &session.refresh_jti, &new_jti, &new_hash)
            .await
            .map_err(|_| AuthError::RefreshTokenReuse)?;

        Ok(Tokens {
            access_token,
            refresh_token: new_refresh,
            expires_at: access_exp,
            user_id: session.user_id,
            org_id: session.org_id,
        })
    }

    pub async fn logout(&self, refresh_token: Option<&str>, context_session_id: Option<&str>) {
        let now = self.now();
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            if let Ok(validated) = self.tokens.validate(token) {
                self.repos.sessions.revoke(&validated.session_id, now).await.ok();
            }
            return;
        }
        if let Some(session_id) = context_session_id {
            self.repos.sessions.revoke(session_id, now).await.ok();
        }
    }

    async fn get_or_create_device(&self, user_id: &str, org_id: &str, fingerprint: &str) -> Result<(Device, bool), AuthError> {
        match self.repos.devices.get_by_fingerprint(user_id, org_id, fingerprint).await {
            Ok(device) => Ok((device, false)),
            Err(_) => {
                let now = self.now();
                let device = Device {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    org_id: org_id.to_string(),
                    fingerprint: fingerprint.to_string(),
                    trusted: false,
                    trusted_until: None,
                    revoked_at: None,
                    last_seen_at: Some(now),
                    created_at: now,
                };
                self.repos.devices.create(device.clone()).await.map_err(|e| AuthError::Internal(e.to_string()))?;
                Ok((device, true))
            }
        }
    }

    async fn issue_mfa_challenge(&self, user_id: &str, org_id: &str, device_id: &str, phone: &str) -> Result<MfaRequired, AuthError> {
        let now = self.now();
        let otp = zt_crypto::generate_otp();
        let code_hash = zt_crypto::hash_otp(self.hasher.as_ref(), &otp).map_err(|_| AuthError::Internal("otp hash failure".to_string()))?;

        let challenge = MfaChallenge {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            device_id: device_id.to_string(),
            phone: phone.to_string(),
            code_hash,
            expires_at: now + self.config.challenge_ttl,
            created_at: now,
        };
        let challenge_id = challenge.id.clone();

        self.repos.mfa_challenges.create(challenge).await.map_err(|e| AuthError::Internal(e.to_string()))?;

        if self.config.otp_return_to_client {
            if let Some(store) = &self.dev_otp_store {
                store.put(&challenge_id, &otp, now + self.config.challenge_ttl).await;
                return Ok(MfaRequired { challenge_id, phone_mask: phone_mask(phone) });
            }
        }

        if let Some(sender) = &self.otp_sender {
            if let Err(err) = sender.send(phone, &otp).await {
                self.repos.mfa_challenges.delete(&challenge_id).await.ok();
                return Err(AuthError::Internal(err));
            }
        }

        Ok(MfaRequired { challenge_id, phone_mask: phone_mask(phone) })
    }

    /// Session-create helper: issues the refresh token first so its hash is
    /// available before the session row is inserted — the two writes are
    /// only observably atomic in that order (§4.9).
    async fn create_session(
        &self,
        user_id: &str,
        org_id: &str,
        device_id: &str,
        register_trust: bool,
        trust_ttl_days: i64,
    ) -> Result<Tokens, AuthError> {
        let now = self.now();
        let session_id = uuid::Uuid::new_v4().to_string();

        let (refresh_token, refresh_jti) = self
            .tokens
            .issue_refresh_token(user_id, org_id, &session_id, now)
            .map_err(|_| AuthError::Internal("token issuance failure".to_string()))?;
        let (access_token, access_exp) = self
            .tokens
            .issue_access_token(user_id, org_id, &session_id, now)
            .map_err(|_| AuthError::Internal("token issuance failure".to_string()))?;
        let refresh_hash = hash_refresh_token(&refresh_token);

        let session = Session {
            id: session_id.clone(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            device_id: device_id.to_string(),
            expires_at: self.tokens.refresh_expiry(now),
            revoked_at: None,
            last_seen_at: None,
            ip_address: None,
            refresh_jti,
            refresh_token_hash: refresh_hash,
            created_at: now,
        };
        self.repos.sessions.create(session).await.map_err(|e| AuthError::Internal(e.to_string()))?;

        if register_trust && trust_ttl_days > 0 {
            if let Ok(mut device) = self.repos.devices.get_by_id(device_id).await {
                register_trust_after_mfa(&mut device, trust_ttl_days, now);
                self.repos.devices.update(device).await.ok();
            }
        }

        Ok(Tokens {
            access_token,
            refresh_token,
            expires_at: access_exp,
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use std::sync::Mutex as StdMutex;
    use zt_common::domain::{Membership, Organization, OrgMfaSettings, OrgStatus, Role};
    use zt_crypto::{BcryptHasher, SigningKey, VerifyingKey};
    use zt_policy::{MfaResult, PolicyEvaluator};

    /// A deterministic policy stub, standing in for the Rego-backed
    /// evaluator per the capability-set note in the design notes — C9's
    /// tests never link against `regorus`.
    struct StubPolicy {
        result: MfaResult,
    }

    #[async_trait]
    impl PolicyEvaluator for StubPolicy {
        async fn evaluate_mfa(
            &self,
            _org_id: &str,
            _platform: zt_common::domain::PlatformDeviceTrustSettings,
            _org_settings: OrgMfaSettings,
            _device: &Device,
            _user: &User,
            _is_new_device: bool,
            _now: DateTime<Utc>,
        ) -> MfaResult {
            self.result
        }
    }

    struct CapturingDevOtpStore {
        captured: StdMutex<Option<(String, String)>>,
    }

    impl CapturingDevOtpStore {
        fn new() -> Self {
            Self { captured: StdMutex::new(None) }
        }

        fn otp_for(&self, challenge_id: &str) -> String {
            let guard = self.captured.lock().unwrap();
            let (stored_id, otp) = guard.as_ref().expect("no otp captured");
            assert_eq!(stored_id, challenge_id);
            otp.clone()
        }
    }

    #[async_trait]
    impl DevOTPStore for CapturingDevOtpStore {
        async fn put(&self, challenge_id: &str, otp: &str, _expires_at: DateTime<Utc>) {
            *self.captured.lock().unwrap() = Some((challenge_id.to_string(), otp.to_string()));
        }
    }

    fn token_provider() -> TokenProvider {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        let signing = SigningKey {
            key: EncodingKey::from_rsa_der(private.to_pkcs1_der().unwrap().as_bytes()),
            algorithm: Algorithm::RS256,
        };
        let verifying = VerifyingKey {
            key: DecodingKey::from_rsa_der(public.to_pkcs1_der().unwrap().as_bytes()),
            algorithm: Algorithm::RS256,
        };
        TokenProvider::new(signing, verifying, "ztcp", "ztcp-clients", Duration::minutes(15), Duration::days(30)).unwrap()
    }

    fn build_service(mfa: MfaResult, dev_store: Option<Arc<CapturingDevOtpStore>>) -> (AuthService, Repositories) {
        let repos = Repositories::in_memory();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(bcrypt::MIN_COST as i32));
        let tokens = Arc::new(token_provider());
        let policy: Arc<dyn PolicyEvaluator> = Arc::new(StubPolicy { result: mfa });
        let clock = Arc::new(zt_common::clock::FixedClock::new(Utc::now()));
        let config = AuthServiceConfig { challenge_ttl: Duration::minutes(10), otp_return_to_client: dev_store.is_some() };
        let dev_store: Option<Arc<dyn DevOTPStore>> = dev_store.map(|s| s as Arc<dyn DevOTPStore>);
        let service = AuthService::new(repos.clone(), hasher, tokens, policy, clock, None, dev_store, config);
        (service, repos)
    }

    async fn seed_org_and_membership(repos: &Repositories, user_id: &str, org_id: &str) {
        repos
            .organizations
            .create(Organization { id: org_id.to_string(), name: "Org".into(), status: OrgStatus::Active, created_at: Utc::now() })
            .await
            .unwrap();
        repos
            .memberships
            .create(Membership { id: uuid::Uuid::new_v4().to_string(), user_id: user_id.to_string(), org_id: org_id.to_string(), role: Role::Member, created_at: Utc::now() })
            .await
            .unwrap();
    }

    fn no_mfa() -> MfaResult {
        MfaResult { mfa_required: false, register_trust_after_mfa: true, trust_ttl_days: 30 }
    }

    #[tokio::test]
    async fn register_then_login_without_mfa_returns_tokens() {
        let (service, repos) = build_service(no_mfa(), None);
        let user_id = service.register("alice@example.com", "Passw0rd!Pass!", Some("Alice")).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;

        let result = service.login("alice@example.com", "Passw0rd!Pass!", "org-a", Some("fp-1")).await.unwrap();
        match result {
            LoginResult::Tokens(tokens) => {
                assert_eq!(tokens.user_id, user_id);
                assert_eq!(tokens.org_id, "org-a");
            }
            other => panic!("expected tokens, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (service, _repos) = build_service(no_mfa(), None);
        service.register("bob@example.com", "Passw0rd!Pass!", None).await.unwrap();
        let err = service.register("bob@example.com", "Passw0rd!Pass!", None).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn login_with_wrong_password_and_unknown_email_are_indistinguishable() {
        let (service, repos) = build_service(no_mfa(), None);
        let user_id = service.register("carol@example.com", "Passw0rd!Pass!", None).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;

        let wrong_password = service.login("carol@example.com", "WrongPassw0rd!", "org-a", None).await.unwrap_err();
        let unknown_email = service.login("nobody@example.com", "WrongPassw0rd!", "org-a", None).await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_reuse_revokes_every_session_of_the_user() {
        let (service, repos) = build_service(no_mfa(), None);
        let user_id = service.register("dora@example.com", "Passw0rd!Pass!", None).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;

        let first = match service.login("dora@example.com", "Passw0rd!Pass!", "org-a", Some("fp-1")).await.unwrap() {
            LoginResult::Tokens(tokens) => tokens,
            other => panic!("expected tokens, got {other:?}"),
        };

        let rotated = service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, first.refresh_token);

        let reuse = service.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(reuse, AuthError::RefreshTokenReuse));

        // A legitimately rotated token is now also invalid: every session of
        // the user was revoked by the reuse-handling path.
        let err = service.refresh(&rotated.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn mfa_happy_path_registers_device_trust() {
        let dev_store = Arc::new(CapturingDevOtpStore::new());
        let mfa = MfaResult { mfa_required: true, register_trust_after_mfa: true, trust_ttl_days: 30 };
        let (service, repos) = build_service(mfa, Some(dev_store.clone()));
        let user_id = service.register("erin@example.com", "Passw0rd!Pass!", None).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;

        // Seed a phone so Login goes straight to the MFA-challenge branch.
        let mut user = repos.users.get_by_id(&user_id).await.unwrap();
        user.phone = Some("+15551234567".to_string());
        user.phone_verified = true;
        repos.users.update(user).await.unwrap();

        let challenge = match service.login("erin@example.com", "Passw0rd!Pass!", "org-a", Some("fp-1")).await.unwrap() {
            LoginResult::MfaRequired(challenge) => challenge,
            other => panic!("expected MfaRequired, got {other:?}"),
        };
        assert_eq!(challenge.phone_mask, "****4567");

        let otp = dev_store.otp_for(&challenge.challenge_id);
        let tokens = service.verify_mfa(&challenge.challenge_id, &otp).await.unwrap();
        assert_eq!(tokens.user_id, user_id);

        let device = repos.devices.get_by_fingerprint(&user_id, "org-a", "fp-1").await.unwrap();
        assert!(device.is_effectively_trusted(Utc::now()));
    }

    #[tokio::test]
    async fn phone_required_branch_then_submit_then_mfa() {
        let dev_store = Arc::new(CapturingDevOtpStore::new());
        let mfa = MfaResult { mfa_required: true, register_trust_after_mfa: true, trust_ttl_days: 30 };
        let (service, repos) = build_service(mfa, Some(dev_store.clone()));
        let user_id = service.register("frank@example.com", "Passw0rd!Pass!", None).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;

        let intent = match service.login("frank@example.com", "Passw0rd!Pass!", "org-a", Some("fp-1")).await.unwrap() {
            LoginResult::PhoneRequired(intent) => intent,
            other => panic!("expected PhoneRequired, got {other:?}"),
        };

        let challenge = service.submit_phone_and_request_mfa(&intent.intent_id, "+15551234567").await.unwrap();
        let otp = dev_store.otp_for(&challenge.challenge_id);
        let tokens = service.verify_mfa(&challenge.challenge_id, &otp).await.unwrap();
        assert_eq!(tokens.user_id, user_id);

        // Single-use: the same intent cannot be submitted twice.
        let err = service.submit_phone_and_request_mfa(&intent.intent_id, "+15551234567").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidMFAIntent));
    }

    #[tokio::test]
    async fn logout_with_valid_refresh_token_revokes_the_session() {
        let (service, repos) = build_service(no_mfa(), None);
        let user_id = service.register("gina@example.com", "Passw0rd!Pass!", None).await.unwrap();
        seed_org_and_membership(&repos, &user_id, "org-a").await;
        let tokens = match service.login("gina@example.com", "Passw0rd!Pass!", "org-a", Some("fp-1")).await.unwrap() {
            LoginResult::Tokens(tokens) => tokens,
            other => panic!("expected tokens, got {other:?}"),
        };

        service.logout(Some(&tokens.refresh_token), None).await;
        let err = service.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn logout_with_malformed_token_is_silently_idempotent() {
        let (service, _repos) = build_service(no_mfa(), None);
        // Must not panic or error; logout with a garbage token is a no-op.
        service.logout(Some("not-a-real-token"), None).await;
    }
}
