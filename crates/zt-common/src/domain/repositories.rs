//! Repository traits the core requires from its persistence layer, plus an
//! in-memory reference implementation of each (used by the test suite and by
//! `zt-server` when no `DATABASE_URL` is configured is **not** how auth-disabled
//! mode works — see `zt-server::config` — this implementation exists purely
//! for deterministic, dependency-free tests).
//!
//! Every repository is `Send + Sync` and takes `&self` — no method requires
//! `&mut self` — so a single `Arc<dyn Trait>` can be shared across the tokio
//! worker pool, mirroring `sase-common::domain::repositories`'
//! `PolicyRepository`/`SessionRepository` shape.

use super::model::*;
use crate::error::{RepoError, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> RepoResult<()>;
    async fn get_by_id(&self, id: &str) -> RepoResult<User>;
    async fn get_by_email(&self, email: &str) -> RepoResult<User>;
    async fn update(&self, user: User) -> RepoResult<()>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn create(&self, identity: Identity) -> RepoResult<()>;
    async fn get_local_by_provider_id(&self, provider_id: &str) -> RepoResult<Identity>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, org: Organization) -> RepoResult<()>;
    async fn get_by_id(&self, id: &str) -> RepoResult<Organization>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn create(&self, membership: Membership) -> RepoResult<()>;
    async fn get(&self, user_id: &str, org_id: &str) -> RepoResult<Membership>;
    async fn update_role(&self, user_id: &str, org_id: &str, role: Role) -> RepoResult<()>;
    async fn remove(&self, user_id: &str, org_id: &str) -> RepoResult<()>;
    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Membership>>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn create(&self, device: Device) -> RepoResult<()>;
    async fn get_by_id(&self, id: &str) -> RepoResult<Device>;
    async fn get_by_fingerprint(
        &self,
        user_id: &str,
        org_id: &str,
        fingerprint: &str,
    ) -> RepoResult<Device>;
    async fn update(&self, device: Device) -> RepoResult<()>;
    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Device>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: Session) -> RepoResult<()>;
    async fn get_by_id(&self, id: &str) -> RepoResult<Session>;
    async fn revoke(&self, id: &str, now: DateTime<Utc>) -> RepoResult<()>;
    async fn revoke_all_by_user(&self, user_id: &str, now: DateTime<Utc>) -> RepoResult<()>;
    async fn revoke_all_by_user_and_org(
        &self,
        user_id: &str,
        org_id: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<()>;
    async fn update_last_seen(&self, id: &str, now: DateTime<Utc>) -> RepoResult<()>;
    /// Compare-and-set rotation: succeeds only if the session's current
    /// `refresh_jti` still equals `expected_jti`, making per-session rotation
    /// linearizable without a global lock (Open Question 1 — see DESIGN.md).
    async fn update_refresh_token(
        &self,
        id: &str,
        expected_jti: &str,
        new_jti: &str,
        new_hash: &str,
    ) -> RepoResult<()>;
    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Session>>;
}

#[async_trait]
pub trait MfaChallengeRepository: Send + Sync {
    async fn create(&self, challenge: MfaChallenge) -> RepoResult<()>;
    async fn get(&self, id: &str) -> RepoResult<MfaChallenge>;
    async fn delete(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait MfaIntentRepository: Send + Sync {
    async fn create(&self, intent: MfaIntent) -> RepoResult<()>;
    async fn get(&self, id: &str) -> RepoResult<MfaIntent>;
    async fn delete(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn create(&self, policy: Policy) -> RepoResult<()>;
    async fn update(&self, policy: Policy) -> RepoResult<()>;
    async fn delete(&self, id: &str) -> RepoResult<()>;
    async fn list_enabled_by_org(&self, org_id: &str) -> RepoResult<Vec<Policy>>;
    async fn list_by_org(&self, org_id: &str) -> RepoResult<Vec<Policy>>;
}

#[async_trait]
pub trait PlatformSettingsRepository: Send + Sync {
    async fn get(&self) -> RepoResult<PlatformDeviceTrustSettings>;
}

#[async_trait]
pub trait OrgMfaSettingsRepository: Send + Sync {
    async fn get_by_org(&self, org_id: &str) -> RepoResult<Option<OrgMfaSettings>>;
    async fn upsert(&self, org_id: &str, settings: OrgMfaSettings) -> RepoResult<()>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn create(&self, event: AuditEvent) -> RepoResult<()>;
    async fn list_by_org(
        &self,
        org_id: &str,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<AuditEvent>>;
}

// ---------------------------------------------------------------------------
// In-memory reference implementations.
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserRepository {
    by_id: DashMap<String, User>,
    email_index: DashMap<String, String>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> RepoResult<()> {
        if self.email_index.contains_key(&user.email) {
            return Err(RepoError::Conflict(format!("email {} exists", user.email)));
        }
        self.email_index.insert(user.email.clone(), user.id.clone());
        self.by_id.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<User> {
        self.by_id
            .get(id)
            .map(|u| u.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<User> {
        let id = self
            .email_index
            .get(email)
            .map(|v| v.clone())
            .ok_or_else(|| RepoError::NotFound(email.to_string()))?;
        self.get_by_id(&id).await
    }

    async fn update(&self, user: User) -> RepoResult<()> {
        self.by_id.insert(user.id.clone(), user);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryIdentityRepository {
    by_provider_id: DashMap<String, Identity>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: Identity) -> RepoResult<()> {
        self.by_provider_id
            .insert(identity.provider_id.clone(), identity);
        Ok(())
    }

    async fn get_local_by_provider_id(&self, provider_id: &str) -> RepoResult<Identity> {
        self.by_provider_id
            .get(provider_id)
            .map(|i| i.clone())
            .ok_or_else(|| RepoError::NotFound(provider_id.to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryOrganizationRepository {
    by_id: DashMap<String, Organization>,
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn create(&self, org: Organization) -> RepoResult<()> {
        self.by_id.insert(org.id.clone(), org);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Organization> {
        self.by_id
            .get(id)
            .map(|o| o.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }
}

fn membership_key(user_id: &str, org_id: &str) -> String {
    format!("{user_id}:{org_id}")
}

#[derive(Default)]
pub struct InMemoryMembershipRepository {
    by_key: DashMap<String, Membership>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn create(&self, membership: Membership) -> RepoResult<()> {
        let key = membership_key(&membership.user_id, &membership.org_id);
        self.by_key.insert(key, membership);
        Ok(())
    }

    async fn get(&self, user_id: &str, org_id: &str) -> RepoResult<Membership> {
        self.by_key
            .get(&membership_key(user_id, org_id))
            .map(|m| m.clone())
            .ok_or_else(|| RepoError::NotFound(format!("{user_id}@{org_id}")))
    }

    async fn update_role(&self, user_id: &str, org_id: &str, role: Role) -> RepoResult<()> {
        let key = membership_key(user_id, org_id);
        let mut m = self
            .by_key
            .get_mut(&key)
            .ok_or_else(|| RepoError::NotFound(key.clone()))?;
        m.role = role;
        Ok(())
    }

    async fn remove(&self, user_id: &str, org_id: &str) -> RepoResult<()> {
        self.by_key
            .remove(&membership_key(user_id, org_id))
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(format!("{user_id}@{org_id}")))
    }

    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Membership>> {
        let mut items: Vec<_> = self
            .by_key
            .iter()
            .map(|e| e.value().clone())
            .filter(|m| m.org_id == org_id)
            .filter(|m| user_id.is_none_or_eq(&m.user_id))
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(paginate(items, offset, limit))
    }
}

#[derive(Default)]
pub struct InMemoryDeviceRepository {
    by_id: DashMap<String, Device>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn create(&self, device: Device) -> RepoResult<()> {
        self.by_id.insert(device.id.clone(), device);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Device> {
        self.by_id
            .get(id)
            .map(|d| d.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn get_by_fingerprint(
        &self,
        user_id: &str,
        org_id: &str,
        fingerprint: &str,
    ) -> RepoResult<Device> {
        self.by_id
            .iter()
            .map(|e| e.value().clone())
            .find(|d| d.user_id == user_id && d.org_id == org_id && d.fingerprint == fingerprint)
            .ok_or_else(|| RepoError::NotFound(fingerprint.to_string()))
    }

    async fn update(&self, device: Device) -> RepoResult<()> {
        self.by_id.insert(device.id.clone(), device);
        Ok(())
    }

    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Device>> {
        let mut items: Vec<_> = self
            .by_id
            .iter()
            .map(|e| e.value().clone())
            .filter(|d| d.org_id == org_id)
            .filter(|d| user_id.is_none_or_eq(&d.user_id))
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(paginate(items, offset, limit))
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    by_id: DashMap<String, Session>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> RepoResult<()> {
        self.by_id.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Session> {
        self.by_id
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn revoke(&self, id: &str, now: DateTime<Utc>) -> RepoResult<()> {
        let mut s = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        // Monotonic: never move revoked_at earlier (I4, P6).
        if s.revoked_at.is_none() {
            s.revoked_at = Some(now);
        }
        Ok(())
    }

    async fn revoke_all_by_user(&self, user_id: &str, now: DateTime<Utc>) -> RepoResult<()> {
        for mut entry in self.by_id.iter_mut() {
            if entry.value().user_id == user_id && entry.value().revoked_at.is_none() {
                entry.value_mut().revoked_at = Some(now);
            }
        }
        Ok(())
    }

    async fn revoke_all_by_user_and_org(
        &self,
        user_id: &str,
        org_id: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        for mut entry in self.by_id.iter_mut() {
            let s = entry.value_mut();
            if s.user_id == user_id && s.org_id == org_id && s.revoked_at.is_none() {
                s.revoked_at = Some(now);
            }
        }
        Ok(())
    }

    async fn update_last_seen(&self, id: &str, now: DateTime<Utc>) -> RepoResult<()> {
        let mut s = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        s.last_seen_at = Some(now);
        Ok(())
    }

    async fn update_refresh_token(
        &self,
        id: &str,
        expected_jti: &str,
        new_jti: &str,
        new_hash: &str,
    ) -> RepoResult<()> {
        // dashmap shards the map internally, so this get_mut holds only the
        // lock for this session's shard, never a workspace-wide lock.
        let mut s = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        if s.refresh_jti != expected_jti {
            return Err(RepoError::Conflict(format!(
                "refresh_jti changed concurrently for session {id}"
            )));
        }
        s.refresh_jti = new_jti.to_string();
        s.refresh_token_hash = new_hash.to_string();
        Ok(())
    }

    async fn list_by_org(
        &self,
        org_id: &str,
        user_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Session>> {
        let mut items: Vec<_> = self
            .by_id
            .iter()
            .map(|e| e.value().clone())
            .filter(|s| s.org_id == org_id)
            .filter(|s| user_id.is_none_or_eq(&s.user_id))
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(paginate(items, offset, limit))
    }
}

#[derive(Default)]
pub struct InMemoryMfaChallengeRepository {
    by_id: DashMap<String, MfaChallenge>,
}

impl InMemoryMfaChallengeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MfaChallengeRepository for InMemoryMfaChallengeRepository {
    async fn create(&self, challenge: MfaChallenge) -> RepoResult<()> {
        self.by_id.insert(challenge.id.clone(), challenge);
        Ok(())
    }

    async fn get(&self, id: &str) -> RepoResult<MfaChallenge> {
        self.by_id
            .get(id)
            .map(|c| c.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.by_id.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMfaIntentRepository {
    by_id: DashMap<String, MfaIntent>,
}

impl InMemoryMfaIntentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MfaIntentRepository for InMemoryMfaIntentRepository {
    async fn create(&self, intent: MfaIntent) -> RepoResult<()> {
        self.by_id.insert(intent.id.clone(), intent);
        Ok(())
    }

    async fn get(&self, id: &str) -> RepoResult<MfaIntent> {
        self.by_id
            .get(id)
            .map(|i| i.clone())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.by_id.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPolicyRepository {
    by_id: DashMap<String, Policy>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn create(&self, policy: Policy) -> RepoResult<()> {
        self.by_id.insert(policy.id.clone(), policy);
        Ok(())
    }

    async fn update(&self, policy: Policy) -> RepoResult<()> {
        self.by_id.insert(policy.id.clone(), policy);
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.by_id
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn list_enabled_by_org(&self, org_id: &str) -> RepoResult<Vec<Policy>> {
        Ok(self
            .by_id
            .iter()
            .map(|e| e.value().clone())
            .filter(|p| p.org_id == org_id && p.enabled)
            .collect())
    }

    async fn list_by_org(&self, org_id: &str) -> RepoResult<Vec<Policy>> {
        Ok(self
            .by_id
            .iter()
            .map(|e| e.value().clone())
            .filter(|p| p.org_id == org_id)
            .collect())
    }
}

pub struct InMemoryPlatformSettingsRepository {
    settings: parking_lot::RwLock<PlatformDeviceTrustSettings>,
}

impl InMemoryPlatformSettingsRepository {
    pub fn new(settings: PlatformDeviceTrustSettings) -> Self {
        Self {
            settings: parking_lot::RwLock::new(settings),
        }
    }
}

impl Default for InMemoryPlatformSettingsRepository {
    fn default() -> Self {
        Self::new(PlatformDeviceTrustSettings::default())
    }
}

#[async_trait]
impl PlatformSettingsRepository for InMemoryPlatformSettingsRepository {
    async fn get(&self) -> RepoResult<PlatformDeviceTrustSettings> {
        Ok(*self.settings.read())
    }
}

#[derive(Default)]
pub struct InMemoryOrgMfaSettingsRepository {
    by_org: DashMap<String, OrgMfaSettings>,
}

impl InMemoryOrgMfaSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrgMfaSettingsRepository for InMemoryOrgMfaSettingsRepository {
    async fn get_by_org(&self, org_id: &str) -> RepoResult<Option<OrgMfaSettings>> {
        Ok(self.by_org.get(org_id).map(|s| *s))
    }

    async fn upsert(&self, org_id: &str, settings: OrgMfaSettings) -> RepoResult<()> {
        self.by_org.insert(org_id.to_string(), settings);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: parking_lot::RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn create(&self, event: AuditEvent) -> RepoResult<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn list_by_org(
        &self,
        org_id: &str,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<AuditEvent>> {
        let items: Vec<_> = self
            .events
            .read()
            .iter()
            .filter(|e| e.org_id == org_id)
            .cloned()
            .collect();
        Ok(paginate(items, offset, limit))
    }
}

fn paginate<T>(items: Vec<T>, offset: u32, limit: u32) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

trait OptionEq {
    fn is_none_or_eq(&self, other: &str) -> bool;
}

impl OptionEq for Option<&str> {
    fn is_none_or_eq(&self, other: &str) -> bool {
        match self {
            Some(v) => *v == other,
            None => true,
        }
    }
}

/// Bundle of every repository the authentication service and the RPC layer
/// depend on, so constructors take one argument instead of eleven.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub identities: Arc<dyn IdentityRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub devices: Arc<dyn DeviceRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub mfa_challenges: Arc<dyn MfaChallengeRepository>,
    pub mfa_intents: Arc<dyn MfaIntentRepository>,
    pub policies: Arc<dyn PolicyRepository>,
    pub platform_settings: Arc<dyn PlatformSettingsRepository>,
    pub org_mfa_settings: Arc<dyn OrgMfaSettingsRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Repositories {
    /// Wires an isolated in-memory reference implementation of every
    /// repository. Intended for tests and for standalone operation; never
    /// used when `DATABASE_URL` selects a real store.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            identities: Arc::new(InMemoryIdentityRepository::new()),
            organizations: Arc::new(InMemoryOrganizationRepository::new()),
            memberships: Arc::new(InMemoryMembershipRepository::new()),
            devices: Arc::new(InMemoryDeviceRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            mfa_challenges: Arc::new(InMemoryMfaChallengeRepository::new()),
            mfa_intents: Arc::new(InMemoryMfaIntentRepository::new()),
            policies: Arc::new(InMemoryPolicyRepository::new()),
            platform_settings: Arc::new(InMemoryPlatformSettingsRepository::default()),
            org_mfa_settings: Arc::new(InMemoryOrgMfaSettingsRepository::new()),
            audit: Arc::new(InMemoryAuditRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: id.into(),
            email: email.into(),
            name: "Test".into(),
            status: UserStatus::Active,
            phone: None,
            phone_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn user_repo_enforces_unique_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("u1", "a@example.com")).await.unwrap();
        assert!(repo.create(user("u2", "a@example.com")).await.is_err());
        assert_eq!(
            repo.get_by_email("a@example.com").await.unwrap().id,
            "u1"
        );
    }

    #[tokio::test]
    async fn session_rotation_is_compare_and_set() {
        let repo = InMemorySessionRepository::new();
        let now = Utc::now();
        let session = Session {
            id: "s1".into(),
            user_id: "u1".into(),
            org_id: "o1".into(),
            device_id: "d1".into(),
            expires_at: now + chrono::Duration::days(30),
            revoked_at: None,
            last_seen_at: None,
            ip_address: None,
            refresh_jti: "jti-1".into(),
            refresh_token_hash: "hash-1".into(),
            created_at: now,
        };
        repo.create(session).await.unwrap();

        repo.update_refresh_token("s1", "jti-1", "jti-2", "hash-2")
            .await
            .unwrap();
        assert_eq!(repo.get_by_id("s1").await.unwrap().refresh_jti, "jti-2");

        // Stale expected_jti (already rotated away) must fail — this is the
        // repository-level half of reuse detection (P1).
        assert!(repo
            .update_refresh_token("s1", "jti-1", "jti-3", "hash-3")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_monotonic() {
        let repo = InMemorySessionRepository::new();
        let now = Utc::now();
        let session = Session {
            id: "s1".into(),
            user_id: "u1".into(),
            org_id: "o1".into(),
            device_id: "d1".into(),
            expires_at: now + chrono::Duration::days(30),
            revoked_at: None,
            last_seen_at: None,
            ip_address: None,
            refresh_jti: "jti-1".into(),
            refresh_token_hash: "hash-1".into(),
            created_at: now,
        };
        repo.create(session).await.unwrap();
        repo.revoke("s1", now).await.unwrap();
        let first_revoke = repo.get_by_id("s1").await.unwrap().revoked_at.unwrap();

        repo.revoke("s1", now + chrono::Duration::seconds(10))
            .await
            .unwrap();
        let second_revoke = repo.get_by_id("s1").await.unwrap().revoked_at.unwrap();
        assert_eq!(first_revoke, second_revoke);
    }
}
