//! Session/access gate.
//!
//! ```text
//!                  authenticate ok
//! Unauthenticated ─────────────────► Authenticated(identity)
//!        ▲                                   │
//!        └────────────── end_session ────────┘
//! ```
//!
//! A failed authentication leaves the state unchanged. There is no lockout,
//! rate limiting, expiry or token refresh.

mod access;
mod credentials;

pub use access::*;
pub use credentials::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::db::{Database, DbError};
use crate::models::{Identity, IdentityProfile, ProfileUpdate, Role};

/// Gate errors.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not permitted for role {0}")]
    Forbidden(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Session store error: {0}")]
    Store(#[from] DbError),
}

pub type GateResult<T> = Result<T, GateError>;

/// An identity plus its hashed credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub identity: Identity,
    pub credential: PasswordHash,
}

impl Account {
    /// Build an account, hashing `secret`.
    pub fn new(identity: Identity, secret: &str, iterations: u32) -> Self {
        Self {
            identity,
            credential: PasswordHash::derive(secret, iterations),
        }
    }
}

/// Admin request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub secret: String,
    #[serde(default)]
    pub profile: IdentityProfile,
}

/// Identity counts for the user-management overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub total: usize,
    pub patients: usize,
    pub doctors: usize,
    pub staff: usize,
}

/// Authenticates credentials, holds the current identity, answers
/// authorization queries.
pub struct Gate {
    accounts: Vec<Account>,
    current: Option<Identity>,
    store: Database,
    config: GateConfig,
}

impl Gate {
    /// Build a gate, restoring the current identity from the snapshot store.
    ///
    /// Only the snapshot's id is trusted; the identity itself comes from
    /// `accounts`. A snapshot that no longer parses, or whose id is not among
    /// `accounts`, is discarded and the gate starts unauthenticated.
    pub fn restore(
        store: Database,
        accounts: Vec<Account>,
        config: GateConfig,
    ) -> GateResult<Self> {
        let current = match store.load_snapshot::<Identity>(&config.session_key) {
            Ok(Some(snapshot)) => {
                let known = accounts
                    .iter()
                    .find(|a| a.identity.id == snapshot.id)
                    .map(|a| a.identity.clone());
                match &known {
                    None => {
                        warn!("Discarding session snapshot for unknown identity");
                        store.remove_value(&config.session_key)?;
                    }
                    Some(identity) if identity.role != snapshot.role => {
                        warn!(
                            identity_id = %identity.id,
                            "Session snapshot role disagrees with account"
                        );
                    }
                    Some(_) => {}
                }
                known
            }
            Ok(None) => None,
            Err(DbError::Json(e)) => {
                warn!("Discarding unreadable session snapshot: {e}");
                store.remove_value(&config.session_key)?;
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(identity) = &current {
            info!(identity_id = %identity.id, role = identity.role.as_str(), "Session restored");
        }

        Ok(Self {
            accounts,
            current,
            store,
            config,
        })
    }

    /// Verify an email/secret pair and start a session.
    pub fn authenticate(&mut self, email: &str, secret: &str) -> GateResult<Identity> {
        let account = self.accounts.iter().find(|a| a.identity.email == email);

        let verified = match account {
            Some(account) => account.credential.verify(secret),
            None => {
                // Same hashing cost for unknown emails.
                let salt = [0u8; SALT_LENGTH];
                PasswordHash::derive_with_salt(secret, &salt, self.config.hash_iterations);
                false
            }
        };

        let identity = match (account, verified) {
            (Some(account), true) => account.identity.clone(),
            _ => {
                warn!("Authentication failed");
                return Err(GateError::InvalidCredentials);
            }
        };

        self.store.save_snapshot(&self.config.session_key, &identity)?;
        info!(identity_id = %identity.id, role = identity.role.as_str(), "Signed in");
        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// Clear the current identity and its persisted snapshot.
    pub fn end_session(&mut self) {
        if let Some(identity) = self.current.take() {
            info!(identity_id = %identity.id, "Signed out");
        }
        if let Err(e) = self.store.remove_value(&self.config.session_key) {
            warn!("Failed to clear session snapshot: {e}");
        }
    }

    /// The signed-in identity, if any.
    pub fn current_identity(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the current identity's role is in `required`.
    pub fn authorize(&self, required: &[Role]) -> bool {
        authorize(required, self.current.as_ref())
    }

    /// Whether the current identity may reach `capability`.
    pub fn can_access(&self, capability: Capability) -> bool {
        let allowed = can_access(capability, self.current.as_ref());
        debug!(capability = capability.path(), allowed, "Access check");
        allowed
    }

    /// Sidebar for the current identity (empty when signed out).
    pub fn navigation(&self) -> Vec<NavEntry> {
        self.current
            .as_ref()
            .map(|identity| navigation_for(identity.role))
            .unwrap_or_default()
    }

    /// Edit the current identity's own name, phone or address.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> GateResult<Identity> {
        let current_id = self.current_id()?;

        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(GateError::Validation("name cannot be empty".into()));
        }

        let mut identity = self
            .current
            .clone()
            .ok_or(GateError::NotAuthenticated)?;
        if let Some(name) = update.name {
            identity.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            identity.profile.phone = Some(phone);
        }
        if let Some(address) = update.address {
            identity.profile.address = Some(address);
        }

        self.store.save_snapshot(&self.config.session_key, &identity)?;
        if let Some(account) = self.accounts.iter_mut().find(|a| a.identity.id == current_id) {
            account.identity = identity.clone();
        }
        self.current = Some(identity.clone());
        info!(identity_id = %current_id, "Profile updated");
        Ok(identity)
    }

    /// Replace the current identity's secret.
    pub fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> GateResult<()> {
        let current_id = self.current_id()?;

        if new != confirm {
            return Err(GateError::PasswordMismatch);
        }
        if new.chars().count() < self.config.min_password_len {
            return Err(GateError::WeakPassword(self.config.min_password_len));
        }

        let iterations = self.config.hash_iterations;
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.identity.id == current_id)
            .ok_or(GateError::NotAuthenticated)?;

        if !account.credential.verify(current) {
            warn!(identity_id = %current_id, "Password change rejected");
            return Err(GateError::InvalidCredentials);
        }

        account.credential = PasswordHash::derive(new, iterations);
        info!(identity_id = %current_id, "Password changed");
        Ok(())
    }

    /// Create a new account. Admin only.
    pub fn register(&mut self, request: NewAccount) -> GateResult<Identity> {
        let role = self.current.as_ref().map(|i| i.role).ok_or(GateError::NotAuthenticated)?;
        if role != Role::Admin {
            return Err(GateError::Forbidden(role.as_str()));
        }

        let email = request.email.trim().to_string();
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(GateError::Validation("name cannot be empty".into()));
        }
        if !email.contains('@') {
            return Err(GateError::Validation(format!("invalid email: {email}")));
        }
        if request.secret.chars().count() < self.config.min_password_len {
            return Err(GateError::WeakPassword(self.config.min_password_len));
        }
        if self.accounts.iter().any(|a| a.identity.email.eq_ignore_ascii_case(&email)) {
            return Err(GateError::DuplicateEmail(email));
        }

        let mut identity = Identity::new(email, name, request.role);
        identity.profile = request.profile;
        self.accounts
            .push(Account::new(identity.clone(), &request.secret, self.config.hash_iterations));
        info!(identity_id = %identity.id, role = identity.role.as_str(), "Account registered");
        Ok(identity)
    }

    /// Look up an identity by ID.
    pub fn find_identity(&self, id: &str) -> Option<&Identity> {
        self.accounts.iter().map(|a| &a.identity).find(|i| i.id == id)
    }

    /// All identities, in registration order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.accounts.iter().map(|a| &a.identity)
    }

    /// Substring search on name/email, optionally filtered by role.
    pub fn search_identities(&self, query: &str, role: Option<Role>) -> Vec<&Identity> {
        self.identities()
            .filter(|i| role.map_or(true, |r| i.role == r))
            .filter(|i| i.matches_query(query))
            .collect()
    }

    /// Identity counts by role group.
    pub fn role_counts(&self) -> RoleCounts {
        self.identities().fold(RoleCounts::default(), |mut counts, identity| {
            counts.total += 1;
            match identity.role {
                Role::Patient => counts.patients += 1,
                Role::Doctor => counts.doctors += 1,
                Role::Receptionist | Role::Admin => counts.staff += 1,
            }
            counts
        })
    }

    fn current_id(&self) -> GateResult<String> {
        self.current
            .as_ref()
            .map(|i| i.id.clone())
            .ok_or(GateError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUNDS: u32 = 1_000;

    fn config() -> GateConfig {
        GateConfig {
            hash_iterations: ROUNDS,
            ..GateConfig::default()
        }
    }

    fn account(id: &str, email: &str, role: Role) -> Account {
        let mut identity = Identity::new(email.into(), format!("User {id}"), role);
        identity.id = id.into();
        Account::new(identity, "password123", ROUNDS)
    }

    fn accounts() -> Vec<Account> {
        vec![
            account("u1", "patient@hospital.com", Role::Patient),
            account("u3", "receptionist@hospital.com", Role::Receptionist),
            account("u4", "admin@hospital.com", Role::Admin),
        ]
    }

    fn setup_gate() -> Gate {
        Gate::restore(Database::open_in_memory().unwrap(), accounts(), config()).unwrap()
    }

    #[test]
    fn test_authenticate_success_persists() {
        let mut gate = setup_gate();

        let identity = gate.authenticate("patient@hospital.com", "password123").unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(gate.current_identity().map(|i| i.id.as_str()), Some("u1"));

        let stored: Option<Identity> = gate.store.load_snapshot("hospital_user").unwrap();
        assert_eq!(stored.map(|i| i.id), Some("u1".to_string()));
    }

    #[test]
    fn test_failed_login_leaves_state_unchanged() {
        let mut gate = setup_gate();

        let result = gate.authenticate("patient@hospital.com", "wrong");
        assert!(matches!(result, Err(GateError::InvalidCredentials)));
        assert!(gate.current_identity().is_none());

        gate.authenticate("admin@hospital.com", "password123").unwrap();
        let result = gate.authenticate("x@y.com", "wrong");
        assert!(matches!(result, Err(GateError::InvalidCredentials)));
        assert_eq!(gate.current_identity().map(|i| i.id.as_str()), Some("u4"));
    }

    #[test]
    fn test_email_match_is_exact() {
        let mut gate = setup_gate();
        let result = gate.authenticate("PATIENT@hospital.com", "password123");
        assert!(matches!(result, Err(GateError::InvalidCredentials)));
    }

    #[test]
    fn test_end_session_clears_snapshot() {
        let mut gate = setup_gate();
        gate.authenticate("patient@hospital.com", "password123").unwrap();

        gate.end_session();
        assert!(gate.current_identity().is_none());
        assert_eq!(gate.store.get_value("hospital_user").unwrap(), None);

        // No error when already signed out.
        gate.end_session();
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn test_restore_from_snapshot() {
        let store = Database::open_in_memory().unwrap();
        let identity = accounts()[2].identity.clone();
        store.save_snapshot("hospital_user", &identity).unwrap();

        let gate = Gate::restore(store, accounts(), config()).unwrap();
        assert_eq!(gate.current_identity().map(|i| i.name.as_str()), Some("User u4"));
        assert!(gate.can_access(Capability::Analytics));
    }

    #[test]
    fn test_restore_takes_role_from_account() {
        let store = Database::open_in_memory().unwrap();
        let mut forged = accounts()[0].identity.clone();
        forged.role = Role::Admin;
        forged.name = "Someone Else".into();
        store.save_snapshot("hospital_user", &forged).unwrap();

        let gate = Gate::restore(store, accounts(), config()).unwrap();
        let current = gate.current_identity().unwrap();
        assert_eq!(current.id, "u1");
        assert_eq!(current.role, Role::Patient);
        assert_eq!(current.name, "User u1");
        assert!(!gate.can_access(Capability::Analytics));
        assert!(gate.can_access(Capability::MyAppointments));
    }

    #[test]
    fn test_restore_discards_garbage() {
        let store = Database::open_in_memory().unwrap();
        store.set_value("hospital_user", "{broken").unwrap();

        let gate = Gate::restore(store, accounts(), config()).unwrap();
        assert!(gate.current_identity().is_none());
        assert_eq!(gate.store.get_value("hospital_user").unwrap(), None);
    }

    #[test]
    fn test_restore_discards_unknown_identity() {
        let store = Database::open_in_memory().unwrap();
        let stranger = Identity::new("ghost@hospital.com".into(), "Ghost".into(), Role::Admin);
        store.save_snapshot("hospital_user", &stranger).unwrap();

        let gate = Gate::restore(store, accounts(), config()).unwrap();
        assert!(gate.current_identity().is_none());
    }

    #[test]
    fn test_authorize_follows_current_role() {
        let mut gate = setup_gate();
        assert!(!gate.authorize(&[]));

        gate.authenticate("receptionist@hospital.com", "password123").unwrap();
        assert!(gate.authorize(&[]));
        assert!(gate.authorize(&[Role::Receptionist, Role::Admin]));
        assert!(!gate.authorize(&[Role::Admin]));
        assert!(gate.navigation().iter().any(|e| e.path == "/scheduling"));
    }

    #[test]
    fn test_update_profile() {
        let mut gate = setup_gate();
        assert!(matches!(
            gate.update_profile(ProfileUpdate::default()),
            Err(GateError::NotAuthenticated)
        ));

        gate.authenticate("patient@hospital.com", "password123").unwrap();
        let updated = gate
            .update_profile(ProfileUpdate {
                name: Some("John Smith".into()),
                phone: Some("+1 234 567 8900".into()),
                address: None,
            })
            .unwrap();
        assert_eq!(updated.name, "John Smith");
        assert_eq!(gate.find_identity("u1").map(|i| i.name.as_str()), Some("John Smith"));

        let stored: Identity = gate.store.load_snapshot("hospital_user").unwrap().unwrap();
        assert_eq!(stored.profile.phone.as_deref(), Some("+1 234 567 8900"));

        let blank = gate.update_profile(ProfileUpdate {
            name: Some("  ".into()),
            ..Default::default()
        });
        assert!(matches!(blank, Err(GateError::Validation(_))));
    }

    #[test]
    fn test_change_password() {
        let mut gate = setup_gate();
        gate.authenticate("patient@hospital.com", "password123").unwrap();

        assert!(matches!(
            gate.change_password("password123", "newsecret1", "newsecret2"),
            Err(GateError::PasswordMismatch)
        ));
        assert!(matches!(
            gate.change_password("password123", "short", "short"),
            Err(GateError::WeakPassword(8))
        ));
        assert!(matches!(
            gate.change_password("wrong", "newsecret1", "newsecret1"),
            Err(GateError::InvalidCredentials)
        ));

        gate.change_password("password123", "newsecret1", "newsecret1").unwrap();
        gate.end_session();
        assert!(gate.authenticate("patient@hospital.com", "password123").is_err());
        assert!(gate.authenticate("patient@hospital.com", "newsecret1").is_ok());
    }

    #[test]
    fn test_register_requires_admin() {
        let mut gate = setup_gate();
        let request = NewAccount {
            email: "new.patient@email.com".into(),
            name: "New Patient".into(),
            role: Role::Patient,
            secret: "password123".into(),
            profile: IdentityProfile::default(),
        };

        assert!(matches!(gate.register(request.clone()), Err(GateError::NotAuthenticated)));

        gate.authenticate("receptionist@hospital.com", "password123").unwrap();
        assert!(matches!(
            gate.register(request.clone()),
            Err(GateError::Forbidden("receptionist"))
        ));

        gate.authenticate("admin@hospital.com", "password123").unwrap();
        let identity = gate.register(request.clone()).unwrap();
        assert_eq!(identity.role, Role::Patient);
        assert!(matches!(gate.register(request), Err(GateError::DuplicateEmail(_))));

        gate.end_session();
        assert!(gate.authenticate("new.patient@email.com", "password123").is_ok());
    }

    #[test]
    fn test_search_and_counts() {
        let gate = setup_gate();

        assert_eq!(gate.search_identities("hospital.com", None).len(), 3);
        assert_eq!(gate.search_identities("", Some(Role::Admin)).len(), 1);
        assert!(gate.search_identities("nobody", None).is_empty());

        let counts = gate.role_counts();
        assert_eq!(
            counts,
            RoleCounts {
                total: 3,
                patients: 1,
                doctors: 0,
                staff: 2
            }
        );
    }
}
