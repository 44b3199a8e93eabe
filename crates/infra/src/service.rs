//! Application service: the single entry point the console drives.
//!
//! ## Execution Flow
//!
//! Every public operation runs the same pipeline:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Authorize against the current session (role-gated operations only)
//!   ↓
//! 2. Run the domain operation (TypeRegistry / UserDirectory / AuthSession)
//!   ↓
//! 3. Persist both documents (mutations only)
//!   ↓
//! 4. Emit exactly one audit event, success or failure
//! ```
//!
//! Domain and authorization errors are recoverable. Persistence errors are
//! not: [`ServiceError::is_fatal`] tells the caller to stop.

use std::collections::BTreeMap;

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use revive_auth::{
    authorize, AuthSession, AuthzError, Permission, Principal, Registration, UserAccount,
    UserDirectory,
};
use revive_core::DomainError;
use revive_events::{AuditEvent, AuditSink};
use revive_inventory::{ItemRecord, ItemType, TypeRegistry};

use crate::persistence::{PersistenceGateway, StorageError};

const OP_REGISTER: &str = "auth.user.register";
const OP_BOOTSTRAP_ADMIN: &str = "auth.admin.bootstrap";
const OP_LOGIN: &str = "auth.login";
const OP_LOGOUT: &str = "auth.logout";
const OP_PENDING: &str = "auth.user.pending";
const OP_SHUTDOWN: &str = "system.shutdown";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Only allowed while no administrator exists.
    #[error("an administrator already exists")]
    BootstrapClosed,

    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

impl ServiceError {
    /// Stable, machine-readable kind used in audit event details.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Domain(err) => err.kind(),
            ServiceError::Authz(err) => err.kind(),
            ServiceError::BootstrapClosed => "bootstrap_closed",
            ServiceError::Persistence(_) => "persistence",
        }
    }

    /// Whether the process must stop rather than report and continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Persistence(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Owns all registry state for the lifetime of the process.
pub struct RegistryService<G> {
    types: TypeRegistry,
    users: UserDirectory,
    session: AuthSession,
    gateway: G,
    audit_sink: Box<dyn AuditSink>,
}

impl<G> core::fmt::Debug for RegistryService<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistryService")
            .field("types", &self.types.len())
            .field("users", &self.users.len())
            .field("session", self.session.state())
            .finish_non_exhaustive()
    }
}

impl<G> RegistryService<G>
where
    G: PersistenceGateway,
{
    /// Load persisted state through `gateway` and start logged out.
    pub fn open(gateway: G, audit_sink: Box<dyn AuditSink>) -> ServiceResult<Self> {
        let (types, users) = gateway.load()?;
        tracing::info!(types = types.len(), users = users.len(), "registry opened");
        Ok(Self {
            types,
            users,
            session: AuthSession::new(),
            gateway,
            audit_sink,
        })
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// True until the first administrator account exists.
    pub fn needs_bootstrap(&self) -> bool {
        !self.users.has_admin()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts & sessions (ungated)
    // ─────────────────────────────────────────────────────────────────────────

    /// Self-registration; the new account awaits approval.
    pub fn register(&mut self, registration: Registration) -> ServiceResult<()> {
        let details = json!({ "username": registration.username });
        let result = self.try_register(registration);
        self.emit(OP_REGISTER, details, &result);
        result
    }

    fn try_register(&mut self, registration: Registration) -> ServiceResult<()> {
        self.users.register(registration)?;
        self.persist()
    }

    /// Create the first administrator. Refused once any admin exists.
    pub fn bootstrap_admin(&mut self, registration: Registration) -> ServiceResult<()> {
        let details = json!({ "username": registration.username });
        let result = self.try_bootstrap_admin(registration);
        self.emit(OP_BOOTSTRAP_ADMIN, details, &result);
        result
    }

    fn try_bootstrap_admin(&mut self, registration: Registration) -> ServiceResult<()> {
        if self.users.has_admin() {
            return Err(ServiceError::BootstrapClosed);
        }
        self.users.add_admin(registration)?;
        self.persist()
    }

    pub fn login(&mut self, username: &str, password: &str) -> ServiceResult<Principal> {
        let result = self
            .session
            .login(&self.users, username, password)
            .cloned()
            .map_err(ServiceError::from);
        self.emit(OP_LOGIN, json!({ "username": username }), &result);
        result
    }

    pub fn logout(&mut self) -> Option<Principal> {
        let previous = self.session.logout();
        if let Some(principal) = &previous {
            let event = AuditEvent::success(
                OP_LOGOUT,
                Some(principal.username.clone()),
                json!({ "username": principal.username }),
            );
            self.record(&event);
        }
        previous
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn define_type(&mut self, name: &str, attributes: &[String]) -> ServiceResult<()> {
        let details = json!({ "type": name, "attributes": attributes });
        let result = self.try_define_type(name, attributes);
        self.emit(Permission::DefineType.as_str(), details, &result);
        result
    }

    fn try_define_type(&mut self, name: &str, attributes: &[String]) -> ServiceResult<()> {
        authorize(&self.session, Permission::DefineType)?;
        self.types.define_type(name, attributes)?;
        self.persist()
    }

    pub fn redefine_attributes(&mut self, name: &str, attributes: &[String]) -> ServiceResult<()> {
        let details = json!({ "type": name, "attributes": attributes });
        let result = self.try_redefine_attributes(name, attributes);
        self.emit(Permission::RedefineAttributes.as_str(), details, &result);
        result
    }

    fn try_redefine_attributes(&mut self, name: &str, attributes: &[String]) -> ServiceResult<()> {
        authorize(&self.session, Permission::RedefineAttributes)?;
        self.types.redefine_attributes(name, attributes)?;
        self.persist()
    }

    /// Approve a user. Returns `false` when nothing changed.
    pub fn approve(&mut self, username: &str) -> ServiceResult<bool> {
        let result = self.try_approve(username);
        let mut details = json!({ "username": username });
        if let Ok(changed) = &result {
            details["changed"] = json!(changed);
        }
        self.emit(Permission::ApproveUser.as_str(), details, &result);
        result
    }

    fn try_approve(&mut self, username: &str) -> ServiceResult<bool> {
        authorize(&self.session, Permission::ApproveUser)?;
        let changed = self.users.approve(username)?;
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    pub fn add_admin(&mut self, registration: Registration) -> ServiceResult<()> {
        let details = json!({ "username": registration.username });
        let result = self.try_add_admin(registration);
        self.emit(Permission::AddAdmin.as_str(), details, &result);
        result
    }

    fn try_add_admin(&mut self, registration: Registration) -> ServiceResult<()> {
        authorize(&self.session, Permission::AddAdmin)?;
        self.users.add_admin(registration)?;
        self.persist()
    }

    /// Users awaiting approval, sorted by username.
    pub fn pending_approvals(&self) -> ServiceResult<Vec<&UserAccount>> {
        let result = authorize(&self.session, Permission::ApproveUser)
            .map(|_| self.users.pending_approvals().collect::<Vec<_>>())
            .map_err(ServiceError::from);

        let mut details = json!({});
        if let Ok(pending) = &result {
            details["count"] = json!(pending.len());
        }
        self.emit(OP_PENDING, details, &result);
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared & user operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Every defined type, sorted by name.
    pub fn list_types(&self) -> ServiceResult<Vec<&ItemType>> {
        let result = authorize(&self.session, Permission::ListTypes)
            .map(|_| {
                self.types
                    .type_names()
                    .filter_map(|name| self.types.get(name))
                    .collect::<Vec<_>>()
            })
            .map_err(ServiceError::from);

        let mut details = json!({});
        if let Ok(types) = &result {
            details["count"] = json!(types.len());
        }
        self.emit(Permission::ListTypes.as_str(), details, &result);
        result
    }

    /// Schema lookup made while preparing `operation`, e.g. to prompt for
    /// item values.
    ///
    /// A successful lookup is not audited since `operation` itself follows.
    /// A failure ends the attempt and is recorded under `operation`.
    pub fn describe_type(&self, name: &str, operation: Permission) -> ServiceResult<&ItemType> {
        let result = authorize(&self.session, operation)
            .map_err(ServiceError::from)
            .and_then(|_| {
                self.types
                    .get(name)
                    .ok_or_else(|| ServiceError::from(DomainError::unknown_type(name)))
            });

        if result.is_err() {
            self.emit(operation.as_str(), json!({ "type": name }), &result);
        }
        result
    }

    pub fn add_item(
        &mut self,
        type_name: &str,
        values: &BTreeMap<String, String>,
    ) -> ServiceResult<ItemRecord> {
        let result = self.try_add_item(type_name, values);
        let mut details = json!({ "type": type_name });
        if let Ok(record) = &result {
            details["item"] = json!(record.name());
        }
        self.emit(Permission::AddItem.as_str(), details, &result);
        result
    }

    fn try_add_item(
        &mut self,
        type_name: &str,
        values: &BTreeMap<String, String>,
    ) -> ServiceResult<ItemRecord> {
        authorize(&self.session, Permission::AddItem)?;
        let record = self.types.add_item(type_name, values)?.clone();
        self.persist()?;
        Ok(record)
    }

    /// Items of `type_name` containing `keyword` in any field (case-insensitive).
    pub fn search(&self, type_name: &str, keyword: &str) -> ServiceResult<Vec<&ItemRecord>> {
        let result = self.try_search(type_name, keyword);
        let mut details = json!({ "type": type_name, "keyword": keyword });
        if let Ok(hits) = &result {
            details["matches"] = json!(hits.len());
        }
        self.emit(Permission::SearchItems.as_str(), details, &result);
        result
    }

    fn try_search(&self, type_name: &str, keyword: &str) -> ServiceResult<Vec<&ItemRecord>> {
        authorize(&self.session, Permission::SearchItems)?;
        Ok(self.types.search(type_name, keyword)?.collect())
    }

    /// End any session and write both documents one last time.
    pub fn shutdown(&mut self) -> ServiceResult<()> {
        self.logout();
        let result = self.persist();
        self.emit(OP_SHUTDOWN, json!({}), &result);
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plumbing
    // ─────────────────────────────────────────────────────────────────────────

    fn persist(&self) -> ServiceResult<()> {
        self.gateway.save(&self.types, &self.users)?;
        Ok(())
    }

    fn actor(&self) -> Option<String> {
        self.session.principal().map(|p| p.username.clone())
    }

    fn emit<T>(&self, operation: &str, details: JsonValue, result: &ServiceResult<T>) {
        let event = match result {
            Ok(_) => AuditEvent::success(operation, self.actor(), details),
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(operation, error = %err, "operation failed");
                }
                AuditEvent::failure(operation, self.actor(), details, err.kind(), err.to_string())
            }
        };
        self.record(&event);
    }

    fn record(&self, event: &AuditEvent) {
        if let Err(err) = self.audit_sink.record(event) {
            tracing::warn!(operation = event.operation(), error = %err, "failed to record audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use revive_auth::Role;
    use revive_events::{AuditEvent, InMemoryAuditSink, Outcome};

    use super::*;
    use crate::persistence::InMemoryGateway;

    type TestService = RegistryService<Arc<InMemoryGateway>>;

    fn service() -> (TestService, Arc<InMemoryGateway>, Arc<InMemoryAuditSink>) {
        let gateway = Arc::new(InMemoryGateway::new());
        let sink = Arc::new(InMemoryAuditSink::new());
        let svc = RegistryService::open(Arc::clone(&gateway), Box::new(Arc::clone(&sink))).unwrap();
        (svc, gateway, sink)
    }

    fn reg(username: &str, password: &str) -> Registration {
        Registration::new(username, "1 Main St", "555-0100", "x@example.com", password)
    }

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Admin `root` exists, user `alice` is approved, type `food` is defined.
    fn seeded() -> (TestService, Arc<InMemoryGateway>, Arc<InMemoryAuditSink>) {
        let (mut svc, gateway, sink) = service();
        svc.bootstrap_admin(reg("root", "toor")).unwrap();
        svc.register(reg("alice", "pw")).unwrap();
        svc.login("root", "toor").unwrap();
        svc.approve("alice").unwrap();
        svc.define_type("food", &attrs(&["expiry"])).unwrap();
        svc.logout();
        (svc, gateway, sink)
    }

    #[test]
    fn bootstrap_only_once() {
        let (mut svc, _, _) = service();
        assert!(svc.needs_bootstrap());
        svc.bootstrap_admin(reg("root", "toor")).unwrap();
        assert!(!svc.needs_bootstrap());

        let err = svc.bootstrap_admin(reg("eve", "x")).unwrap_err();
        assert!(matches!(err, ServiceError::BootstrapClosed));
        assert!(svc.users().get("eve").is_none());
    }

    #[test]
    fn every_mutation_is_saved() {
        let (_, gateway, _) = seeded();
        // bootstrap, register, approve, define
        assert_eq!(gateway.save_count(), 4);

        let (types, users) = gateway.load().unwrap();
        assert!(types.get("food").is_some());
        assert!(users.get("alice").unwrap().approved);
    }

    #[test]
    fn failed_operations_are_not_saved() {
        let (mut svc, gateway, _) = seeded();
        let before = gateway.save_count();

        svc.login("alice", "pw").unwrap();
        let err = svc.add_item("food", &values(&[("name", " ")])).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::EmptyRequiredField(_))));
        assert!(!err.is_fatal());

        assert_eq!(gateway.save_count(), before);
        assert!(svc.types().items("food").unwrap().is_empty());
    }

    #[test]
    fn approving_twice_saves_once() {
        let (mut svc, gateway, _) = service();
        svc.bootstrap_admin(reg("root", "toor")).unwrap();
        svc.register(reg("alice", "pw")).unwrap();
        svc.login("root", "toor").unwrap();
        let before = gateway.save_count();

        assert!(svc.approve("alice").unwrap());
        assert!(!svc.approve("alice").unwrap());
        assert_eq!(gateway.save_count(), before + 1);
    }

    fn failure_kind(event: &AuditEvent) -> Option<&str> {
        match event.outcome() {
            Outcome::Failure { kind, .. } => Some(kind.as_str()),
            Outcome::Success => None,
        }
    }

    #[test]
    fn redefine_attributes_saves_and_audits_each_attempt() {
        let (mut svc, gateway, sink) = seeded();
        svc.login("root", "toor").unwrap();
        let saves = gateway.save_count();
        let events = sink.len();

        svc.redefine_attributes("food", &attrs(&["brand", "expiry"]))
            .unwrap();
        assert_eq!(gateway.save_count(), saves + 1);
        assert_eq!(svc.types().get("food").unwrap().attributes(), ["brand", "expiry"]);

        let (types, _) = gateway.load().unwrap();
        assert_eq!(types.get("food").unwrap().attributes(), ["brand", "expiry"]);

        let err = svc.redefine_attributes("tools", &attrs(&["size"])).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::UnknownType(_))));
        assert_eq!(gateway.save_count(), saves + 1);

        let recorded = sink.events();
        let recent = &recorded[events..];
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|e| e.operation() == "inventory.type.redefine"));
        assert_eq!(failure_kind(&recent[0]), None);
        assert_eq!(failure_kind(&recent[1]), Some("unknown_type"));
    }

    #[test]
    fn user_session_cannot_redefine_attributes() {
        let (mut svc, gateway, sink) = seeded();
        svc.login("alice", "pw").unwrap();
        let saves = gateway.save_count();

        let err = svc.redefine_attributes("food", &attrs(&["brand"])).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Authz(AuthzError::Forbidden {
                role: Role::User,
                permission: Permission::RedefineAttributes,
            })
        ));
        assert_eq!(svc.types().get("food").unwrap().attributes(), ["expiry"]);
        assert_eq!(gateway.save_count(), saves);

        let last = sink.events().pop().unwrap();
        assert_eq!(last.operation(), "inventory.type.redefine");
        assert_eq!(failure_kind(&last), Some("forbidden"));
    }

    #[test]
    fn failed_type_lookup_is_audited_under_the_pending_operation() {
        let (mut svc, _, sink) = seeded();
        svc.login("alice", "pw").unwrap();
        let events = sink.len();

        assert!(svc.describe_type("food", Permission::AddItem).is_ok());
        assert_eq!(sink.len(), events);

        let err = svc.describe_type("nope", Permission::AddItem).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::UnknownType(_))));

        let err = svc
            .describe_type("food", Permission::RedefineAttributes)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden { .. })));

        let recorded = sink.events();
        let recent: Vec<(&str, Option<&str>)> = recorded[events..]
            .iter()
            .map(|e| (e.operation(), failure_kind(e)))
            .collect();
        assert_eq!(
            recent,
            vec![
                ("inventory.item.add", Some("unknown_type")),
                ("inventory.type.redefine", Some("forbidden")),
            ]
        );
    }

    #[test]
    fn user_session_cannot_reach_admin_operations() {
        let (mut svc, _, _) = seeded();
        svc.login("alice", "pw").unwrap();

        let err = svc.define_type("tools", &attrs(&["brand"])).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Authz(AuthzError::Forbidden {
                role: Role::User,
                permission: Permission::DefineType,
            })
        ));
        assert!(svc.types().get("tools").is_none());
        assert!(svc.approve("alice").is_err());
        assert!(svc.add_admin(reg("mallory", "x")).is_err());
    }

    #[test]
    fn admin_session_cannot_add_items() {
        let (mut svc, _, _) = seeded();
        svc.login("root", "toor").unwrap();

        let err = svc.add_item("food", &values(&[("name", "Bread")])).unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden { .. })));
        assert!(svc.search("food", "").is_err());
    }

    #[test]
    fn logged_out_operations_are_rejected() {
        let (mut svc, _, _) = seeded();
        let err = svc.add_item("food", &values(&[("name", "Bread")])).unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::NotLoggedIn)));
        assert!(svc.list_types().is_err());
    }

    #[test]
    fn user_adds_and_searches_items() {
        let (mut svc, _, _) = seeded();
        svc.login("alice", "pw").unwrap();

        svc.add_item("food", &values(&[("name", "Bread"), ("expiry", "monday")]))
            .unwrap();
        svc.add_item("food", &values(&[("name", "Milk"), ("expiry", "friday")]))
            .unwrap();

        let hits: Vec<&str> = svc
            .search("food", "BREAD")
            .unwrap()
            .into_iter()
            .map(ItemRecord::name)
            .collect();
        assert_eq!(hits, vec!["Bread"]);
        assert_eq!(svc.search("food", "").unwrap().len(), 2);
        assert!(matches!(
            svc.search("tools", ""),
            Err(ServiceError::Domain(DomainError::UnknownType(_)))
        ));
    }

    #[test]
    fn every_attempt_emits_one_audit_event() {
        let (mut svc, _, sink) = seeded();
        let before = sink.len();

        assert!(svc.login("alice", "wrong").is_err());
        svc.login("alice", "pw").unwrap();
        svc.search("food", "x").unwrap();
        assert!(svc.define_type("tools", &[]).is_err());
        svc.logout();

        let events = sink.events();
        let recent: Vec<&str> = events[before..].iter().map(|e| e.operation()).collect();
        assert_eq!(
            recent,
            vec![
                "auth.login",
                "auth.login",
                "inventory.item.search",
                "inventory.type.define",
                "auth.logout",
            ]
        );

        let failed_login = &events[before];
        assert_eq!(failed_login.actor(), None);
        assert!(matches!(
            failed_login.outcome(),
            revive_events::Outcome::Failure { kind, .. } if kind == "wrong_password"
        ));
        assert!(failed_login.details().get("password").is_none());

        let search = &events[before + 2];
        assert_eq!(search.actor(), Some("alice"));
        assert_eq!(search.details()["matches"], 0);
    }

    #[test]
    fn pending_approvals_lists_waiting_users() {
        let (mut svc, _, _) = seeded();
        svc.register(reg("bob", "pw")).unwrap();
        svc.login("root", "toor").unwrap();

        let pending: Vec<&str> = svc
            .pending_approvals()
            .unwrap()
            .into_iter()
            .map(UserAccount::username)
            .collect();
        assert_eq!(pending, vec!["bob"]);
    }

    #[test]
    fn state_survives_reopen() {
        let (mut svc, gateway, _) = seeded();
        svc.login("alice", "pw").unwrap();
        svc.add_item("food", &values(&[("name", "Bread")])).unwrap();
        svc.shutdown().unwrap();
        assert!(!svc.session().is_logged_in());

        let reopened =
            RegistryService::open(Arc::clone(&gateway), Box::new(revive_events::NullAuditSink))
                .unwrap();
        assert_eq!(reopened.types(), svc.types());
        assert_eq!(reopened.users(), svc.users());
        assert!(!reopened.session().is_logged_in());
    }
}
