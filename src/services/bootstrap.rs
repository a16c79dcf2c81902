//! First-run provisioning of the platform super admin.

use anyhow::Context;
use uuid::Uuid;

use crate::auth::{hash_password, meets_minimum_length, password::MIN_PASSWORD_LENGTH, Role};
use crate::config::BootstrapConfig;
use crate::database::{Store, StoreError, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No bootstrap credentials configured.
    Skipped,
    AlreadyPresent(Uuid),
    Created(Uuid),
}

/// Create a tenantless `super_admin` from the bootstrap credentials unless a
/// user with that username already exists.
pub async fn ensure_super_admin(
    store: &Store,
    config: &BootstrapConfig,
) -> anyhow::Result<BootstrapOutcome> {
    let (Some(username), Some(password)) = (config.username.as_deref(), config.password.as_deref())
    else {
        return Ok(BootstrapOutcome::Skipped);
    };

    let username = username.trim();
    anyhow::ensure!(!username.is_empty(), "bootstrap username is empty");
    anyhow::ensure!(
        meets_minimum_length(password),
        "bootstrap password must be at least {} characters",
        MIN_PASSWORD_LENGTH
    );

    if let Some(existing) = store.users.find_unique("username", username).await? {
        if existing.role != Role::SuperAdmin {
            tracing::warn!(
                username,
                role = %existing.role,
                "bootstrap username belongs to a non super admin account; leaving it unchanged"
            );
        }
        return Ok(BootstrapOutcome::AlreadyPresent(existing.id));
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task panicked")??;

    let user = User::new(
        None,
        username.to_string(),
        password_hash,
        Role::SuperAdmin,
        Some("Platform administrator".to_string()),
    );

    match store.users.create(user).await {
        Ok(created) => {
            tracing::info!(user_id = %created.id, username, "bootstrap super admin created");
            Ok(BootstrapOutcome::Created(created.id))
        }
        // Another instance won the race.
        Err(StoreError::Conflict(_)) => {
            let existing = store
                .users
                .find_unique("username", username)
                .await?
                .context("bootstrap user vanished after conflict")?;
            Ok(BootstrapOutcome::AlreadyPresent(existing.id))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    fn credentials(username: &str, password: &str) -> BootstrapConfig {
        BootstrapConfig {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn skipped_without_credentials() {
        let store = Store::in_memory();
        let config = BootstrapConfig {
            username: None,
            password: None,
        };
        assert_eq!(
            ensure_super_admin(&store, &config).await.unwrap(),
            BootstrapOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn creates_platform_super_admin_once() {
        let store = Store::in_memory();
        let config = credentials("root", "bootstrap-password");

        let first = ensure_super_admin(&store, &config).await.unwrap();
        let BootstrapOutcome::Created(id) = first else {
            panic!("expected creation, got {:?}", first);
        };

        let user = store.users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::SuperAdmin);
        assert_eq!(user.tenant_id, None);
        assert!(verify_password("bootstrap-password", &user.password_hash));

        let second = ensure_super_admin(&store, &config).await.unwrap();
        assert_eq!(second, BootstrapOutcome::AlreadyPresent(id));
    }

    #[tokio::test]
    async fn short_password_is_refused() {
        let store = Store::in_memory();
        assert!(ensure_super_admin(&store, &credentials("root", "short"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn short_password_is_measured_in_characters() {
        let store = Store::in_memory();
        // fourteen bytes but only seven characters
        let config = credentials("root", "ééééééé");
        assert!(ensure_super_admin(&store, &config).await.is_err());
        assert!(store.users.get_all(None).await.unwrap().is_empty());
    }
}
