use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Role, SessionPayload};
use crate::database::Entity;

/// Stored account, including the password hash. Never serialize to clients;
/// use [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        tenant_id: Option<Uuid>,
        username: String,
        password_hash: String,
        role: Role,
        display_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            username,
            password_hash,
            role,
            display_name,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn session_payload(&self) -> SessionPayload {
        SessionPayload {
            user_id: self.id,
            tenant_id: self.tenant_id,
            role: self.role,
            username: self.username.clone(),
        }
    }
}

/// Client-facing view of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
            role: user.role,
            display_name: user.display_name,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
}

impl Entity for User {
    const KIND: &'static str = "user";
    type Patch = UserPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("username", self.username.to_lowercase())]
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = Some(display_name);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_drops_password_hash() {
        let user = User::new(
            Some(Uuid::new_v4()),
            "ada".into(),
            "$argon2id$secret".into(),
            Role::Engineer,
            None,
        );
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "engineer");
        assert_eq!(json["username"], "ada");
    }
}
