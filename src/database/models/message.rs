use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::Infallible;
use uuid::Uuid;

use crate::database::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageGroup {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub member_ids: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MessageGroup {
    /// The creator is always a member.
    pub fn new(tenant_id: Uuid, created_by: Uuid, name: String, mut member_ids: Vec<Uuid>) -> Self {
        if !member_ids.contains(&created_by) {
            member_ids.insert(0, created_by);
        }
        let mut seen = HashSet::new();
        member_ids.retain(|id| seen.insert(*id));
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            member_ids,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }
}

impl Entity for MessageGroup {
    const KIND: &'static str = "message_group";
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(group: &MessageGroup, sender_id: Uuid, sender_username: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: group.tenant_id,
            group_id: group.id,
            sender_id,
            sender_username,
            body,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Message {
    const KIND: &'static str = "message";
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_joins_own_group() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let group = MessageGroup::new(Uuid::new_v4(), creator, "Line 3".into(), vec![other]);
        assert!(group.is_member(creator));
        assert!(group.is_member(other));
        assert!(!group.is_member(Uuid::new_v4()));
    }
}
