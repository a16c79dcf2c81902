use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tracking_number: String,
    pub carrier: String,
    pub direction: ShipmentDirection,
    pub status: ShipmentStatus,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(
        tenant_id: Uuid,
        tracking_number: String,
        carrier: String,
        direction: ShipmentDirection,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            tracking_number,
            carrier,
            direction,
            status: ShipmentStatus::Pending,
            origin: None,
            destination: None,
            expected_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPatch {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub direction: Option<ShipmentDirection>,
    pub status: Option<ShipmentStatus>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Entity for Shipment {
    const KIND: &'static str = "shipment";
    type Patch = ShipmentPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: ShipmentPatch) {
        if let Some(tracking_number) = patch.tracking_number {
            self.tracking_number = tracking_number;
        }
        if let Some(carrier) = patch.carrier {
            self.carrier = carrier;
        }
        if let Some(direction) = patch.direction {
            self.direction = direction;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.origin.is_some() {
            self.origin = patch.origin;
        }
        if patch.destination.is_some() {
            self.destination = patch.destination;
        }
        if patch.expected_at.is_some() {
            self.expected_at = patch.expected_at;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        self.updated_at = Utc::now();
    }
}
