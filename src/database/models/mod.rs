mod checklist;
mod document;
mod incident;
mod message;
mod shipment;
mod tenant;
mod user;

pub use checklist::{
    ChecklistItem, ChecklistResponse, ChecklistSubmission, ChecklistTemplate, SubmissionStatus,
    TemplatePatch,
};
pub use document::{Document, DocumentFolder};
pub use incident::{Incident, IncidentPatch, IncidentSeverity, IncidentStatus};
pub use message::{Message, MessageGroup};
pub use shipment::{Shipment, ShipmentDirection, ShipmentPatch, ShipmentStatus};
pub use tenant::{Tenant, TenantPatch};
pub use user::{PublicUser, User, UserPatch};
