// handlers/protected/mod.rs - Handlers that need a tenant session
//
// Route prefix: /api/* (except /api/tenants and the public auth endpoints)
// Each handler calls `require` with its role set, then keeps every storage
// call inside the caller's tenant scope.

pub mod auth;
pub mod checklists;
pub mod documents;
pub mod incidents;
pub mod messages;
pub mod shipments;
pub mod users;
