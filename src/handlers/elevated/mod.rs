// handlers/elevated/mod.rs - Platform administration (super_admin only)
//
// Route prefix: /api/tenants
// Tenant roles never pass the guard here; super_admin sees every tenant.

pub mod tenants;
