use serde::Serialize;
use std::collections::HashMap;

use crate::auth::Role;

/// A protected page prefix and the roles that may open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    pub prefix: String,
    pub roles: Vec<Role>,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            prefix: prefix.into(),
            roles: roles.to_vec(),
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        role.is_super_admin() || self.roles.contains(&role)
    }
}

/// Static page-level access table consulted by the edge middleware.
#[derive(Debug, Clone, Serialize)]
pub struct RouteRoleMap {
    rules: Vec<RouteRule>,
    exempt: Vec<String>,
    login_path: String,
    landing: HashMap<Role, String>,
}

impl RouteRoleMap {
    pub fn new(
        mut rules: Vec<RouteRule>,
        exempt: Vec<String>,
        login_path: impl Into<String>,
        landing: HashMap<Role, String>,
    ) -> Self {
        // Longest prefix first, so the first hit is the most specific rule.
        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self {
            rules,
            exempt,
            login_path: login_path.into(),
            landing,
        }
    }

    /// The PlantOps page table.
    pub fn plantops_default() -> Self {
        use Role::*;

        let everyone = Role::TENANT_ROLES;
        let rules = vec![
            RouteRule::new("/super-admin", &[SuperAdmin]),
            RouteRule::new("/admin", &[Admin, Owner]),
            RouteRule::new("/quality", &[QualityTech, Admin, Owner]),
            RouteRule::new("/lab", &[LabTech, QualityTech, Admin, Owner]),
            RouteRule::new("/shipping", &[Shipping, Admin, Owner]),
            RouteRule::new("/view", &[Engineer, QualityTech, LabTech, Admin, Owner]),
            RouteRule::new("/worker", &[Worker, Admin, Owner]),
            RouteRule::new("/checklists", &everyone),
            RouteRule::new("/incidents", &everyone),
            RouteRule::new("/messages", &everyone),
            RouteRule::new("/documents", &everyone),
        ];

        let landing = HashMap::from([
            (Worker, "/worker".to_string()),
            (QualityTech, "/quality".to_string()),
            (Engineer, "/view".to_string()),
            (Shipping, "/shipping".to_string()),
            (LabTech, "/lab".to_string()),
            (Admin, "/admin".to_string()),
            (Owner, "/admin".to_string()),
            (SuperAdmin, "/super-admin".to_string()),
        ]);

        Self::new(
            rules,
            vec!["/login".to_string(), "/super-admin/login".to_string()],
            "/login",
            landing,
        )
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|p| prefix_matches(p, path))
    }

    /// Most specific rule covering `path`.
    pub fn match_path(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| prefix_matches(&rule.prefix, path))
    }

    /// Where a role lands when it strays onto a page it may not open.
    pub fn landing_for(&self, role: Role) -> &str {
        self.landing.get(&role).map(String::as_str).unwrap_or("/")
    }

    /// Login URL that returns to `from` after authenticating.
    pub fn login_redirect(&self, from: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(from.as_bytes()).collect();
        format!("{}?from={}", self.login_path, encoded)
    }
}

/// Segment-aware prefix test: `/admin` covers `/admin` and `/admin/x`, not `/administrator`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_boundaries_are_respected() {
        assert!(prefix_matches("/admin", "/admin"));
        assert!(prefix_matches("/admin", "/admin/"));
        assert!(prefix_matches("/admin", "/admin/users/7"));
        assert!(!prefix_matches("/admin", "/administrator"));
        assert!(!prefix_matches("/admin", "/"));
        assert!(prefix_matches("/", "/anything"));
    }

    #[test]
    fn longest_prefix_wins() {
        let map = RouteRoleMap::new(
            vec![
                RouteRule::new("/admin", &[Role::Admin]),
                RouteRule::new("/admin/reports", &[Role::Engineer]),
            ],
            vec![],
            "/login",
            HashMap::new(),
        );
        assert_eq!(map.match_path("/admin/reports/q3").unwrap().prefix, "/admin/reports");
        assert_eq!(map.match_path("/admin/users").unwrap().prefix, "/admin");
        assert!(map.match_path("/public").is_none());
    }

    #[test]
    fn login_pages_are_exempt() {
        let map = RouteRoleMap::plantops_default();
        assert!(map.is_exempt("/login"));
        assert!(map.is_exempt("/super-admin/login"));
        assert!(!map.is_exempt("/super-admin"));
        assert!(!map.is_exempt("/loginx"));
    }

    #[test]
    fn login_redirect_encodes_return_path() {
        let map = RouteRoleMap::plantops_default();
        assert_eq!(map.login_redirect("/admin/x"), "/login?from=%2Fadmin%2Fx");
    }

    #[test]
    fn landing_falls_back_to_root() {
        let map = RouteRoleMap::new(
            vec![],
            vec![],
            "/login",
            HashMap::from([(Role::Worker, "/worker".to_string())]),
        );
        assert_eq!(map.landing_for(Role::Worker), "/worker");
        assert_eq!(map.landing_for(Role::LabTech), "/");
    }

    #[test]
    fn default_table_matches_plant_roles() {
        let map = RouteRoleMap::plantops_default();
        assert!(map.match_path("/documents").unwrap().permits(Role::Worker));
        assert!(!map.match_path("/quality").unwrap().permits(Role::Engineer));
        assert!(map.match_path("/super-admin/tenants").unwrap().permits(Role::SuperAdmin));
        assert!(!map.match_path("/super-admin/tenants").unwrap().permits(Role::Owner));
        assert_eq!(map.landing_for(Role::Engineer), "/view");
        assert!(map.match_path("/api/incidents").is_none());
    }
}
