use serde_json::json;
use uuid::Uuid;

use crate::auth::{Role, SessionPayload};
use crate::cli::{utils::output_fields, OutputFormat};
use crate::middleware::{evaluate, EdgeDecision, RouteRoleMap};

pub fn list(output_format: OutputFormat) -> anyhow::Result<()> {
    let routes = RouteRoleMap::plantops_default();

    match output_format {
        OutputFormat::Json => {
            let rules: Vec<_> = routes
                .rules()
                .iter()
                .map(|rule| json!({ "prefix": rule.prefix, "roles": rule.roles }))
                .collect();
            let landing: serde_json::Map<_, _> = Role::ALL
                .iter()
                .map(|role| (role.to_string(), json!(routes.landing_for(*role))))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "loginPath": routes.login_path(),
                    "rules": rules,
                    "landing": landing,
                }))?
            );
        }
        OutputFormat::Text => {
            let width = routes.rules().iter().map(|r| r.prefix.len()).max().unwrap_or(0);
            for rule in routes.rules() {
                let roles: Vec<&str> = rule.roles.iter().map(Role::as_str).collect();
                println!("{:width$}  {}", rule.prefix, roles.join(", "), width = width);
            }
            println!();
            println!("super_admin passes every prefix; login page is {}", routes.login_path());
        }
    }
    Ok(())
}

pub fn check(path: &str, role: Option<Role>, output_format: OutputFormat) -> anyhow::Result<()> {
    let routes = RouteRoleMap::plantops_default();
    let bare_path = path.split('?').next().unwrap_or(path);
    let session = role.map(|role| SessionPayload {
        user_id: Uuid::nil(),
        tenant_id: (!role.is_super_admin()).then(Uuid::nil),
        role,
        username: "cli".to_string(),
    });

    let decision = evaluate(&routes, bare_path, path, session.as_ref());
    let outcome = match &decision {
        EdgeDecision::Exempt => "pass (exempt)",
        EdgeDecision::NoMatch => "pass (not a protected page)",
        EdgeDecision::Authorized => "pass (role permitted)",
        EdgeDecision::Unauthenticated { .. } => "redirect to login",
        EdgeDecision::Unauthorized { .. } => "redirect to landing page",
    };

    let mut fields = vec![
        ("path", path.to_string()),
        ("role", role.map(|r| r.to_string()).unwrap_or_else(|| "anonymous".to_string())),
        ("decision", outcome.to_string()),
    ];
    if let Some(location) = decision.redirect_location() {
        fields.push(("location", location.to_string()));
    }
    output_fields(output_format, &fields)
}
