use anyhow::Context;
use chrono::Duration;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{Role, SessionCodec, SessionPayload};
use crate::cli::{
    utils::{output_error, output_fields, output_success},
    OutputFormat,
};
use crate::config::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a session token with the configured secret")]
    Issue {
        #[arg(long, help = "User id (random when omitted)")]
        user_id: Option<Uuid>,
        #[arg(long, help = "Role carried by the token")]
        role: Role,
        #[arg(long, help = "Username carried by the token")]
        username: String,
        #[arg(long, help = "Tenant id (omit for super_admin)")]
        tenant_id: Option<Uuid>,
        #[arg(long, help = "Lifetime in hours (defaults to the configured session expiry)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a token and print its payload")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
    },
}

fn codec(hours: Option<u64>) -> anyhow::Result<SessionCodec> {
    let security = &config().security;
    let hours = hours.unwrap_or(security.session_expiry_hours);
    let ttl = Duration::hours(i64::try_from(hours).context("lifetime is too large")?);
    Ok(SessionCodec::new(security.session_secret.as_bytes(), ttl)?)
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue {
            user_id,
            role,
            username,
            tenant_id,
            hours,
        } => {
            anyhow::ensure!(
                role.is_super_admin() || tenant_id.is_some(),
                "--tenant-id is required for tenant roles"
            );
            let payload = SessionPayload {
                user_id: user_id.unwrap_or_else(Uuid::new_v4),
                tenant_id,
                role,
                username,
            };
            let token = codec(hours)?.issue(&payload)?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token issued",
                    Some(json!({ "token": token, "payload": payload })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => match codec(None)?.verify(token.trim()) {
            Some(payload) => output_fields(
                output_format,
                &[
                    ("userId", payload.user_id.to_string()),
                    (
                        "tenantId",
                        payload
                            .tenant_id
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    ("role", payload.role.to_string()),
                    ("username", payload.username),
                ],
            ),
            None => {
                output_error(output_format, "Token is invalid or expired", Some("INVALID_TOKEN"))?;
                std::process::exit(1);
            }
        },
    }
}
