use serde_json::json;

use crate::auth::{hash_password, meets_minimum_length, password::MIN_PASSWORD_LENGTH};
use crate::cli::{utils::output_success, OutputFormat};

pub async fn handle(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    anyhow::ensure!(
        meets_minimum_length(password),
        "password must be at least {} characters",
        MIN_PASSWORD_LENGTH
    );

    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    match output_format {
        OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "hash": hash }))),
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
    }
}
