use crate::config::ApiConfig;

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

fn env_token(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Find an API token, trying in order:
/// 1. Env var named in config
/// 2. CLI command from config
///
/// `None` means requests go out unauthenticated, which is enough for
/// public repositories.
pub fn load_token(api: &ApiConfig) -> Option<String> {
    if let Some(token) = api.token_env.as_deref().and_then(env_token) {
        tracing::debug!("using token from environment");
        return Some(token);
    }

    if let Some(token) = api.token_command.as_deref().and_then(try_cli_token) {
        tracing::debug!("using token from token_command");
        return Some(token);
    }

    tracing::info!("no API token found, continuing unauthenticated");
    None
}
