//! Server command implementation

use anyhow::{Context, Result};

/// Port used when neither --port nor $PORT is set
pub const DEFAULT_PORT: u16 = 3001;

/// Resolve the listen port: flag, then $PORT, then the default
pub fn resolve_port(flag: Option<u16>, env_port: Option<&str>) -> Result<u16> {
    match (flag, env_port) {
        (Some(port), _) => Ok(port),
        (None, Some(value)) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", value)),
        (None, None) => Ok(DEFAULT_PORT),
    }
}

pub async fn cmd_serve(host: &str, port: Option<u16>) -> Result<()> {
    let env_port = std::env::var("PORT").ok();
    let port = resolve_port(port, env_port.as_deref())?;
    let config = mailcraft_server::ServerConfig::from_env();

    println!("🚀 Starting Mailcraft server...");
    println!("   Listening: http://{}:{}", host, port);
    println!("   Environment: {}", config.environment);
    println!("   CORS origins: {}", config.allowed_origins.join(", "));
    println!();
    println!("   Press Ctrl+C to stop");

    mailcraft_server::serve(host, port, config).await?;

    Ok(())
}
