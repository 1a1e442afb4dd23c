use fortimanager::FortimanagerProvider;
use std::env;
use tfplug::server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the go-plugin handshake line; logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::default();
    if let Ok(cert) = env::var("TFPLUG_CERT_PATH") {
        config = config.with_cert_path(cert.into());
    }
    if let Ok(key) = env::var("TFPLUG_KEY_PATH") {
        config = config.with_key_path(key.into());
    }

    serve(FortimanagerProvider::new(), config).await?;

    Ok(())
}
