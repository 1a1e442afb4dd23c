//! Server entry point for running a Terraform provider
//!
//! Binds the gRPC service on a loopback port, prints the go-plugin
//! handshake line, and serves until Terraform closes the connection.

use crate::error::{Result, TfplugError};
use crate::grpc::ProviderHandler;
use crate::provider::Provider;
use crate::proto;
use std::path::PathBuf;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Server configuration for running a Terraform provider.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the TLS certificate presented to Terraform.
    pub cert_path: PathBuf,
    /// Path to the TLS private key.
    pub key_path: PathBuf,
    /// Maximum gRPC message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("./certs/localhost.pem"),
            key_path: PathBuf::from("./certs/localhost-key.pem"),
            max_message_size: 256 << 20, // 256MB; Terraform states can be large
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cert_path(mut self, path: PathBuf) -> Self {
        self.cert_path = path;
        self
    }

    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = path;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

/// Main entry point for running a provider.
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| TfplugError::TlsError("failed to install crypto provider".to_string()))?;

    let cert = tokio::fs::read(&config.cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("failed to read certificate: {}", e)))?;
    let key = tokio::fs::read(&config.key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("failed to read key: {}", e)))?;

    let identity = Identity::from_pem(cert, key);
    let tls_config = ServerTlsConfig::new().identity(identity);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let service = proto::ProviderServer::new(ProviderHandler::new(provider))
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    // go-plugin handshake: protocol version 6 over tcp with grpc.
    println!("1|6|tcp|127.0.0.1:{}|grpc", addr.port());
    tracing::info!(port = addr.port(), "provider server listening");

    Server::builder()
        .tls_config(tls_config)?
        .add_service(service)
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}

/// Convenience wrapper using the default configuration.
pub async fn serve_default<P: Provider + 'static>(provider: P) -> Result<()> {
    serve(provider, ServerConfig::default()).await
}
