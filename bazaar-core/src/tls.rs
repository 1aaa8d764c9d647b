use diesel::{ConnectionError, ConnectionResult};
use diesel_async::AsyncPgConnection;
use futures_util::future::{BoxFuture, FutureExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tracing;

/// Pool setup hook: TLS connection with the server certificate checked
/// against the platform root store.
pub fn establish_verified(url: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    connect(url.to_owned(), true).boxed()
}

/// Pool setup hook: TLS connection that accepts any server certificate.
/// Managed postgres offerings commonly present self-signed chains.
pub fn establish_unverified(url: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    connect(url.to_owned(), false).boxed()
}

async fn connect(url: String, verify: bool) -> ConnectionResult<AsyncPgConnection> {
    let config = client_config(verify).map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(config);

    let (client, connection) = tokio_postgres::connect(&url, tls)
        .await
        .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

    AsyncPgConnection::try_from_client_and_connection(client, connection).await
}

pub fn client_config(verify: bool) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let config = if verify {
        builder
            .with_root_certificates(native_roots())
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
            .with_no_client_auth()
    };

    Ok(config)
}

fn native_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        tracing::warn!("Failed to load a native root certificate: {}", err);
    }
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    tracing::debug!("Loaded {} native root certificates ({} ignored)", added, ignored);
    roots
}

/// Skips chain and hostname validation but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_unverified_client_config() {
        let config = client_config(false).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn builds_verified_client_config() {
        assert!(client_config(true).is_ok());
    }
}
