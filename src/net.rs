//! Shared TCP and TLS helpers
//!
//! The IMAP side reaches its server with a TCP connect, then either an
//! immediate TLS handshake or a STARTTLS exchange followed by the
//! handshake. The helpers here cover everything but the STARTTLS
//! command itself.

use crate::config::Endpoint;
use crate::error::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

/// A bidirectional byte stream, plain or encrypted.
pub trait MailStream: AsyncRead + AsyncWrite + Unpin + Send + Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Debug> MailStream for T {}

/// A connection whose security has already been negotiated.
pub type BoxedStream = Box<dyn MailStream>;

/// The name of this machine, used in EHLO and in the probe message.
///
/// Falls back to `localhost` when the OS refuses to tell.
#[must_use]
pub fn local_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Could not read local hostname: {e}");
            "localhost".to_string()
        }
    }
}

/// Open the TCP connection to an endpoint.
pub async fn connect_tcp(endpoint: &Endpoint) -> Result<TcpStream> {
    let addr = endpoint.address();
    debug!("Connecting to {} ({})", addr, endpoint.tls);
    Ok(TcpStream::connect(&addr).await?)
}

/// Run the TLS handshake over an established TCP stream.
///
/// Used right after connect for implicit TLS, and after the server
/// accepted STARTTLS otherwise.
pub async fn upgrade(endpoint: &Endpoint, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
    let connector = tls_connector(endpoint.accept_invalid_certs)?;
    let server_name = ServerName::try_from(endpoint.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let tls_stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| Error::Tls(format!("Handshake with {} failed: {e}", endpoint.host)))?;

    debug!("TLS established with {}", endpoint.host);
    Ok(tls_stream)
}

/// Build a TLS connector.
///
/// Verifies against the Mozilla root store unless
/// `accept_invalid_certs` is set, in which case any chain is trusted.
/// Always uses the ring provider, never the process default.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("Unsupported TLS configuration: {e}")))?;
    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    } else {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Verifier that trusts any certificate chain for any name, for
/// servers with self-signed certificates. Handshake signatures are
/// still checked with the provider's algorithms.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
