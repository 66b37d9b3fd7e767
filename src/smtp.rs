//! SMTP submission of the probe message
//!
//! One connection, one message, one recipient. The session itself
//! (EHLO, STARTTLS and the second EHLO, AUTH, the mail transaction,
//! QUIT) is run by `lettre`; this module maps the probe's endpoint
//! settings onto a transport and the transport's errors onto ours.
//! Nothing is retried.

use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::message::ProbeMessage;
use crate::tls_mode::TlsMode;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info};

/// Submit `message` from `from` to `to`.
///
/// `helo_name` identifies this host in EHLO. The connection is opened
/// for this one message and closed with QUIT before this returns,
/// whether the transaction succeeded or not.
///
/// # Errors
///
/// Returns [`Error::Config`] for an address that does not parse, and a
/// transport error if the connection, TLS handshake, authentication,
/// or any step of the mail transaction fails.
pub async fn send(
    config: &SmtpConfig,
    from: &str,
    to: &str,
    message: &ProbeMessage,
    helo_name: &str,
) -> Result<()> {
    let envelope = envelope(from, to)?;
    let transport = transport(config, helo_name)?;

    debug!(
        "Submitting to {} ({})",
        config.endpoint.address(),
        config.endpoint.tls
    );
    transport
        .send_raw(&envelope, &message.to_bytes())
        .await
        .map_err(|e| classify(&e))?;

    info!("Probe message submitted to {}", config.endpoint.address());
    Ok(())
}

fn envelope(from: &str, to: &str) -> Result<Envelope> {
    let parse = |addr: &str| {
        addr.parse::<Address>()
            .map_err(|e| Error::Config(format!("Invalid address {addr}: {e}")))
    };
    Envelope::new(Some(parse(from)?), vec![parse(to)?])
        .map_err(|e| Error::Config(format!("Invalid envelope: {e}")))
}

/// A single-use transport for `config`'s endpoint.
fn transport(config: &SmtpConfig, helo_name: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let endpoint = &config.endpoint;
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&endpoint.host)
        .port(endpoint.port)
        .tls(tls(config)?)
        .hello_name(ClientId::Domain(helo_name.to_string()));

    if let Some(login) = config.login() {
        builder = builder.credentials(Credentials::new(
            login.username.clone(),
            login.password.clone(),
        ));
    }
    Ok(builder.build())
}

fn tls(config: &SmtpConfig) -> Result<Tls> {
    let endpoint = &config.endpoint;
    let secure: fn(TlsParameters) -> Tls = match endpoint.tls {
        TlsMode::None => return Ok(Tls::None),
        TlsMode::Tls => Tls::Wrapper,
        TlsMode::StartTls => Tls::Required,
    };

    let parameters = TlsParameters::builder(endpoint.host.clone())
        .dangerous_accept_invalid_certs(endpoint.accept_invalid_certs)
        .build_rustls()
        .map_err(|e| Error::Tls(format!("Unsupported TLS configuration: {e}")))?;

    Ok(secure(parameters))
}

/// Sort a transport error into the probe's error kinds: TLS problems,
/// socket failures, and everything the server said no to.
fn classify(e: &lettre::transport::smtp::Error) -> Error {
    let message = e.to_string();
    if e.is_tls() {
        return Error::Tls(message);
    }

    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if err.is::<rustls::Error>() {
            return Error::Tls(message);
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return Error::Tls(message);
            }
            return Error::Io(std::io::Error::new(io.kind(), message));
        }
        source = err.source();
    }
    Error::Smtp(message)
}
