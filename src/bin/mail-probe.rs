#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Send a probe message over SMTP and wait for it over IMAP
//!
//! Every flag can also come from the environment (or a `.env` file).
//! The report goes to stdout, logs go to stderr (`RUST_LOG=debug`).

use clap::Parser;
use mail_probe::{
    Credentials, DEFAULT_CHECK_FREQUENCY, DEFAULT_IMAP_PORT, DEFAULT_MAX_CHECKS, DEFAULT_PREFIX,
    DEFAULT_SMTP_PORT, Endpoint, ImapConfig, OutputFormat, Probe, ProbeConfig, SmtpConfig,
    TlsMode, report,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mail-probe")]
#[command(about = "End-to-end mail delivery probe: send over SMTP, wait for it over IMAP")]
struct Args {
    /// Address to use as sender
    #[arg(long, env = "EMAIL_FROM")]
    email_from: String,

    /// Address to use as recipient (the mailbox polled over IMAP)
    #[arg(long, env = "EMAIL_TO")]
    email_to: String,

    /// Prefix for the message subject
    #[arg(long, env = "SUBJECT_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Seconds to wait between two mailbox checks
    #[arg(long, env = "CHECK_FREQUENCY", default_value_t = DEFAULT_CHECK_FREQUENCY.as_secs())]
    check_frequency: u64,

    /// Number of mailbox checks before the probe fails
    #[arg(long, env = "MAX_CHECKS", default_value_t = DEFAULT_MAX_CHECKS)]
    max_checks: u32,

    /// Report format: json or influx
    #[arg(long, env = "OUTPUT_FORMAT", default_value_t = OutputFormat::Json)]
    output_format: OutputFormat,

    /// SMTP server host
    #[arg(long, env = "SMTP_HOST")]
    smtp_host: String,

    /// SMTP server port
    #[arg(long, env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,

    /// SMTP transport security: none, tls or starttls
    #[arg(long, env = "SMTP_TLS", default_value_t = TlsMode::StartTls)]
    smtp_tls: TlsMode,

    /// Accept any certificate from the SMTP server
    #[arg(long, env = "SMTP_INSECURE")]
    smtp_insecure: bool,

    /// SMTP username (no AUTH when absent)
    #[arg(long, env = "SMTP_USERNAME")]
    smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// IMAP server host
    #[arg(long, env = "IMAP_HOST")]
    imap_host: String,

    /// IMAP server port
    #[arg(long, env = "IMAP_PORT", default_value_t = DEFAULT_IMAP_PORT)]
    imap_port: u16,

    /// IMAP transport security: none, tls or starttls
    #[arg(long, env = "IMAP_TLS", default_value_t = TlsMode::StartTls)]
    imap_tls: TlsMode,

    /// Accept any certificate from the IMAP server
    #[arg(long, env = "IMAP_INSECURE")]
    imap_insecure: bool,

    /// IMAP username
    #[arg(long, env = "IMAP_USERNAME")]
    imap_username: String,

    /// IMAP password
    #[arg(long, env = "IMAP_PASSWORD", hide_env_values = true)]
    imap_password: String,
}

impl Args {
    fn into_config(self) -> ProbeConfig {
        let mut smtp_endpoint = Endpoint::new(self.smtp_host, self.smtp_port, self.smtp_tls);
        smtp_endpoint.accept_invalid_certs = self.smtp_insecure;
        let mut imap_endpoint = Endpoint::new(self.imap_host, self.imap_port, self.imap_tls);
        imap_endpoint.accept_invalid_certs = self.imap_insecure;

        let smtp_credentials = self
            .smtp_username
            .map(|user| Credentials::new(user, self.smtp_password.unwrap_or_default()));

        ProbeConfig {
            smtp: SmtpConfig {
                endpoint: smtp_endpoint,
                credentials: smtp_credentials,
            },
            imap: ImapConfig {
                endpoint: imap_endpoint,
                credentials: Credentials::new(self.imap_username, self.imap_password),
            },
            email_from: self.email_from,
            email_to: self.email_to,
            subject_prefix: self.prefix,
            check_frequency: Duration::from_secs(self.check_frequency),
            max_checks: self.max_checks,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Already installed is fine; the library pins its own provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let format = args.output_format;
    let config = args.into_config();

    let result = Probe::new(&config).run().await?;
    println!("{}", report::render(format, &config, &result)?);

    Ok(())
}
