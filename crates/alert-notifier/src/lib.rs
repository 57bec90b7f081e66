//! Alert notifier
//!
//! Clients create an alert document (an "SOS" or an "I'm safe" check-in) in
//! the `alerts` collection of the document store. The hosting platform
//! delivers each document event to the `trigger` router, and for every newly
//! created alert the `Notifier` sends an SMS to each of its recipients.
//!
//! Sends to recipients are independent of one another: they run concurrently,
//! and a failure is logged without affecting other recipients or the outcome
//! of the event. There are no retries, and a missing transport configuration
//! disables sending entirely rather than failing events.
use anyhow::Context;
use futures::FutureExt;
use std::sync::Arc;

pub mod alert;
pub mod config;
pub mod notifier;
pub mod sender;
pub mod trigger;

pub use alert::{AlertKind, AlertRecord, Recipient};
pub use notifier::{
    plan_sends, AttemptOutcome, AttemptStatus, Notifier, NotifyReport, SendAttempt, Skipped,
};
pub use sender::{OutboundSms, Receipt, SmsSender, TwilioSender};

/// Alert-notifier is a service which sends an SMS to each recipient of
/// newly-created alert documents.
#[derive(derivative::Derivative, clap::Parser)]
#[derivative(Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Port to listen on for document events.
    #[clap(long, env = "PORT", default_value = "8080")]
    pub port: u16,
    /// Collection of alert documents. Create events of documents
    /// `{collection}/{alertId}` are handled, and all others are ignored.
    #[clap(long, env = "ALERTS_COLLECTION", default_value = "alerts")]
    pub collection: String,
    /// Twilio account SID.
    #[clap(long, env = "TWILIO_SID")]
    pub twilio_sid: Option<String>,
    /// Twilio auth token.
    #[derivative(Debug = "ignore")]
    #[clap(long, env = "TWILIO_TOKEN", hide_env_values = true)]
    pub twilio_token: Option<String>,
    /// Phone number which messages are sent from.
    #[clap(long, env = "TWILIO_FROM")]
    pub twilio_from: Option<String>,
    /// Base URL of the Twilio REST API.
    #[clap(long, env = "TWILIO_API_URL", default_value = "https://api.twilio.com")]
    pub twilio_api_url: url::Url,
    /// Path to a JSON runtime config of the hosting platform.
    /// Twilio settings which are not otherwise provided are read from it.
    #[clap(long, env = "RUNTIME_CONFIG")]
    pub runtime_config: Option<std::path::PathBuf>,
}

impl Args {
    /// Resolve the transport configuration from these Args and the runtime config store.
    pub fn transport_config(&self) -> anyhow::Result<config::TransportConfig> {
        let secondary = match &self.runtime_config {
            Some(path) => config::RuntimeConfig::load(path)?.twilio,
            None => None,
        };
        let primary = config::TransportConfig {
            account_sid: self.twilio_sid.clone(),
            auth_token: self.twilio_token.clone(),
            from: self.twilio_from.clone(),
        };
        Ok(config::TransportConfig::resolve(primary, secondary))
    }
}

/// Build the Notifier described by `transport`. A TwilioSender is created
/// only if the account credentials are present.
pub fn build_notifier(
    transport: config::TransportConfig,
    api_url: url::Url,
    http_client: reqwest::Client,
) -> Notifier<TwilioSender> {
    let client = transport
        .credentials()
        .map(|(sid, token)| TwilioSender::new(http_client, api_url, sid, token));

    Notifier::new(client, transport.from)
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let transport = args
        .transport_config()
        .context("resolving transport configuration")?;
    tracing::info!(?transport, "resolved transport configuration");

    let notifier = build_notifier(
        transport,
        args.twilio_api_url.clone(),
        reqwest::Client::new(),
    );
    if !notifier.is_configured() {
        tracing::warn!("SMS transport is not fully configured, alerts will not be sent");
    }

    let app = trigger::build_router(Arc::new(notifier), args.collection.clone());

    let listener = tokio::net::TcpListener::bind(format!("[::]:{}", args.port))
        .await
        .context("failed to bind server port")?;

    tracing::info!(port = args.port, collection = %args.collection, "alert notifier listening");

    // Share-able future which completes when the server should exit.
    let shutdown = tokio::signal::ctrl_c().map(|_| ()).shared();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving HTTP")?;

    Ok(())
}
