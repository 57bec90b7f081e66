/// OutboundSms is a single text message to be sent by a transport provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub to: String,
    pub from: String,
    pub body: String,
}

/// Receipt returned by a provider for a message it accepted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Receipt {
    /// Provider-assigned identifier of the message.
    pub sid: String,
    /// Provider-reported delivery status at the time of acceptance (ex "queued").
    #[serde(default)]
    pub status: Option<String>,
}

/// Error that describes a failed send.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to call messaging API")]
    Request(#[from] reqwest::Error),
    #[error("messaging API rejected the message ({status}{}): {message}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

/// SmsSender is a transport provider able to send a text message.
/// Implementations are shared by concurrent invocations and must not hold
/// per-invocation state.
pub trait SmsSender: std::fmt::Debug + Send + Sync + 'static {
    fn send<'s>(
        &'s self,
        sms: OutboundSms,
    ) -> impl std::future::Future<Output = Result<Receipt, Error>> + Send + 's;
}

/// Sends messages using the Twilio Programmable Messaging REST API.
#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct TwilioSender {
    #[derivative(Debug = "ignore")]
    http_client: reqwest::Client,
    api_url: url::Url,
    account_sid: String,
    #[derivative(Debug = "ignore")]
    auth_token: String,
}

impl TwilioSender {
    pub fn new(
        http_client: reqwest::Client,
        api_url: url::Url,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> TwilioSender {
        TwilioSender {
            http_client,
            api_url,
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_url.as_str().trim_end_matches('/'),
            self.account_sid,
        )
    }
}

impl SmsSender for TwilioSender {
    async fn send<'s>(&'s self, sms: OutboundSms) -> Result<Receipt, Error> {
        let OutboundSms { to, from, body } = sms;

        // No request timeout is set here: the client's defaults apply.
        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let receipt: Receipt = response.json().await?;
            tracing::debug!(%to, sid = %receipt.sid, status = ?receipt.status, "messaging API accepted message");
            return Ok(receipt);
        }

        #[derive(serde::Deserialize)]
        struct ApiError {
            code: Option<i64>,
            message: String,
        }
        let text = response.text().await?;

        Err(match serde_json::from_str::<ApiError>(&text) {
            Ok(ApiError { code, message }) => Error::Api {
                status: status.as_u16(),
                code,
                message,
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                code: None,
                message: text,
            },
        })
    }
}
