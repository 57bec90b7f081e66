use anyhow::Context;

/// RuntimeConfig is the secondary, platform-provided configuration store.
/// It's a JSON document where every key is optional:
/// ```ignore
/// { "twilio": { "sid": "AC...", "token": "...", "from": "+15557654321" } }
/// ```
#[derive(Debug, Default, serde::Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub twilio: Option<TwilioSection>,
}

#[derive(derivative::Derivative, Default, serde::Deserialize)]
#[derivative(Debug)]
pub struct TwilioSection {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    #[derivative(Debug = "ignore")]
    pub token: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

impl RuntimeConfig {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("reading runtime config {}", path.display()))?;
        let config = serde_json::from_slice(&content)
            .with_context(|| format!("parsing runtime config {}", path.display()))?;
        Ok(config)
    }
}

/// TransportConfig is the resolved configuration of the SMS transport.
/// Empty values are normalized to None.
#[derive(derivative::Derivative, Default, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct TransportConfig {
    pub account_sid: Option<String>,
    #[derivative(Debug = "ignore")]
    pub auth_token: Option<String>,
    pub from: Option<String>,
}

impl TransportConfig {
    /// Resolve a TransportConfig from `primary` values (flags and environment),
    /// falling back to the `secondary` runtime config store for each value
    /// which is missing or empty in `primary`.
    pub fn resolve(primary: TransportConfig, secondary: Option<TwilioSection>) -> Self {
        let TransportConfig {
            account_sid,
            auth_token,
            from,
        } = primary;
        let TwilioSection {
            sid: secondary_sid,
            token: secondary_token,
            from: secondary_from,
        } = secondary.unwrap_or_default();

        Self {
            account_sid: first_non_empty(account_sid, secondary_sid),
            auth_token: first_non_empty(auth_token, secondary_token),
            from: first_non_empty(from, secondary_from),
        }
    }

    /// Credentials of the transport account, if both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.account_sid.as_deref(), self.auth_token.as_deref()) {
            (Some(sid), Some(token)) => Some((sid, token)),
            _ => None,
        }
    }
}

fn first_non_empty(primary: Option<String>, secondary: Option<String>) -> Option<String> {
    primary
        .filter(|s| !s.is_empty())
        .or(secondary.filter(|s| !s.is_empty()))
}
