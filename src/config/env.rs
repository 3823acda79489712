use std::env;

use super::ClientConfig;
use crate::errors::{SpeechError, SpeechResult};

pub(super) const URL: &str = "WATSON_STT_URL";
pub(super) const USERNAME: &str = "WATSON_STT_USERNAME";
pub(super) const PASSWORD: &str = "WATSON_STT_PASSWORD";
pub(super) const API_KEY: &str = "WATSON_STT_API_KEY";
pub(super) const BEARER_TOKEN: &str = "WATSON_STT_BEARER_TOKEN";
pub(super) const IAM_URL: &str = "WATSON_STT_IAM_URL";
pub(super) const MODEL: &str = "WATSON_STT_MODEL";
pub(super) const REQUEST_TIMEOUT: &str = "WATSON_STT_REQUEST_TIMEOUT_SECS";
pub(super) const CONNECT_TIMEOUT: &str = "WATSON_STT_CONNECT_TIMEOUT_SECS";

#[cfg(test)]
pub(super) const ENV_VARS: [&str; 9] = [
    URL,
    USERNAME,
    PASSWORD,
    API_KEY,
    BEARER_TOKEN,
    IAM_URL,
    MODEL,
    REQUEST_TIMEOUT,
    CONNECT_TIMEOUT,
];

/// Non-empty value of `name`, if set.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn var_secs(name: &str) -> SpeechResult<Option<u64>> {
    var(name)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|e| {
                SpeechError::Configuration(format!("{name} must be a number of seconds: {e}"))
            })
        })
        .transpose()
}

/// Overlay environment variables onto `config`.
pub(super) fn apply_env(config: &mut ClientConfig) -> SpeechResult<()> {
    if let Some(url) = var(URL) {
        config.url = url;
    }
    if let Some(iam_url) = var(IAM_URL) {
        config.iam_url = iam_url;
    }
    if let Some(model) = var(MODEL) {
        config.default_model = Some(model);
    }

    config.username = var(USERNAME).or(config.username.take());
    config.password = var(PASSWORD).or(config.password.take());
    config.api_key = var(API_KEY).or(config.api_key.take());
    config.bearer_token = var(BEARER_TOKEN).or(config.bearer_token.take());

    if let Some(secs) = var_secs(REQUEST_TIMEOUT)? {
        config.request_timeout_secs = secs;
    }
    if let Some(secs) = var_secs(CONNECT_TIMEOUT)? {
        config.connect_timeout_secs = secs;
    }
    Ok(())
}
