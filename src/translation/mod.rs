use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::language::LanguageCodes;

pub mod bing;
pub mod google;
pub mod helper;
pub mod web_translator;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum TranslatorKind {
    #[strum(ascii_case_insensitive)]
    Google,
    #[strum(ascii_case_insensitive)]
    Bing,
}

/// Base urls of the translation sites.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub google: String,
    pub bing: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google: "https://translate.google.com".to_string(),
            bing: "https://www.bing.com".to_string(),
        }
    }
}

impl TranslatorKind {
    pub async fn translate(
        &self,
        client: &Client,
        endpoints: &Endpoints,
        text: &str,
        target_language: &str,
        debug_mode: bool,
    ) -> Result<String> {
        let code = LanguageCodes
            .find_by_id(target_language)
            .ok_or_else(|| anyhow!("unknown translation language: {target_language}"))?;

        match self {
            TranslatorKind::Google => {
                google::translate(client, &endpoints.google, text, code.iso639_1, debug_mode).await
            }
            TranslatorKind::Bing => {
                bing::translate(client, &endpoints.bing, text, code.iso639_1, debug_mode).await
            }
        }
    }

    /// Page reported to the user when loading fails.
    pub fn page_url(&self, endpoints: &Endpoints) -> String {
        match self {
            TranslatorKind::Google => google::page_url(&endpoints.google),
            TranslatorKind::Bing => bing::page_url(&endpoints.bing),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    pub timeout: Duration,
    /// Enabled translators in priority order.
    pub translators: Vec<TranslatorKind>,
    pub debug_mode: bool,
    pub ignore_ssl_errors: bool,
    pub force_rotate_translators: bool,
    #[serde(skip)]
    pub endpoints: Endpoints,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            translators: vec![TranslatorKind::Google, TranslatorKind::Bing],
            debug_mode: false,
            ignore_ssl_errors: false,
            force_rotate_translators: false,
            endpoints: Endpoints::default(),
        }
    }
}

pub fn build_client(config: &TranslatorConfig) -> Result<Client> {
    let client = Client::builder()
        .cookie_store(true)
        .danger_accept_invalid_certs(config.ignore_ssl_errors)
        .user_agent(concat!("Mozilla/5.0 screen_translator/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn translator_kind_parses_case_insensitive() {
        assert_eq!(TranslatorKind::from_str("google").unwrap(), TranslatorKind::Google);
        assert_eq!(TranslatorKind::Bing.to_string(), "Bing");
    }

    #[test]
    fn config_serializes_translators_by_name() {
        let json = serde_json::to_string(&TranslatorConfig::default().translators).unwrap();
        assert_eq!(json, r#"["Google","Bing"]"#);
    }

    #[tokio::test]
    async fn unknown_target_language_fails() {
        let client = build_client(&TranslatorConfig::default()).unwrap();
        let result = TranslatorKind::Google
            .translate(&client, &Endpoints::default(), "text", "xxx", false)
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "unknown translation language: xxx"
        );
    }
}
