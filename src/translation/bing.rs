use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_IID: &str = "translator.5028";

pub fn page_url(base_url: &str) -> String {
    format!("{base_url}/translator")
}

/// Tokens the translator page hands out for its api.
#[derive(Debug, PartialEq)]
pub struct BingSession {
    pub ig: String,
    pub iid: String,
    pub key: String,
    pub token: String,
}

pub fn parse_session(page: &str) -> Result<BingSession> {
    let ig = Regex::new(r#"IG:"([^"]+)""#)?
        .captures(page)
        .and_then(|x| x.get(1))
        .context("IG not found on translator page")?;

    let iid = Regex::new(r#"data-iid="([^"]+)""#)?
        .captures(page)
        .and_then(|x| x.get(1))
        .map_or(DEFAULT_IID, |x| x.as_str());

    let helper = Regex::new(r#"params_AbusePreventionHelper\s*=\s*\[\s*(\d+)\s*,\s*"([^"]+)""#)?
        .captures(page)
        .context("token not found on translator page")?;
    let key = helper.get(1).context("Capture group 1 does not exist")?;
    let token = helper.get(2).context("Capture group 2 does not exist")?;

    Ok(BingSession {
        ig: ig.as_str().to_string(),
        iid: iid.to_string(),
        key: key.as_str().to_string(),
        token: token.as_str().to_string(),
    })
}

#[derive(Deserialize)]
struct TranslationResult {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

pub fn parse_translation(body: &str) -> Result<String> {
    let results: Vec<TranslationResult> =
        serde_json::from_str(body).with_context(|| format!("unexpected response: {body}"))?;

    let text = results
        .iter()
        .flat_map(|x| &x.translations)
        .map(|x| x.text.as_str())
        .join("\n");
    Ok(text.trim().to_string())
}

/// Bing names Chinese scripts differently.
fn bing_language(iso639_1: &str) -> &str {
    match iso639_1 {
        "zh-CN" => "zh-Hans",
        "zh-TW" => "zh-Hant",
        "no" => "nb",
        x => x,
    }
}

pub async fn translate(
    client: &Client,
    base_url: &str,
    text: &str,
    target_language: &str,
    debug_mode: bool,
) -> Result<String> {
    let page = client
        .get(page_url(base_url))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let session = parse_session(&page)?;

    let body = client
        .post(format!("{base_url}/ttranslatev3"))
        .query(&[
            ("isVertical", "1"),
            ("IG", session.ig.as_str()),
            ("IID", session.iid.as_str()),
        ])
        .form(&[
            ("fromLang", "auto-detect"),
            ("to", bing_language(target_language)),
            ("text", text),
            ("token", session.token.as_str()),
            ("key", session.key.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if debug_mode {
        debug!("Bing response: {body}");
    }

    parse_translation(&body)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::prelude::*;

    pub const PAGE: &str = r#"<html><div id="rich_tta" data-iid="translator.5023"></div>
        <script>_G={IG:"ABCDEF0123",EF:{}};
        var params_AbusePreventionHelper = [1700000000000,"tok-en_1",3600000];</script></html>"#;

    pub const RESPONSE: &str =
        r#"[{"detectedLanguage":{"language":"en","score":1.0},"translations":[{"text":"Привет","to":"ru"}]}]"#;

    #[test]
    fn parses_session_tokens() {
        let session = parse_session(PAGE).unwrap();
        assert_eq!(
            session,
            BingSession {
                ig: "ABCDEF0123".into(),
                iid: "translator.5023".into(),
                key: "1700000000000".into(),
                token: "tok-en_1".into(),
            }
        );
    }

    #[test]
    fn missing_tokens_fail() {
        assert!(parse_session("<html></html>").is_err());
        assert!(parse_session(r#"IG:"AB""#).is_err());
    }

    #[test]
    fn parses_translations() {
        assert_eq!(parse_translation(RESPONSE).unwrap(), "Привет");
        assert!(parse_translation(r#"{"statusCode":400}"#).is_err());
    }

    #[test]
    fn maps_chinese_scripts() {
        assert_eq!(bing_language("zh-CN"), "zh-Hans");
        assert_eq!(bing_language("de"), "de");
    }

    #[tokio::test]
    async fn posts_tokens_from_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/translator");
                then.status(200).body(PAGE);
            })
            .await;
        let api = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/ttranslatev3")
                    .query_param("IG", "ABCDEF0123")
                    .query_param("IID", "translator.5023")
                    .form_urlencoded_tuple("to", "ru")
                    .form_urlencoded_tuple("token", "tok-en_1")
                    .form_urlencoded_tuple("text", "Hello");
                then.status(200).body(RESPONSE);
            })
            .await;

        let text = translate(&Client::new(), &server.base_url(), "Hello", "ru", false)
            .await
            .unwrap();

        api.assert_async().await;
        assert_eq!(text, "Привет");
    }
}
