use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::debug;
use reqwest::Client;

pub fn page_url(base_url: &str) -> String {
    format!("{base_url}/m")
}

pub async fn translate(
    client: &Client,
    base_url: &str,
    text: &str,
    target_language: &str,
    debug_mode: bool,
) -> Result<String> {
    let response = client
        .get(page_url(base_url))
        .query(&[("sl", "auto"), ("tl", target_language), ("hl", "en"), ("q", text)])
        .send()
        .await?
        .error_for_status()?;
    let body = response.text().await?;

    if debug_mode {
        debug!("Google response: {body}");
    }

    parse_translation(&body)
}

/// Empty when the page holds no translation.
pub fn parse_translation(body: &str) -> Result<String> {
    let document = scraper::Html::parse_document(body);

    let selector = scraper::Selector::parse("div.result-container")
        .map_err(|_| anyhow!("div.result-container selector not found"))?;
    let translation = document
        .select(&selector)
        .map(|x| x.text().collect::<String>())
        .join("\n");
    Ok(translation.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn parses_result_container() {
        let body = r#"<html><body><div class="result-container">Hello &amp; bye </div></body></html>"#;
        assert_eq!(parse_translation(body).unwrap(), "Hello & bye");
    }

    #[test]
    fn missing_container_is_empty() {
        assert_eq!(parse_translation("<html></html>").unwrap(), "");
    }

    #[tokio::test]
    async fn requests_target_language() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/m")
                    .query_param("sl", "auto")
                    .query_param("tl", "ru")
                    .query_param("q", "hello world");
                then.status(200)
                    .body(r#"<div class="result-container">привет мир</div>"#);
            })
            .await;

        let translation = translate(&Client::new(), &server.base_url(), "hello world", "ru", true)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(translation, "привет мир");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(503);
            })
            .await;

        let result = translate(&Client::new(), &server.base_url(), "hello", "ru", false).await;
        assert!(result.is_err());
    }
}
