use super::{FeedData, FeedFetcher, FetchError, FetchResult};
use crate::config::QuoteConfig;
use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::Url;
use serde::Deserialize;

/// The rendered fields of a single quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    /// Absolute URL, checked at parse time and kept as served.
    pub link: String,
    /// HTML fragment.
    pub content: String,
    pub title: String,
}

pub struct QuoteFetcher {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    link: String,
    content: Rendered,
    title: Rendered,
}

/// WordPress serves either a bare string or `{ "rendered": "..." }`
/// depending on the API generation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Rendered {
    Plain(String),
    Wrapped { rendered: String },
}

impl Rendered {
    fn into_string(self) -> String {
        match self {
            Rendered::Plain(s) => s,
            Rendered::Wrapped { rendered } => rendered,
        }
    }
}

impl QuoteFetcher {
    pub fn new(config: &QuoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("startpage/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: config.endpoint.clone(),
            client,
        }
    }
}

/// One random post, cache-busted with the request time.
pub fn quote_url(endpoint: &str, now_ms: i64) -> String {
    let params = [
        ("filter[orderby]", "rand".to_string()),
        ("filter[posts_per_page]", "1".to_string()),
        ("processdate", now_ms.to_string()),
    ];

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", endpoint, query)
}

/// Takes the first post of the response. An empty array is a failure.
pub fn parse_quotes(body: &str) -> FetchResult<QuoteRecord> {
    let posts: Vec<ApiPost> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let post = posts.into_iter().next().ok_or(FetchError::EmptyCollection)?;

    Url::parse(&post.link)
        .map_err(|e| FetchError::Malformed(format!("bad link {:?}: {}", post.link, e)))?;

    Ok(QuoteRecord {
        link: post.link,
        content: post.content.into_string(),
        title: post.title.into_string(),
    })
}

#[async_trait]
impl FeedFetcher for QuoteFetcher {
    async fn fetch(&self) -> FetchResult<FeedData> {
        let url = quote_url(&self.endpoint, Timestamp::now().as_millisecond());

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(FeedData::Quote(parse_quotes(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::{refused_url, serve_once};
    use reqwest::StatusCode;

    fn fetcher_for(base: &str) -> QuoteFetcher {
        QuoteFetcher::new(&QuoteConfig {
            enabled: true,
            endpoint: format!("{}/wp-json/posts", base),
        })
    }

    #[test]
    fn test_quote_url_encodes_filters() {
        assert_eq!(
            quote_url("https://quotes.example/wp-json/posts", 1700000000123),
            concat!(
                "https://quotes.example/wp-json/posts",
                "?filter%5Borderby%5D=rand&filter%5Bposts_per_page%5D=1",
                "&processdate=1700000000123"
            )
        );
    }

    #[test]
    fn test_parse_plain_fields() {
        let body = r#"[{"ID":1,"link":"https://x","content":"<p>hi</p>","title":"Jane"}]"#;
        let record = parse_quotes(body).unwrap();
        assert_eq!(record.link, "https://x");
        assert_eq!(record.content, "<p>hi</p>");
        assert_eq!(record.title, "Jane");
    }

    #[test]
    fn test_parse_rendered_fields() {
        let body = concat!(
            r#"[{"link":"https://q.example/a","#,
            r#""content":{"rendered":"<p>x</p>"},"title":{"rendered":"Ada"}}]"#
        );
        let record = parse_quotes(body).unwrap();
        assert_eq!(record.content, "<p>x</p>");
        assert_eq!(record.title, "Ada");
    }

    #[test]
    fn test_parse_takes_first_post() {
        let body = concat!(
            r#"[{"link":"https://a","content":"1","title":"A"},"#,
            r#"{"link":"https://b","content":"2","title":"B"}]"#
        );
        assert_eq!(parse_quotes(body).unwrap().title, "A");
    }

    #[test]
    fn test_parse_empty_collection_is_failure() {
        assert!(matches!(parse_quotes("[]"), Err(FetchError::EmptyCollection)));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(parse_quotes("{\"oops\":"), Err(FetchError::Malformed(_))));
        assert!(matches!(parse_quotes("{}"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_bad_link() {
        let body = r#"[{"link":"not a url","content":"c","title":"t"}]"#;
        assert!(matches!(parse_quotes(body), Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_fetch_returns_first_quote() {
        let body = r#"[{"link":"https://q.example/a","content":"<p>hi</p>","title":"Ada"}]"#;
        let base = serve_once("200 OK", "application/json", body.as_bytes().to_vec()).await;

        match fetcher_for(&base).fetch().await {
            Ok(FeedData::Quote(record)) => {
                assert_eq!(record.link, "https://q.example/a");
                assert_eq!(record.title, "Ada");
            }
            _ => panic!("expected a quote"),
        }
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_status_failure() {
        let base = serve_once("500 Internal Server Error", "text/plain", b"boom".to_vec()).await;
        let result = fetcher_for(&base).fetch().await;
        assert!(matches!(
            result,
            Err(FetchError::Status(status)) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_fetch_empty_array_is_empty_collection() {
        let base = serve_once("200 OK", "application/json", b"[]".to_vec()).await;
        let result = fetcher_for(&base).fetch().await;
        assert!(matches!(result, Err(FetchError::EmptyCollection)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_failure() {
        let base = refused_url().await;
        let result = fetcher_for(&base).fetch().await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
