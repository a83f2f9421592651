//! Third-party comment probes.
//!
//! Some blogs render comments client-side or through an embedded widget, so
//! the structural extractor finds nothing. Two fallbacks exist:
//!
//! - **WordPress REST API**: when native extraction comes back empty, the
//!   comments endpoint on the page's origin is queried and each item's
//!   rendered HTML is flattened to text.
//! - **Widget detection**: Disqus and Facebook comment widgets are recognized
//!   from their embed markers. Their comments are not fetched; an annotation
//!   is added to the comment list instead.

use super::text::{collapse_whitespace, strip_tags};
use crate::extractors::comments::MAX_COMMENTS;
use crate::fetch::Fetcher;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

const WORDPRESS_COMMENTS_PATH: &str = "/wp-json/wp/v2/comments";

static SHORTLINK_POST_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)rel=["']shortlink["'][^>]*href=["'][^"']*[?&]p=(\d+)"#).expect("valid shortlink regex")
});
static BODY_POST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpostid-(\d+)\b").expect("valid postid regex"));
static ARTICLE_POST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<article[^>]*\bid=["']post-(\d+)["']"#).expect("valid article id regex"));

static DISQUS_SHORTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"disqus_shortname\s*=\s*["']([\w-]+)["']"#).expect("valid disqus shortname regex")
});
static DISQUS_EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//([\w-]+)\.disqus\.com/embed\.js").expect("valid disqus embed regex"));
static FACEBOOK_COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"class=["'][^"']*\bfb-comments\b|facebook\.com/plugins/comments"#)
        .expect("valid facebook comments regex")
});

/// Find the WordPress post id a page exposes, if any.
pub fn detect_post_id(markup: &str) -> Option<u64> {
    [&*SHORTLINK_POST_ID, &*BODY_POST_ID, &*ARTICLE_POST_ID]
        .iter()
        .find_map(|re| re.captures(markup))
        .and_then(|caps| caps[1].parse().ok())
}

/// The WordPress comments endpoint on the origin of `page_url`.
pub fn wordpress_comments_endpoint(page_url: &str, post_id: Option<u64>) -> Option<String> {
    let page = Url::parse(page_url).ok()?;
    let mut endpoint = page.join(WORDPRESS_COMMENTS_PATH).ok()?;
    {
        let mut query = endpoint.query_pairs_mut();
        query.append_pair("per_page", &MAX_COMMENTS.to_string());
        if let Some(id) = post_id {
            query.append_pair("post", &id.to_string());
        }
    }
    Some(endpoint.to_string())
}

/// Flatten a WordPress comments response into comment strings.
///
/// Anything other than a JSON array yields no comments.
pub fn comments_from_wordpress(body: &Value) -> Vec<String> {
    let Some(items) = body.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.pointer("/content/rendered").and_then(Value::as_str))
        .map(|html| collapse_whitespace(&strip_tags(html, " ")))
        .filter(|text| !text.is_empty())
        .take(MAX_COMMENTS)
        .collect()
}

/// Ask the page's WordPress REST API for its comments.
///
/// Every failure is swallowed and reported as an empty list.
#[instrument(level = "info", skip(fetcher, markup))]
pub async fn fetch_platform_comments(fetcher: &Fetcher, page_url: &str, markup: &str) -> Vec<String> {
    let post_id = detect_post_id(markup);
    let Some(endpoint) = wordpress_comments_endpoint(page_url, post_id) else {
        debug!("Page URL has no usable origin; skipping REST probe");
        return Vec::new();
    };

    match fetcher.get_json(&endpoint).await {
        Ok(Some(body)) => {
            let comments = comments_from_wordpress(&body);
            info!(%endpoint, ?post_id, count = comments.len(), "WordPress REST probe answered");
            comments
        }
        Ok(None) => {
            debug!(%endpoint, "WordPress REST probe found no comments endpoint");
            Vec::new()
        }
        Err(e) => {
            warn!(%endpoint, error = %e, "WordPress REST probe failed");
            Vec::new()
        }
    }
}

/// Annotations for embedded third-party comment widgets found in the markup.
pub fn detect_widgets(markup: &str) -> Vec<String> {
    let mut annotations = Vec::new();

    let shortname = DISQUS_SHORTNAME
        .captures(markup)
        .or_else(|| DISQUS_EMBED.captures(markup))
        .map(|caps| caps[1].to_string());
    if let Some(shortname) = shortname {
        annotations.push(format!(
            "[Disqus comments widget detected (shortname: {shortname}); comments not fetched]"
        ));
    } else if markup.contains("disqus_thread") {
        annotations.push("[Disqus comments widget detected; comments not fetched]".to_string());
    }

    if FACEBOOK_COMMENTS.is_match(markup) {
        annotations.push("[Facebook comments widget detected; comments not fetched]".to_string());
    }

    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_detect_post_id_sources() {
        let shortlink = r#"<link rel='shortlink' href='https://blog.example.com/?p=321' />"#;
        assert_eq!(detect_post_id(shortlink), Some(321));

        let body = r#"<body class="post-template single postid-77 logged-out">"#;
        assert_eq!(detect_post_id(body), Some(77));

        let article = r#"<article id="post-9" class="post">"#;
        assert_eq!(detect_post_id(article), Some(9));

        assert_eq!(detect_post_id("<html><body></body></html>"), None);
    }

    #[test]
    fn test_endpoint_is_derived_from_origin() {
        let endpoint = wordpress_comments_endpoint("https://blog.example.com/2024/05/my-post/?utm=x", Some(42)).unwrap();
        assert_eq!(
            endpoint,
            "https://blog.example.com/wp-json/wp/v2/comments?per_page=50&post=42"
        );

        let without_id = wordpress_comments_endpoint("https://blog.example.com/a/b", None).unwrap();
        assert_eq!(without_id, "https://blog.example.com/wp-json/wp/v2/comments?per_page=50");

        assert!(wordpress_comments_endpoint("not a url", None).is_none());
    }

    #[test]
    fn test_comments_from_wordpress_strips_html() {
        let body = json!([
            {"id": 1, "content": {"rendered": "<p>Great post,\n thanks!</p>\n"}},
            {"id": 2, "content": {"rendered": "<p> </p>"}},
            {"id": 3},
        ]);
        assert_eq!(comments_from_wordpress(&body), vec!["Great post, thanks!".to_string()]);
        assert!(comments_from_wordpress(&json!({"code": "rest_no_route"})).is_empty());
    }

    #[test]
    fn test_detect_disqus_shortname() {
        let markup = r#"<div id="disqus_thread"></div><script>var disqus_shortname = 'techblog';</script>"#;
        assert_eq!(
            detect_widgets(markup),
            vec!["[Disqus comments widget detected (shortname: techblog); comments not fetched]".to_string()]
        );

        let embed = r#"<script src="https://my-site.disqus.com/embed.js"></script>"#;
        assert!(detect_widgets(embed)[0].contains("shortname: my-site"));
    }

    #[test]
    fn test_detect_facebook_widget() {
        let markup = r#"<div class="fb-comments" data-href="https://example.com/post" data-numposts="5"></div>"#;
        assert_eq!(
            detect_widgets(markup),
            vec!["[Facebook comments widget detected; comments not fetched]".to_string()]
        );
        assert!(detect_widgets("<div class=\"comments\"></div>").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_platform_comments_uses_post_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/comments"))
            .and(query_param("post", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"content": {"rendered": "<p>Very helpful, thank you.</p>"}},
                {"content": {"rendered": "<p>I had the same problem!</p>"}}
            ])))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let page_url = format!("{}/2024/my-post/", server.uri());
        let markup = r#"<body class="postid-42"></body>"#;
        let comments = fetch_platform_comments(&fetcher, &page_url, markup).await;

        assert_eq!(comments, vec!["Very helpful, thank you.", "I had the same problem!"]);
    }

    #[tokio::test]
    async fn test_fetch_platform_comments_swallows_missing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let comments = fetch_platform_comments(&fetcher, &server.uri(), "<html></html>").await;
        assert!(comments.is_empty());
    }
}
