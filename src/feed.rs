//! RSS feed generation for `site.feed(...)`.
//!
//! A feed is an ordinary content file (e.g. `content/feed.xml`) that calls
//! `{{ site.feed(path="articles/", order="-date", limit=10) }}`.

use crate::config::{BaseConfig, MarkdownConfig};
use crate::debug;
use crate::render::markdown;
use crate::site::Page;
use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};

/// Channel-level fields; empty values fall back to `[base]`.
#[derive(Debug, Clone, Default)]
pub struct FeedChannel {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

/// Render pages as an RSS 2.0 document.
pub fn render_feed(
    pages: &[&Page],
    channel: &FeedChannel,
    base: &BaseConfig,
    markdown: &MarkdownConfig,
) -> Result<String> {
    let Some(link) = channel.link.clone().or_else(|| base.url.clone()) else {
        bail!("site.feed needs a `link` argument or [base.url] in the config");
    };
    let site_url = link.trim_end_matches('/');

    let items: Vec<_> = pages
        .iter()
        .filter_map(|page| page_to_item(page, site_url, base, markdown))
        .collect();

    let channel = ChannelBuilder::default()
        .title(channel.title.clone().unwrap_or_else(|| base.title.clone()))
        .link(link.clone())
        .description(
            channel
                .description
                .clone()
                .unwrap_or_else(|| base.description.clone()),
        )
        .language(Some(base.language.clone()))
        .generator(Some("glaze".to_owned()))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

/// Convert a page to a feed item. Pages without a title are skipped.
fn page_to_item(
    page: &Page,
    site_url: &str,
    base: &BaseConfig,
    config: &MarkdownConfig,
) -> Option<rss::Item> {
    let Some(title) = page.title.clone() else {
        debug!("feed"; "skipping {} (no title)", page.filepath);
        return None;
    };
    let link = format!("{site_url}{}", page.url);
    let pub_date = page.date.as_deref().and_then(to_rfc2822);

    let body = page.body.as_deref().unwrap_or_default();
    let content = if page.is_markdown() {
        markdown::convert(body, config)
    } else {
        body.to_owned()
    };

    Some(
        ItemBuilder::default()
            .title(Some(title))
            .link(Some(link.clone()))
            .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
            .pub_date(pub_date)
            .author(Some(base.author.clone()))
            .categories(
                page.tags
                    .iter()
                    .map(|tag| rss::CategoryBuilder::default().name(tag.clone()).build())
                    .collect::<Vec<_>>(),
            )
            .content(Some(content))
            .build(),
    )
}

/// Convert a `YYYY-MM-DD` or RFC 3339 date to RFC 2822.
fn to_rfc2822(date: &str) -> Option<String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(date) {
        return Some(datetime.to_rfc2822());
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let datetime = day.and_hms_opt(0, 0, 0)?.and_utc();
    Some(datetime.to_rfc2822())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseConfig {
        BaseConfig {
            url: Some("https://example.com/".into()),
            ..BaseConfig::default()
        }
    }

    #[test]
    fn test_to_rfc2822() {
        assert_eq!(
            to_rfc2822("2024-01-01").as_deref(),
            Some("Mon, 1 Jan 2024 00:00:00 +0000")
        );
        assert!(to_rfc2822("2024-01-01T10:00:00Z").unwrap().contains("10:00:00"));
        assert_eq!(to_rfc2822("yesterday"), None);
    }

    #[test]
    fn test_render_feed() {
        let hello = Page::parse_string(
            "articles/hello.md",
            "title = Hello\ndate = 2024-01-01\ntags = cake\n++++\nHi *there*",
        );
        let untitled = Page::parse_string("articles/untitled.md", "date = 2024-01-02\n++++\nx");

        let xml = render_feed(
            &[&hello, &untitled],
            &FeedChannel::default(),
            &base(),
            &MarkdownConfig::default(),
        )
        .unwrap();

        assert!(xml.contains("<title>My Site</title>"));
        assert!(xml.contains("<link>https://example.com/articles/hello/</link>"));
        assert!(xml.contains("Mon, 1 Jan 2024 00:00:00 +0000"));
        assert!(xml.contains("<category>cake</category>"));
        assert!(xml.contains("<em>there</em>"));
        assert!(!xml.contains("untitled"));
    }

    #[test]
    fn test_render_feed_channel_overrides() {
        let channel = FeedChannel {
            title: Some("Articles".into()),
            link: Some("https://cakes.example.com".into()),
            description: Some("All the cakes".into()),
        };
        let xml = render_feed(&[], &channel, &BaseConfig::default(), &MarkdownConfig::default())
            .unwrap();
        assert!(xml.contains("<title>Articles</title>"));
        assert!(xml.contains("<description>All the cakes</description>"));
    }

    #[test]
    fn test_render_feed_requires_link() {
        let result = render_feed(
            &[],
            &FeedChannel::default(),
            &BaseConfig::default(),
            &MarkdownConfig::default(),
        );
        assert!(result.is_err());
    }
}
