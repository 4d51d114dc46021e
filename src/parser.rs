use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::models::PostRecord;

pub const UNTITLED: &str = "untitled";

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<entry[^>]*>.*?</entry>").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title[^>]*>([^<]*)</title>").unwrap());
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<link[^>]*href="([^"]*)""#).unwrap());
static UPDATED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<updated>([^<]*)</updated>").unwrap());
static CONTENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<content[^>]*>(.*?)</content>").unwrap());
// Counts are the whole text of an element, e.g. `<span>1,234 upvotes</span>`
static UPVOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)>(\d[\d,]*)\s*upvotes?<").unwrap());
static COMMENTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)>(\d[\d,]*)\s*comments?<").unwrap());

/// Fields pulled out of one feed entry before they become a post.
/// `title` is already entity-decoded and `content` is decoded markup.
#[derive(Debug)]
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    updated: Option<DateTime<Utc>>,
    content: String,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        let content = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();

        Self {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            updated: entry.updated.or(entry.published),
            content,
        }
    }
}

impl RawEntry {
    fn into_post(self, community: &str) -> PostRecord {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let mut post = PostRecord::new(community, title);
        post.link = self.link.unwrap_or_default();
        post.published_at = self.updated;
        post.upvotes = extract_count(&UPVOTES_RE, &self.content);
        post.comments = extract_count(&COMMENTS_RE, &self.content);
        post
    }
}

/// Extract at most `cap` posts from raw feed markup.
///
/// The document is read with a real feed parser first. Markup that does not
/// parse as a feed is scraped entry by entry instead, so a broken document
/// still yields whatever entries can be recognized.
pub fn parse_feed(raw: &str, community: &str, cap: usize) -> Vec<PostRecord> {
    let entries: Vec<RawEntry> = match parser::parse(raw.as_bytes()) {
        Ok(feed) => feed.entries.into_iter().take(cap).map(RawEntry::from).collect(),
        Err(e) => {
            debug!("r/{} is not a well-formed feed ({}), scraping entries", community, e);
            scrape_entries(raw, cap)
        }
    };

    entries.into_iter().map(|e| e.into_post(community)).collect()
}

/// Pattern-based extraction; every field falls back on its own.
fn scrape_entries(raw: &str, cap: usize) -> Vec<RawEntry> {
    ENTRY_RE
        .find_iter(raw)
        .take(cap)
        .map(|block| {
            let block = block.as_str();
            RawEntry {
                title: capture(&TITLE_RE, block).map(|t| clean_text(&t)),
                link: capture(&LINK_RE, block),
                updated: capture(&UPDATED_RE, block).and_then(|s| parse_timestamp(&s)),
                content: capture(&CONTENT_RE, block)
                    .map(|c| html_escape::decode_html_entities(&c).into_owned())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block).map(|c| c[1].to_string())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First `>1,234 upvotes<`-style count in decoded markup, 0 when absent or unparsable.
fn extract_count(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .and_then(|c| c[1].replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Decode the five entities of scraped title text, in order, then trim.
/// `&amp;` is handled after `&lt;`/`&gt;` but before `&quot;`/`&#39;`.
pub fn clean_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Human-readable age of a post relative to `now`.
pub fn relative_age(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published_at) = published_at else {
        return "unknown".to_string();
    };

    let hours = (now - published_at).num_hours();
    if hours < 1 {
        "just now".to_string()
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else {
        format!("{} days ago", hours / 24)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn atom_entry(title: &str, upvotes: &str, comments: &str) -> String {
        format!(
            r#"<entry>
<author><name>/u/someone</name></author>
<content type="html">&lt;div&gt;&lt;span&gt;{upvotes}&lt;/span&gt; &lt;span&gt;{comments}&lt;/span&gt;&lt;/div&gt;</content>
<id>t3_{id}</id>
<link href="https://www.reddit.com/r/MachineLearning/comments/{id}/post/" />
<updated>2026-10-16T08:00:00+00:00</updated>
<title>{title}</title>
</entry>"#,
            id = title.len(),
        )
    }

    pub fn atom_feed(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<id>/r/MachineLearning/top/.rss?t=day</id>
<title>top scoring links : MachineLearning</title>
<updated>2026-10-16T09:00:00+00:00</updated>
{}
</feed>"#,
            entries.join("\n")
        )
    }
}
