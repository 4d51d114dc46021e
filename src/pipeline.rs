use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::time::sleep;
use crate::classify::{annotate, classify_all, rank_top};
use crate::config::Config;
use crate::feed::FetchFeed;
use crate::models::{PostRecord, ReportContext, ReportStyle};
use crate::parser::parse_feed;
use crate::render::{render_digest_html, render_index_html, render_ranked_html, render_ranked_markdown};
use crate::store::BlobStore;

/// Size of the cross-community ranking
pub const TOP_N: usize = 5;

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// Nothing was fetched, so nothing was written
    Empty,
    Written { posts: usize, artifacts: Vec<String> },
}

/// Drives one run: fetch every community in turn, classify, render, persist.
pub struct Pipeline<'a, F, S> {
    config: &'a Config,
    fetcher: F,
    store: S,
    style: ReportStyle,
}

impl<'a, F: FetchFeed, S: BlobStore> Pipeline<'a, F, S> {
    pub fn new(config: &'a Config, fetcher: F, store: S, style: ReportStyle) -> Self {
        Self {
            config,
            fetcher,
            store,
            style,
        }
    }

    /// Fetch and parse every configured community, pausing between requests.
    /// A failed feed is logged and contributes no posts.
    pub async fn collect(&self) -> Vec<PostRecord> {
        let cap = self.style.per_feed_cap();
        let delay = self.config.request_delay();
        let mut all = Vec::new();

        for (i, community) in self.config.communities.iter().enumerate() {
            let url = community.feed_url(&self.config.feed_host);
            info!("Fetching r/{}...", community.name);

            match self.fetcher.fetch(&url).await {
                Ok(raw) => {
                    let posts = parse_feed(&raw, &community.name, cap);
                    info!("r/{}: got {} posts", community.name, posts.len());
                    all.extend(posts);
                }
                Err(e) => {
                    error!("r/{} fetch failed: {}", community.name, e);
                }
            }

            if i + 1 < self.config.communities.len() && !delay.is_zero() {
                sleep(delay).await;
            }
        }

        all
    }

    pub async fn run(&mut self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let mut posts = self.collect().await;
        info!("Fetched {} posts in total", posts.len());

        if posts.is_empty() {
            warn!("No posts fetched, Reddit may be limiting RSS access; nothing written");
            return Ok(RunOutcome::Empty);
        }

        info!("Generating summaries...");
        classify_all(&mut posts, self.config);

        let ctx = ReportContext::new(now);
        let date = ctx.date_key();
        let total = posts.len();
        let mut artifacts = Vec::new();

        match self.style {
            ReportStyle::Digest => {
                let json = serde_json::to_string_pretty(&posts)?;
                let html = render_digest_html(&posts, &ctx, self.config);
                let index = render_index_html(&posts, &ctx);

                self.write(format!("data/posts-{}.json", date), &json, &mut artifacts)?;
                self.write(format!("daily/{}.html", date), &html, &mut artifacts)?;
                self.write("index.html".to_string(), &index, &mut artifacts)?;
            }
            ReportStyle::Ranked => {
                let ranked = annotate(rank_top(posts, &self.config.scoring, TOP_N), self.config);

                let json = serde_json::to_string_pretty(&ranked)?;
                let markdown = render_ranked_markdown(&ranked, &ctx, self.config);
                let html = render_ranked_html(&ranked, &ctx, self.config);
                let index = render_index_html(ranked.iter().map(|r| &r.post), &ctx);

                self.write(format!("data/top5-{}.json", date), &json, &mut artifacts)?;
                self.write(format!("daily/{}.md", date), &markdown, &mut artifacts)?;
                self.write(format!("daily/{}.html", date), &html, &mut artifacts)?;
                self.write("index.html".to_string(), &index, &mut artifacts)?;
            }
        }

        Ok(RunOutcome::Written {
            posts: total,
            artifacts,
        })
    }

    fn write(&mut self, key: String, contents: &str, artifacts: &mut Vec<String>) -> Result<()> {
        self.store.put(&key, contents)?;
        info!("Saved {}", key);
        artifacts.push(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use chrono::TimeZone;
    use tokio::time::Instant;
    use crate::feed::FetchError;
    use crate::parser::fixtures::{atom_entry, atom_feed};
    use crate::store::MemoryStore;
    use super::*;

    /// Canned responses keyed by URL; unknown URLs answer 404.
    #[derive(Default)]
    struct FakeFetcher {
        responses: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_feed(mut self, community: &str, body: String) -> Self {
            self.responses.insert(feed_url(community), Ok(body));
            self
        }

        fn with_error(mut self, community: &str, err: FetchError) -> Self {
            self.responses.insert(feed_url(community), Err(err));
            self
        }
    }

    impl FetchFeed for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn feed_url(community: &str) -> String {
        format!("https://www.reddit.com/r/{}/top/.rss?t=day", community)
    }

    fn test_config() -> Config {
        Config {
            request_delay_ms: 0,
            ..Config::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_all_feeds_failing_writes_nothing() {
        let config = test_config();
        let fetcher = FakeFetcher::default()
            .with_error("artificial", FetchError::Status(429))
            .with_error("OpenAI", FetchError::Network("connection reset".to_string()));

        let mut pipeline = Pipeline::new(&config, fetcher, MemoryStore::default(), ReportStyle::Digest);
        let outcome = pipeline.run(now()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Empty);
        assert!(pipeline.store.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_every_community_fetched_in_order() {
        let config = test_config();
        let pipeline = Pipeline::new(&config, FakeFetcher::default(), MemoryStore::default(), ReportStyle::Digest);
        assert!(pipeline.collect().await.is_empty());

        let requested = pipeline.fetcher.requested.lock().unwrap().clone();
        let expected: Vec<String> = config.communities.iter().map(|c| feed_url(&c.name)).collect();
        assert_eq!(requested, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_communities_only() {
        // Five communities, one second apart, no pause after the last
        let config = Config::default();
        let pipeline = Pipeline::new(&config, FakeFetcher::default(), MemoryStore::default(), ReportStyle::Digest);

        let started = Instant::now();
        pipeline.collect().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "{:?}", elapsed);
        assert_eq!(pipeline.fetcher.requested.lock().unwrap().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let config = test_config();
        let pipeline = Pipeline::new(&config, FakeFetcher::default(), MemoryStore::default(), ReportStyle::Digest);

        let started = Instant::now();
        pipeline.collect().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_digest_single_research_post() {
        let config = test_config();
        let fetcher = FakeFetcher::default().with_feed(
            "MachineLearning",
            atom_feed(&[atom_entry("[R] New Paper on Transformer Efficiency", "1,234 upvotes", "56 comments")]),
        );

        let mut pipeline = Pipeline::new(&config, fetcher, MemoryStore::default(), ReportStyle::Digest);
        let outcome = pipeline.run(now()).await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Written {
                posts: 1,
                artifacts: vec![
                    "data/posts-2026-10-16.json".to_string(),
                    "daily/2026-10-16.html".to_string(),
                    "index.html".to_string(),
                ],
            }
        );

        let blobs = &pipeline.store.blobs;
        let snapshot: Vec<PostRecord> = serde_json::from_str(&blobs["data/posts-2026-10-16.json"]).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].upvotes, 1234);
        assert_eq!(snapshot[0].comments, 56);
        assert_eq!(snapshot[0].summary, "Research paper: introduces a new technique or experimental result.");

        let html = &blobs["daily/2026-10-16.html"];
        assert_eq!(html.matches("<section class=\"section\">").count(), 1);
        assert_eq!(html.matches("<div class=\"post-card\">").count(), 1);
        assert!(html.contains("⬆️ 1234"));
        assert!(html.contains("💬 56"));

        assert!(blobs["index.html"].contains("daily/2026-10-16.html"));
    }

    #[tokio::test]
    async fn test_unparseable_feed_is_not_an_error() {
        let config = test_config();
        let fetcher = FakeFetcher::default().with_feed("OpenAI", "<html>blocked</html>".to_string());

        let mut pipeline = Pipeline::new(&config, fetcher, MemoryStore::default(), ReportStyle::Digest);
        assert_eq!(pipeline.run(now()).await.unwrap(), RunOutcome::Empty);
    }

    #[tokio::test]
    async fn test_ranked_run_selects_top_five() {
        let config = test_config();
        let entries = |community: &str, base: u64| -> String {
            let posts: Vec<String> = (0..5)
                .map(|i| {
                    atom_entry(
                        &format!("{} thread {}", community, i),
                        &format!("{} upvotes", base + i),
                        "1 comment",
                    )
                })
                .collect();
            atom_feed(&posts)
        };

        let fetcher = FakeFetcher::default()
            .with_feed("artificial", entries("artificial", 5000))
            .with_feed("LocalLLaMA", entries("LocalLLaMA", 100));

        let mut pipeline = Pipeline::new(&config, fetcher, MemoryStore::default(), ReportStyle::Ranked);
        let outcome = pipeline.run(now()).await.unwrap();

        // 3 posts per feed in the ranked style
        let RunOutcome::Written { posts, artifacts } = outcome else {
            panic!("expected artifacts to be written");
        };
        assert_eq!(posts, 6);
        assert_eq!(
            artifacts,
            vec![
                "data/top5-2026-10-16.json",
                "daily/2026-10-16.md",
                "daily/2026-10-16.html",
                "index.html",
            ]
        );

        let blobs = &pipeline.store.blobs;
        let top: Vec<serde_json::Value> = serde_json::from_str(&blobs["data/top5-2026-10-16.json"]).unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0]["rank"], 1);
        assert_eq!(top[0]["title"], "artificial thread 2");
        assert_eq!(top[0]["score"], 5002);
        assert_eq!(top[3]["title"], "LocalLLaMA thread 2");

        let markdown = &blobs["daily/2026-10-16.md"];
        assert!(markdown.contains("## 🥇 1. [artificial thread 2]"));
        assert!(markdown.contains("## 5️⃣ 5. [LocalLLaMA thread 1]"));
    }
}
