use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PostRecord {
    pub community: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub upvotes: u64,
    pub comments: u64,
    pub summary: String,                // Filled by the classifier, empty right after parsing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,             // Only meaningful inside a single ranked run
}

impl PostRecord {
    pub fn new(community: &str, title: String) -> Self {
        Self {
            community: community.to_string(),
            title,
            link: String::new(),
            published_at: None,
            upvotes: 0,
            comments: 0,
            summary: String::new(),
            score: None,
        }
    }
}

/// Which family of reports a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportStyle {
    /// Every post grouped by community
    Digest,
    /// Cross-community top 5 with analysis
    Ranked,
}

impl ReportStyle {
    /// Maximum number of posts kept from a single feed
    pub fn per_feed_cap(self) -> usize {
        match self {
            ReportStyle::Digest => 5,
            ReportStyle::Ranked => 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Analysis {
    pub kind: String,
    pub highlight: String,
    pub impact: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct RankedPost {
    pub rank: usize,
    #[serde(flatten)]
    pub post: PostRecord,
    pub analysis: Analysis,
}

/// Per-run values every renderer needs
#[derive(Debug, Clone, Copy)]
pub struct ReportContext {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            date: now.date_naive(),
            generated_at: now,
        }
    }

    /// `YYYY-MM-DD`, the key for every artifact of the run
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
