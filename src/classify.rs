use crate::config::{AnalysisRule, CategoryGroup, Config, ScoreGroup, Scoring, SummaryRule};
use crate::models::{Analysis, PostRecord, RankedPost};

/// How many triggered summary sentences make it into a post's summary
const MAX_SUMMARY_PARTS: usize = 2;

/// A rule that fires when any of its keywords occurs in a post title
pub trait KeywordRule {
    fn keywords(&self) -> &[String];

    /// `title` must already be lowercase
    fn matches(&self, title: &str) -> bool {
        self.keywords()
            .iter()
            .any(|k| title.contains(k.to_lowercase().as_str()))
    }
}

impl KeywordRule for SummaryRule {
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl KeywordRule for ScoreGroup {
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl KeywordRule for AnalysisRule {
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl KeywordRule for CategoryGroup {
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Summary text for a post: the sentences of the first two rules that fire,
/// in rule order, or the community's default sentence when none does.
pub fn summarize(post: &PostRecord, config: &Config) -> String {
    let title = post.title.to_lowercase();

    let parts: Vec<&str> = config
        .summary_rules
        .iter()
        .filter(|rule| rule.matches(&title))
        .take(MAX_SUMMARY_PARTS)
        .map(|rule| rule.sentence.as_str())
        .collect();

    if !parts.is_empty() {
        return parts.join(" ");
    }

    config
        .community(&post.community)
        .and_then(|c| c.default_summary.clone())
        .unwrap_or_else(|| config.generic_summary.clone())
}

/// Fill in the summary of every post.
pub fn classify_all(posts: &mut [PostRecord], config: &Config) {
    for post in posts.iter_mut() {
        post.summary = summarize(post, config);
    }
}

/// Ranking score: upvotes plus keyword and community bonuses.
pub fn relevance_score(post: &PostRecord, scoring: &Scoring) -> u64 {
    let title = post.title.to_lowercase();

    let keyword_bonus: u64 = scoring
        .groups
        .iter()
        .filter(|group| group.matches(&title))
        .map(|group| group.bonus)
        .fold(0, u64::saturating_add);

    let community_bonus = if scoring.priority_communities.iter().any(|c| *c == post.community) {
        scoring.priority_bonus
    } else {
        0
    };

    post.upvotes
        .saturating_add(keyword_bonus)
        .saturating_add(community_bonus)
}

/// Score every post and keep the `n` best. Equal scores keep input order.
pub fn rank_top(mut posts: Vec<PostRecord>, scoring: &Scoring, n: usize) -> Vec<PostRecord> {
    for post in posts.iter_mut() {
        post.score = Some(relevance_score(post, scoring));
    }

    // sort_by is stable
    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts.truncate(n);
    posts
}

/// First matching analysis rule wins.
pub fn analyze(post: &PostRecord, config: &Config) -> Analysis {
    let title = post.title.to_lowercase();

    config
        .analysis_rules
        .iter()
        .find(|rule| rule.matches(&title))
        .map(|rule| Analysis {
            kind: rule.kind.clone(),
            highlight: rule.highlight.clone(),
            impact: rule.impact.clone(),
        })
        .unwrap_or_else(|| config.analysis_fallback.clone())
}

/// Attach rank and analysis to already ranked posts.
pub fn annotate(ranked: Vec<PostRecord>, config: &Config) -> Vec<RankedPost> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, post)| RankedPost {
            rank: i + 1,
            analysis: analyze(&post, config),
            post,
        })
        .collect()
}

/// Number of posts matching each category group, in group order.
pub fn category_counts<'a>(posts: &[RankedPost], groups: &'a [CategoryGroup]) -> Vec<(&'a str, usize)> {
    let titles: Vec<String> = posts.iter().map(|p| p.post.title.to_lowercase()).collect();

    groups
        .iter()
        .map(|group| {
            let count = titles.iter().filter(|t| group.matches(t)).count();
            (group.name.as_str(), count)
        })
        .collect()
}
