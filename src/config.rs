use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::models::Analysis;

/// Immutable run configuration: which communities to read and every keyword
/// table the classifier and renderers consult.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub feed_host: String,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub communities: Vec<Community>,
    pub generic_summary: String,
    pub summary_rules: Vec<SummaryRule>,
    pub scoring: Scoring,
    pub analysis_rules: Vec<AnalysisRule>,
    pub analysis_fallback: Analysis,
    pub category_groups: Vec<CategoryGroup>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Community {
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    /// Summary used when no keyword rule fires
    pub default_summary: Option<String>,
    /// Overrides the URL derived from `feed_host`
    pub url: Option<String>,
}

fn default_icon() -> String {
    "📌".to_string()
}

impl Community {
    fn new(name: &str, icon: &str, description: &str, default_summary: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            default_summary: Some(default_summary.to_string()),
            url: None,
        }
    }

    pub fn feed_url(&self, feed_host: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("https://{}/r/{}/top/.rss?t=day", feed_host, self.name),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummaryRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub sentence: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScoreGroup {
    pub name: String,
    pub keywords: Vec<String>,
    pub bonus: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Scoring {
    pub groups: Vec<ScoreGroup>,
    pub priority_communities: Vec<String>,
    pub priority_bonus: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisRule {
    pub keywords: Vec<String>,
    pub kind: String,
    pub highlight: String,
    pub impact: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_host: "www.reddit.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_delay_ms: 1000,
            timeout_secs: 30,
            communities: vec![
                Community::new("artificial", "🤖", "General AI discussion",
                    "AI industry news: the latest developments across artificial intelligence."),
                Community::new("MachineLearning", "🧠", "Machine learning research",
                    "Machine learning discussion: implementation details or research topics."),
                Community::new("OpenAI", "⚡", "OpenAI news",
                    "OpenAI: product updates, user experience or company news."),
                Community::new("LocalLLaMA", "💻", "Local model deployment",
                    "Local models: deploying, optimizing or using open-weight models."),
                Community::new("singularity", "🔮", "AGI and the future",
                    "AGI and future trends: discussion of where general AI is heading."),
            ],
            generic_summary: "Hot topic: a technology or industry discussion the community is following.".to_string(),
            summary_rules: vec![
                SummaryRule {
                    name: "research".to_string(),
                    keywords: words(&["paper", "research", "[r]"]),
                    sentence: "Research paper: introduces a new technique or experimental result.".to_string(),
                },
                SummaryRule {
                    name: "product".to_string(),
                    keywords: words(&["built", "launch", "release", "[p]", "[d]"]),
                    sentence: "Project/tool release: a developer shares a new tool or project progress.".to_string(),
                },
                SummaryRule {
                    name: "company".to_string(),
                    keywords: words(&["ceo", "funding", "investment", "nvidia", "apple", "openai"]),
                    sentence: "Industry news: an important development or strategic move from a tech company.".to_string(),
                },
                SummaryRule {
                    name: "data".to_string(),
                    keywords: words(&["analyzed", "data", "study"]),
                    sentence: "Data analysis: insights or findings grounded in data.".to_string(),
                },
                SummaryRule {
                    name: "security".to_string(),
                    keywords: words(&["security", "warn", "risk", "exposed", "database"]),
                    sentence: "Security alert: important information about data security or risk.".to_string(),
                },
                SummaryRule {
                    name: "model".to_string(),
                    keywords: words(&["model", "llm", "gpt", "quantiz", "perplexity"]),
                    sentence: "Model tech: discussion of AI model optimization, training or performance.".to_string(),
                },
                SummaryRule {
                    name: "hardware".to_string(),
                    keywords: words(&["gpu", "cpu", "rtx", "hardware"]),
                    sentence: "Hardware: AI hardware setups, benchmarks or buying advice.".to_string(),
                },
            ],
            scoring: Scoring::default(),
            analysis_rules: vec![
                AnalysisRule {
                    keywords: words(&["funding", "raise", "raises", "billion", "million", "acquisition", "acquire", "investment", "valuation", "ipo"]),
                    kind: "Funding & Business".to_string(),
                    highlight: "Money is moving: a financing, deal or valuation event involving an AI company.".to_string(),
                    impact: "Signals where capital expects AI value to land and who can afford the next scale-up.".to_string(),
                },
                AnalysisRule {
                    keywords: words(&["paper", "research", "[r]", "arxiv", "study"]),
                    kind: "Research".to_string(),
                    highlight: "A new paper or study reports methods and results worth reading in full.".to_string(),
                    impact: "May shift what practitioners try next once the results are reproduced.".to_string(),
                },
                AnalysisRule {
                    keywords: words(&["launch", "release", "released", "introducing", "announce", "built", "[p]"]),
                    kind: "Product Launch".to_string(),
                    highlight: "A new product, tool or open-source project is available to try today.".to_string(),
                    impact: "Changes the toolbox available to developers and raises the bar for competitors.".to_string(),
                },
                AnalysisRule {
                    keywords: words(&["security", "risk", "exposed", "leak", "vulnerability", "jailbreak", "warn"]),
                    kind: "Security & Risk".to_string(),
                    highlight: "A security issue, leak or safety risk is being discussed.".to_string(),
                    impact: "Worth checking whether your own deployments are affected.".to_string(),
                },
                AnalysisRule {
                    keywords: words(&["model", "llm", "gpt", "claude", "gemini", "llama", "benchmark"]),
                    kind: "Model & Algorithm".to_string(),
                    highlight: "Discussion of a model's capabilities, training or benchmark results.".to_string(),
                    impact: "Helps calibrate which models are worth adopting for real workloads.".to_string(),
                },
            ],
            analysis_fallback: Analysis {
                kind: "Community Discussion".to_string(),
                highlight: "A widely upvoted thread the community is actively discussing.".to_string(),
                impact: "A useful read on what practitioners care about right now.".to_string(),
            },
            category_groups: vec![
                CategoryGroup {
                    name: "💰 Funding & Business".to_string(),
                    keywords: words(&["funding", "investment", "billion", "million", "ceo", "acquisition", "valuation"]),
                },
                CategoryGroup {
                    name: "🔬 Research".to_string(),
                    keywords: words(&["paper", "research", "[r]", "study", "arxiv"]),
                },
                CategoryGroup {
                    name: "🚀 Product".to_string(),
                    keywords: words(&["launch", "release", "built", "[p]", "introducing"]),
                },
                CategoryGroup {
                    name: "🛡️ Security".to_string(),
                    keywords: words(&["security", "risk", "exposed", "leak", "vulnerability"]),
                },
            ],
        }
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            groups: vec![
                ScoreGroup {
                    name: "organizations".to_string(),
                    keywords: words(&["openai", "anthropic", "google", "deepmind", "meta", "microsoft", "nvidia", "apple"]),
                    bonus: 500,
                },
                ScoreGroup {
                    name: "funding".to_string(),
                    keywords: words(&["billion", "million", "funding", "raise", "investment", "acquisition"]),
                    bonus: 300,
                },
                ScoreGroup {
                    name: "breakthrough".to_string(),
                    keywords: words(&["breakthrough", "first", "launch", "release", "agi", "sota", "state-of-the-art"]),
                    bonus: 200,
                },
            ],
            priority_communities: words(&["OpenAI", "MachineLearning"]),
            priority_bonus: 200,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or fall back to the built-in
    /// defaults when no file is given or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            info!("Configuration file does not exist: {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from YAML file: {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        info!("Loaded {} communities from configuration", config.communities.len());
        Ok(config)
    }

    pub fn community(&self, name: &str) -> Option<&Community> {
        self.communities.iter().find(|c| c.name == name)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_communities_in_fixed_order() {
        let config = Config::default();
        let names: Vec<&str> = config.communities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["artificial", "MachineLearning", "OpenAI", "LocalLLaMA", "singularity"]);
        assert_eq!(config.request_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_feed_url_derived_from_host() {
        let config = Config::default();
        let community = config.community("LocalLLaMA").unwrap();
        assert_eq!(
            community.feed_url(&config.feed_host),
            "https://www.reddit.com/r/LocalLLaMA/top/.rss?t=day"
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
request_delay_ms: 0
communities:
  - name: rust
    url: http://localhost/rust.rss
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.request_delay_ms, 0);
        assert_eq!(config.communities.len(), 1);

        let rust = &config.communities[0];
        assert_eq!(rust.icon, "📌");
        assert_eq!(rust.default_summary, None);
        assert_eq!(rust.feed_url(&config.feed_host), "http://localhost/rust.rss");

        // Untouched sections come from the defaults
        assert_eq!(config.summary_rules.len(), 7);
        assert_eq!(config.scoring.priority_bonus, 200);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(Config::from_yaml("communities: 12").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap();
        assert_eq!(config.communities.len(), 5);
    }
}
