use html_escape::{encode_double_quoted_attribute, encode_text};
use crate::classify::category_counts;
use crate::config::Config;
use crate::models::{PostRecord, RankedPost, ReportContext};
use crate::parser::relative_age;

const RANK_ICONS: [&str; 5] = ["🥇", "🥈", "🥉", "4️⃣", "5️⃣"];
const INDEX_POSTS: usize = 3;

const STYLE: &str = r#"
        :root { --bg: #faf9f7; --card: #ffffff; --text: #1a1a1a; --muted: #666; --border: #e0ddd5; --accent: #ff4500; --link: #0066cc; --summary-bg: #f5f5f0; }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: var(--bg); color: var(--text); line-height: 1.6; }
        .header { background: linear-gradient(135deg, #ff4500 0%, #ff6b6b 100%); color: white; padding: 40px 20px; text-align: center; }
        .header h1 { font-size: 2.5em; margin-bottom: 10px; }
        .container { max-width: 900px; margin: 0 auto; padding: 30px 20px; }
        .section { margin-bottom: 40px; }
        .section-title { font-size: 1.5em; margin-bottom: 20px; padding-bottom: 10px; border-bottom: 3px solid var(--accent); }
        .section-title small { font-size: 0.6em; color: var(--muted); font-weight: normal; }
        .post-card { background: var(--card); border: 1px solid var(--border); border-radius: 12px; padding: 20px; margin-bottom: 20px; }
        .post-title { font-size: 1.2em; margin-bottom: 10px; }
        .post-title a { color: var(--text); text-decoration: none; }
        .post-meta { display: flex; gap: 20px; font-size: 0.9em; color: var(--muted); margin-bottom: 12px; flex-wrap: wrap; }
        .stat.upvotes { color: #ff4500; }
        .post-summary { background: var(--summary-bg); border-left: 4px solid var(--accent); padding: 12px 16px; margin: 12px 0; border-radius: 0 8px 8px 0; }
        .source-link, .archive-link { color: var(--link); text-decoration: none; font-size: 0.9em; }
        .btn { display: inline-block; background: var(--accent); color: white; padding: 12px 24px; border-radius: 8px; text-decoration: none; font-weight: 600; margin-top: 20px; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid var(--border); padding: 8px 12px; text-align: left; }
        .archive-list { list-style: none; }
        .archive-item { padding: 12px 0; border-bottom: 1px solid var(--border); display: flex; justify-content: space-between; }
        .footer { text-align: center; padding: 40px 20px; border-top: 1px solid var(--border); color: var(--muted); }
"#;

/// `[text](<url>)` that stays a single link whatever the title contains.
fn markdown_link(text: &str, url: &str) -> String {
    let text = text
        .replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]");
    let url = url.replace('<', "%3C").replace('>', "%3E").replace(' ', "%20");
    format!("[{}](<{}>)", text, url)
}

fn rank_icon(rank: usize) -> &'static str {
    rank.checked_sub(1)
        .and_then(|i| RANK_ICONS.get(i))
        .copied()
        .unwrap_or("🔹")
}

fn count_or_na(n: u64) -> String {
    if n == 0 {
        "N/A".to_string()
    } else {
        n.to_string()
    }
}

fn report_href(ctx: &ReportContext) -> String {
    format!("daily/{}.html", ctx.date_key())
}

fn page(title: &str, heading: &str, tagline: &str, body: &str, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <header class="header">
        <h1>{heading}</h1>
        <p>{tagline}</p>
    </header>
    <div class="container">
{body}
    </div>
    <footer class="footer">
        <p>{footer}</p>
    </footer>
</body>
</html>
"#
    )
}

fn generated_line(ctx: &ReportContext) -> String {
    format!(
        "Source: Reddit RSS | Generated {}",
        ctx.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Posts grouped by community, communities in order of first appearance.
fn group_by_community(posts: &[PostRecord]) -> Vec<(&str, Vec<&PostRecord>)> {
    let mut groups: Vec<(&str, Vec<&PostRecord>)> = Vec::new();
    for post in posts {
        match groups.iter_mut().find(|(name, _)| *name == post.community) {
            Some((_, members)) => members.push(post),
            None => groups.push((post.community.as_str(), vec![post])),
        }
    }
    groups
}

fn digest_card(post: &PostRecord, ctx: &ReportContext) -> String {
    let link = encode_double_quoted_attribute(&post.link);
    format!(
        r#"        <div class="post-card">
            <h3 class="post-title"><a href="{link}" target="_blank">{title}</a></h3>
            <div class="post-meta">
                <span>⏱️ {age}</span>
                <span class="stat upvotes">⬆️ {upvotes}</span>
                <span class="stat">💬 {comments}</span>
            </div>
            <div class="post-summary">💡 {summary}</div>
            <a href="{link}" class="source-link" target="_blank">View the original discussion →</a>
        </div>
"#,
        title = encode_text(&post.title),
        age = relative_age(post.published_at, ctx.generated_at),
        upvotes = count_or_na(post.upvotes),
        comments = count_or_na(post.comments),
        summary = encode_text(&post.summary),
    )
}

/// Every post of the run, one section per community.
pub fn render_digest_html(posts: &[PostRecord], ctx: &ReportContext, config: &Config) -> String {
    let mut body = String::new();

    for (name, members) in group_by_community(posts) {
        let (icon, description) = match config.community(name) {
            Some(c) => (c.icon.as_str(), c.description.as_str()),
            None => ("📌", ""),
        };

        body.push_str(&format!(
            "        <section class=\"section\">\n            <h2 class=\"section-title\">{} r/{} <small>({})</small></h2>\n",
            icon,
            encode_text(name),
            encode_text(description)
        ));
        for post in members {
            body.push_str(&digest_card(post, ctx));
        }
        body.push_str("        </section>\n");
    }

    let date = ctx.date_key();
    page(
        &format!("Reddit AI Digest - {}", date),
        "🔥 Reddit AI Digest",
        &format!("{} | The hottest discussions of the past 24 hours", date),
        &body,
        &generated_line(ctx),
    )
}

/// Ranked top posts as a Markdown report.
pub fn render_ranked_markdown(ranked: &[RankedPost], ctx: &ReportContext, config: &Config) -> String {
    let mut out = format!(
        "# 🔥 Reddit AI Top {} - {}\n\n> {}\n\n",
        ranked.len(),
        ctx.date_key(),
        generated_line(ctx)
    );

    for entry in ranked {
        let post = &entry.post;
        out.push_str(&format!(
            "## {} {}. {}\n\n",
            rank_icon(entry.rank),
            entry.rank,
            markdown_link(&post.title, &post.link)
        ));
        out.push_str(&format!(
            "- **Source:** r/{} · ⬆️ {} · 💬 {} · ⏱️ {}\n",
            post.community,
            count_or_na(post.upvotes),
            count_or_na(post.comments),
            relative_age(post.published_at, ctx.generated_at)
        ));
        out.push_str(&format!("- **Score:** {}\n", post.score.unwrap_or(post.upvotes)));
        out.push_str(&format!("- **Type:** {}\n", entry.analysis.kind));
        out.push_str(&format!("- **Highlight:** {}\n", entry.analysis.highlight));
        out.push_str(&format!("- **Impact:** {}\n\n", entry.analysis.impact));
    }

    out.push_str("## 📊 Category Breakdown\n\n| Category | Posts |\n| --- | --- |\n");
    for (name, count) in category_counts(ranked, &config.category_groups) {
        out.push_str(&format!("| {} | {} |\n", name, count));
    }

    out
}

/// Ranked top posts as an HTML report.
pub fn render_ranked_html(ranked: &[RankedPost], ctx: &ReportContext, config: &Config) -> String {
    let mut body = String::from("        <section class=\"section\">\n");

    for entry in ranked {
        let post = &entry.post;
        body.push_str(&format!(
            r#"        <div class="post-card">
            <h3 class="post-title">{icon} {rank}. <a href="{link}" target="_blank">{title}</a></h3>
            <div class="post-meta">
                <span>r/{community}</span>
                <span>⏱️ {age}</span>
                <span class="stat upvotes">⬆️ {upvotes}</span>
                <span class="stat">💬 {comments}</span>
                <span>Score {score}</span>
            </div>
            <div class="post-summary">
                <p><strong>{kind}</strong></p>
                <p>✨ {highlight}</p>
                <p>🎯 {impact}</p>
            </div>
        </div>
"#,
            icon = rank_icon(entry.rank),
            rank = entry.rank,
            link = encode_double_quoted_attribute(&post.link),
            title = encode_text(&post.title),
            community = encode_text(&post.community),
            age = relative_age(post.published_at, ctx.generated_at),
            upvotes = count_or_na(post.upvotes),
            comments = count_or_na(post.comments),
            score = post.score.unwrap_or(post.upvotes),
            kind = encode_text(&entry.analysis.kind),
            highlight = encode_text(&entry.analysis.highlight),
            impact = encode_text(&entry.analysis.impact),
        ));
    }
    body.push_str("        </section>\n");

    body.push_str("        <section class=\"section\">\n            <h2 class=\"section-title\">📊 Category Breakdown</h2>\n            <table>\n                <tr><th>Category</th><th>Posts</th></tr>\n");
    for (name, count) in category_counts(ranked, &config.category_groups) {
        body.push_str(&format!("                <tr><td>{}</td><td>{}</td></tr>\n", encode_text(name), count));
    }
    body.push_str("            </table>\n        </section>\n");

    let date = ctx.date_key();
    page(
        &format!("Reddit AI Top {} - {}", ranked.len(), date),
        &format!("🔥 Reddit AI Top {}", ranked.len()),
        &format!("{} | Ranked across every community", date),
        &body,
        &generated_line(ctx),
    )
}

/// Landing page: the first three posts given plus a link to the full report.
pub fn render_index_html<'a>(top: impl IntoIterator<Item = &'a PostRecord>, ctx: &ReportContext) -> String {
    let date = ctx.date_key();
    let href = report_href(ctx);

    let mut body = format!(
        "        <div class=\"section\">\n            <h2 class=\"section-title\">📰 Latest - {}</h2>\n",
        date
    );
    for post in top.into_iter().take(INDEX_POSTS) {
        body.push_str(&format!(
            r#"            <div class="post-card">
                <a href="{link}" class="post-title" target="_blank">{title}</a>
                <div class="post-summary">{summary}</div>
                <div class="post-meta">r/{community} · ⬆️ {upvotes}</div>
            </div>
"#,
            link = encode_double_quoted_attribute(&post.link),
            title = encode_text(&post.title),
            summary = encode_text(&post.summary),
            community = encode_text(&post.community),
            upvotes = count_or_na(post.upvotes),
        ));
    }
    body.push_str(&format!(
        "            <a href=\"{href}\" class=\"btn\">Read the full report →</a>\n        </div>\n"
    ));

    body.push_str(&format!(
        r#"        <div class="section">
            <h2 class="section-title">📚 Archive</h2>
            <ul class="archive-list">
                <li class="archive-item">
                    <span>{date}</span>
                    <a href="{href}" class="archive-link">View the full report →</a>
                </li>
            </ul>
        </div>
"#
    ));

    page(
        "Reddit AI Digest",
        "🔥 Reddit AI Digest",
        "Daily highlights from the Reddit AI communities",
        &body,
        &generated_line(ctx),
    )
}
