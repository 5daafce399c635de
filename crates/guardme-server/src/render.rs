//! Server-side rendering of the single-page interface.
//!
//! Everything here is pure: a session snapshot goes in, HTML comes out.

use chrono::Local;

use guardme_core::classifier::{Action, ClassificationResult};
use guardme_core::history::{CategoryDistribution, HistoryEntry};
use guardme_core::session::SessionState;

/// Bar colour per distribution label.
const CHART_COLORS: &[(&str, &str)] = &[
    ("Safe", "#22c55e"),
    ("Harassment", "#ef4444"),
    ("Sexual", "#db2777"),
    ("Misinformation", "#f59e0b"),
    ("Age-Inappropriate", "#8b5cf6"),
];

/// Colour for labels missing from [`CHART_COLORS`].
const FALLBACK_COLOR: &str = "#94a3b8";

/// Longest axis label shown unshortened.
const MAX_AXIS_LABEL: usize = 10;

const STYLESHEET: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f8fafc; color: #0f172a; margin: 0; }
header { background: #fff; border-bottom: 1px solid #e2e8f0; padding: 1rem 2rem; }
header h1 { margin: 0; font-size: 1.25rem; color: #7e22ce; }
header p { margin: 0; font-size: 0.75rem; color: #64748b; }
main { max-width: 64rem; margin: 0 auto; padding: 2rem 1rem; display: grid; grid-template-columns: 2fr 1fr; gap: 2rem; }
.card { background: #fff; border: 1px solid #f1f5f9; border-radius: 1rem; padding: 1.5rem; margin-bottom: 1.5rem; }
textarea { width: 100%; height: 10rem; box-sizing: border-box; padding: 1rem; border-radius: 0.75rem; border: 1px solid #e2e8f0; resize: none; }
.controls { display: flex; justify-content: space-between; margin-top: 1rem; }
button { padding: 0.6rem 1.5rem; border-radius: 0.5rem; border: none; cursor: pointer; }
button.primary { background: #9333ea; color: #fff; }
button:disabled { background: #cbd5e1; cursor: not-allowed; }
.error { background: #fef2f2; color: #b91c1c; border: 1px solid #fecaca; border-radius: 0.75rem; padding: 1rem; }
.result { border: 2px solid; border-radius: 0.75rem; padding: 1.5rem; }
.result.allow { border-color: #bbf7d0; background: #f0fdf4; color: #166534; }
.result.warn { border-color: #fde68a; background: #fffbeb; color: #92400e; }
.result.block { border-color: #fecaca; background: #fef2f2; color: #991b1b; }
.badge { font-size: 0.75rem; font-weight: bold; padding: 0.1rem 0.5rem; border-radius: 9999px; text-transform: uppercase; }
.badge.allow { background: #dcfce7; color: #15803d; }
.badge.warn { background: #fef3c7; color: #b45309; }
.badge.block { background: #fee2e2; color: #b91c1c; }
.reasoning { background: rgba(255,255,255,0.6); border-radius: 0.5rem; padding: 1rem; color: #1f2937; }
.chart { display: flex; align-items: flex-end; gap: 0.5rem; height: 12rem; }
.bar { flex: 1; display: flex; flex-direction: column; justify-content: flex-end; align-items: center; height: 100%; font-size: 0.625rem; }
.bar .fill { width: 100%; border-radius: 4px 4px 0 0; }
.empty { color: #94a3b8; text-align: center; padding: 2rem; font-size: 0.875rem; }
.history { list-style: none; margin: 0; padding: 0; max-height: 400px; overflow-y: auto; }
.history li { padding: 1rem 0; border-bottom: 1px solid #f1f5f9; }
.history .time { float: right; font-size: 0.75rem; color: #94a3b8; }
.history .found { font-size: 0.75rem; color: #9333ea; }
"#;

/// Escapes text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn action_class(action: Action) -> &'static str {
    match action {
        Action::Allow => "allow",
        Action::Warn => "warn",
        Action::Block => "block",
    }
}

fn chart_color(label: &str) -> &'static str {
    CHART_COLORS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// Shortens long axis labels to seven characters plus an ellipsis.
pub fn axis_label(label: &str) -> String {
    if label.chars().count() > MAX_AXIS_LABEL {
        let head: String = label.chars().take(7).collect();
        format!("{}...", head)
    } else {
        label.to_string()
    }
}

/// Renders the verdict card.
pub fn result_card(result: &ClassificationResult) -> String {
    let class = action_class(result.action);
    let badge = if result.safe {
        String::new()
    } else {
        format!(
            r#"<span class="badge {}">{}</span>"#,
            class,
            escape_html(result.primary_category.name())
        )
    };
    let blocked_tag = if result.is_blocked() {
        r#"<p><span class="badge block">Content Blocked</span></p>"#
    } else {
        ""
    };

    format!(
        r#"<section class="result {class}">
<h3>{action}ED</h3>
<p>Risk Score: {score}/10</p>
{badge}
<div class="reasoning"><h4>Reasoning</h4><p>{reasoning}</p></div>
{blocked_tag}
</section>"#,
        class = class,
        action = result.action.name(),
        score = result.risk_score,
        badge = badge,
        reasoning = escape_html(&result.reasoning),
        blocked_tag = blocked_tag,
    )
}

/// Renders the category distribution as a bar chart.
pub fn chart(distribution: &CategoryDistribution) -> String {
    if distribution.is_empty() {
        return r#"<div class="empty">No analysis history yet</div>"#.to_string();
    }

    let bars = distribution.bars();
    let max = bars.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1);

    let mut html = String::from(r#"<h4>Category Distribution</h4><div class="chart">"#);
    for (label, count) in bars {
        let height = count * 100 / max;
        html.push_str(&format!(
            r#"<div class="bar" title="{label}: {count}"><span>{count}</span><div class="fill" style="height: {height}%; background: {color};"></div><span>{axis}</span></div>"#,
            label = escape_html(label),
            count = count,
            height = height,
            color = chart_color(label),
            axis = escape_html(&axis_label(label)),
        ));
    }
    html.push_str("</div>");
    html
}

fn history_item(entry: &HistoryEntry) -> String {
    let found = if entry.category().is_risk() {
        format!(
            r#"<p class="found">Found: {}</p>"#,
            escape_html(entry.category().name())
        )
    } else {
        String::new()
    };

    format!(
        r#"<li><span class="badge {class}">{action}</span><span class="time">{time}</span><p>"{excerpt}"</p>{found}</li>"#,
        class = action_class(entry.action()),
        action = entry.action().name(),
        time = entry.captured_at.with_timezone(&Local).format("%H:%M"),
        excerpt = escape_html(&entry.excerpt),
        found = found,
    )
}

/// Renders the recent scans list.
pub fn history_list(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return r#"<div class="empty">No history yet.</div>"#.to_string();
    }

    let items: String = history.iter().map(history_item).collect();
    format!(r#"<ul class="history">{}</ul>"#, items)
}

/// Renders the whole page for a session snapshot.
pub fn page(state: &SessionState, distribution: &CategoryDistribution) -> String {
    let analyze_label = if state.is_loading {
        "Analyzing..."
    } else {
        "Run Analysis"
    };
    let disabled = |flag: bool| if flag { " disabled" } else { "" };

    let error = state
        .current_error
        .as_deref()
        .map(|e| format!(r#"<div class="error" role="alert"><p>{}</p></div>"#, escape_html(e)))
        .unwrap_or_default();
    let result = state
        .current_result
        .as_ref()
        .map(result_card)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>GuardME - AI Safety Moderator</title>
<style>{style}</style>
</head>
<body>
<header><h1>GuardME</h1><p>AI Safety Moderator</p></header>
<main>
<div>
<section class="card">
<h2>Content Analyzer</h2>
<p>Enter text below to scan for harassment, bias, or safety risks.</p>
<form method="post" action="/analyze">
<textarea name="text" placeholder="Type or paste content here to analyze...">{input}</textarea>
<div class="controls">
<button type="submit" formaction="/clear"{clear_disabled}>Clear</button>
<button type="submit" class="primary"{analyze_disabled}>{analyze_label}</button>
</div>
</form>
</section>
{error}
{result}
</div>
<div>
<section class="card"><h3>Session Stats</h3>{chart}</section>
<section class="card"><h3>Recent Scans</h3>{history}</section>
</div>
</main>
</body>
</html>"#,
        style = STYLESHEET,
        input = escape_html(&state.input_text),
        clear_disabled = disabled(state.is_loading),
        analyze_disabled = disabled(state.is_loading),
        analyze_label = analyze_label,
        error = error,
        result = result,
        chart = chart(distribution),
        history = history_list(&state.history),
    )
}
