use chrono::NaiveDate;

use crate::format_number;
use crate::product::ScoredProduct;
use crate::trends::TrendSummary;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const TREND_LIST_LIMIT: usize = 5;
const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|ch| !MARKDOWN_SPECIAL.contains(ch))
        .collect()
}

/// Splits on line boundaries so each chunk stays within `max_len`
/// characters. A single line longer than `max_len` becomes its own chunk.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.chars().count() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.split('\n') {
        let line_len = line.chars().count();
        if !current.is_empty() && current_len + 1 + line_len > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn format_daily_report(products: &[ScoredProduct], day: u32, date: NaiveDate) -> String {
    let mut msg = format!(
        "🚀 *WORLD VIRAL PRODUCT REPORT — Day {}*\n📅 {}\n{}\n\n",
        day,
        escape_markdown(&date.to_string()),
        RULE
    );

    for (idx, product) in products.iter().enumerate() {
        let candidate = &product.candidate;
        msg.push_str(&format!("*{}\\) {}*\n", idx + 1, escape_markdown(&candidate.name)));
        msg.push_str(&format!("💰 Price: ${}\n", escape_markdown(&format!("{:.2}", candidate.price))));
        msg.push_str(&format!(
            "📦 Orders: {}\\+\n",
            escape_markdown(&format_number(candidate.orders as f64))
        ));
        msg.push_str(&format!("⭐ Rating: {}\n", escape_markdown(&candidate.rating.to_string())));
        msg.push_str(&format!(
            "📊 Viral Score: {}\n",
            escape_markdown(&product.viral_score.to_string())
        ));
        if let Some(analysis) = &product.analysis {
            msg.push_str(&format!(
                "🏁 Competition: {} \\| Niche: {}/10\n",
                analysis.competition_level.label(),
                analysis.niche_score
            ));
            if !analysis.reasoning.is_empty() {
                msg.push_str(&format!("🧠 {}\n", escape_markdown(&analysis.reasoning)));
            }
        }
        if !candidate.why_viral.is_empty() {
            msg.push_str(&format!("🔥 {}\n", escape_markdown(&candidate.why_viral)));
        }
        msg.push_str(&format!("🔗 [Search on AliExpress]({})\n\n", candidate.link));
    }

    msg.push_str(RULE);
    msg.push_str("\n🤖 _Powered by World Viral Product Hunter_");
    msg
}

pub fn format_trend_report(summary: &TrendSummary, day: u32) -> String {
    let mut msg = format!("📊 *TREND TRACKER — Day {}*\n{}\n\n", day, RULE);
    msg.push_str(&format!(
        "📈 Rising: {}\n📉 Declining: {}\n➡️ Stable: {}\n🆕 New today: {}\n🗂 Tracked: {}\n",
        summary.rising.len(),
        summary.declining.len(),
        summary.stable.len(),
        summary.new_today.len(),
        summary.total
    ));

    let sections = [("📈 *Rising*", &summary.rising), ("📉 *Declining*", &summary.declining)];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        msg.push_str(&format!("\n{}\n", title));
        for entry in entries.iter().take(TREND_LIST_LIMIT) {
            let orders: Vec<String> = entry
                .appearances
                .iter()
                .rev()
                .take(2)
                .rev()
                .map(|appearance| format_number(appearance.orders as f64))
                .collect();
            msg.push_str(&format!(
                "• {} \\({}\\)\n",
                escape_markdown(&entry.name),
                escape_markdown(&orders.join(" → "))
            ));
        }
    }
    msg
}

pub fn format_weekly_report(report: &str, day: u32) -> String {
    format!(
        "🧭 *WEEKLY MARKET INTELLIGENCE — Day {}*\n{}\n\n{}",
        day,
        RULE,
        escape_markdown(report)
    )
}
