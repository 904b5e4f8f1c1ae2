//! Best-effort extraction of summary / keywords / sentiment from a model reply.
//!
//! The prompt asks for a JSON object, but models routinely wrap it in code
//! fences, prepend chatter, or ignore the instruction and answer in labelled
//! prose. Both shapes are accepted:
//!
//! - a JSON object anywhere in the reply (keys matched case-insensitively,
//!   `keywords` as an array or a comma-separated string)
//! - `Summary:` / `Keywords:` / `Sentiment:` sections in any order, with
//!   optional markdown bullets, headings or bold labels

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::analyzer::AnalyzerError;
use crate::models::Analysis;

/// Parse a raw completion into an [`Analysis`].
pub fn parse_completion(raw: &str) -> Result<Analysis, AnalyzerError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.trim().is_empty() {
        return Err(AnalyzerError::EmptyCompletion);
    }

    if let Some(analysis) = parse_json_object(&cleaned) {
        return Ok(analysis);
    }

    parse_labelled_sections(&cleaned).ok_or_else(|| {
        AnalyzerError::Parse(format!(
            "no summary/keywords/sentiment found in completion: {}",
            preview(raw)
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Keywords,
    Sentiment,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "summary" => Some(Section::Summary),
            "keywords" | "keyword" => Some(Section::Keywords),
            "sentiment" => Some(Section::Sentiment),
            _ => None,
        }
    }
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:[-*•>]+\s*|#+\s*|\d+[.)]\s*)*\**\s*(summary|key\s*words?|sentiment)\s*\**\s*:\s*\**\s*(.*)$",
        )
        .expect("label regex is valid")
    })
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-*•]+|\d+[.)])\s*").expect("bullet regex is valid"))
}

fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Try every `{` in turn and take the first JSON object that yields an analysis.
/// Trailing chatter, including stray braces, is never read.
fn parse_json_object(text: &str) -> Option<Analysis> {
    text.match_indices('{').find_map(|(start, _)| {
        let value = serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()?
            .ok()?;
        analysis_from_object(value.as_object()?)
    })
}

fn analysis_from_object(object: &serde_json::Map<String, Value>) -> Option<Analysis> {
    let mut summary = None;
    let mut keywords = None;
    let mut sentiment = None;

    for (key, value) in object {
        match Section::from_label(key) {
            Some(Section::Summary) => summary = value.as_str().map(|s| s.trim().to_string()),
            Some(Section::Keywords) => keywords = json_keywords(value),
            Some(Section::Sentiment) => sentiment = value.as_str().map(clean_sentiment),
            None => {}
        }
    }

    assemble(summary, keywords, sentiment)
}

fn json_keywords(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(clean_keyword(s)),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Null | Value::Array(_) | Value::Object(_) => None,
                })
                .filter(|k| !k.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(split_keywords(s)),
        _ => None,
    }
}

fn parse_labelled_sections(text: &str) -> Option<Analysis> {
    let re = label_regex();
    let mut current: Option<Section> = None;
    let mut summary: Option<Vec<String>> = None;
    let mut keywords: Option<Vec<String>> = None;
    let mut sentiment: Option<Vec<String>> = None;

    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            let section = caps.get(1).and_then(|m| Section::from_label(m.as_str()));
            if let Some(section) = section {
                current = Some(section);
                let slot = match section {
                    Section::Summary => &mut summary,
                    Section::Keywords => &mut keywords,
                    Section::Sentiment => &mut sentiment,
                };
                let lines = slot.get_or_insert_with(Vec::new);
                let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                if !rest.is_empty() {
                    lines.push(rest.to_string());
                }
                continue;
            }
        }

        let slot = match current {
            Some(Section::Summary) => &mut summary,
            Some(Section::Keywords) => &mut keywords,
            Some(Section::Sentiment) => &mut sentiment,
            None => continue,
        };
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if let Some(lines) = slot.as_mut() {
                lines.push(trimmed.to_string());
            }
        }
    }

    let summary = summary.map(|lines| lines.join(" ").trim().to_string());
    let keywords = keywords.map(|lines| split_keywords(&lines.join("\n")));
    let sentiment = sentiment.and_then(|lines| lines.first().map(|l| clean_sentiment(l.as_str())));

    assemble(summary, keywords, sentiment)
}

fn assemble(
    summary: Option<String>,
    keywords: Option<Vec<String>>,
    sentiment: Option<String>,
) -> Option<Analysis> {
    let summary = summary.filter(|s| !s.is_empty())?;
    let keywords = keywords?;
    let sentiment = sentiment.filter(|s| !s.is_empty())?;
    Some(Analysis {
        summary,
        keywords,
        sentiment,
    })
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split([',', ';', '\n'])
        .map(clean_keyword)
        .filter(|k| !k.is_empty())
        .collect()
}

fn clean_keyword(raw: &str) -> String {
    let without_bullet = bullet_regex().replace(raw.trim(), "");
    strip_decoration(&without_bullet)
}

fn clean_sentiment(raw: &str) -> String {
    strip_decoration(raw)
}

/// Trim whitespace, quotes and emphasis on both ends, plus trailing periods.
fn strip_decoration(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c.is_whitespace() || is_quote_or_emphasis(c))
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.' || is_quote_or_emphasis(c))
        .to_string()
}

fn is_quote_or_emphasis(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '*')
}

fn preview(raw: &str) -> String {
    let mut out: String = raw.chars().take(120).collect();
    if raw.chars().count() > 120 {
        out.push('…');
    }
    out
}
