//! Typed view of a decision.
//!
//! Free text from the backend is never interpolated raw: the decision and
//! amount are escaped, and the markdown summary is rendered and then
//! sanitised before it reaches the result container.

use crate::models::DecisionResult;
use pulldown_cmark::{html, Options, Parser};

const FALLBACK_CLASS: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionCard {
    pub decision: String,
    pub decision_class: String,
    pub amount: String,
    pub summary_html: String,
}

impl DecisionCard {
    pub fn new(result: &DecisionResult) -> Self {
        Self {
            decision: result.decision.clone(),
            decision_class: decision_class(&result.decision),
            amount: result.amount.clone(),
            summary_html: render_markdown(&result.justification.summary),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="card"><h3 class="decision {class}">Decision: {decision}</h3><p><strong>Amount:</strong> {amount}</p><div class="justification">{summary}</div></div>"#,
            class = self.decision_class,
            decision = ammonia::clean_text(&self.decision),
            amount = ammonia::clean_text(&self.amount),
            summary = self.summary_html,
        )
    }
}

/// Lower-cased, identifier-safe CSS class for a decision value.
pub fn decision_class(decision: &str) -> String {
    let mut class = String::with_capacity(decision.len());
    for c in decision.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            class.push(c);
        } else if !class.ends_with('-') {
            class.push('-');
        }
    }

    let class = class.trim_matches('-');
    if class.is_empty() {
        FALLBACK_CLASS.to_string()
    } else {
        class.to_string()
    }
}

/// Markdown to sanitised HTML.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options);

    let mut unsafe_html = String::new();
    html::push_html(&mut unsafe_html, parser);
    ammonia::clean(&unsafe_html)
}
