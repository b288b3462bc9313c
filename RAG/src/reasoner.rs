use crate::gemini_service::LanguageModel;
use crate::models::*;
use crate::payout::amount_for;
use crate::query_parser::parse_query;
use anyhow::Result;
use std::sync::Arc;

pub const INFORMATIONAL: &str = "informational";
const MAX_CLAUSE_REFS: usize = 3;

/// Turns a query and its retrieved clauses into a decision.
pub struct Reasoner {
    llm: Arc<dyn LanguageModel>,
}

impl Reasoner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn decide(&self, query: &str, clauses: &[String]) -> Result<DecisionResponse> {
        let parsed = parse_query(query);
        log::info!("Parsed query: {:?}", parsed);

        let mut grounded = !clauses.is_empty();
        let mut answer = if grounded {
            self.llm.complete(&clause_prompt(query, clauses)).await?
        } else {
            self.llm.complete(&general_prompt(query)).await?
        };

        if grounded && answer.to_lowercase().contains("not mentioned") {
            log::warn!("Not found in document, falling back to general knowledge");
            answer = self.llm.complete(&general_prompt(query)).await?;
            grounded = false;
        }

        let clause_refs = if grounded { clause_refs(&answer) } else { Vec::new() };

        Ok(DecisionResponse {
            decision: INFORMATIONAL.to_string(),
            amount: amount_for(parsed.procedure.as_deref()),
            justification: Justification {
                summary: answer,
                clause_refs,
            },
        })
    }
}

fn clause_prompt(query: &str, clauses: &[String]) -> String {
    let clause_list = clauses
        .iter()
        .map(|clause| format!("- {clause}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an intelligent insurance assistant.

Only use the retrieved policy clauses to answer the question. If a clause is not found, say 'Not mentioned in the provided document.' Do not assume or guess general policy rules.
Always specify exact figures like waiting periods, limits, or percentages if mentioned.
Never assume or generalize across policies.

User Question:
"""{query}"""

Relevant Policy Clauses:
{clause_list}

Answer the question in only a single sentence using simple and concise language.
"#
    )
}

fn general_prompt(query: &str) -> String {
    format!(
        r#"You are a confident, knowledgeable insurance assistant.

Answer the question briefly in 1 sentence based on common Indian health insurance practices. Keep the language simple and avoid unnecessary detail.

User Question:
"""{query}"""

Answer:
"#
    )
}

fn clause_refs(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("clause") || lower.contains("section")
        })
        .take(MAX_CLAUSE_REFS)
        .map(str::to_string)
        .collect()
}
