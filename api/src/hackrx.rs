use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct HackRxRequest {
    /// URL of the policy document the questions are about.
    #[serde(default)]
    pub documents: Option<String>,
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HackRxResponse {
    pub answers: Vec<String>,
}

/// `POST /hackrx/run`: one answer per question, in order. A failing
/// question yields an error answer instead of failing the batch.
pub async fn handle_hackrx_run(
    State(state): State<AppState>,
    Json(body): Json<HackRxRequest>,
) -> Json<HackRxResponse> {
    let index = match body.documents.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => Some(state.engine.index_remote(url).await),
        None => None,
    };

    let mut answers = Vec::with_capacity(body.questions.len());
    for (idx, question) in body.questions.iter().enumerate() {
        log::info!("Q{}: {}", idx + 1, question);

        let result = match &index {
            Some(Ok(index)) => state.engine.decide_with(index, question).await,
            Some(Err(e)) => Err(anyhow::anyhow!("{e:#}")),
            None => state.engine.answer_general(question).await,
        };

        let answer = match result {
            Ok(decision) => decision.justification.summary.trim().to_string(),
            Err(e) => {
                log::warn!("Question {} failed: {:#}", idx + 1, e);
                format!("Error processing question: {e:#}")
            }
        };
        answers.push(answer);
    }

    Json(HackRxResponse { answers })
}
