//! API route handlers.

use axum::extract::State;
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use tracing::{debug, info};

use guardme_core::session::SubmitOutcome;

use crate::error::{ApiError, Result};
use crate::models::{
    AnalyzeForm, AnalyzeRequest, AnalyzeResponse, InputRequest, SessionResponse, StatsResponse,
};
use crate::render;
use crate::state::AppState;
use crate::MAX_INPUT_BYTES;

fn check_len(text: &str) -> Result<()> {
    if text.len() > MAX_INPUT_BYTES {
        return Err(ApiError::BadRequest(format!(
            "input exceeds {} bytes",
            MAX_INPUT_BYTES
        )));
    }
    Ok(())
}

/// GET / - Render the interface.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.session.snapshot();
    let distribution = guardme_core::history::aggregate(&snapshot.history);
    Html(render::page(&snapshot, &distribution))
}

/// POST /analyze - Form submission from the interface.
pub async fn analyze_form(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Redirect> {
    check_len(&form.text)?;

    let outcome = state.session.submit_text(form.text).await;
    if outcome == SubmitOutcome::Busy {
        return Err(ApiError::Busy);
    }
    debug!(outcome = outcome.as_str(), "Form analysis finished");

    Ok(Redirect::to("/"))
}

/// POST /clear - Clear button on the interface.
pub async fn clear_form(State(state): State<AppState>) -> Redirect {
    state.session.clear();
    Redirect::to("/")
}

/// GET /api/session - Current session snapshot.
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(state.session.snapshot().into())
}

/// PUT /api/input - Replace the input text.
pub async fn put_input(
    State(state): State<AppState>,
    Json(req): Json<InputRequest>,
) -> Result<Json<SessionResponse>> {
    check_len(&req.text)?;
    state.session.set_input_text(req.text);
    Ok(Json(state.session.snapshot().into()))
}

/// POST /api/analyze - Classify the given or current input text.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let outcome = match req.text {
        Some(text) => {
            check_len(&text)?;
            state.session.submit_text(text).await
        }
        None => state.session.submit_input().await,
    };
    if outcome == SubmitOutcome::Busy {
        return Err(ApiError::Busy);
    }

    info!(outcome = outcome.as_str(), "Analysis request complete");
    Ok(Json(AnalyzeResponse::new(outcome, state.session.snapshot())))
}

/// POST /api/clear - Reset input, verdict and error.
pub async fn clear(State(state): State<AppState>) -> Json<SessionResponse> {
    state.session.clear();
    Json(state.session.snapshot().into())
}

/// GET /api/stats - Aggregated session statistics.
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.session.action_counts(),
        state.session.distribution(),
    ))
}
