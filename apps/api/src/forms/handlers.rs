//! Axum route handlers for form submission and the persona PDF.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::assets::AssetKind;
use crate::errors::AppError;
use crate::forms::{session_key, FormKind, FormPayload};
use crate::render::render_persona_pdf;
use crate::state::AppState;

const PERSONA_SAVED: &str = "Persona details saved successfully!";
const CONTENT_SAVED: &str = "Content generation details saved successfully";

/// Acknowledgment returned after a form is stored, with the prompt definition echoed back.
#[derive(Debug, Serialize)]
pub struct SaveAck {
    pub message: &'static str,
    pub prompt: Value,
}

/// The prompt is loaded before the slot is replaced, so a failed load leaves
/// the stored form untouched.
async fn save_form(
    state: &AppState,
    headers: &HeaderMap,
    kind: FormKind,
    prompt_kind: AssetKind,
    message: &'static str,
    payload: FormPayload,
) -> Result<Json<SaveAck>, AppError> {
    let prompt = state.assets.load(prompt_kind).await?;

    let session = session_key(headers);
    let fields = payload.len();
    state.forms.save(kind, &session, payload);
    info!(
        "Saved {:?} form for session '{}' ({} fields, {} sessions held)",
        kind,
        session,
        fields,
        state.forms.session_count()
    );

    Ok(Json(SaveAck { message, prompt }))
}

/// POST /generate-persona
pub async fn handle_generate_persona(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FormPayload>,
) -> Result<Json<SaveAck>, AppError> {
    save_form(
        &state,
        &headers,
        FormKind::Persona,
        AssetKind::PersonaPrompt,
        PERSONA_SAVED,
        payload,
    )
    .await
}

/// POST /content-generation
pub async fn handle_content_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FormPayload>,
) -> Result<Json<SaveAck>, AppError> {
    save_form(
        &state,
        &headers,
        FormKind::Content,
        AssetKind::ContentPrompt,
        CONTENT_SAVED,
        payload,
    )
    .await
}

/// GET /generate-pdf
///
/// Renders whatever persona form the caller's session currently holds.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let persona = state.forms.get(FormKind::Persona, &session_key(&headers));
    let pdf = render_persona_pdf(&persona)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "inline; filename=\"customer-personas.pdf\"",
            ),
        ],
        pdf,
    ))
}
