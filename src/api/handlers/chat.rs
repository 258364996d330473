//! Chat handler: one conversation turn streamed as server-sent events.

use crate::{
    AppState,
    types::{AppError, ChatRequest, Result},
};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::StreamExt;
use std::convert::Infallible;

/// Chat with the assistant, streaming tokens as they are generated.
///
/// Grounded mode is honored when the session has an ingested corpus;
/// otherwise the turn runs in plain mode.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Server-sent token stream"),
        (status = 400, description = "Invalid input")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::InvalidInput("Message required".to_string()));
    }

    let (session_id, session) = state.session(payload.session_id.clone());

    // Append the user turn and snapshot what the generators need, then
    // release the session lock before any provider call.
    let (conversation, index) = {
        let mut guard = session.lock().await;
        guard.push_user(&payload.message);
        (guard.conversation.clone(), guard.index.clone())
    };

    let grounded = payload.grounded && index.is_some();
    let token_stream = if grounded {
        let index = index.as_deref().ok_or_else(|| {
            AppError::Internal("grounded turn without session index".to_string())
        })?;
        state.engine.stream_grounded(index, &conversation).await?
    } else {
        if payload.grounded {
            tracing::info!(session = %session_id, "Grounded mode requested but no corpus ingested");
        }
        state.engine.stream_plain(&conversation).await?
    };

    tracing::info!(session = %session_id, grounded, "Generation started");

    let done_id = session_id.clone();
    let sse_stream = async_stream::stream! {
        let mut stream = token_stream;
        let mut full_response = String::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    full_response.push_str(&token);
                    yield Ok(Event::default().data(token));
                }
                Err(e) => {
                    // Fragments already yielded stay with the caller.
                    tracing::error!(session = %done_id, error = %e, "Generation failed mid-stream");
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    break;
                }
            }
        }

        if !full_response.is_empty() {
            session.lock().await.push_assistant(full_response);
        }
        yield Ok(Event::default().event("done").data(done_id.clone()));
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}
