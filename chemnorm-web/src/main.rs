//! Servidor web Axum com WebSocket para normalização de entidades em tempo real

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chemnorm_core::{
    corpus::{demo_documents, demo_lexicon, DEMO_ENTITY_TYPE},
    lexicon::LexiconStats,
    Annotation, Document, FinalResult, NormalizationPipeline, NormalizerConfig,
    PipelineEvent, SieveResult, SieveTrace, TargetFilter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: NormalizationPipeline,
}

#[derive(Deserialize)]
struct NormalizeRequest {
    mention: String,
}

#[derive(Serialize)]
struct NormalizeResponse {
    result: SieveResult,
    trace: SieveTrace,
    names: Vec<String>,
}

#[derive(Serialize)]
struct DocumentResponse {
    document: Document,
    mentions: BTreeMap<String, FinalResult>,
    processing_ms: u64,
}

#[derive(Serialize)]
struct LexiconResponse {
    target_resource: String,
    entity_type: String,
    unknown_id: String,
    stats: LexiconStats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pipeline = match std::env::var("CHEMNORM_CONFIG") {
        Ok(path) => {
            info!("Carregando configuração de {}", path);
            let config = NormalizerConfig::from_file(&path)?;
            NormalizationPipeline::from_config(&config)?
        }
        Err(_) => {
            warn!("CHEMNORM_CONFIG ausente, usando o léxico de demonstração");
            NormalizationPipeline::new(demo_lexicon(), TargetFilter::mesh(), DEMO_ENTITY_TYPE)
        }
    };
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/normalize", post(normalize_handler))
        .route("/document", post(document_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-documents", get(demo_documents_handler))
        .route("/lexicon", get(lexicon_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    let addr = std::env::var("CHEMNORM_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Servidor de normalização iniciado em http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Resolve uma menção isolada nas peneiras (sem contexto de documento)
async fn normalize_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NormalizeRequest>,
) -> Response {
    match normalize_mention(&state.pipeline, &req.mention) {
        Some(response) => Json(response).into_response(),
        None => bad_request("Menção vazia"),
    }
}

/// O nível 0 compara o texto exato recebido; o trim só decide se a menção é vazia.
fn normalize_mention(pipeline: &NormalizationPipeline, mention: &str) -> Option<NormalizeResponse> {
    if mention.trim().is_empty() {
        return None;
    }
    let trace = pipeline.resolver().trace(mention);
    let result = trace.result.clone();
    let names = pipeline.display_names(&result.candidate_ids);
    Some(NormalizeResponse { result, trace, names })
}

/// Normaliza um documento completo via HTTP POST (sem streaming)
async fn document_handler(
    State(state): State<Arc<AppState>>,
    Json(mut document): Json<Document>,
) -> Response {
    if document.annotations.is_empty() {
        return bad_request("Documento sem anotações");
    }

    let start = Instant::now();
    let mentions = state.pipeline.normalize_document(&mut document);

    Json(DocumentResponse {
        document,
        mentions,
        processing_ms: start.elapsed().as_millis() as u64,
    })
    .into_response()
}

/// Retorna os documentos de demonstração
async fn demo_documents_handler() -> impl IntoResponse {
    Json(demo_documents())
}

/// Estatísticas do léxico carregado
async fn lexicon_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pipeline = &state.pipeline;
    Json(LexiconResponse {
        target_resource: pipeline.filter().name().to_string(),
        entity_type: pipeline.entity_type().to_string(),
        unknown_id: pipeline.lexicon().unknown_id().to_string(),
        stats: pipeline.lexicon().stats(),
    })
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Texto puro vira um documento com uma única menção cobrindo o texto todo.
fn parse_ws_document(raw: &str, entity_type: &str) -> Option<Document> {
    if let Ok(document) = serde_json::from_str::<Document>(raw) {
        return Some(document);
    }
    let mention = raw.trim();
    if mention.is_empty() {
        return None;
    }
    let mut document = Document::new("ws", mention, "");
    document
        .annotations
        .push(Annotation::new(0, mention.len(), mention, entity_type));
    Some(document)
}

/// Lógica do WebSocket: recebe um documento, executa o pipeline e envia eventos em tempo real
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let Some(document) = parse_ws_document(&text, state.pipeline.entity_type()) else {
                    continue;
                };
                if document.annotations.is_empty() {
                    let error = serde_json::json!({ "error": "Documento sem anotações" });
                    if socket.send(Message::Text(error.to_string())).await.is_err() {
                        return;
                    }
                    continue;
                }

                info!(
                    "Normalizando via WebSocket [{}]: {} anotações",
                    document.id,
                    document.annotations.len()
                );

                // O pipeline é síncrono: roda fora do runtime
                let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
                let state_for_thread = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    state_for_thread.pipeline.normalize_streaming(&document, tx_std);
                });
                if let Err(e) = handle.await {
                    warn!("Pipeline interrompido: {}", e);
                    continue;
                }

                // Todos os eventos já foram emitidos quando a tarefa termina
                let events: Vec<PipelineEvent> = rx_std.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para animação visual (passo a passo)
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
