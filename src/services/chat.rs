//! Chat assistant: forwards to an external workflow webhook and falls back to
//! canned local answers when the webhook is absent or misbehaves.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat webhook is not configured")]
    NotConfigured,
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook answered with status {0}")]
    Status(u16),
    #[error("webhook answer has no reply text")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
    pub user: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Webhook,
    Simulated,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub source: ReplySource,
}

#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    webhook_url: Option<String>,
}

impl ChatClient {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, ChatError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, webhook_url })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn ask_webhook(&self, payload: &WebhookPayload<'_>) -> Result<String, ChatError> {
        let url = self.webhook_url.as_deref().ok_or(ChatError::NotConfigured)?;
        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }
        let body: Value = response.json().await?;
        extract_reply(&body).ok_or(ChatError::EmptyReply)
    }

    /// Webhook answer when possible, local simulation otherwise.
    pub async fn reply(&self, payload: &WebhookPayload<'_>) -> ChatReply {
        match self.ask_webhook(payload).await {
            Ok(reply) => ChatReply { reply, source: ReplySource::Webhook },
            Err(ChatError::NotConfigured) => {
                debug!("Chat webhook not configured, using simulated reply");
                simulated(payload.message)
            }
            Err(e) => {
                warn!(error = %e, session_id = payload.session_id, "Chat webhook failed, using simulated reply");
                simulated(payload.message)
            }
        }
    }
}

fn simulated(message: &str) -> ChatReply {
    ChatReply { reply: simulated_reply(message), source: ReplySource::Simulated }
}

/// First non-blank string among `output`, `reply`, `message`, `text`.
/// Arrays are unwrapped to their first element.
pub fn extract_reply(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.first().and_then(extract_reply),
        Value::Object(map) => ["output", "reply", "message", "text"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            }),
        _ => None,
    }
}

fn fold(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

const TOPICS: &[(&[&str], &str)] = &[
    (
        &["comissao", "comissoes"],
        "As comissões são calculadas pela regra ativa do vendedor na data da venda. \
         Consulte o desempenho do vendedor para ver valores pendentes e pagos.",
    ),
    (
        &["venda", "vendas", "vendi", "faturamento"],
        "Para acompanhar as vendas, abra o relatório mensal: ele mostra faturamento, \
         quantidade de vendas e ticket médio do período.",
    ),
    (
        &["estoque", "produto", "produtos", "peca", "pecas"],
        "O resumo de estoque mostra quantas peças estão disponíveis, reservadas, vendidas \
         e inativas, além do valor de custo e de venda do estoque.",
    ),
    (
        &["financeiro", "despesa", "despesas", "receita", "receitas", "caixa", "lucro", "balanco"],
        "No financeiro você encontra o balanço (receitas menos despesas), o fluxo de caixa \
         diário e a lucratividade do mês.",
    ),
    (
        &["meta", "metas", "objetivo"],
        "As metas mostram o progresso em porcentagem do valor atual sobre o alvo, \
         limitado a 100%.",
    ),
    (
        &["cliente", "clientes", "pontos", "resgate"],
        "Clientes acumulam pontos a cada compra. Pedidos de resgate ficam pendentes \
         até um gerente aprovar ou rejeitar.",
    ),
    (
        &["oi", "ola", "bom dia", "boa tarde", "boa noite"],
        "Olá! Sou o assistente do brechó. Posso ajudar com vendas, estoque, financeiro, \
         comissões, metas e clientes.",
    ),
];

const DEFAULT_REPLY: &str = "Não entendi sua pergunta. Pergunte sobre vendas, estoque, \
     financeiro, comissões, metas ou clientes.";

/// Keyword-routed canned answer used when the webhook is unavailable.
pub fn simulated_reply(message: &str) -> String {
    let folded = fold(message);
    let words: Vec<&str> = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let joined = words.join(" ");

    TOPICS
        .iter()
        .find(|(keywords, _)| {
            keywords.iter().any(|k| {
                if k.contains(' ') {
                    joined.contains(k)
                } else {
                    words.contains(k)
                }
            })
        })
        .map(|(_, reply)| reply.to_string())
        .unwrap_or_else(|| DEFAULT_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_known_field() {
        assert_eq!(extract_reply(&json!({"output": "oi"})), Some("oi".into()));
        assert_eq!(extract_reply(&json!({"reply": " ok "})), Some("ok".into()));
        assert_eq!(
            extract_reply(&json!({"output": "", "text": "fallback"})),
            Some("fallback".into())
        );
        assert_eq!(extract_reply(&json!([{"message": "from array"}])), Some("from array".into()));
        assert_eq!(extract_reply(&json!("plain")), Some("plain".into()));
        assert_eq!(extract_reply(&json!({"data": 1})), None);
        assert_eq!(extract_reply(&json!([])), None);
    }

    #[test]
    fn routes_by_keyword_ignoring_case_and_accents() {
        assert!(simulated_reply("Como estão as VENDAS?").contains("relatório mensal"));
        assert!(simulated_reply("Qual a comissão da Ana?").contains("comissões"));
        assert!(simulated_reply("quanto tenho em estoque").contains("resumo de estoque"));
        assert!(simulated_reply("Balanço do mês").contains("balanço"));
        assert!(simulated_reply("Bom dia!").starts_with("Olá"));
    }

    #[test]
    fn unknown_questions_get_help_text() {
        assert_eq!(simulated_reply("qual a previsão do tempo?"), DEFAULT_REPLY);
    }

    #[test]
    fn short_keywords_match_whole_words_only() {
        // "oi" inside "depois" must not trigger the greeting.
        assert_eq!(simulated_reply("depois"), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn unconfigured_client_falls_back_to_simulation() {
        let client = ChatClient::new(None, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        let payload = WebhookPayload { message: "metas", session_id: "s1", user: "ana" };
        let reply = client.reply(&payload).await;
        assert_eq!(reply.source, ReplySource::Simulated);
        assert!(reply.reply.contains("metas"));
    }

    #[tokio::test]
    async fn unreachable_webhook_falls_back_to_simulation() {
        let client = ChatClient::new(
            Some("http://127.0.0.1:9/webhook".to_string()),
            Duration::from_millis(500),
        )
        .unwrap();
        let payload = WebhookPayload { message: "oi", session_id: "s1", user: "ana" };
        let reply = client.reply(&payload).await;
        assert_eq!(reply.source, ReplySource::Simulated);
    }

    async fn local_webhook() -> String {
        use axum::{http::StatusCode, routing::post, Json, Router};

        let app = Router::new()
            .route(
                "/ok",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "output": format!("sessao {}", body["sessionId"].as_str().unwrap_or("")) }))
                }),
            )
            .route("/fail", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/garbage", post(|| async { "not json" }))
            .route("/blank", post(|| async { Json(json!({ "output": "  " })) }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(url: String) -> ChatClient {
        ChatClient::new(Some(url), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn webhook_answer_is_used_when_available() {
        let base = local_webhook().await;
        let payload = WebhookPayload { message: "oi", session_id: "s-42", user: "ana" };
        let reply = client_for(format!("{base}/ok")).reply(&payload).await;
        assert_eq!(reply.source, ReplySource::Webhook);
        assert_eq!(reply.reply, "sessao s-42");
    }

    #[tokio::test]
    async fn webhook_error_status_falls_back_to_simulation() {
        let base = local_webhook().await;
        let client = client_for(format!("{base}/fail"));
        let payload = WebhookPayload { message: "metas", session_id: "s1", user: "ana" };
        assert!(matches!(client.ask_webhook(&payload).await, Err(ChatError::Status(500))));
        let reply = client.reply(&payload).await;
        assert_eq!(reply.source, ReplySource::Simulated);
        assert!(reply.reply.contains("metas"));
    }

    #[tokio::test]
    async fn unparsable_webhook_body_falls_back_to_simulation() {
        let base = local_webhook().await;
        let payload = WebhookPayload { message: "oi", session_id: "s1", user: "ana" };

        let client = client_for(format!("{base}/garbage"));
        assert!(matches!(client.ask_webhook(&payload).await, Err(ChatError::Transport(_))));
        assert_eq!(client.reply(&payload).await.source, ReplySource::Simulated);

        let client = client_for(format!("{base}/blank"));
        assert!(matches!(client.ask_webhook(&payload).await, Err(ChatError::EmptyReply)));
        assert_eq!(client.reply(&payload).await.source, ReplySource::Simulated);
    }
}
