use serde::{Deserialize, Serialize};

use crate::services::chat::ReplySource;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub source: ReplySource,
    pub session_id: String,
}
