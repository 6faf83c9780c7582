// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Blocking client for the OpenAI-compatible chat completions API used for
//! the finance assistant and receipt scanning.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::Transaction;

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_CHAT_MODEL: &str = "qwen-max";
pub const DEFAULT_VISION_MODEL: &str = "qwen2-vl-7b-instruct";
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";

pub const RECEIPT_CATEGORIES: [&str; 10] = [
    "Food & Dining",
    "Shopping",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Housing",
    "Health",
    "Education",
    "Travel",
    "Other",
];

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

#[derive(Error, Debug)]
pub enum AiError {
    #[error("DASHSCOPE_API_KEY is not set")]
    MissingApiKey,

    #[error("No image provided")]
    NoImage,

    #[error("Upstream API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Failed to parse receipt data")]
    Unparseable { raw_text: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AiError {
    /// HTTP status the proxy answers with for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoImage => 400,
            Self::Unparseable { .. } => 422,
            _ => 500,
        }
    }

    /// `{"error": ..}` body, with `rawText` when the model output was unusable.
    pub fn to_body(&self) -> Value {
        match self {
            Self::Unparseable { raw_text } => json!({ "error": self.to_string(), "rawText": raw_text }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub image_base64: String,
}

/// Receipt fields as read by the vision model. Every field is optional and
/// loosely typed; values of an unexpected shape are coerced, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    #[serde(default, deserialize_with = "lenient_text")]
    pub merchant: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReply {
    pub data: ReceiptData,
}

/// Accepts `12.5`, `"12.50"`, `"¥1,234.00"` or `null`.
fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_amount_text(&s),
        _ => None,
    })
}

fn value_text(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

/// Strings as-is; numbers, booleans and nested values as their JSON text.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_text(Value::deserialize(d)?))
}

/// Items may be strings, `{"name": ..}` objects or scalars. Nulls are dropped.
fn lenient_items<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let item = |v: Value| match v {
        Value::Object(mut obj) => match obj.remove("name") {
            Some(name @ Value::String(_)) => value_text(name),
            Some(_) | None => value_text(Value::Object(obj)),
        },
        other => value_text(other),
    };
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(item).collect(),
        other => item(other).into_iter().collect(),
    })
}

/// Strips currency symbols and thousands separators before parsing.
pub fn parse_amount_text(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pulls the outermost `{...}` block out of free-form model output.
///
/// Only text that is not JSON at all is `Unparseable`; any JSON object is
/// accepted and mapped field by field.
pub fn extract_receipt(raw_text: &str) -> Result<ReceiptData, AiError> {
    let unparseable = || AiError::Unparseable {
        raw_text: raw_text.to_string(),
    };
    let m = JSON_OBJECT.find(raw_text).ok_or_else(unparseable)?;
    let value: Value = serde_json::from_str(m.as_str()).map_err(|err| {
        tracing::warn!("model output is not valid JSON: {err}");
        unparseable()
    })?;
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!("receipt JSON could not be mapped: {err}");
        unparseable()
    })
}

pub fn assistant_system_prompt(transactions: &[Transaction]) -> Result<String, AiError> {
    let data = serde_json::to_string(transactions)
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
    Ok(format!(
        "You are a professional and considerate personal financial assistant.

Follow these guidelines:
1. Analyze the user's financial data to provide personalized insights.
2. Be empathetic and supportive when discussing financial challenges.
3. Offer practical, actionable advice based on the user's spending patterns.
4. Maintain a professional but friendly tone.
5. Refer to specific transaction data when relevant to show personalization.
6. Focus on helping the user improve their financial health.
7. Never make up information - only use the data provided.
8. If uncertain about something, acknowledge the limitation.

You have access to the following financial data for reference:
{data}"
    ))
}

pub fn receipt_system_prompt() -> String {
    format!(
        r#"You are a receipt scanning assistant. Analyze the receipt image and extract the following information in JSON format ONLY:
{{
  "merchant": "Store or business name",
  "amount": "Total amount as a number without currency symbols",
  "date": "Date in YYYY-MM-DD format",
  "items": ["Item 1", "Item 2", "...etc"],
  "category": "One of: {}"
}}

If you can't determine a value, use null. Don't include any explanations, just the JSON."#,
        RECEIPT_CATEGORIES.join(", ")
    )
}

pub fn chat_body(model: &str, message: &str, transactions: &[Transaction]) -> Result<Value, AiError> {
    let system = assistant_system_prompt(transactions)?;
    Ok(json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": message }
        ],
        "temperature": 0.7
    }))
}

pub fn scan_body(model: &str, image_base64: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": [{ "type": "text", "text": receipt_system_prompt() }]
            },
            {
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/jpeg;base64,{}", image_base64) }
                    },
                    { "type": "text", "text": "Extract the receipt information into the required JSON format." }
                ]
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// First choice's message text out of a completions response body.
pub fn completion_text(body: &Value) -> Result<String, AiError> {
    let c: Completion = serde_json::from_value(body.clone())
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
    c.choices
        .into_iter()
        .next()
        .map(|ch| ch.message.content)
        .ok_or_else(|| AiError::MalformedResponse("no choices returned".into()))
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub vision_model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

pub struct AiClient {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    vision_model: String,
}

impl AiClient {
    pub fn new(client: Client, settings: AiSettings) -> Result<Self, AiError> {
        let api_key = settings.api_key.ok_or(AiError::MissingApiKey)?;
        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            chat_model: settings.chat_model,
            vision_model: settings.vision_model,
        })
    }

    fn complete(&self, body: &Value) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(%url, model = %body["model"], "sending completion request");
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()?;
        let status = res.status();
        let payload: Value = res.json().unwrap_or(Value::Null);
        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();
            tracing::error!(status = status.as_u16(), "upstream error: {message}");
            return Err(AiError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        completion_text(&payload)
    }

    /// Asks the assistant a question with the full transaction history as context.
    pub fn chat(&self, req: &ChatRequest) -> Result<ChatReply, AiError> {
        let body = chat_body(&self.chat_model, &req.message, &req.transactions)?;
        let response = self.complete(&body)?;
        Ok(ChatReply { response })
    }

    pub fn scan_receipt(&self, req: &ScanRequest) -> Result<ScanReply, AiError> {
        if req.image_base64.trim().is_empty() {
            return Err(AiError::NoImage);
        }
        let body = scan_body(&self.vision_model, &req.image_base64);
        let text = self.complete(&body)?;
        let data = extract_receipt(&text)?;
        Ok(ScanReply { data })
    }
}
