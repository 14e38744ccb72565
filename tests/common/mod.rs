use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use shellq::config::ModelConfig;
use shellq::providers::{Message, ProviderKind};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Model entry pointing at a mock server
#[allow(dead_code)]
pub fn model_config(provider: ProviderKind, endpoint: String, auth_env_var: &str) -> ModelConfig {
    ModelConfig {
        name: "test-model".to_string(),
        endpoint,
        provider,
        auth_env_var: auth_env_var.to_string(),
        org_env_var: None,
        project_env_var: None,
        temperature: 0.0,
        prompt: vec![Message::system("You are a terminal assistant.")],
    }
}

/// Server-sent events body carrying `payloads` as data frames
#[allow(dead_code)]
pub fn sse_body(payloads: &[String], done: bool) -> String {
    let mut body: String = payloads
        .iter()
        .map(|payload| format!("data: {}\n\n", payload))
        .collect();
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

#[allow(dead_code)]
pub fn openai_chunk(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": content } }]
    })
    .to_string()
}

#[allow(dead_code)]
pub fn gemini_chunk(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}
