//! Live calls against the configured endpoint. Run with `--ignored` and OPENAI_API_KEY set.
use llm::{ChatMessage, ChatOptions, Client};

fn init_env() {
    // Load .env from workspace root (two levels up from tests)
    let _ = dotenvy::from_path("../../.env");
}

#[tokio::test]
#[ignore = "requires OPENAI_API_KEY and network access"]
async fn basic_call() {
    init_env();
    let cli = Client::from_env_openai().unwrap();
    let out = cli.simple("Say OK.").await.unwrap();
    println!("Response: {}", out);
    assert!(!out.trim().is_empty());
}

#[tokio::test]
#[ignore = "requires OPENAI_API_KEY and network access"]
async fn json_object_mode() {
    init_env();
    let cli = Client::from_env_openai().unwrap();
    let msgs = vec![
        ChatMessage::system("Reply ONLY as valid JSON with a field 'ok': true"),
        ChatMessage::user("ack"),
    ];
    let out = cli.chat(&msgs, ChatOptions { json_object: true, temperature: Some(0.0) }).await.unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v.get("ok").and_then(|x| x.as_bool()), Some(true));
}
