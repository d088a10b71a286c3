use orchestrator_core::{mocks, OrchestratorCore};
use protocol::RouteRequest;

/// Two-turn conversation against scripted collaborators.
///
/// Pass `--walk` to make the destinations close enough to walk.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let walk = std::env::args().skip(1).any(|a| a == "--walk");
    let meters = if walk { 800 } else { 27_000 };
    let (interpreter, maps) = mocks::demo_collaborators(meters);
    let core = OrchestratorCore::new(interpreter, maps);

    for text in [mocks::DEMO_REQUEST, mocks::DEMO_CITY_ANSWER] {
        println!("> {}", text);
        let reply = core.handle(RouteRequest::new(text, Some("demo".to_string()))).await?;
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }

    if let Some(snapshot) = core.snapshot("demo").await {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
