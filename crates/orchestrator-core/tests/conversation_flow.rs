use std::sync::Arc;
use std::time::Duration;

use orchestrator_core::mocks::*;
use orchestrator_core::model::{CityAnalysis, IntentResult};
use orchestrator_core::ports::AddressPrompt;
use orchestrator_core::session::Stage;
use orchestrator_core::{CoreConfig, OrchestratorCore};
use protocol::RouteRequest;

fn turn(text: &str, session: &str) -> RouteRequest {
    RouteRequest::new(text, Some(session.to_string()))
}

fn route_intent(a: &str, b: &str) -> IntentResult {
    IntentResult::RouteRequest { locations: vec![a.to_string(), b.to_string()] }
}

async fn stage_of<I, M>(core: &OrchestratorCore<I, M>, session: &str) -> Option<Stage>
where
    I: orchestrator_core::ports::InterpreterPort,
    M: orchestrator_core::ports::MapPort,
{
    let handle = core.sessions().get(session).await?;
    let stage = handle.lock().await.stage;
    Some(stage)
}

#[tokio::test]
async fn ambiguous_city_then_transit_itinerary() {
    let (interpreter, maps) = demo_collaborators(27_000);
    let core = OrchestratorCore::new(interpreter, maps);

    let first = core.handle(turn(DEMO_REQUEST, "s1")).await.unwrap();
    assert!(first.success);
    assert!(first.need_city_confirmation);
    assert!(first.message.starts_with("🤔 "));
    assert!(first.message.contains("\n\n❓ 请问莲花山和壹方城分别在哪个城市？"));
    assert_eq!(first.session_id.as_deref(), Some("s1"));
    assert_eq!(stage_of(&core, "s1").await, Some(Stage::WaitingCity));

    let second = core.handle(turn(DEMO_CITY_ANSWER, "s1")).await.unwrap();
    assert!(second.success, "{}", second.message);
    assert!(!second.need_city_confirmation);
    assert!(second.message.contains("从 深圳市莲花山 到 深圳市壹方城"));
    assert!(second.message.contains("📏 **直线距离**: 27000米"));
    assert!(second.message.contains("## 🚇 公共交通方案"));
    assert!(second.message.contains("地铁1号线"));
    assert_eq!(stage_of(&core, "s1").await, Some(Stage::Start));
}

#[tokio::test]
async fn short_hop_is_walked() {
    let (interpreter, maps) = demo_collaborators(800);
    let core = OrchestratorCore::new(interpreter, maps);

    core.handle(turn(DEMO_REQUEST, "walk")).await.unwrap();
    let reply = core.handle(turn(DEMO_CITY_ANSWER, "walk")).await.unwrap();
    assert!(reply.success);
    assert!(reply.message.contains("## 🚶 步行方案"));
    assert!(reply.message.contains("**时间**: 约8分钟"));
    assert!(reply.message.contains("(沿红荔路)"));
}

#[tokio::test]
async fn threshold_distance_walks_and_one_more_meter_rides() {
    let (interpreter, maps) = demo_collaborators(1000);
    let core = OrchestratorCore::new(interpreter, maps);
    core.handle(turn(DEMO_REQUEST, "edge")).await.unwrap();
    let reply = core.handle(turn(DEMO_CITY_ANSWER, "edge")).await.unwrap();
    assert!(reply.message.contains("步行方案"));

    let (interpreter, maps) = demo_collaborators(1001);
    let core = OrchestratorCore::new(interpreter, maps);
    core.handle(turn(DEMO_REQUEST, "edge")).await.unwrap();
    let reply = core.handle(turn(DEMO_CITY_ANSWER, "edge")).await.unwrap();
    assert!(reply.message.contains("公共交通方案"));
}

#[tokio::test]
async fn transit_query_uses_configured_city() {
    let (interpreter, maps) = demo_collaborators(5_000);
    let config = CoreConfig { transit_city: "广州".into(), ..CoreConfig::default() };
    let core = OrchestratorCore::with_config(interpreter, maps, config);

    core.handle(turn(DEMO_REQUEST, "gz")).await.unwrap();
    core.handle(turn(DEMO_CITY_ANSWER, "gz")).await.unwrap();
    assert_eq!(core.maps().transit_cities().await, vec!["广州".to_string()]);
    assert_eq!(core.maps().walking_calls(), 0);
}

#[tokio::test]
async fn resolved_city_plans_in_one_turn() {
    let interpreter = MockInterpreter::new()
        .with_intent("从深圳市A到广州市B", route_intent("深圳市A", "广州市B"))
        .with_city(CityAnalysis::Resolved {
            suggested_city_info: "深圳,广州".into(),
            analysis: "用户已说明城市".into(),
        })
        .with_address_reply(AddressPrompt::Delimited, "深圳市A,广州市B");
    let maps = MockMap::new()
        .with_geocode("深圳市A", geocode_reply("114.0,22.5"))
        .with_geocode("广州市B", geocode_reply("113.2,23.1"))
        .with_distance(distance_reply(120_000))
        .with_transit(transit_reply(120_000, 7200));
    let core = OrchestratorCore::new(interpreter, maps);

    let reply = core.handle(turn("从深圳市A到广州市B", "one")).await.unwrap();
    assert!(reply.success);
    assert!(!reply.need_city_confirmation);
    assert!(reply.message.contains("从 深圳市A 到 广州市B"));
    assert_eq!(stage_of(&core, "one").await, Some(Stage::Start));
}

#[tokio::test]
async fn unknown_geocode_names_the_endpoint() {
    let interpreter = MockInterpreter::new()
        .with_intent("从X到Y", route_intent("X", "Y"))
        .with_city(CityAnalysis::NeedsInput { question: "哪个城市？".into(), analysis: "不确定".into() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市不存在的地方,深圳市壹方城");
    let maps = MockMap::new()
        .with_geocode("深圳市壹方城", geocode_reply("113.885,22.557"))
        .with_distance(distance_reply(9000));
    let core = OrchestratorCore::new(interpreter, maps);

    core.handle(turn("从X到Y", "nf")).await.unwrap();
    let reply = core.handle(turn("深圳", "nf")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 无法找到起点 '深圳市不存在的地方' 的位置信息，请检查地址是否正确");
    assert_eq!(stage_of(&core, "nf").await, Some(Stage::Start));
}

#[tokio::test]
async fn missing_distance_and_route_are_reported() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_city(CityAnalysis::Resolved { suggested_city_info: "深圳".into(), analysis: String::new() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市A,深圳市B");
    let maps = MockMap::new()
        .with_geocode("深圳市A", geocode_reply("114.0,22.5"))
        .with_geocode("深圳市B", geocode_reply("114.1,22.6"));
    let core = OrchestratorCore::new(interpreter, maps);
    let reply = core.handle(turn("go", "d")).await.unwrap();
    assert_eq!(reply.message, "❌ 无法获取距离信息");

    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_city(CityAnalysis::Resolved { suggested_city_info: "深圳".into(), analysis: String::new() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市A,深圳市B");
    let maps = MockMap::new()
        .with_geocode("深圳市A", geocode_reply("114.0,22.5"))
        .with_geocode("深圳市B", geocode_reply("114.1,22.6"))
        .with_distance(distance_reply(4000))
        .with_transit(serde_json::json!({ "status": "1", "route": { "transits": [] } }));
    let core = OrchestratorCore::new(interpreter, maps);
    let reply = core.handle(turn("go", "r")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 无法获取从 深圳市A 到 深圳市B 的路线信息");
}

#[tokio::test]
async fn labeled_reply_is_tried_once_after_delimited_fails() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("莲花山", "壹方城"))
        .with_city(CityAnalysis::NeedsInput { question: "?".into(), analysis: "?".into() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市莲花山")
        .with_address_reply(AddressPrompt::Labeled, "第一个地址：深圳市莲花山\n第二个地址：深圳市壹方城");
    let maps = MockMap::new()
        .with_geocode("深圳市莲花山", geocode_reply("114.056,22.556"))
        .with_geocode("深圳市壹方城", geocode_reply("113.885,22.557"))
        .with_distance(distance_reply(27_000))
        .with_transit(transit_reply(27_000, 2400));
    let core = OrchestratorCore::new(interpreter, maps);

    core.handle(turn("go", "fb")).await.unwrap();
    let reply = core.handle(turn("深圳", "fb")).await.unwrap();
    assert!(reply.success, "{}", reply.message);
    assert!(reply.message.contains("从 深圳市莲花山 到 深圳市壹方城"));
    assert_eq!(core.interpreter().address_calls(AddressPrompt::Delimited), 1);
    assert_eq!(core.interpreter().address_calls(AddressPrompt::Labeled), 1);
}

#[tokio::test]
async fn formatting_failure_resets_the_session() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_city(CityAnalysis::NeedsInput { question: "?".into(), analysis: "?".into() })
        .with_address_reply(AddressPrompt::Delimited, "只有一个")
        .with_address_reply(AddressPrompt::Labeled, "也没有标签");
    let core = OrchestratorCore::new(interpreter, MockMap::new());

    core.handle(turn("go", "ff")).await.unwrap();
    let reply = core.handle(turn("深圳", "ff")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 地址格式化失败，请重新提供清晰的城市信息");
    assert_eq!(stage_of(&core, "ff").await, Some(Stage::Start));
    assert_eq!(core.interpreter().address_calls(AddressPrompt::Labeled), 1);
}

#[tokio::test]
async fn resolved_path_formatting_failure_has_its_own_wording() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_city(CityAnalysis::Resolved { suggested_city_info: "深圳".into(), analysis: String::new() });
    let core = OrchestratorCore::new(interpreter, MockMap::new());

    let reply = core.handle(turn("go", "rf")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 地址格式化失败，请提供更详细的地址信息");
}

#[tokio::test]
async fn city_analysis_failure_asks_generic_question() {
    let interpreter = MockInterpreter::new().with_intent("从甲到乙", route_intent("甲", "乙"));
    let core = OrchestratorCore::new(interpreter, MockMap::new());

    let reply = core.handle(turn("从甲到乙", "cf")).await.unwrap();
    assert!(reply.need_city_confirmation);
    assert_eq!(reply.message, "🤔 无法分析地点归属\n\n❓ 请告诉我'甲'和'乙'分别在哪个城市？");
    assert_eq!(stage_of(&core, "cf").await, Some(Stage::WaitingCity));
}

#[tokio::test]
async fn wrong_number_of_locations_is_rejected() {
    let interpreter = MockInterpreter::new()
        .with_intent("去公园", IntentResult::RouteRequest { locations: vec!["公园".into()] })
        .with_intent(
            "三个地方",
            IntentResult::RouteRequest { locations: vec!["A".into(), "B".into(), "C".into()] },
        );
    let core = OrchestratorCore::new(interpreter, MockMap::new());

    for text in ["去公园", "三个地方"] {
        let reply = core.handle(turn(text, "n")).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "❌ 未能正确识别起点和终点");
        assert_eq!(stage_of(&core, "n").await, Some(Stage::Start));
    }
}

#[tokio::test]
async fn non_route_input_and_interpreter_failure() {
    let interpreter = MockInterpreter::new()
        .with_intent("今天天气怎么样", IntentResult::Other { reason: "询问天气".into() });
    let core = OrchestratorCore::new(interpreter, MockMap::new());

    let reply = core.handle(turn("今天天气怎么样", "o")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 无法识别路径规划需求: 询问天气");

    let reply = core.handle(turn("完全无法解析", "o")).await.unwrap();
    assert_eq!(reply.message, "❌ 无法识别路径规划需求: 识别过程出错");
    assert_eq!(stage_of(&core, "o").await, Some(Stage::Start));
}

#[tokio::test]
async fn correction_reports_whether_address_was_found() {
    let correction = IntentResult::Correction {
        correction_info: "莲花山应该是福田区的莲花山公园".into(),
        suggested_address: "深圳市福田区莲花山公园".into(),
    };
    let interpreter = MockInterpreter::new()
        .with_intent("不对，是福田区的莲花山公园", correction.clone())
        .with_corrected_address("深圳市福田区莲花山公园");
    let maps = MockMap::new().with_geocode("深圳市福田区莲花山公园", geocode_reply("114.06,22.55"));
    let core = OrchestratorCore::new(interpreter, maps);

    let reply = core.handle(turn("不对，是福田区的莲花山公园", "c")).await.unwrap();
    assert!(reply.success);
    assert_eq!(
        reply.message,
        "✅ 找到了 深圳市福田区莲花山公园 的位置信息。如需重新规划路径，请告诉我起点和终点。"
    );
    assert_eq!(stage_of(&core, "c").await, Some(Stage::Start));

    let interpreter = MockInterpreter::new()
        .with_intent("改一下", correction)
        .with_corrected_address("火星基地");
    let core = OrchestratorCore::new(interpreter, MockMap::new());
    let reply = core.handle(turn("改一下", "c")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 抱歉，无法找到 火星基地 的位置信息，请提供更详细的地址。");
}

#[tokio::test]
async fn correction_extraction_failure_is_reported() {
    let interpreter = MockInterpreter::new().with_intent(
        "纠正",
        IntentResult::Correction { correction_info: "x".into(), suggested_address: String::new() },
    );
    let core = OrchestratorCore::new(interpreter, MockMap::new());
    let reply = core.handle(turn("纠正", "ce")).await.unwrap();
    assert!(!reply.success);
    assert!(reply.message.starts_with("❌ 处理纠错时出现错误: "));
}

#[tokio::test]
async fn slow_interpreter_is_cut_off() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_delay(Duration::from_millis(200));
    let config = CoreConfig { call_timeout: Duration::from_millis(20), ..CoreConfig::default() };
    let core = OrchestratorCore::with_config(interpreter, MockMap::new(), config);

    let reply = core.handle(turn("go", "slow")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 无法识别路径规划需求: 识别过程出错");
    assert_eq!(stage_of(&core, "slow").await, Some(Stage::Start));
}

#[tokio::test]
async fn concurrent_turns_on_one_session_are_serialized() {
    let (interpreter, maps) = demo_collaborators(27_000);
    let interpreter = interpreter.with_delay(Duration::from_millis(10));
    let core = Arc::new(OrchestratorCore::new(interpreter, maps));

    let a = tokio::spawn({
        let core = core.clone();
        async move { core.handle(turn(DEMO_REQUEST, "race")).await.unwrap() }
    });
    let b = tokio::spawn({
        let core = core.clone();
        async move { core.handle(turn(DEMO_REQUEST, "race")).await.unwrap() }
    });
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    // Whichever ran second saw WAITING_CITY and treated the text as a city answer.
    let asked = [&a, &b].iter().filter(|r| r.need_city_confirmation).count();
    assert_eq!(asked, 1);
    let stage = stage_of(&core, "race").await.unwrap();
    assert!(matches!(stage, Stage::Start | Stage::WaitingCity));
}

#[tokio::test]
async fn six_hundred_meters_walks_and_resets() {
    let (interpreter, maps) = demo_collaborators(600);
    let core = OrchestratorCore::new(interpreter, maps);

    core.handle(turn(DEMO_REQUEST, "600")).await.unwrap();
    let reply = core.handle(turn(DEMO_CITY_ANSWER, "600")).await.unwrap();
    assert!(reply.success);
    assert!(reply.message.contains("🚶 步行方案"));
    assert_eq!(core.maps().walking_calls(), 1);
    assert_eq!(core.maps().transit_calls(), 0);
    assert_eq!(stage_of(&core, "600").await, Some(Stage::Start));
}

#[tokio::test]
async fn transit_without_options_fails_and_resets() {
    let (interpreter, maps) = demo_collaborators(5000);
    let maps = maps.with_transit(serde_json::json!({ "status": "1", "route": { "distance": "5000", "transits": [] } }));
    let core = OrchestratorCore::new(interpreter, maps);

    core.handle(turn(DEMO_REQUEST, "5k")).await.unwrap();
    let reply = core.handle(turn(DEMO_CITY_ANSWER, "5k")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 无法获取从 深圳市莲花山 到 深圳市壹方城 的路线信息");
    assert_eq!(core.maps().transit_calls(), 1);
    assert_eq!(stage_of(&core, "5k").await, Some(Stage::Start));
}

#[tokio::test]
async fn identical_fully_specified_requests_answer_identically() {
    let interpreter = MockInterpreter::new()
        .with_intent("从深圳莲花山到深圳壹方城", route_intent("深圳莲花山", "深圳壹方城"))
        .with_city(CityAnalysis::Resolved { suggested_city_info: "深圳".into(), analysis: "含城市".into() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市莲花山,深圳市壹方城");
    let (_, maps) = demo_collaborators(27_000);
    let core = OrchestratorCore::new(interpreter, maps);

    let first = core.handle(turn("从深圳莲花山到深圳壹方城", "fresh-a")).await.unwrap();
    let second = core.handle(turn("从深圳莲花山到深圳壹方城", "fresh-b")).await.unwrap();
    assert!(first.success);
    assert_eq!(first.message, second.message);
    assert_eq!(first.need_city_confirmation, second.need_city_confirmation);
}

#[tokio::test]
async fn slow_map_reports_a_timeout() {
    let interpreter = MockInterpreter::new()
        .with_intent("go", route_intent("A", "B"))
        .with_city(CityAnalysis::Resolved { suggested_city_info: "深圳".into(), analysis: String::new() })
        .with_address_reply(AddressPrompt::Delimited, "深圳市A,深圳市B");
    let maps = MockMap::new()
        .with_geocode("深圳市A", geocode_reply("114.0,22.5"))
        .with_geocode("深圳市B", geocode_reply("114.1,22.6"))
        .with_delay(Duration::from_millis(200));
    let config = CoreConfig { call_timeout: Duration::from_millis(20), ..CoreConfig::default() };
    let core = OrchestratorCore::with_config(interpreter, maps, config);

    let reply = core.handle(turn("go", "slow-map")).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.message, "❌ 外部服务响应超时，请稍后重试");
    assert_eq!(stage_of(&core, "slow-map").await, Some(Stage::Start));
}
