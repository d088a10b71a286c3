//! Prompt text sent to the model. Replies are parsed by the caller.

use orchestrator_core::model::LocationPair;

pub const INTENT_SYSTEM: &str = r#"你负责识别出行路径规划对话中的用户意图。只输出一个JSON对象。

用户想从一个地点去另一个地点时：
{"intent_type": "route_request", "locations": ["起点", "终点"]}

用户在纠正之前的地址或规划结果时：
{"intent_type": "correction", "correction_info": "用户的纠正内容", "suggested_address": "用户给出的正确地址"}

其他情况：
{"intent_type": "other", "reason": "简要原因"}

规则：
- 地点名称保留用户的原话，不要补全或改写
- "不对"、"错了"、"应该是"、"在XX区"之类的说法通常表示纠正"#;

pub fn intent_user(text: &str) -> String {
    format!("用户输入：{}", text)
}

pub fn city_system(locations: &LocationPair, text: &str) -> String {
    format!(
        r#"用户原话："{text}"
识别出的起点："{origin}"，终点："{destination}"

判断用户原话里是否已经给出了这两个地点所在的城市，只输出一个JSON对象。

城市已经明确（例如"深圳宝安壹方城"、"北京王府井"）：
{{"need_user_input": false, "suggested_city_info": "推断出的城市信息", "analysis": "判断依据"}}

无法确定城市，需要询问用户：
{{"need_user_input": true, "question": "要问用户的问题", "analysis": "你对这两个地点的分析"}}

只有确实无法判断时才询问用户；地点名里已经带有城市或区县时不要再问。"#,
        text = text,
        origin = locations.origin,
        destination = locations.destination,
    )
}

/// Single-line reply: `城市市地点1,城市市地点2`.
pub fn delimited_addresses(locations: &LocationPair, city_hint: &str) -> String {
    format!(
        r#"用户要规划从"{origin}"到"{destination}"的路线。
关于城市，用户的回答是："{hint}"

把两个地点补全成"城市市+地点名"的形式，只输出一行，两个地址之间用英文逗号分隔：
城市市地点1,城市市地点2

参考：
- 用户回答"深圳,广州"时，输出 深圳市{origin},广州市{destination}
- 用户分别说明了每个地点的城市时，按对应关系补全
- 用户只回答"是"之类的确认时，根据地点名本身判断城市

不要输出JSON，不要解释。"#,
        origin = locations.origin,
        destination = locations.destination,
        hint = city_hint,
    )
}

/// Two labeled lines, used after the single-line reply failed to parse.
pub fn labeled_addresses(locations: &LocationPair, city_hint: &str) -> String {
    format!(
        r#"用户要从"{origin}"到"{destination}"，关于城市用户说："{hint}"
按"城市市+地点"的格式给出两个完整地址，只填结果：

第一个地址：
第二个地址："#,
        origin = locations.origin,
        destination = locations.destination,
        hint = city_hint,
    )
}

pub fn corrected_address(correction: &str) -> String {
    format!(
        r#"用户对之前的地址提出了纠正："{correction}"

从中提取出准确、完整的地址。用户可能是在说明某地所在的区域（如"壹方城在宝安区"），也可能是在给出准确名称（如"应该是宝安壹方城"）。

直接输出完整地址，例如：深圳市宝安区壹方城
不要任何解释。"#,
        correction = correction,
    )
}
