use rand::seq::SliceRandom;

const TOPICS: &[&str] = &[
    "大模型测试", "AI驱动测试", "测试用例自动生成", "智能体测试",
    "LLM测试实践", "提示词测试", "RAG系统测试", "AI安全测试",
    "测试数据生成", "自愈测试脚本", "测试左移", "AI测试工具",
    "模型评估", "对抗测试", "AI在CI/CD中的应用", "测试覆盖率优化",
    "测试预测分析", "智能回归测试", "多模态测试", "A/B测试自动化",
];

const ANGLES: &[&str] = &[
    "2026年最新趋势", "实战案例", "技术深度解析", "工具对比",
    "常见误区", "性能优化", "落地实践", "未来展望",
    "与传统的对比", "团队转型", "成本效益分析", "开源方案",
];

pub trait TopicSource: Send + Sync {
    fn topic(&self) -> String;
}

/// Random topic/angle pair poured into one of a few title templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTopicSelector;

impl TopicSource for RandomTopicSelector {
    fn topic(&self) -> String {
        let mut rng = rand::thread_rng();
        let topic = TOPICS.choose(&mut rng).copied().unwrap_or(TOPICS[0]);
        let angle = ANGLES.choose(&mut rng).copied().unwrap_or(ANGLES[0]);
        let templates = [
            format!("{topic}：{angle}"),
            format!("{angle}：{topic}实战"),
            format!("2026年{topic}的{angle}"),
            format!("深度解读：{topic}{angle}"),
            format!("测试专家必看：{topic}{angle}"),
        ];
        templates
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| topic.to_string())
    }
}

/// Always the same topic; used for `--topic` and in tests.
#[derive(Debug, Clone)]
pub struct FixedTopic(pub String);

impl TopicSource for FixedTopic {
    fn topic(&self) -> String {
        self.0.clone()
    }
}
