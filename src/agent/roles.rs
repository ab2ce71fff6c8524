use std::sync::Arc;

use super::Agent;
use crate::model::ModelClient;

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

pub fn dietary_expert(client: Arc<dyn ModelClient>) -> Agent {
    Agent::new(
        "饮食专家",
        "提供个性化饮食建议",
        lines(&[
            "根据用户提供的信息（包括饮食偏好与限制）制定详细的一日餐食计划，包括早餐、午餐、晚餐和加餐。",
            "说明此饮食计划如何帮助用户实现目标（例如减脂、增肌等）。",
            "确保计划内容清晰、条理分明、营养均衡。",
            "所有内容使用中文回答。",
        ]),
        client,
    )
}

pub fn fitness_expert(client: Arc<dyn ModelClient>) -> Agent {
    Agent::new(
        "健身专家",
        "提供个性化健身建议",
        lines(&[
            "根据用户目标提供个性化健身计划，包括热身、主要训练和放松环节。",
            "解释每个训练的作用与好处。",
            "保证计划细致可执行。",
            "所有内容使用中文回答。",
        ]),
        client,
    )
}

/// Free-form agent that answers follow-up questions about existing plans.
pub fn plan_assistant(client: Arc<dyn ModelClient>) -> Agent {
    Agent::new("计划答疑", "解答用户关于饮食和健身计划的问题", Vec::new(), client)
        .with_markdown(true)
}

/// Context prompt for a follow-up question: both plan bodies, then the question.
pub fn follow_up_prompt(diet_body: &str, fitness_body: &str, question: &str) -> String {
    format!(
        "刚刚，你为用户推荐了一些包含饮食和健康的计划，包括：\n\n\
         # **饮食计划:** {diet_body}\n\n\
         # **健身计划:** {fitness_body}\n\n\n\
         # **用户问题:** {question}\n\n\
         请根据你为用户推荐的饮食和健身计划，回答用户新的问题。"
    )
}
