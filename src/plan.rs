//! Wraps raw model output into displayable plans.
//!
//! The rationale and caveat strings are fixed presentation content and are
//! attached to every plan regardless of what the model returned.

use chrono::{DateTime, Utc};

const DIET_RATIONALE: &str = "高蛋白、优质脂肪、适量碳水、热量均衡";
const DIET_CAVEATS: &[&str] = &[
    "多喝水，保持充足水分",
    "注意电解质摄入（钠、钾、镁）",
    "通过蔬菜、水果保证膳食纤维摄入",
    "根据身体反馈调整食量",
];

const FITNESS_GOAL: &str = "增强力量、提升耐力并保持全身健康";
const FITNESS_CAVEATS: &[&str] = &[
    "定期记录训练进展",
    "保证训练间的充分休息",
    "关注动作姿势，避免受伤",
    "持之以恒才能见到效果",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Diet,
    Fitness,
}

impl PlanKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Diet => "📋 个性化饮食计划",
            Self::Fitness => "💪 个性化健身计划",
        }
    }

    pub fn rationale_heading(&self) -> &'static str {
        match self {
            Self::Diet => "🎯 计划原理",
            Self::Fitness => "🎯 健身目标",
        }
    }

    pub fn body_heading(&self) -> &'static str {
        match self {
            Self::Diet => "🍽️ 餐食安排",
            Self::Fitness => "🏋️‍♂️ 训练安排",
        }
    }

    pub fn caveats_heading(&self) -> &'static str {
        match self {
            Self::Diet => "⚠️ 注意事项",
            Self::Fitness => "💡 专业建议",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub kind: PlanKind,
    pub rationale: String,
    pub body: String,
    pub caveats: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Plan {
    fn new(kind: PlanKind, rationale: &str, body: String, caveats: &[&str]) -> Self {
        Self {
            kind,
            rationale: rationale.to_string(),
            body,
            caveats: caveats.iter().map(|line| line.to_string()).collect(),
            generated_at: Utc::now(),
        }
    }
}

pub fn format_diet(raw_text: impl Into<String>) -> Plan {
    Plan::new(PlanKind::Diet, DIET_RATIONALE, raw_text.into(), DIET_CAVEATS)
}

pub fn format_fitness(raw_text: impl Into<String>) -> Plan {
    Plan::new(
        PlanKind::Fitness,
        FITNESS_GOAL,
        raw_text.into(),
        FITNESS_CAVEATS,
    )
}
