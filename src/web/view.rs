//! HTML rendering for the single-page form.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::controller::{Controller, Phase};
use crate::plan::Plan;
use crate::profile::{
    AGE_RANGE, ActivityLevel, DietaryPreference, FitnessGoal, HEIGHT_CM_RANGE, ProfileForm, Sex,
    WEIGHT_KG_RANGE,
};
use crate::session::QaEntry;

const STYLE: &str = "body{font-family:sans-serif;max-width:1100px;margin:0 auto;padding:2rem}\
button{width:100%;border-radius:5px;height:3em}\
.intro{background:#00008B;color:#fff;padding:1rem;border-radius:.5rem;margin-bottom:2rem}\
.success{padding:1rem;border-radius:.5rem;background:#f0fff4;border:1px solid #9ae6b4}\
.warning{padding:1rem;border-radius:.5rem;background:#fffaf0;border:1px solid #fbd38d}\
.error{padding:1rem;border-radius:.5rem;background:#fff5f5;border:1px solid #feb2b2}\
.plan{display:grid;grid-template-columns:2fr 1fr;gap:1rem}\
.body{white-space:pre-wrap}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    None,
    Success(String),
    Warning(String),
    Error(String),
}

/// Renders the whole page for the session's current phase.
pub fn render(controller: &Controller, notice: &Notice) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html><html lang=\"zh\"><head><meta charset=\"utf-8\">");
    page.push_str("<title>AI 饮食与健身计划助手</title>");
    page.push_str(&format!("<style>{STYLE}</style></head><body>"));
    page.push_str("<h1>🏋️‍♂️ AI 饮食与健身计划助手</h1>");
    page.push_str(
        "<div class=\"intro\">根据您的目标与喜好，为您量身定制饮食和健身计划。\
         AI 将考虑您的个人情况，为您制定科学可行的健康方案。</div>",
    );

    page.push_str(&render_notice(notice));
    page.push_str(&render_key_form(controller.phase()));

    if controller.phase() != Phase::AwaitingKey {
        page.push_str(&render_profile_form(controller.profile_form()));
    }

    let ctx = controller.context();
    if let Some(plans) = ctx.plans() {
        page.push_str(&render_plan(&plans.diet));
        page.push_str(&render_plan(&plans.fitness));
        page.push_str(&render_qa(ctx.qa_history()));
    }

    page.push_str("</body></html>");
    page
}

fn render_notice(notice: &Notice) -> String {
    let (class, text) = match notice {
        Notice::None => return String::new(),
        Notice::Success(text) => ("success", text),
        Notice::Warning(text) => ("warning", text),
        Notice::Error(text) => ("error", text),
    };
    format!("<div class=\"{class}\">{}</div>", encode_text(text))
}

fn render_key_form(phase: Phase) -> String {
    let status = if phase == Phase::AwaitingKey {
        "<div class=\"warning\">⚠️ 请输入您的 GLM API Key 才能生成计划</div>\
         <p><a href=\"https://bigmodel.cn/\">点击此处获取 GLM API Key</a></p>"
    } else {
        "<div class=\"success\">✅ GLM API Key 已接受！</div>"
    };
    format!(
        "<section><h2>🔑 API 配置</h2>{status}\
         <form method=\"post\" action=\"/key\">\
         <label>GLM API Key <input type=\"password\" name=\"api_key\" autocomplete=\"off\"></label>\
         <button type=\"submit\">确认</button></form></section>"
    )
}

fn select<T>(
    name: &str,
    label: &str,
    options: &[T],
    option_label: impl Fn(&T) -> &'static str,
    selected: &str,
) -> String {
    let mut html = format!("<label>{label} <select name=\"{name}\">");
    for option in options {
        let text = option_label(option);
        let marker = if text == selected { " selected" } else { "" };
        html.push_str(&format!("<option value=\"{text}\"{marker}>{text}</option>"));
    }
    html.push_str("</select></label><br>");
    html
}

fn number(name: &str, label: &str, (min, max): (f64, f64), step: &str, value: &str) -> String {
    format!(
        "<label>{label} <input type=\"number\" name=\"{name}\" min=\"{min}\" max=\"{max}\" \
         step=\"{step}\" value=\"{}\" required></label><br>",
        encode_double_quoted_attribute(value)
    )
}

fn render_profile_form(form: &ProfileForm) -> String {
    let mut html = String::from(
        "<section><h2>👤 我的信息</h2><form method=\"post\" action=\"/generate\">",
    );
    html.push_str(&number(
        "age",
        "年龄",
        (AGE_RANGE.0 as f64, AGE_RANGE.1 as f64),
        "1",
        &form.age,
    ));
    html.push_str(&number(
        "height_cm",
        "身高 (cm)",
        HEIGHT_CM_RANGE,
        "0.1",
        &form.height_cm,
    ));
    html.push_str(&number(
        "weight_kg",
        "体重 (kg)",
        WEIGHT_KG_RANGE,
        "0.1",
        &form.weight_kg,
    ));
    html.push_str(&select("sex", "性别", Sex::ALL, Sex::label, &form.sex));
    html.push_str(&select(
        "activity_level",
        "活动水平",
        ActivityLevel::ALL,
        ActivityLevel::label,
        &form.activity_level,
    ));
    html.push_str(&select(
        "dietary_preference",
        "饮食偏好",
        DietaryPreference::ALL,
        DietaryPreference::label,
        &form.dietary_preference,
    ));
    html.push_str(&select(
        "fitness_goal",
        "健身目标",
        FitnessGoal::ALL,
        FitnessGoal::label,
        &form.fitness_goal,
    ));
    html.push_str("<button type=\"submit\">🎯 生成我的计划</button></form></section>");
    html
}

fn render_plan(plan: &Plan) -> String {
    let caveats: String = plan
        .caveats
        .iter()
        .map(|line| format!("<div class=\"warning\">{}</div>", encode_text(line)))
        .collect();
    format!(
        "<section><h2>{title}</h2><div class=\"plan\"><div>\
         <h3>{rationale_heading}</h3><div class=\"success\">{rationale}</div>\
         <h3>{body_heading}</h3><div class=\"body\">{body}</div></div>\
         <div><h3>{caveats_heading}</h3>{caveats}</div></div>\
         <p><small>生成时间：{generated_at}</small></p></section>",
        title = plan.kind.title(),
        rationale_heading = plan.kind.rationale_heading(),
        rationale = encode_text(&plan.rationale),
        body_heading = plan.kind.body_heading(),
        body = encode_text(&plan.body),
        caveats_heading = plan.kind.caveats_heading(),
        generated_at = plan.generated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn render_qa(history: &[QaEntry]) -> String {
    let mut html = String::from(
        "<section><h2>❓ 计划答疑</h2><form method=\"post\" action=\"/ask\">\
         <label>请输入您想了解的问题 <input type=\"text\" name=\"question\"></label>\
         <button type=\"submit\">获取回答</button></form>\
         <form method=\"post\" action=\"/reset\"><button type=\"submit\">重新开始</button></form>",
    );

    if !history.is_empty() {
        html.push_str("<h2>💬 问答记录</h2>");
        for entry in history {
            html.push_str(&format!(
                "<p><strong>问题：</strong>{}</p><p class=\"body\"><strong>回答：</strong>{}</p>",
                encode_text(&entry.question),
                encode_text(&entry.answer)
            ));
        }
    }

    html.push_str("</section>");
    html
}
