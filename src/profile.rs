//! The user's physical profile and goals, as collected by the form.

use serde::Deserialize;

use crate::error::ValidationError;

pub const AGE_RANGE: (u32, u32) = (10, 100);
pub const HEIGHT_CM_RANGE: (f64, f64) = (100.0, 250.0);
pub const WEIGHT_KG_RANGE: (f64, f64) = (20.0, 300.0);

/// Declares a closed set of form options, each with its display label.
macro_rules! labelled_options {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn from_label(raw: &str) -> Result<Self, ValidationError> {
                let raw = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.label() == raw)
                    .ok_or_else(|| ValidationError::UnknownOption {
                        field: $field,
                        raw: raw.to_string(),
                    })
            }
        }
    };
}

labelled_options!(Sex, "sex", {
    Male => "男",
    Female => "女",
    Other => "其他",
});

labelled_options!(ActivityLevel, "activity_level", {
    Sedentary => "久坐",
    Light => "轻度活动",
    Moderate => "中等活动",
    High => "高强度活动",
    VeryHigh => "非常高强度活动",
});

labelled_options!(DietaryPreference, "dietary_preference", {
    Vegetarian => "素食",
    Keto => "生酮饮食",
    GlutenFree => "无麸质",
    LowCarb => "低碳水",
    DairyFree => "无乳制品",
});

labelled_options!(FitnessGoal, "fitness_goal", {
    FatLoss => "减脂",
    MuscleGain => "增肌",
    Endurance => "提高耐力",
    StayHealthy => "保持健康",
    Strength => "力量训练",
});

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    pub dietary_preference: DietaryPreference,
    pub fitness_goal: FitnessGoal,
}

impl UserProfile {
    /// Profile block sent verbatim to both expert agents.
    pub fn to_prompt(&self) -> String {
        format!(
            "年龄: {}\n体重: {}kg\n身高: {}cm\n性别: {}\n活动水平: {}\n饮食偏好: {}\n健身目标: {}",
            self.age,
            self.weight_kg,
            self.height_cm,
            self.sex.label(),
            self.activity_level.label(),
            self.dietary_preference.label(),
            self.fitness_goal.label(),
        )
    }
}

/// Raw form submission; every field arrives as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub height_cm: String,
    #[serde(default)]
    pub weight_kg: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub activity_level: String,
    #[serde(default)]
    pub dietary_preference: String,
    #[serde(default)]
    pub fitness_goal: String,
}

/// Values the form starts with before anything is submitted.
impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            age: "30".to_string(),
            height_cm: "170.0".to_string(),
            weight_kg: "65.0".to_string(),
            sex: String::new(),
            activity_level: String::new(),
            dietary_preference: String::new(),
            fitness_goal: String::new(),
        }
    }
}

impl TryFrom<&ProfileForm> for UserProfile {
    type Error = ValidationError;

    fn try_from(form: &ProfileForm) -> Result<Self, Self::Error> {
        let age = parse_number("age", &form.age)?;
        if age.fract() != 0.0 {
            return Err(ValidationError::NotANumber {
                field: "age",
                raw: form.age.trim().to_string(),
            });
        }
        let age = check_range("age", age, (AGE_RANGE.0 as f64, AGE_RANGE.1 as f64))?;

        Ok(Self {
            age: age as u32,
            height_cm: check_range(
                "height_cm",
                parse_number("height_cm", &form.height_cm)?,
                HEIGHT_CM_RANGE,
            )?,
            weight_kg: check_range(
                "weight_kg",
                parse_number("weight_kg", &form.weight_kg)?,
                WEIGHT_KG_RANGE,
            )?,
            sex: Sex::from_label(&form.sex)?,
            activity_level: ActivityLevel::from_label(&form.activity_level)?,
            dietary_preference: DietaryPreference::from_label(&form.dietary_preference)?,
            fitness_goal: FitnessGoal::from_label(&form.fitness_goal)?,
        })
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field,
            raw: raw.trim().to_string(),
        })
}

fn check_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<f64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(value)
}
