//! 脱敏类别与占位符
//!
//! 七个固定类别，每个对应一个方括号占位符（如 `[AGE]`）。
//! 审计用的类别提取是纯字符串包含判断，不调用模型。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Age,
    HeartRate,
    Weight,
    Vo2Max,
    BloodPressure,
    Name,
    /// 距离 / 时间等运动指标
    Metric,
}

impl Category {
    /// 固定顺序，也是审计记录里类别的排列顺序
    pub const ALL: [Category; 7] = [
        Category::Age,
        Category::HeartRate,
        Category::Weight,
        Category::Vo2Max,
        Category::BloodPressure,
        Category::Name,
        Category::Metric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Age => "AGE",
            Category::HeartRate => "HEART_RATE",
            Category::Weight => "WEIGHT",
            Category::Vo2Max => "VO2_MAX",
            Category::BloodPressure => "BLOOD_PRESSURE",
            Category::Name => "NAME",
            Category::Metric => "METRIC",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Category::Age => "[AGE]",
            Category::HeartRate => "[HEART_RATE]",
            Category::Weight => "[WEIGHT]",
            Category::Vo2Max => "[VO2_MAX]",
            Category::BloodPressure => "[BLOOD_PRESSURE]",
            Category::Name => "[NAME]",
            Category::Metric => "[METRIC]",
        }
    }

    /// 写进脱敏 prompt 的人类可读描述
    pub fn description(&self) -> &'static str {
        match self {
            Category::Age => "Age",
            Category::HeartRate => "Heart rate",
            Category::Weight => "Weight",
            Category::Vo2Max => "VO2 max",
            Category::BloodPressure => "Blood pressure",
            Category::Name => "Name",
            Category::Metric => "Distance/time metrics",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 扫描脱敏文本中出现的占位符，按 Category::ALL 顺序返回命中的类别
pub fn detect_categories(text: &str) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| text.contains(c.placeholder()))
        .collect()
}
