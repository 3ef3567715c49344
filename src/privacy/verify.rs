//! 脱敏结果二次校验
//!
//! 模型脱敏是尽力而为，无法保证原始数据已全部移除。这里用确定性正则扫描常见的生理数据格式
//! （血压 120/80、心率 150 bpm、体重 70 kg、VO2 max 数值、年龄、距离与配速），
//! 供 Router 在发往远端前作为闸门使用。姓名无法用正则识别，不在扫描范围内。

use regex::Regex;

use crate::privacy::Category;

const PATTERNS: [(Category, &str); 6] = [
    (
        Category::BloodPressure,
        r"(?i)\b\d{2,3}\s*/\s*\d{2,3}\b(\s*mm\s*hg)?",
    ),
    (
        Category::HeartRate,
        r"(?i)\b\d{2,3}\s*(bpm|beats per minute)\b|heart\s*rate\s*(of|was|is|at|:)?\s*\d{2,3}\b",
    ),
    (
        Category::Weight,
        r"(?i)\b\d{2,3}(\.\d+)?\s*(kg|kgs|kilos?|kilograms?|lbs?|pounds?)\b",
    ),
    (Category::Vo2Max, r"(?i)vo2\s*max\D{0,12}\d{2}"),
    (
        Category::Age,
        r"(?i)\b\d{1,3}\s*(years?|yrs?)[\s-]*old\b|\bage[d]?\s*(of\s*)?\d{1,3}\b",
    ),
    (
        Category::Metric,
        r"(?i)\b\d+(\.\d+)?\s*(km|kilometers?|kilometres?|miles?)\b|\b\d{1,2}:\d{2}(:\d{2})?\b",
    ),
];

/// 残留敏感数据扫描器；正则在构造时编译一次
#[derive(Debug, Clone)]
pub struct ResidualScanner {
    rules: Vec<(Category, Regex)>,
}

impl ResidualScanner {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = PATTERNS
            .iter()
            .map(|(category, pattern)| Ok((*category, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// 返回文本中仍然像原始数据的类别（按规则顺序，去重）
    pub fn residual_categories(&self, text: &str) -> Vec<Category> {
        self.rules
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(category, _)| *category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ResidualScanner {
        ResidualScanner::new().unwrap()
    }

    #[test]
    fn test_properly_redacted_text_is_clean() {
        let s = scanner();
        assert!(s
            .residual_categories("My heart rate was [HEART_RATE] at age [AGE], is that dangerous?")
            .is_empty());
        assert!(s
            .residual_categories("[NAME] runs [METRIC] weekly with BP [BLOOD_PRESSURE]")
            .is_empty());
    }

    #[test]
    fn test_detects_leftover_biometrics() {
        let s = scanner();
        assert_eq!(
            s.residual_categories("My heart rate was 190 at age 34"),
            vec![Category::HeartRate, Category::Age]
        );
        assert_eq!(
            s.residual_categories("BP 135/85 mmHg"),
            vec![Category::BloodPressure]
        );
        assert_eq!(
            s.residual_categories("I weigh 82.5 kg"),
            vec![Category::Weight]
        );
        assert_eq!(
            s.residual_categories("my VO2 max is 52"),
            vec![Category::Vo2Max]
        );
        assert_eq!(
            s.residual_categories("I am 41 years old"),
            vec![Category::Age]
        );
        assert_eq!(
            s.residual_categories("ran 10 km in 48:30"),
            vec![Category::Metric]
        );
    }

    #[test]
    fn test_plain_numbers_are_not_flagged() {
        let s = scanner();
        assert!(s.residual_categories("Give me 3 drills for sprint starts").is_empty());
    }
}
