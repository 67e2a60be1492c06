//! 筛选问题回答策略 - 业务能力层
//!
//! 固定的默认回答规则：是/否问题回答肯定，数值型经验问题填最低合格值。
//! 这会直接改变提交的申请内容，所以所有取值都来自配置，可以按问题关键字覆盖。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 问题类型（由页面上的输入控件决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// 单选是/否
    YesNo,
    /// 数字输入框
    Numeric,
    /// 文本输入框 / 多行文本
    FreeText,
}

/// 策略给出的回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// 选中 value 等于该值的选项
    Choose(String),
    /// 填入数字
    Number(u32),
    /// 填入文本
    Text(String),
    /// 不作答
    Skip,
}

/// 回答策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPolicy {
    /// 是/否问题选择的选项 value
    pub yes_no_answer: String,
    /// 数值型经验问题填写的年限
    pub years_of_experience: u32,
    /// 问题关键字 → 回答（不区分大小写的包含匹配，优先于默认规则）
    pub overrides: BTreeMap<String, String>,
}

impl Default for AnswerPolicy {
    fn default() -> Self {
        Self {
            yes_no_answer: "Yes".to_string(),
            years_of_experience: 1,
            overrides: BTreeMap::new(),
        }
    }
}

impl AnswerPolicy {
    /// 根据问题文字和类型给出回答
    pub fn answer(&self, prompt: &str, kind: QuestionKind) -> Answer {
        if let Some(value) = self.override_for(prompt) {
            return match kind {
                QuestionKind::YesNo => Answer::Choose(value.to_string()),
                QuestionKind::Numeric => match value.trim().parse::<u32>() {
                    Ok(n) => Answer::Number(n),
                    Err(_) => Answer::Text(value.to_string()),
                },
                QuestionKind::FreeText => Answer::Text(value.to_string()),
            };
        }

        match kind {
            QuestionKind::YesNo => Answer::Choose(self.yes_no_answer.clone()),
            QuestionKind::Numeric => Answer::Number(self.years_of_experience),
            QuestionKind::FreeText => Answer::Skip,
        }
    }

    /// 最长的匹配关键字优先
    fn override_for(&self, prompt: &str) -> Option<&str> {
        let prompt = prompt.to_lowercase();
        self.overrides
            .iter()
            .filter(|(key, _)| !key.trim().is_empty() && prompt.contains(&key.to_lowercase()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, value)| value.as_str())
    }
}
