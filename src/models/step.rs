use serde::{Deserialize, Serialize};

/// 投递流程中的步骤
///
/// 声明顺序即流程顺序：除 `Failed` 外只能向前推进，
/// `Failed` 可以从任何非终止状态进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StepState {
    NotStarted,
    EntryOpened,
    ContactInfo,
    ResumeUpload,
    ScreeningQuestions,
    Review,
    Submitted,
    Failed,
}

impl StepState {
    /// 可选步骤，按固定顺序探测
    pub const OPTIONAL_STEPS: [StepState; 3] = [
        StepState::ContactInfo,
        StepState::ResumeUpload,
        StepState::ScreeningQuestions,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Submitted | StepState::Failed)
    }

    /// 是否允许从 `self` 转移到 `next`
    pub fn can_transition_to(self, next: StepState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == StepState::Failed || next > self
    }

    pub fn label(self) -> &'static str {
        match self {
            StepState::NotStarted => "未开始",
            StepState::EntryOpened => "已打开申请入口",
            StepState::ContactInfo => "联系方式",
            StepState::ResumeUpload => "上传简历",
            StepState::ScreeningQuestions => "筛选问题",
            StepState::Review => "确认提交",
            StepState::Submitted => "已提交",
            StepState::Failed => "失败",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        assert!(StepState::NotStarted.can_transition_to(StepState::EntryOpened));
        assert!(StepState::EntryOpened.can_transition_to(StepState::Review));
        assert!(!StepState::Review.can_transition_to(StepState::ContactInfo));
        assert!(!StepState::Review.can_transition_to(StepState::Review));
    }

    #[test]
    fn failed_reachable_from_any_non_terminal() {
        for step in [
            StepState::NotStarted,
            StepState::EntryOpened,
            StepState::ContactInfo,
            StepState::ResumeUpload,
            StepState::ScreeningQuestions,
            StepState::Review,
        ] {
            assert!(step.can_transition_to(StepState::Failed), "{:?}", step);
        }
        assert!(!StepState::Submitted.can_transition_to(StepState::Failed));
        assert!(!StepState::Failed.can_transition_to(StepState::Failed));
    }
}
