//! 投递上下文
//!
//! 封装"我正在投递哪个岗位、走到了哪一步"这一信息。
//! 每次投递新建一个，只属于一次状态机运行，运行结束即丢弃。

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::models::{JobRecord, StepState};
use crate::services::AnswerPolicy;

/// 联系方式（门户表单里为空时才需要）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactProfile {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// 申请人资料，在一个批次的所有岗位之间共享（只读）
#[derive(Debug, Clone, Default)]
pub struct Applicant {
    pub resume_path: String,
    pub contact: ContactProfile,
    pub answers: AnswerPolicy,
}

/// 投递上下文
#[derive(Debug, Clone)]
pub struct ApplicationContext {
    pub job: JobRecord,

    /// 岗位在批次中的序号（仅用于日志显示）
    pub job_index: usize,

    pub applicant: Arc<Applicant>,

    pub current_state: StepState,

    /// 每个步骤的尝试次数
    pub attempt_count: BTreeMap<StepState, usize>,

    pub last_error: Option<ErrorKind>,

    /// 依次经过的步骤
    pub elapsed_steps: Vec<StepState>,
}

impl ApplicationContext {
    /// 创建新的投递上下文
    pub fn new(job: JobRecord, job_index: usize, applicant: Arc<Applicant>) -> Self {
        Self {
            job,
            job_index,
            applicant,
            current_state: StepState::NotStarted,
            attempt_count: BTreeMap::new(),
            last_error: None,
            elapsed_steps: vec![StepState::NotStarted],
        }
    }

    pub fn resume_path(&self) -> &str {
        &self.applicant.resume_path
    }

    /// 转移到下一个步骤并记录轨迹
    ///
    /// 只允许向前推进或进入 Failed，非法转移会被忽略并返回 false。
    pub fn transition(&mut self, next: StepState) -> bool {
        if !self.current_state.can_transition_to(next) {
            tracing::error!(
                "{} 非法的步骤转移: {:?} -> {:?}",
                self,
                self.current_state,
                next
            );
            return false;
        }
        self.current_state = next;
        self.elapsed_steps.push(next);
        true
    }

    /// 记录一次尝试，返回该步骤的累计次数
    pub fn record_attempt(&mut self, step: StepState) -> usize {
        let count = self.attempt_count.entry(step).or_insert(0);
        *count += 1;
        *count
    }

    pub fn attempts(&self, step: StepState) -> usize {
        self.attempt_count.get(&step).copied().unwrap_or(0)
    }
}

impl Display for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[岗位 #{} {} 步骤#{}]",
            self.job_index,
            self.job.source(),
            self.current_state.label()
        )
    }
}
