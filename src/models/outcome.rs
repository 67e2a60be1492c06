//! 投递结果与批次报告

use serde::{Serialize, Serializer};

use crate::error::{ApplyError, ErrorKind};
use crate::models::{JobRecord, PortalKind, StepState};

/// 单次投递的结果
#[derive(Debug, Clone)]
pub struct ApplicationOutcome {
    pub job: JobRecord,
    pub succeeded: bool,
    pub failure_reason: Option<ApplyError>,
    /// 依次经过的步骤
    pub elapsed_steps: Vec<StepState>,
}

impl ApplicationOutcome {
    pub fn submitted(job: JobRecord, elapsed_steps: Vec<StepState>) -> Self {
        Self {
            job,
            succeeded: true,
            failure_reason: None,
            elapsed_steps,
        }
    }

    pub fn failed(job: JobRecord, reason: ApplyError, elapsed_steps: Vec<StepState>) -> Self {
        Self {
            job,
            succeeded: false,
            failure_reason: Some(reason),
            elapsed_steps,
        }
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure_reason.as_ref().map(ApplyError::kind)
    }

    /// 最终停留的步骤
    pub fn final_step(&self) -> StepState {
        self.elapsed_steps
            .last()
            .copied()
            .unwrap_or(StepState::NotStarted)
    }
}

impl Serialize for ApplicationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct View<'a> {
            title: &'a str,
            company: &'a str,
            source: PortalKind,
            url: &'a str,
            succeeded: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            failure_reason: Option<ErrorKind>,
            #[serde(skip_serializing_if = "Option::is_none")]
            failure_detail: Option<String>,
            elapsed_steps: &'a [StepState],
        }

        View {
            title: self.job.title(),
            company: self.job.company(),
            source: self.job.source(),
            url: self.job.url(),
            succeeded: self.succeeded,
            failure_reason: self.failure_kind(),
            failure_detail: self.failure_reason.as_ref().map(ToString::to_string),
            elapsed_steps: &self.elapsed_steps,
        }
        .serialize(serializer)
    }
}

/// 批次被中止的信息（会话断开 / 取消）
#[derive(Debug, Clone)]
pub struct BatchAbort {
    /// 中止发生的会话所属门户（串行模式下为 None）
    pub portal: Option<PortalKind>,
    pub reason: ApplyError,
    /// 未被尝试的岗位数
    pub remaining: usize,
}

impl Serialize for BatchAbort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View {
            #[serde(skip_serializing_if = "Option::is_none")]
            portal: Option<PortalKind>,
            reason: ErrorKind,
            detail: String,
            remaining: usize,
        }

        View {
            portal: self.portal,
            reason: self.reason.kind(),
            detail: self.reason.to_string(),
            remaining: self.remaining,
        }
        .serialize(serializer)
    }
}

/// 批次报告
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub per_job_outcomes: Vec<ApplicationOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aborted: Vec<BatchAbort>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个岗位的结果
    pub fn record(&mut self, outcome: ApplicationOutcome) {
        self.attempted += 1;
        if outcome.succeeded {
            self.succeeded += 1;
        }
        self.per_job_outcomes.push(outcome);
    }

    pub fn abort(&mut self, portal: Option<PortalKind>, reason: ApplyError, remaining: usize) {
        self.aborted.push(BatchAbort {
            portal,
            reason,
            remaining,
        });
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn is_aborted(&self) -> bool {
        !self.aborted.is_empty()
    }

    /// 合并多个会话的报告，按岗位原始下标恢复顺序
    pub fn merge(parts: Vec<(Vec<usize>, BatchReport)>) -> Self {
        let mut indexed = Vec::new();
        let mut merged = BatchReport::new();

        for (indices, report) in parts {
            merged.aborted.extend(report.aborted);
            for (index, outcome) in indices.into_iter().zip(report.per_job_outcomes) {
                indexed.push((index, outcome));
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        for (_, outcome) in indexed {
            merged.record(outcome);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: usize) -> JobRecord {
        JobRecord::new(
            format!("Job {}", n),
            "X",
            "",
            format!("https://www.linkedin.com/jobs/view/{}", n),
        )
    }

    #[test]
    fn record_counts_attempts_and_successes() {
        let mut report = BatchReport::new();
        report.record(ApplicationOutcome::submitted(job(1), vec![StepState::Submitted]));
        report.record(ApplicationOutcome::failed(
            job(2),
            ApplyError::TerminalStateAmbiguous,
            vec![StepState::Failed],
        ));
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn merge_restores_original_order() {
        let mut a = BatchReport::new();
        a.record(ApplicationOutcome::submitted(job(0), vec![]));
        a.record(ApplicationOutcome::submitted(job(2), vec![]));
        let mut b = BatchReport::new();
        b.record(ApplicationOutcome::failed(job(1), ApplyError::Cancelled, vec![]));
        b.abort(Some(PortalKind::Indeed), ApplyError::Cancelled, 3);

        let merged = BatchReport::merge(vec![(vec![0, 2], a), (vec![1], b)]);
        let titles: Vec<_> = merged
            .per_job_outcomes
            .iter()
            .map(|o| o.job.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Job 0", "Job 1", "Job 2"]);
        assert_eq!(merged.attempted, 3);
        assert_eq!(merged.succeeded, 2);
        assert_eq!(merged.aborted.len(), 1);
    }

    #[test]
    fn report_json_shape() {
        let mut report = BatchReport::new();
        report.record(ApplicationOutcome::failed(
            job(7),
            ApplyError::UnsupportedPortal {
                url: "https://x".into(),
            },
            vec![StepState::NotStarted, StepState::Failed],
        ));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["attempted"], 1);
        assert_eq!(value["succeeded"], 0);
        let entry = &value["perJobOutcomes"][0];
        assert_eq!(entry["title"], "Job 7");
        assert_eq!(entry["source"], "LinkedIn");
        assert_eq!(entry["succeeded"], false);
        assert_eq!(entry["failureReason"], "UnsupportedPortal");
        assert!(value.get("aborted").is_none());
    }
}
