//! 岗位去重服务 - 业务能力层
//!
//! 按指纹（规范化后的 title / company / url）去重，保留第一次出现的顺序。

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Fingerprint, JobRecord};

/// 岗位去重器
///
/// 抓取阶段逐条 `insert`，也可以对已有列表一次性 `dedupe`。
#[derive(Debug, Default)]
pub struct JobDeduplicator {
    seen: HashSet<Fingerprint>,
}

impl JobDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有岗位预先填充（增量抓取时跳过已保存的岗位）
    pub fn with_known<'a>(jobs: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let mut dedup = Self::new();
        for job in jobs {
            dedup.seen.insert(job.fingerprint().clone());
        }
        dedup
    }

    /// 第一次见到该指纹返回 true
    pub fn insert(&mut self, job: &JobRecord) -> bool {
        self.seen.insert(job.fingerprint().clone())
    }

    pub fn contains(&self, job: &JobRecord) -> bool {
        self.seen.contains(job.fingerprint())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// 去掉重复岗位，保留首次出现的顺序
    pub fn dedupe(&mut self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        let total = records.len();
        let unique: Vec<JobRecord> = records.into_iter().filter(|job| self.insert(job)).collect();
        if unique.len() < total {
            debug!("去重: {} → {} 个岗位", total, unique.len());
        }
        unique
    }
}

/// 对一组岗位去重
pub fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    JobDeduplicator::new().dedupe(records)
}
