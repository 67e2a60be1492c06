use crate::models::JobRecord;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载岗位列表
///
/// 文件格式：`[{ "title", "company", "location", "link" | "url" }]`，
/// 门户类型在加载时根据链接推断。
pub async fn load_jobs(path: &Path) -> Result<Vec<JobRecord>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取岗位文件: {}", path.display()))?;

    let jobs: Vec<JobRecord> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析岗位文件: {}", path.display()))?;

    tracing::info!(
        "已加载 {} 个岗位: {}",
        jobs.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(jobs)
}

/// 保存岗位列表到 JSON 文件（自动创建父目录）
pub async fn save_jobs(path: &Path, jobs: &[JobRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(jobs)?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入岗位文件: {}", path.display()))?;

    tracing::info!("✓ 已保存 {} 个岗位到 {}", jobs.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortalKind;

    #[tokio::test]
    async fn save_then_load_keeps_order_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("jobs.json");
        let jobs = vec![
            JobRecord::new("A", "X", "Pune", "https://www.naukri.com/a"),
            JobRecord::new("B", "Y", "", "https://in.indeed.com/viewjob?jk=2"),
        ];

        save_jobs(&path, &jobs).await.unwrap();
        let loaded = load_jobs(&path).await.unwrap();

        assert_eq!(loaded, jobs);
        assert_eq!(loaded[1].source(), PortalKind::Indeed);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_jobs(&dir.path().join("nope.json")).await;
        tokio_test::assert_err!(result);
    }
}
