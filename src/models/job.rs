//! 岗位数据模型
//!
//! `JobRecord` 一旦创建就不可变，身份由指纹决定而不是字段逐一比较。

use std::fmt;
use std::hash::{Hash, Hasher};

use phf::phf_map;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// 招聘门户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PortalKind {
    LinkedIn,
    Indeed,
    Internshala,
    Naukri,
    Unknown,
}

/// 域名 → 门户
static PORTAL_DOMAINS: phf::Map<&'static str, PortalKind> = phf_map! {
    "linkedin.com" => PortalKind::LinkedIn,
    "indeed.com" => PortalKind::Indeed,
    "internshala.com" => PortalKind::Internshala,
    "naukri.com" => PortalKind::Naukri,
};

impl PortalKind {
    /// 所有已支持的门户（不含 Unknown）
    pub const SUPPORTED: [PortalKind; 4] = [
        PortalKind::LinkedIn,
        PortalKind::Indeed,
        PortalKind::Internshala,
        PortalKind::Naukri,
    ];

    /// 根据岗位链接的域名判断门户
    ///
    /// 子域名也能匹配，例如 `in.linkedin.com`、`in.indeed.com`。
    pub fn from_url(url: &str) -> Self {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return PortalKind::Unknown;
        };
        let Some(host) = parsed.host_str() else {
            return PortalKind::Unknown;
        };
        let host = host.to_ascii_lowercase();

        let mut rest = host.as_str();
        loop {
            if let Some(kind) = PORTAL_DOMAINS.get(rest) {
                return *kind;
            }
            match rest.split_once('.') {
                Some((_, parent)) => rest = parent,
                None => return PortalKind::Unknown,
            }
        }
    }

    /// 标准名称
    pub fn name(self) -> &'static str {
        match self {
            PortalKind::LinkedIn => "LinkedIn",
            PortalKind::Indeed => "Indeed",
            PortalKind::Internshala => "Internshala",
            PortalKind::Naukri => "Naukri",
            PortalKind::Unknown => "Unknown",
        }
    }

    /// 从名称解析（不区分大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Some(PortalKind::LinkedIn),
            "indeed" => Some(PortalKind::Indeed),
            "internshala" => Some(PortalKind::Internshala),
            "naukri" => Some(PortalKind::Naukri),
            _ => None,
        }
    }
}

impl fmt::Display for PortalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 岗位指纹：规范化后的 (title, company, url)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(title: &str, company: &str, url: &str) -> Self {
        Self(format!(
            "{}\u{1f}{}\u{1f}{}",
            normalize_text(title),
            normalize_text(company),
            normalize_url(url)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// scheme 和主机名不区分大小写，路径和查询参数区分
fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    };
    url.trim_end_matches('/').to_string()
}

/// 去掉首尾空白、合并连续空白、统一小写
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 岗位记录文件中的原始格式
///
/// 旧的抓取结果用 `link`，新的用 `url`，两者都接受。
#[derive(Debug, Clone, Deserialize)]
struct RawJob {
    title: String,
    company: String,
    #[serde(default)]
    location: String,
    #[serde(alias = "link")]
    url: String,
}

impl From<RawJob> for JobRecord {
    fn from(raw: RawJob) -> Self {
        JobRecord::new(raw.title, raw.company, raw.location, raw.url)
    }
}

/// 岗位记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawJob")]
pub struct JobRecord {
    title: String,
    company: String,
    location: String,
    url: String,
    source: PortalKind,
    #[serde(skip_serializing)]
    fingerprint: Fingerprint,
}

impl JobRecord {
    /// 创建岗位记录，门户类型在这里一次性确定
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let company = company.into();
        let url = url.into();
        let source = PortalKind::from_url(&url);
        let fingerprint = Fingerprint::of(&title, &company, &url);
        Self {
            title,
            company,
            location: location.into(),
            url,
            source,
            fingerprint,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> PortalKind {
        self.source
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl PartialEq for JobRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for JobRecord {}

impl Hash for JobRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} [{}]", self.title.trim(), self.company.trim(), self.source)
    }
}
