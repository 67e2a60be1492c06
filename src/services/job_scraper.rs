//! 岗位抓取服务 - 业务能力层
//!
//! 打开门户的搜索页，滚动加载，逐张卡片读取标题 / 公司 / 地点 / 链接。
//! 只负责"抓取"能力，去重由调用方传入的 `JobDeduplicator` 完成。

use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::error::ApplyError;
use crate::infrastructure::{ElementRef, PageDriver, WaitPolicy};
use crate::models::{JobRecord, PortalKind};
use crate::services::job_dedup::JobDeduplicator;

/// 搜索结果卡片的选择器
#[derive(Debug, Clone, Copy)]
pub struct CardSelectors {
    pub card: &'static str,
    pub title: &'static str,
    pub company: &'static str,
    pub location: &'static str,
    /// 带 href 的元素
    pub link: &'static str,
    /// 下一页按钮（只有分页门户才有）
    pub next_page: Option<&'static str>,
}

impl CardSelectors {
    pub fn for_portal(portal: PortalKind) -> Option<Self> {
        let selectors = match portal {
            PortalKind::LinkedIn => CardSelectors {
                card: ".job-card-container",
                title: ".job-card-list__title",
                company: ".job-card-container__company-name",
                location: ".job-card-container__metadata-item",
                link: ".job-card-list__title",
                next_page: None,
            },
            PortalKind::Indeed => CardSelectors {
                card: ".job_seen_beacon",
                title: ".jobTitle",
                company: ".companyName",
                location: ".companyLocation",
                link: ".jobTitle a",
                next_page: Some("[aria-label='Next Page']"),
            },
            PortalKind::Internshala => CardSelectors {
                card: ".job_card",
                title: ".job_title",
                company: ".company_name",
                location: ".location_link",
                link: ".job_title",
                next_page: None,
            },
            PortalKind::Naukri => CardSelectors {
                card: ".jobTuple",
                title: ".title",
                company: ".companyInfo",
                location: ".location",
                link: ".title",
                next_page: None,
            },
            PortalKind::Unknown => return None,
        };
        Some(selectors)
    }
}

/// 门户首页（用于补全相对链接）
fn portal_origin(portal: PortalKind) -> Option<&'static str> {
    match portal {
        PortalKind::LinkedIn => Some("https://www.linkedin.com/"),
        PortalKind::Indeed => Some("https://www.indeed.com/"),
        PortalKind::Internshala => Some("https://internshala.com/"),
        PortalKind::Naukri => Some("https://www.naukri.com/"),
        PortalKind::Unknown => None,
    }
}

/// 路径中使用的关键字：小写、空白换成连字符
fn slug(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// 构造搜索页地址
pub fn search_url(portal: PortalKind, keywords: &str, location: &str) -> Option<String> {
    let url = match portal {
        PortalKind::LinkedIn => Url::parse_with_params(
            "https://www.linkedin.com/jobs/search/",
            &[("keywords", keywords.trim()), ("location", location.trim())],
        )
        .ok()?
        .to_string(),
        PortalKind::Indeed => Url::parse_with_params(
            "https://www.indeed.com/jobs",
            &[("q", keywords.trim()), ("l", location.trim())],
        )
        .ok()?
        .to_string(),
        PortalKind::Internshala => {
            format!("https://internshala.com/jobs/keywords-{}", slug(keywords))
        }
        PortalKind::Naukri => {
            if location.trim().is_empty() {
                format!("https://www.naukri.com/{}-jobs", slug(keywords))
            } else {
                format!(
                    "https://www.naukri.com/{}-jobs-in-{}",
                    slug(keywords),
                    slug(location)
                )
            }
        }
        PortalKind::Unknown => return None,
    };
    Some(url)
}

/// 岗位抓取服务
pub struct JobScraper {
    wait: WaitPolicy,
    scroll_rounds: usize,
    max_pages: usize,
    load_timeout: Duration,
    scroll_pause: Duration,
}

impl JobScraper {
    /// 创建新的抓取服务
    pub fn new(wait: WaitPolicy, scroll_rounds: usize, max_pages: usize) -> Self {
        Self {
            wait,
            scroll_rounds: scroll_rounds.max(1),
            max_pages: max_pages.max(1),
            load_timeout: Duration::from_secs(10),
            scroll_pause: Duration::from_secs(2),
        }
    }

    pub fn with_timing(mut self, load_timeout: Duration, scroll_pause: Duration) -> Self {
        self.load_timeout = load_timeout;
        self.scroll_pause = scroll_pause;
        self
    }

    /// 依次抓取多个门户
    ///
    /// 单个门户失败只记录日志；会话断开或取消时立即返回。
    pub async fn scrape_all(
        &self,
        driver: &dyn PageDriver,
        portals: &[PortalKind],
        keywords: &str,
        location: &str,
        dedup: &mut JobDeduplicator,
    ) -> Result<Vec<JobRecord>, ApplyError> {
        let mut jobs = Vec::new();
        for &portal in portals {
            match self.scrape_portal(driver, portal, keywords, location, dedup).await {
                Ok(found) => jobs.extend(found),
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => warn!("[{}] ⚠️ 抓取失败: {}", portal, e),
            }
        }
        Ok(jobs)
    }

    /// 抓取一个门户的搜索结果，只返回之前没见过的岗位
    pub async fn scrape_portal(
        &self,
        driver: &dyn PageDriver,
        portal: PortalKind,
        keywords: &str,
        location: &str,
        dedup: &mut JobDeduplicator,
    ) -> Result<Vec<JobRecord>, ApplyError> {
        let (Some(selectors), Some(url)) = (
            CardSelectors::for_portal(portal),
            search_url(portal, keywords, location),
        ) else {
            return Err(ApplyError::UnsupportedPortal {
                url: portal.to_string(),
            });
        };

        info!("[{}] 🔍 搜索: {}", portal, url);
        driver.navigate(&url).await?;

        // 已读到的岗位已经登记进去重集合，翻页中途出错也要把它们交出去
        let mut jobs = Vec::new();
        match self
            .collect_pages(driver, portal, &selectors, dedup, &mut jobs)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_batch_fatal() => return Err(e),
            Err(e) => warn!(
                "[{}] ⚠️ 翻页中断: {}，保留已找到的 {} 个岗位",
                portal,
                e,
                jobs.len()
            ),
        }

        info!("[{}] ✓ 共找到 {} 个新岗位", portal, jobs.len());
        Ok(jobs)
    }

    /// 逐页读取卡片，新岗位追加到 `jobs`
    async fn collect_pages(
        &self,
        driver: &dyn PageDriver,
        portal: PortalKind,
        selectors: &CardSelectors,
        dedup: &mut JobDeduplicator,
        jobs: &mut Vec<JobRecord>,
    ) -> Result<(), ApplyError> {
        let pages = if selectors.next_page.is_some() { self.max_pages } else { 1 };

        for page in 1..=pages {
            let loaded = self
                .wait
                .poll(self.load_timeout, || driver.find_element(selectors.card))
                .await?;
            if loaded.is_none() {
                warn!("[{}] 第 {} 页没有加载出岗位卡片", portal, page);
                break;
            }

            for round in 1..=self.scroll_rounds {
                driver.scroll_to_bottom().await?;
                self.wait.pause(self.scroll_pause).await?;

                let before = jobs.len();
                for card in driver.find_all(selectors.card).await? {
                    if let Some(job) = self.read_card(driver, portal, selectors, &card).await? {
                        if dedup.insert(&job) {
                            info!("[{}] 📌 {}", portal, job);
                            jobs.push(job);
                        }
                    }
                }
                debug!(
                    "[{}] 第 {} 页第 {} 轮滚动，新增 {} 个岗位",
                    portal,
                    page,
                    round,
                    jobs.len() - before
                );
            }

            let Some(next_selector) = selectors.next_page else {
                break;
            };
            if page == pages {
                break;
            }
            match driver.find_element(next_selector).await? {
                Some(next) => driver.click(&next).await?,
                None => break,
            }
        }
        Ok(())
    }

    /// 读取一张卡片，缺少标题 / 公司 / 链接时跳过
    async fn read_card(
        &self,
        driver: &dyn PageDriver,
        portal: PortalKind,
        selectors: &CardSelectors,
        card: &ElementRef,
    ) -> Result<Option<JobRecord>, ApplyError> {
        let Some(title) = read_text(driver, card, selectors.title).await? else {
            return Ok(None);
        };
        let Some(company) = read_text(driver, card, selectors.company).await? else {
            return Ok(None);
        };
        let location = read_text(driver, card, selectors.location)
            .await?
            .unwrap_or_default();

        let Some(link) = driver.find_within(card, selectors.link).await? else {
            return Ok(None);
        };
        let Some(href) = driver.attribute(&link, "href").await? else {
            return Ok(None);
        };
        let Some(url) = absolute_url(portal, &href) else {
            debug!("[{}] 无法解析链接: {}", portal, href);
            return Ok(None);
        };

        Ok(Some(JobRecord::new(title, company, location, url)))
    }
}

async fn read_text(
    driver: &dyn PageDriver,
    card: &ElementRef,
    selector: &str,
) -> Result<Option<String>, ApplyError> {
    let Some(element) = driver.find_within(card, selector).await? else {
        return Ok(None);
    };
    Ok(driver
        .text(&element)
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// 相对链接补全为门户的绝对地址
fn absolute_url(portal: PortalKind, href: &str) -> Option<String> {
    let href = href.trim();
    if let Ok(url) = Url::parse(href) {
        return Some(url.to_string());
    }
    let base = Url::parse(portal_origin(portal)?).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
