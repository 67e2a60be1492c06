//! 程序配置
//!
//! 加载顺序：默认值 ← 配置文件（JSON / TOML，按扩展名判断）← `APPLY_*` 环境变量。

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::{PortalKind, StepState};
use crate::services::AnswerPolicy;
use crate::workflow::ContactProfile;

/// 每个步骤的探测超时（秒，可以是小数）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTimeouts {
    pub entry: f64,
    pub contact: f64,
    pub resume: f64,
    pub questions: f64,
    pub review: f64,
    pub submit: f64,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            entry: 10.0,
            contact: 10.0,
            resume: 5.0,
            questions: 5.0,
            review: 10.0,
            submit: 15.0,
        }
    }
}

impl StepTimeouts {
    /// 探测某个步骤时使用的超时
    pub fn for_step(&self, step: StepState) -> Duration {
        let secs = match step {
            StepState::NotStarted | StepState::EntryOpened => self.entry,
            StepState::ContactInfo => self.contact,
            StepState::ResumeUpload => self.resume,
            StepState::ScreeningQuestions => self.questions,
            StepState::Review => self.review,
            StepState::Submitted | StepState::Failed => self.submit,
        };
        seconds(secs)
    }

    pub fn submit(&self) -> Duration {
        seconds(self.submit)
    }

    fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("step_timeout_seconds.entry", self.entry),
            ("step_timeout_seconds.contact", self.contact),
            ("step_timeout_seconds.resume", self.resume),
            ("step_timeout_seconds.questions", self.questions),
            ("step_timeout_seconds.review", self.review),
            ("step_timeout_seconds.submit", self.submit),
        ]
    }
}

/// 程序配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 搜索 ---
    /// 搜索关键字
    pub keywords: String,
    /// 搜索地点
    pub location: String,
    /// 启用的门户
    pub portals: Vec<PortalKind>,
    /// 每个搜索页的滚动加载轮数
    pub scrape_scroll_rounds: usize,
    /// 分页门户最多抓取的页数
    pub scrape_max_pages: usize,

    // --- 投递 ---
    /// 简历文件路径
    pub resume_path: String,
    /// 两次投递之间的间隔（秒）
    pub rate_limit_seconds: f64,
    /// "继续"按钮循环的最大次数
    pub max_step_advance_iterations: usize,
    pub step_timeout_seconds: StepTimeouts,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 同时打开的浏览器会话数（>1 时按门户并行）
    pub max_concurrent_sessions: usize,
    /// 整个批次的最长运行时间（秒），超过后取消
    pub run_timeout_seconds: Option<u64>,
    pub screening: AnswerPolicy,
    pub contact: ContactProfile,

    // --- 浏览器 ---
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 连接不到调试端口时是否启动无头浏览器
    pub headless: bool,
    pub chrome_executable: Option<String>,

    // --- 文件 ---
    /// 岗位列表文件
    pub jobs_file: String,
    /// 批次报告
    pub report_file: String,
    /// 失败岗位清单（纯文本，便于手动补投）
    pub failed_jobs_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: "Software Engineer".to_string(),
            location: "India".to_string(),
            portals: PortalKind::SUPPORTED.to_vec(),
            scrape_scroll_rounds: 5,
            scrape_max_pages: 3,
            resume_path: "resume.pdf".to_string(),
            rate_limit_seconds: 5.0,
            max_step_advance_iterations: 10,
            step_timeout_seconds: StepTimeouts::default(),
            poll_interval_ms: 500,
            max_concurrent_sessions: 1,
            run_timeout_seconds: None,
            screening: AnswerPolicy::default(),
            contact: ContactProfile::default(),
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            jobs_file: "jobs.json".to_string(),
            report_file: "report.json".to_string(),
            failed_jobs_file: "failed_jobs.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从配置文件读取（未出现的字段取默认值）
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(&display, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| AppError::file_parse_failed(&display, e)),
            Some("toml") => {
                toml::from_str(&content).map_err(|e| AppError::file_parse_failed(&display, e))
            }
            _ => Err(AppError::File(FileError::UnsupportedFormat { path: display })),
        }
    }

    /// 默认值 ← 配置文件（可选）← 环境变量，并校验
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 用 `lookup` 返回的值覆盖对应字段
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APPLY_KEYWORDS") {
            self.keywords = v;
        }
        if let Some(v) = lookup("APPLY_LOCATION") {
            self.location = v;
        }
        if let Some(v) = lookup("APPLY_RESUME_PATH") {
            self.resume_path = v;
        }
        if let Some(v) = lookup("APPLY_PORTALS") {
            self.portals = parse_portals(&v)?;
        }
        if let Some(v) = lookup("APPLY_JOBS_FILE") {
            self.jobs_file = v;
        }
        if let Some(v) = lookup("APPLY_REPORT_FILE") {
            self.report_file = v;
        }
        if let Some(v) = lookup("APPLY_OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Some(v) = lookup("APPLY_CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }

        parse_into(&lookup, "APPLY_RATE_LIMIT_SECONDS", "number", &mut self.rate_limit_seconds)?;
        parse_into(
            &lookup,
            "APPLY_MAX_STEP_ADVANCE_ITERATIONS",
            "usize",
            &mut self.max_step_advance_iterations,
        )?;
        parse_into(&lookup, "APPLY_POLL_INTERVAL_MS", "u64", &mut self.poll_interval_ms)?;
        parse_into(
            &lookup,
            "APPLY_MAX_CONCURRENT_SESSIONS",
            "usize",
            &mut self.max_concurrent_sessions,
        )?;
        parse_into(&lookup, "APPLY_BROWSER_DEBUG_PORT", "u16", &mut self.browser_debug_port)?;
        parse_into(&lookup, "APPLY_HEADLESS", "bool", &mut self.headless)?;
        parse_into(&lookup, "APPLY_VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;
        parse_into(&lookup, "APPLY_SCRAPE_SCROLL_ROUNDS", "usize", &mut self.scrape_scroll_rounds)?;
        parse_into(&lookup, "APPLY_SCRAPE_MAX_PAGES", "usize", &mut self.scrape_max_pages)?;

        if let Some(v) = lookup("APPLY_RUN_TIMEOUT_SECONDS") {
            let secs = v.parse().map_err(|_| env_parse_error("APPLY_RUN_TIMEOUT_SECONDS", &v, "u64"))?;
            self.run_timeout_seconds = Some(secs);
        }
        Ok(())
    }

    /// 检查取值是否合法
    pub fn validate(&self) -> AppResult<()> {
        if self.max_step_advance_iterations == 0 {
            return Err(invalid("max_step_advance_iterations", "必须大于 0"));
        }
        if self.max_concurrent_sessions == 0 {
            return Err(invalid("max_concurrent_sessions", "必须大于 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "必须大于 0"));
        }
        if self.portals.contains(&PortalKind::Unknown) {
            return Err(invalid("portals", "不能包含 Unknown"));
        }
        check_seconds("rate_limit_seconds", self.rate_limit_seconds)?;
        for (field, value) in self.step_timeout_seconds.fields() {
            check_seconds(field, value)?;
        }
        self.validate_contact()
    }

    /// 联系方式会原样填进门户表单，格式不对时尽早报错
    fn validate_contact(&self) -> AppResult<()> {
        let phone_re = Regex::new(r"^\+?[0-9][0-9 \-]{6,18}$")
            .map_err(|e| invalid("contact.phone", &e.to_string()))?;
        let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .map_err(|e| invalid("contact.email", &e.to_string()))?;

        if let Some(phone) = self.contact.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            if !phone_re.is_match(phone.trim()) {
                return Err(invalid("contact.phone", "不是有效的电话号码"));
            }
        }
        if let Some(email) = self.contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
            if !email_re.is_match(email.trim()) {
                return Err(invalid("contact.email", "不是有效的邮箱地址"));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn rate_limit(&self) -> Duration {
        seconds(self.rate_limit_seconds)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_seconds.map(Duration::from_secs)
    }
}

/// 秒数转为 `Duration`；非法值已在 `validate` 中拒绝，这里退化为 0
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn check_seconds(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, "必须是非负的有限数"));
    }
    Ok(())
}

fn parse_into<F, T>(lookup: &F, key: &str, expected: &str, target: &mut T) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(v) = lookup(key) {
        *target = v.trim().parse().map_err(|_| env_parse_error(key, &v, expected))?;
    }
    Ok(())
}

fn parse_portals(value: &str) -> AppResult<Vec<PortalKind>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|name| {
            PortalKind::from_name(name)
                .ok_or_else(|| env_parse_error("APPLY_PORTALS", name, "portal name"))
        })
        .collect()
}

fn env_parse_error(var_name: &str, value: &str, expected_type: &str) -> AppError {
    AppError::Config(ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: expected_type.to_string(),
    })
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.rate_limit(), Duration::from_secs(5));
        assert_eq!(config.max_step_advance_iterations, 10);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(
            config.step_timeout_seconds.for_step(StepState::EntryOpened),
            Duration::from_secs(10)
        );
        assert_eq!(config.step_timeout_seconds.submit(), Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_replace_fields() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("APPLY_KEYWORDS", "Rust Developer"),
                ("APPLY_RATE_LIMIT_SECONDS", "0"),
                ("APPLY_PORTALS", "indeed, naukri"),
                ("APPLY_RUN_TIMEOUT_SECONDS", "600"),
            ]))
            .unwrap();

        assert_eq!(config.keywords, "Rust Developer");
        assert_eq!(config.rate_limit_seconds, 0.0);
        assert_eq!(config.portals, vec![PortalKind::Indeed, PortalKind::Naukri]);
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("APPLY_BROWSER_DEBUG_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { ref var_name, .. })
                if var_name == "APPLY_BROWSER_DEBUG_PORT"
        ));
    }

    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
keywords = "Data Engineer"
max_step_advance_iterations = 4

[step_timeout_seconds]
submit = 30

[screening]
years_of_experience = 2
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.keywords, "Data Engineer");
        assert_eq!(config.max_step_advance_iterations, 4);
        assert_eq!(config.step_timeout_seconds.submit, 30.0);
        assert_eq!(config.step_timeout_seconds.entry, 10.0);
        assert_eq!(config.screening.years_of_experience, 2);
        assert_eq!(config.screening.yes_no_answer, "Yes");
        assert_eq!(config.jobs_file, "jobs.json");
    }

    #[test]
    fn json_file_and_unsupported_extension() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"location": "Remote", "portals": ["LinkedIn"]}}"#).unwrap();
        let config = Config::from_file(json.path()).unwrap();
        assert_eq!(config.location, "Remote");
        assert_eq!(config.portals, vec![PortalKind::LinkedIn]);

        let yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            Config::from_file(yaml.path()),
            Err(AppError::File(FileError::UnsupportedFormat { .. }))
        ));
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let config = Config {
            max_step_advance_iterations: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn contact_format_is_checked() {
        let mut config = Config::default();
        config.contact.phone = Some("+91 98765 43210".into());
        config.contact.email = Some("me@example.com".into());
        assert!(config.validate().is_ok());

        config.contact.phone = Some("call me".into());
        assert!(config.validate().is_err());

        config.contact.phone = None;
        config.contact.email = Some("not-an-email".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        let config: Config = serde_json::from_str(
            r#"{"rate_limit_seconds": 2.5, "step_timeout_seconds": {"review": 0.75}}"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit(), Duration::from_millis(2500));
        assert_eq!(
            config.step_timeout_seconds.for_step(StepState::Review),
            Duration::from_millis(750)
        );

        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[("APPLY_RATE_LIMIT_SECONDS", "0.5")]))
            .unwrap();
        assert_eq!(config.rate_limit(), Duration::from_millis(500));
    }

    #[test]
    fn negative_or_infinite_seconds_are_rejected() {
        let config = Config {
            rate_limit_seconds: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.step_timeout_seconds.submit = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "step_timeout_seconds.submit"
        ));
    }
}
