use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::StepState;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Browser(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    ConfigurationFailed { message: String },
    /// 启动浏览器失败
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            BrowserError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            BrowserError::ConfigurationFailed { message } => {
                write!(f, "浏览器配置失败: {}", message)
            }
            BrowserError::LaunchFailed { source } => {
                write!(f, "启动浏览器失败: {}", source)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. }
            | BrowserError::PageCreationFailed { source }
            | BrowserError::LaunchFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            BrowserError::ConfigurationFailed { .. } => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文件内容解析失败（JSON / TOML）
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 不支持的文件格式
    UnsupportedFormat { path: String },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::ParseFailed { path, source } => {
                write!(f, "解析文件失败 ({}): {}", path, source)
            }
            FileError::UnsupportedFormat { path } => {
                write!(f, "不支持的文件格式: {}", path)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::UnsupportedFormat { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "配置项 {} 非法: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件解析错误
    pub fn file_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

// ========== 投递流程错误 ==========

/// 单次投递过程中可能出现的错误
///
/// 除 `SessionLost` / `Cancelled` 外都只影响当前岗位，会被状态机转成失败结果；
/// 这两个属于批次级错误，会中止同一会话中剩余的岗位。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// 在超时时间内没有找到元素
    #[error("元素未找到: {selector}")]
    ElementNotFound { selector: String },

    /// 步骤动作完成后，继续按钮一直没有出现
    #[error("步骤 {step:?} 之后未出现继续按钮")]
    StepAdvanceTimeout { step: StepState },

    /// 步进循环中找不到继续 / 提交按钮，或超过最大循环次数
    #[error("找不到继续或提交按钮 (已循环 {iterations} 次)")]
    NoAdvanceControlFound { iterations: usize },

    /// 点击提交后无法判断是否成功
    #[error("无法判断提交结果")]
    TerminalStateAmbiguous,

    /// 门户明确显示提交失败（校验错误等）
    #[error("门户拒绝了提交: {detail}")]
    SubmissionRejected { detail: String },

    /// 没有对应门户的适配器
    #[error("不支持的门户: {url}")]
    UnsupportedPortal { url: String },

    /// 页面驱动 / 浏览器会话失效
    #[error("浏览器会话已断开: {0}")]
    SessionLost(String),

    /// 批次被操作者取消或超时
    #[error("批次已取消")]
    Cancelled,

    /// 适配器内部出现意外（panic）
    #[error("适配器内部错误: {0}")]
    Internal(String),
}

/// 错误种类（写入报告用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ElementNotFound,
    StepAdvanceTimeout,
    NoAdvanceControlFound,
    TerminalStateAmbiguous,
    SubmissionRejected,
    UnsupportedPortal,
    SessionLost,
    Cancelled,
    Internal,
}

impl ApplyError {
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        ApplyError::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// 获取错误种类
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplyError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            ApplyError::StepAdvanceTimeout { .. } => ErrorKind::StepAdvanceTimeout,
            ApplyError::NoAdvanceControlFound { .. } => ErrorKind::NoAdvanceControlFound,
            ApplyError::TerminalStateAmbiguous => ErrorKind::TerminalStateAmbiguous,
            ApplyError::SubmissionRejected { .. } => ErrorKind::SubmissionRejected,
            ApplyError::UnsupportedPortal { .. } => ErrorKind::UnsupportedPortal,
            ApplyError::SessionLost(_) => ErrorKind::SessionLost,
            ApplyError::Cancelled => ErrorKind::Cancelled,
            ApplyError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 是否为批次级错误（需要中止剩余岗位）
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, ApplyError::SessionLost(_) | ApplyError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_session_and_cancel_are_batch_fatal() {
        assert!(ApplyError::SessionLost("ws closed".into()).is_batch_fatal());
        assert!(ApplyError::Cancelled.is_batch_fatal());
        assert!(!ApplyError::TerminalStateAmbiguous.is_batch_fatal());
        assert!(!ApplyError::element_not_found("input[type='file']").is_batch_fatal());
    }

    #[test]
    fn kind_matches_variant() {
        let err = ApplyError::StepAdvanceTimeout {
            step: StepState::ResumeUpload,
        };
        assert_eq!(err.kind(), ErrorKind::StepAdvanceTimeout);
        assert_eq!(
            serde_json::to_string(&err.kind()).unwrap(),
            "\"StepAdvanceTimeout\""
        );
    }

    #[test]
    fn file_errors_keep_their_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AppError::file_read_failed("jobs.json", io);
        assert!(err.to_string().contains("jobs.json"));
        let file_err = err.source().unwrap();
        assert_eq!(file_err.source().unwrap().to_string(), "no such file");
    }
}
