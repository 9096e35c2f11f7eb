//! 运行时配置模块
//!
//! 提供日志等基础设施配置的定义与加载：
//! - TOML 配置文件解析
//! - 任一来源失败时回退到默认值

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（trace/debug/info/warn/error）
    pub level: String,
    /// 是否输出日志来源 target
    pub with_target: bool,
    /// 是否输出线程 ID
    pub with_thread_ids: bool,
    /// 是否输出源码文件名
    pub with_file: bool,
    /// 是否输出源码行号
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// 客户端运行时配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 加载配置
///
/// 未指定路径时依次尝试默认候选文件，全部失败则回退到默认配置。
pub fn load_config(path: Option<&str>) -> RuntimeConfig {
    let candidates: Vec<&str> = match path {
        Some(p) => vec![p],
        None => vec!["config.toml", "ripple.toml"],
    };

    for candidate in candidates {
        match load_config_from_file(Path::new(candidate)) {
            Ok(cfg) => return cfg,
            Err(err) => warn!("failed to load config from {candidate}: {err}"),
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    RuntimeConfig::default()
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Result<RuntimeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config format: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_from_toml() {
        let cfg: RuntimeConfig = toml::from_str(
            r#"
            [logging]
            level = "info"
            with_target = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.with_target);
        // 未出现的字段保持默认值
        assert!(!cfg.logging.with_thread_ids);
    }

    #[test]
    fn test_runtime_config_defaults() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.with_target);
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let cfg = load_config(Some("/nonexistent/ripple.toml"));
        assert_eq!(cfg.logging.level, "debug");
    }
}
