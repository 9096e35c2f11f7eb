//! 错误类型定义
//!
//! - Hook 注册相关错误直接返回给调用方
//! - 账号协作方错误统一包装后向上传播，重试策略由嵌入方决定
//! - Hook 执行期间的失败在分发边界被隔离，不会出现在这里

use crate::hooks::FilterKind;

/// 客户端核心统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 移除未注册的 (hook, filter) 组合
    #[error("hook is not registered under filter kind {kind:?}")]
    HookNotFound {
        /// 本次移除操作使用的过滤器类型
        kind: FilterKind,
    },

    /// 账号协作方调用失败
    #[error("account operation failed: {0}")]
    Account(#[from] anyhow::Error),
}

impl ClientError {
    /// 便捷构造账号侧错误
    pub fn account<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        ClientError::Account(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
