//! Ripple Chat 客户端核心库
//!
//! 面向单账号的事件调度运行时，包括：
//! - 从账号连接拉取原始事件并做类型归一化与富化
//! - 以过滤器类型为键的 Hook 注册与顺序分发
//! - 从"收到消息"事件派生新消息 / 提示消息事件的分类子循环
//!
//! 网络 I/O、消息存储与账号生命周期管理由外部账号协作方实现，
//! 本库只依赖 [`account`] 模块定义的最小接口。

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod tracing;

pub use account::{Account, Message, RawAccountEvent, config_keys};
pub use client::{Bot, Client};
pub use config::{LoggingConfig, RuntimeConfig, load_config};
pub use error::{ClientError, Result};
pub use events::{Event, EventKind, HookPayload, MessageSnapshot};
pub use hooks::{
    EventFilter, EventHook, FilterKind, HookDispatcher, HookRegistry, MessageFilter, hook_fn,
};
