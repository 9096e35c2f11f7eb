//! 账号协作方接口
//!
//! 核心不实现网络 I/O、消息存储与账号生命周期管理，这些能力由外部
//! 账号实现提供；本模块定义核心依赖的最小协作接口。
//!
//! 协作方调用失败一律向上传播，重连与退避策略由嵌入方决定。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::events::MessageSnapshot;

/// 常用账号配置键
pub mod config_keys {
    /// 账号地址
    pub const ADDR: &str = "addr";
    /// 账号口令
    pub const MAIL_PW: &str = "mail_pw";
    /// 机器人标记
    pub const BOT: &str = "bot";
}

/// 账号连接产出的原始事件，类型标签尚未归一化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAccountEvent {
    /// 连接层的事件类型标签
    pub kind: String,
    /// 事件附带字段
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawAccountEvent {
    pub fn new<T: Into<String>>(kind: T) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// 单个账号连接
#[async_trait]
pub trait Account: Send + Sync {
    /// 账号是否已完成配置
    async fn is_configured(&self) -> Result<bool>;

    /// 写入一项账号配置
    async fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// 按已写入的配置项完成账号配置
    async fn configure(&self) -> Result<()>;

    /// 启动账号 I/O 子系统
    async fn start_io(&self) -> Result<()>;

    /// 挂起等待下一个事件
    async fn wait_for_event(&self) -> Result<RawAccountEvent>;

    /// 按到达顺序（从旧到新）返回所有未处理消息
    async fn get_fresh_messages_in_arrival_order(&self) -> Result<Vec<Arc<dyn Message>>>;
}

/// 账号中的一条消息
#[async_trait]
pub trait Message: Send + Sync {
    /// 获取消息当前状态的只读快照
    ///
    /// 快照持有底层消息引用，接收方可以据此执行 [`Message::mark_seen`]
    /// 等后续操作。
    async fn get_snapshot(self: Arc<Self>) -> Result<MessageSnapshot>;

    /// 将消息标记为已读/已处理
    async fn mark_seen(&self) -> Result<()>;
}
