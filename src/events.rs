//! 事件模型
//!
//! - [`EventKind`]：连接层事件标签的归一化枚举
//! - [`Event`]：经过富化的不可变事件值（归一化类型 + 所属账号）
//! - [`MessageSnapshot`]：派生消息事件携带的消息快照
//! - [`HookPayload`]：分发给过滤器与 Hook 的载荷
//!
//! 富化是独立的构造步骤而不是原地修改：每个收到的原始事件都会被
//! 构造成一个新的 [`Event`] 值，分发完成后即被丢弃。

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::account::{Account, Message, RawAccountEvent};

/// 归一化后的事件类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// 连接层的一般信息
    Info,
    /// 连接层警告
    Warning,
    /// 连接层错误
    Error,
    /// 连接状态变化
    ConnectivityChanged,
    /// 收到新消息，触发消息分类子循环
    IncomingMsg,
    /// 消息列表变化
    MsgsChanged,
    /// 消息送达
    MsgDelivered,
    /// 消息发送失败
    MsgFailed,
    /// 消息被阅读
    MsgRead,
    /// 会话属性变化
    ChatModified,
    /// 联系人变化
    ContactsChanged,
    /// 配置进度上报
    ConfigureProgress,
    /// 导入/导出进度上报
    ImexProgress,
    /// 未识别的事件标签，保留原始值
    Other(String),
}

impl EventKind {
    /// 将连接层的事件标签归一化为枚举值
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Info" => EventKind::Info,
            "Warning" => EventKind::Warning,
            "Error" => EventKind::Error,
            "ConnectivityChanged" => EventKind::ConnectivityChanged,
            "IncomingMsg" => EventKind::IncomingMsg,
            "MsgsChanged" => EventKind::MsgsChanged,
            "MsgDelivered" => EventKind::MsgDelivered,
            "MsgFailed" => EventKind::MsgFailed,
            "MsgRead" => EventKind::MsgRead,
            "ChatModified" => EventKind::ChatModified,
            "ContactsChanged" => EventKind::ContactsChanged,
            "ConfigureProgress" => EventKind::ConfigureProgress,
            "ImexProgress" => EventKind::ImexProgress,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        EventKind::from_tag(tag)
    }
}

/// 经过富化的事件：归一化类型 + 原始字段 + 所属账号
#[derive(Clone)]
pub struct Event {
    /// 归一化后的事件类型
    pub kind: EventKind,
    /// 连接层附带的原始字段
    pub fields: Map<String, Value>,
    /// 所属账号
    pub account: Arc<dyn Account>,
}

impl Event {
    /// 富化构造：归一化事件类型并挂接所属账号
    pub fn enrich(raw: RawAccountEvent, account: Arc<dyn Account>) -> Self {
        Self {
            kind: EventKind::from_tag(&raw.kind),
            fields: raw.fields,
            account,
        }
    }

    /// 读取一个原始字段
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// 消息快照：消息在读取时刻的只读视图
#[derive(Clone)]
pub struct MessageSnapshot {
    /// 消息 ID
    pub id: u64,
    /// 所属会话 ID
    pub chat_id: u64,
    /// 消息文本
    pub text: String,
    /// 是否为提示消息（系统生成的非会话内容）
    pub is_info: bool,
    /// 消息到达时间
    pub timestamp: DateTime<Utc>,
    /// 底层消息引用，用于 mark_seen 等后续操作
    pub message: Arc<dyn Message>,
}

impl fmt::Debug for MessageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSnapshot")
            .field("id", &self.id)
            .field("chat_id", &self.chat_id)
            .field("is_info", &self.is_info)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// 分发载荷：原始事件或派生的消息事件
#[derive(Debug, Clone)]
pub enum HookPayload {
    /// 原始账号事件
    Event(Event),
    /// 派生的消息事件
    Message(MessageSnapshot),
}

impl HookPayload {
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            HookPayload::Event(event) => Some(event),
            HookPayload::Message(_) => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageSnapshot> {
        match self {
            HookPayload::Event(_) => None,
            HookPayload::Message(snapshot) => Some(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_known_tag() {
        assert_eq!(EventKind::from_tag("IncomingMsg"), EventKind::IncomingMsg);
        assert_eq!(EventKind::from_tag("Info"), EventKind::Info);
        assert_eq!(
            EventKind::from_tag("ConnectivityChanged"),
            EventKind::ConnectivityChanged
        );
    }

    #[test]
    fn test_event_kind_preserves_unknown_tag() {
        let kind = EventKind::from_tag("SomethingNew");
        assert_eq!(kind, EventKind::Other("SomethingNew".to_string()));
    }
}
