//! 事件过滤器
//!
//! 过滤器的具体类型（[`FilterKind`]）作为注册表的分组键，同一类型内
//! 按值相等判定注册是否重复。过滤求值是异步操作，允许实现进行挂起
//! 式查询（例如确认消息的会话归属）。

use serde::{Deserialize, Serialize};

use crate::events::HookPayload;

/// 过滤器类型标识，作为注册表的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// 原始账号事件
    RawEvent,
    /// 新消息（非提示消息）
    NewMessage,
    /// 新提示消息
    NewInfoMessage,
}

impl FilterKind {
    /// 是否属于消息派生过滤器
    ///
    /// NewInfoMessage 是 NewMessage 的细分，两者都会触发消息分类子循环。
    pub fn is_message_filter(self) -> bool {
        matches!(self, FilterKind::NewMessage | FilterKind::NewInfoMessage)
    }
}

/// 消息过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFilter {
    /// 限定会话，None 表示任意会话
    #[serde(default)]
    pub chat_id: Option<u64>,
}

impl MessageFilter {
    /// 匹配任意会话的默认条件
    pub fn any() -> Self {
        Self::default()
    }

    /// 只匹配指定会话内的消息
    pub fn in_chat(chat_id: u64) -> Self {
        Self {
            chat_id: Some(chat_id),
        }
    }

    fn matches_chat(&self, chat_id: u64) -> bool {
        self.chat_id.map(|id| id == chat_id).unwrap_or(true)
    }
}

/// 事件过滤器：决定注册的 Hook 是否处理某个载荷
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFilter {
    /// 无条件匹配所有事件
    RawEvent,
    /// 匹配非提示消息快照
    NewMessage(MessageFilter),
    /// 匹配提示消息快照
    NewInfoMessage(MessageFilter),
}

impl EventFilter {
    /// 过滤器的类型标识
    pub fn kind(&self) -> FilterKind {
        match self {
            EventFilter::RawEvent => FilterKind::RawEvent,
            EventFilter::NewMessage(_) => FilterKind::NewMessage,
            EventFilter::NewInfoMessage(_) => FilterKind::NewInfoMessage,
        }
    }

    /// 对载荷求值，决定是否调用关联 Hook
    ///
    /// 求值允许挂起，当前内置变体均为纯判定。
    pub async fn matches(&self, payload: &HookPayload) -> bool {
        match (self, payload) {
            (EventFilter::RawEvent, _) => true,
            (EventFilter::NewMessage(filter), HookPayload::Message(snapshot)) => {
                !snapshot.is_info && filter.matches_chat(snapshot.chat_id)
            }
            (EventFilter::NewInfoMessage(filter), HookPayload::Message(snapshot)) => {
                snapshot.is_info && filter.matches_chat(snapshot.chat_id)
            }
            _ => false,
        }
    }
}

impl From<FilterKind> for EventFilter {
    /// 由类型标识构造该类型的默认过滤器实例
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::RawEvent => EventFilter::RawEvent,
            FilterKind::NewMessage => EventFilter::NewMessage(MessageFilter::default()),
            FilterKind::NewInfoMessage => EventFilter::NewInfoMessage(MessageFilter::default()),
        }
    }
}
