//! Hook 分发器
//!
//! 在分发边界隔离 Hook 失败：匹配 Hook 返回的错误只记录日志，
//! 不影响同一事件的后续 Hook，也不影响外层事件循环。

use std::sync::Arc;

use tracing::error;

use crate::events::HookPayload;

use super::filter::FilterKind;
use super::registry::HookRegistry;

/// Hook 分发器，封装注册表的分发入口
#[derive(Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// 将载荷顺序分发给指定过滤器类型下的所有注册
    ///
    /// 注册集合在进入循环前快照，Hook 内部发起的注册变更只影响
    /// 后续分发。单个 Hook 的失败不会中断分发。
    pub async fn dispatch(&self, payload: &HookPayload, kind: FilterKind) {
        for registration in self.registry.registrations(kind).await {
            if !registration.filter.matches(payload).await {
                continue;
            }
            if let Err(err) = registration.hook.handle(payload).await {
                error!(filter = ?kind, error = %err, "event hook failed, continuing dispatch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::account::Message;
    use crate::error::{ClientError, Result};
    use crate::events::MessageSnapshot;
    use crate::hooks::{EventFilter, FilterKind, MessageFilter, hook_fn};

    struct NullMessage;

    #[async_trait]
    impl Message for NullMessage {
        async fn get_snapshot(self: Arc<Self>) -> Result<MessageSnapshot> {
            unimplemented!("not used by dispatcher tests")
        }

        async fn mark_seen(&self) -> Result<()> {
            Ok(())
        }
    }

    fn message_payload(id: u64) -> HookPayload {
        HookPayload::Message(MessageSnapshot {
            id,
            chat_id: 1,
            text: "hello".to_string(),
            is_info: false,
            timestamp: Utc::now(),
            message: Arc::new(NullMessage),
        })
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_stop_dispatch() {
        let registry = Arc::new(HookRegistry::new());
        let dispatcher = HookDispatcher::new(Arc::clone(&registry));

        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        registry
            .add(
                hook_fn(|_| async { Err(ClientError::account(anyhow::anyhow!("boom"))) }),
                FilterKind::NewMessage,
            )
            .await;

        let seen_clone = Arc::clone(&seen);
        registry
            .add(
                hook_fn(move |payload| {
                    let seen = Arc::clone(&seen_clone);
                    async move {
                        if let HookPayload::Message(snapshot) = &payload {
                            seen.lock().unwrap().push(snapshot.id);
                        }
                        Ok(())
                    }
                }),
                FilterKind::NewMessage,
            )
            .await;

        dispatcher.dispatch(&message_payload(42), FilterKind::NewMessage).await;

        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[tokio::test]
    async fn test_non_matching_filter_skips_hook() {
        let registry = Arc::new(HookRegistry::new());
        let dispatcher = HookDispatcher::new(Arc::clone(&registry));

        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        registry
            .add(
                hook_fn(move |payload| {
                    let seen = Arc::clone(&seen_clone);
                    async move {
                        if let HookPayload::Message(snapshot) = &payload {
                            seen.lock().unwrap().push(snapshot.id);
                        }
                        Ok(())
                    }
                }),
                EventFilter::NewMessage(MessageFilter::in_chat(999)),
            )
            .await;

        dispatcher.dispatch(&message_payload(42), FilterKind::NewMessage).await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_from_hook_only_affects_later_dispatch() {
        let registry = Arc::new(HookRegistry::new());
        let dispatcher = HookDispatcher::new(Arc::clone(&registry));

        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let late_seen = Arc::clone(&seen);
        let late_hook = hook_fn(move |_| {
            let seen = Arc::clone(&late_seen);
            async move {
                seen.lock().unwrap().push("late");
                Ok(())
            }
        });

        let registry_clone = Arc::clone(&registry);
        registry
            .add(
                hook_fn(move |_| {
                    let registry = Arc::clone(&registry_clone);
                    let late_hook = Arc::clone(&late_hook);
                    async move {
                        registry.add(late_hook, FilterKind::NewMessage).await;
                        Ok(())
                    }
                }),
                FilterKind::NewMessage,
            )
            .await;

        // 首轮分发时 late hook 尚未进入快照
        dispatcher.dispatch(&message_payload(1), FilterKind::NewMessage).await;
        assert!(seen.lock().unwrap().is_empty());

        // 次轮分发可以看到新增注册
        dispatcher.dispatch(&message_payload(2), FilterKind::NewMessage).await;
        assert_eq!(*seen.lock().unwrap(), vec!["late"]);
    }
}
