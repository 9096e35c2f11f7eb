//! Hook 注册表
//!
//! 以过滤器类型为键维护 (hook, filter) 注册集合：
//! - 同一类型内按 (hook 实例, filter 值) 去重，重复注册为幂等空操作
//! - 移除未注册的组合返回 [`ClientError::HookNotFound`]
//! - 分发方通过 [`HookRegistry::registrations`] 取集合快照，
//!   Hook 内部发起的注册变更只影响后续分发

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ClientError, Result};
use crate::events::HookPayload;

use super::filter::{EventFilter, FilterKind};

/// 事件 Hook：过滤器匹配后被调用的处理器
///
/// 返回的错误在分发边界被记录并隔离，不会中断同一事件的分发。
#[async_trait]
pub trait EventHook: Send + Sync {
    async fn handle(&self, payload: &HookPayload) -> Result<()>;
}

struct FnHook<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> EventHook for FnHook<F>
where
    F: Fn(HookPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, payload: &HookPayload) -> Result<()> {
        (self.f)(payload.clone()).await
    }
}

/// 将异步闭包适配为 Hook
pub fn hook_fn<F, Fut>(f: F) -> Arc<dyn EventHook>
where
    F: Fn(HookPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnHook { f })
}

/// 单条注册记录
pub(crate) struct Registration {
    pub(crate) hook: Arc<dyn EventHook>,
    pub(crate) filter: EventFilter,
}

impl Registration {
    /// 判定与给定组合是否为同一注册：
    /// hook 按 Arc 实例判同，filter 按值判同
    fn same_pair(&self, hook: &Arc<dyn EventHook>, filter: &EventFilter) -> bool {
        Arc::ptr_eq(&self.hook, hook) && self.filter == *filter
    }
}

impl Clone for Registration {
    fn clone(&self) -> Self {
        Self {
            hook: Arc::clone(&self.hook),
            filter: self.filter.clone(),
        }
    }
}

/// Hook 注册表，按过滤器类型分组
///
/// 注册表由客户端实例独占持有，注册变更与分发通过内部读写锁串行化。
#[derive(Default)]
pub struct HookRegistry {
    entries: RwLock<HashMap<FilterKind, Vec<Registration>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Hook
    ///
    /// 传入 [`FilterKind`] 时按默认过滤器实例注册。
    /// 重复注册同一 (hook, filter) 组合为空操作。
    pub async fn add(&self, hook: Arc<dyn EventHook>, filter: impl Into<EventFilter>) {
        let filter = filter.into();
        let kind = filter.kind();
        let mut entries = self.entries.write().await;
        let set = entries.entry(kind).or_default();
        if set.iter().any(|reg| reg.same_pair(&hook, &filter)) {
            tracing::debug!(filter = ?kind, "duplicate hook registration ignored");
            return;
        }
        set.push(Registration { hook, filter });
    }

    /// 移除注册
    ///
    /// 未注册的组合返回 [`ClientError::HookNotFound`]。
    pub async fn remove(
        &self,
        hook: &Arc<dyn EventHook>,
        filter: impl Into<EventFilter>,
    ) -> Result<()> {
        let filter = filter.into();
        let kind = filter.kind();
        let mut entries = self.entries.write().await;
        let Some(set) = entries.get_mut(&kind) else {
            return Err(ClientError::HookNotFound { kind });
        };
        let Some(pos) = set.iter().position(|reg| reg.same_pair(hook, &filter)) else {
            return Err(ClientError::HookNotFound { kind });
        };
        set.remove(pos);
        Ok(())
    }

    /// 返回指定类型注册集合的快照
    ///
    /// 仅做类型精确匹配。集合内部顺序对同一注册表实例稳定，
    /// 但不属于对外契约。
    pub(crate) async fn registrations(&self, kind: FilterKind) -> Vec<Registration> {
        let entries = self.entries.read().await;
        entries.get(&kind).cloned().unwrap_or_default()
    }

    /// 指定类型当前的注册数量
    pub async fn count(&self, kind: FilterKind) -> usize {
        let entries = self.entries.read().await;
        entries.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// 是否存在任一消息派生过滤器的注册
    ///
    /// 消息分类子循环以此决定是否拉取未处理消息；
    /// 被移除到空的集合不计入。
    pub async fn has_message_hooks(&self) -> bool {
        let entries = self.entries.read().await;
        entries
            .iter()
            .any(|(kind, set)| kind.is_message_filter() && !set.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::MessageFilter;

    fn noop_hook() -> Arc<dyn EventHook> {
        hook_fn(|_| async { Ok(()) })
    }

    #[test]
    fn test_duplicate_add_is_idempotent() {
        tokio_test::block_on(async {
            let registry = HookRegistry::new();
            let hook = noop_hook();

            registry.add(Arc::clone(&hook), FilterKind::NewMessage).await;
            registry.add(Arc::clone(&hook), FilterKind::NewMessage).await;

            assert_eq!(registry.count(FilterKind::NewMessage).await, 1);
        });
    }

    #[test]
    fn test_same_hook_with_different_filter_values_coexists() {
        tokio_test::block_on(async {
            let registry = HookRegistry::new();
            let hook = noop_hook();

            registry
                .add(Arc::clone(&hook), EventFilter::NewMessage(MessageFilter::in_chat(1)))
                .await;
            registry
                .add(Arc::clone(&hook), EventFilter::NewMessage(MessageFilter::in_chat(2)))
                .await;

            assert_eq!(registry.count(FilterKind::NewMessage).await, 2);
        });
    }

    #[tokio::test]
    async fn test_remove_unregistered_pair_fails() {
        let registry = HookRegistry::new();
        let hook = noop_hook();

        let err = registry.remove(&hook, FilterKind::RawEvent).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::HookNotFound {
                kind: FilterKind::RawEvent
            }
        ));
    }

    #[tokio::test]
    async fn test_remove_leaves_other_registrations_intact() {
        let registry = HookRegistry::new();
        let first = noop_hook();
        let second = noop_hook();

        registry.add(Arc::clone(&first), FilterKind::NewMessage).await;
        registry.add(Arc::clone(&second), FilterKind::NewMessage).await;

        registry.remove(&first, FilterKind::NewMessage).await.unwrap();

        assert_eq!(registry.count(FilterKind::NewMessage).await, 1);
        // 再次移除同一组合必须报告未注册
        assert!(registry.remove(&first, FilterKind::NewMessage).await.is_err());
    }

    #[tokio::test]
    async fn test_has_message_hooks_ignores_emptied_sets() {
        let registry = HookRegistry::new();
        let hook = noop_hook();

        assert!(!registry.has_message_hooks().await);

        registry.add(Arc::clone(&hook), FilterKind::NewInfoMessage).await;
        assert!(registry.has_message_hooks().await);

        registry.remove(&hook, FilterKind::NewInfoMessage).await.unwrap();
        assert!(!registry.has_message_hooks().await);
    }

    #[tokio::test]
    async fn test_raw_hooks_do_not_count_as_message_hooks() {
        let registry = HookRegistry::new();
        registry.add(noop_hook(), FilterKind::RawEvent).await;
        assert!(!registry.has_message_hooks().await);
    }
}
