//! 单账号客户端
//!
//! 主事件循环：拉取原始事件 → 归一化富化 → 按 RawEvent 类型分发；
//! 事件类型为 IncomingMsg 时进入消息分类子循环，将未处理消息派生为
//! NewMessage / NewInfoMessage 事件，并在分发完成后标记为已处理。
//!
//! 整个循环运行在单个逻辑任务上：一个事件（含其派生的消息分发）
//! 处理完毕后才会拉取下一个事件。取消由嵌入方在外层任务上执行。

use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::account::{Account, config_keys};
use crate::error::Result;
use crate::events::{Event, EventKind, HookPayload};
use crate::hooks::{EventFilter, EventHook, FilterKind, HookDispatcher, HookRegistry};

/// 监听单个账号事件的客户端
pub struct Client {
    account: Arc<dyn Account>,
    dispatcher: HookDispatcher,
}

impl Client {
    /// 创建注册表为空的客户端
    pub fn new(account: Arc<dyn Account>) -> Self {
        Self {
            account,
            dispatcher: HookDispatcher::new(Arc::new(HookRegistry::new())),
        }
    }

    /// 创建客户端并注册初始 Hook 集合
    pub async fn with_hooks<I>(account: Arc<dyn Account>, hooks: I) -> Self
    where
        I: IntoIterator<Item = (Arc<dyn EventHook>, EventFilter)>,
    {
        let client = Self::new(account);
        client.add_hooks(hooks).await;
        client
    }

    /// 所属账号
    pub fn account(&self) -> &Arc<dyn Account> {
        &self.account
    }

    /// Hook 注册表
    pub fn registry(&self) -> &Arc<HookRegistry> {
        self.dispatcher.registry()
    }

    /// 注册一个 Hook，重复注册同一组合为空操作
    pub async fn add_hook(&self, hook: Arc<dyn EventHook>, filter: impl Into<EventFilter>) {
        self.registry().add(hook, filter).await;
    }

    /// 批量注册 Hook
    pub async fn add_hooks<I>(&self, hooks: I)
    where
        I: IntoIterator<Item = (Arc<dyn EventHook>, EventFilter)>,
    {
        for (hook, filter) in hooks {
            self.add_hook(hook, filter).await;
        }
    }

    /// 移除一个 Hook
    ///
    /// 未注册的组合返回 [`crate::error::ClientError::HookNotFound`]。
    pub async fn remove_hook(
        &self,
        hook: &Arc<dyn EventHook>,
        filter: impl Into<EventFilter>,
    ) -> Result<()> {
        self.registry().remove(hook, filter).await
    }

    /// 账号是否已完成配置
    pub async fn is_configured(&self) -> Result<bool> {
        self.account.is_configured().await
    }

    /// 配置账号地址与口令，extra 中的键值原样透传给账号
    pub async fn configure(&self, addr: &str, password: &str, extra: &[(&str, &str)]) -> Result<()> {
        self.account.set_config(config_keys::ADDR, addr).await?;
        self.account.set_config(config_keys::MAIL_PW, password).await?;
        for (key, value) in extra.iter().copied() {
            self.account.set_config(key, value).await?;
        }
        self.account.configure().await?;
        debug!("account configured");
        Ok(())
    }

    /// 运行主事件循环直至被外部取消
    ///
    /// 正常情况下永不返回。账号协作方出错时错误向上传播，
    /// 重连与退避策略由嵌入方决定。
    pub async fn run_forever(&self) -> Result<Infallible> {
        self.run_until(|_| false).await?;
        unreachable!("run_until with a never-matching predicate cannot return normally")
    }

    /// 运行事件循环，直到某个原始事件满足谓词，返回该事件
    ///
    /// 谓词判定发生在该事件分发与消息分类之后。
    pub async fn run_until<P>(&self, predicate: P) -> Result<Event>
    where
        P: Fn(&Event) -> bool,
    {
        debug!("listening to incoming events");
        if self.is_configured().await? {
            self.account.start_io().await?;
        }
        // 先排空启动前已存在的未处理消息，保证重启行为确定
        self.process_messages().await?;
        loop {
            let raw = self.account.wait_for_event().await?;
            let event = Event::enrich(raw, Arc::clone(&self.account));
            trace!(kind = ?event.kind, "dispatching account event");
            let incoming = event.kind == EventKind::IncomingMsg;
            self.dispatcher
                .dispatch(&HookPayload::Event(event.clone()), FilterKind::RawEvent)
                .await;
            if incoming {
                self.process_messages().await?;
            }
            if predicate(&event) {
                return Ok(event);
            }
        }
    }

    /// 消息分类子循环
    ///
    /// 没有任何消息类 Hook 注册时直接跳过，不触发协作方调用。
    /// 消息按到达顺序处理；分发完成后才标记已处理，Hook 失败
    /// 不能阻塞消息前进，否则持续失败的 Hook 会让同一消息被反复投递。
    async fn process_messages(&self) -> Result<()> {
        if !self.registry().has_message_hooks().await {
            return Ok(());
        }
        for message in self.account.get_fresh_messages_in_arrival_order().await? {
            let snapshot = Arc::clone(&message).get_snapshot().await?;
            let kind = if snapshot.is_info {
                FilterKind::NewInfoMessage
            } else {
                FilterKind::NewMessage
            };
            self.dispatcher
                .dispatch(&HookPayload::Message(snapshot), kind)
                .await;
            message.mark_seen().await?;
        }
        Ok(())
    }
}

/// 机器人客户端：配置时默认将账号标记为 bot
pub struct Bot {
    inner: Client,
}

impl Bot {
    pub fn new(account: Arc<dyn Account>) -> Self {
        Self {
            inner: Client::new(account),
        }
    }

    /// 创建机器人客户端并注册初始 Hook 集合
    pub async fn with_hooks<I>(account: Arc<dyn Account>, hooks: I) -> Self
    where
        I: IntoIterator<Item = (Arc<dyn EventHook>, EventFilter)>,
    {
        Self {
            inner: Client::with_hooks(account, hooks).await,
        }
    }

    /// 同 [`Client::configure`]，但在调用方未指定时写入 bot=1
    pub async fn configure(&self, addr: &str, password: &str, extra: &[(&str, &str)]) -> Result<()> {
        if extra.iter().any(|(key, _)| *key == config_keys::BOT) {
            return self.inner.configure(addr, password, extra).await;
        }
        let mut extended: Vec<(&str, &str)> = extra.to_vec();
        extended.push((config_keys::BOT, "1"));
        self.inner.configure(addr, password, &extended).await
    }
}

impl Deref for Bot {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.inner
    }
}
