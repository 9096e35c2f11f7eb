//! 事件 Hook 模块
//!
//! - 过滤器以具体类型为注册键，同一类型内按值去重（见 [`EventFilter`]）
//! - 注册表维护 (hook, filter) 集合，提供幂等注册与显式移除
//! - 分发器按类型顺序分发并在分发边界隔离 Hook 失败

mod dispatcher;
mod filter;
mod registry;

pub use dispatcher::HookDispatcher;
pub use filter::{EventFilter, FilterKind, MessageFilter};
pub use registry::{EventHook, HookRegistry, hook_fn};
