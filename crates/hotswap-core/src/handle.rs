//! 可热替换的实现绑定。
//!
//! # 设计动机（Why）
//! - 持有者只拿一次句柄，之后无需感知实现何时被替换；“谁持有引用”与“引用当前解析到谁”彻底解耦；
//! - 替换以整值发布完成：新实现封装进不可变的 [`Slot`]，经 `ArcSwap` 原子替换，旧槽位从不被原地修改。
//!
//! # 核心契约（What）
//! - 每次调用在开始分派时读取一次快照，并在整个调用期间只面对这一个实现；
//! - 替换不等待在途调用：旧调用继续持有旧 `Arc`，结束后旧实现随最后一个引用释放；
//! - 替换之间由 `rcu` 的 CAS 循环串行化，世代号严格递增，最后写入者胜出。
//!
//! # 实现逻辑（How）
//! - 读路径：`load_full` 取得 `Arc<Slot<T>>`，交给 [`Snapshot`] 托管；
//! - 写路径：先执行准入校验，再以 `rcu` 基于被替换槽位的世代号派生新槽位。

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;
use core::ops::Deref;

use crate::arc_swap::ArcSwap;
use crate::builder::{Admission, SwapHandleBuilder};
use crate::error::SwapError;

/// 实现的世代号。
///
/// - 构造时的初始实现为 [`Generation::INITIAL`]；
/// - 每次成功替换恰好加一，因此同一句柄上的世代号可直接反映替换顺序。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Generation(u64);

impl Generation {
    /// 初始实现的世代号。
    pub const INITIAL: Generation = Generation(0);

    /// 以原始计数构造世代号，主要用于断言与日志关联。
    pub const fn new(value: u64) -> Self {
        Generation(value)
    }

    /// 原始计数值。
    pub const fn get(self) -> u64 {
        self.0
    }

    /// 下一世代。计数在 `u64::MAX` 处饱和：此后的替换仍会发布，但世代号不再前进。
    pub(crate) const fn next(self) -> Self {
        Generation(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// 发布点中保存的不可变槽位。
struct Slot<T: ?Sized> {
    generation: Generation,
    implementation: Arc<T>,
}

impl<T: ?Sized> Slot<T> {
    fn new(generation: Generation, implementation: Arc<T>) -> Arc<Self> {
        Arc::new(Self {
            generation,
            implementation,
        })
    }
}

/// 句柄与代理共享的绑定状态。
///
/// 标签与准入校验在构造后不可变，唯一可变的共享状态是 `current`。
pub(crate) struct Shared<T: ?Sized> {
    label: Cow<'static, str>,
    current: ArcSwap<Slot<T>>,
    admission: Option<Admission<T>>,
}

impl<T: ?Sized> Shared<T> {
    fn load(&self) -> Snapshot<T> {
        Snapshot {
            slot: self.current.load_full(),
        }
    }

    fn admit(&self, candidate: &T) -> Result<(), SwapError> {
        match &self.admission {
            Some(check) => check(candidate).map_err(|reason| {
                tracing::warn!(
                    handle = %self.label,
                    %reason,
                    "implementation rejected; keeping current binding"
                );
                SwapError::rejected(&self.label, reason)
            }),
            None => Ok(()),
        }
    }

    fn publish(&self, next: Arc<T>) -> Result<(Generation, Arc<T>), SwapError> {
        self.admit(&next)?;
        // `rcu` 在 CAS 竞争失败时会重跑闭包；闭包只依据被替换槽位派生世代号，重跑是幂等的。
        let previous = self
            .current
            .rcu(|current| Slot::new(current.generation.next(), Arc::clone(&next)));
        let published = previous.generation.next();
        tracing::info!(
            handle = %self.label,
            previous = %previous.generation,
            current = %published,
            "implementation replaced"
        );
        Ok((published, Arc::clone(&previous.implementation)))
    }
}

/// 单次分派捕获的实现快照。
///
/// # 契约（What）
/// - 持有期间所引用的实现不会被释放，即便句柄已经替换到更新的世代；
/// - 通过 `Deref` 直接访问实现，适合需要跨多步（例如 `.await`）保持同一实现的场景；
/// - 快照不会感知后续替换，长期持有会延迟旧实现的回收。
pub struct Snapshot<T: ?Sized> {
    slot: Arc<Slot<T>>,
}

impl<T: ?Sized> Snapshot<T> {
    /// 快照所属的世代号。
    pub fn generation(&self) -> Generation {
        self.slot.generation
    }

    /// 快照中的实现引用，可用于 `Arc::ptr_eq` 归属判断。
    pub fn implementation(&self) -> &Arc<T> {
        &self.slot.implementation
    }

    /// 取出实现的共享所有权，脱离快照继续使用。
    pub fn into_implementation(self) -> Arc<T> {
        Arc::clone(&self.slot.implementation)
    }
}

impl<T: ?Sized> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: ?Sized> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.slot.implementation
    }
}

impl<T: ?Sized> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("generation", &self.slot.generation)
            .finish_non_exhaustive()
    }
}

/// 可热替换实现的所有者句柄。
///
/// # 设计动机（Why）
/// - 作为唯一的间接点：调用方经由句柄（或其 [`SwapProxy`]）分派，从不需要重新获取实现；
/// - 替换能力只出现在本类型上，由持有替换策略的一方（运维入口、健康检查循环等）保管。
///
/// # 核心契约（What）
/// - [`call`](Self::call) 把闭包交给分派开始时的当前实现，返回值与错误原样透传；
/// - [`replace`](Self::replace) 原子发布新实现，不阻塞、不等待在途调用；
/// - 句柄本身只在构造或替换被拒绝时失败，见 [`SwapError`]。
///
/// # 风险提示（Trade-offs & Gotchas）
/// - 闭包内若长时间阻塞，会让被替换的旧实现存活到闭包返回；
/// - 克隆句柄会复制替换权限，只向需要替换的一方分发句柄，普通调用方应拿 [`SwapProxy`]。
pub struct SwapHandle<T: ?Sized> {
    shared: Arc<Shared<T>>,
}

impl<T: ?Sized> SwapHandle<T> {
    /// 以初始实现构造句柄，标签为 `"anonymous"`，无准入校验。
    pub fn new(initial: Arc<T>) -> Self {
        Self::assemble(Cow::Borrowed(DEFAULT_LABEL), initial, None)
    }

    /// 以可能缺失的初始实现构造句柄。
    ///
    /// # 契约（What）
    /// - `None` 返回 [`SwapError::MissingImplementation`]，不会产生半初始化的句柄。
    pub fn try_new(initial: Option<Arc<T>>) -> Result<Self, SwapError> {
        Self::builder().initial_opt(initial).build()
    }

    /// 获取配置构造器，可设置标签、准入校验与初始实现。
    pub fn builder() -> SwapHandleBuilder<T> {
        SwapHandleBuilder::new()
    }

    pub(crate) fn assemble(
        label: Cow<'static, str>,
        initial: Arc<T>,
        admission: Option<Admission<T>>,
    ) -> Self {
        tracing::debug!(handle = %label, generation = %Generation::INITIAL, "swap handle bound");
        Self {
            shared: Arc::new(Shared {
                label,
                current: ArcSwap::new(Slot::new(Generation::INITIAL, initial)),
                admission,
            }),
        }
    }

    /// 将操作分派给当前实现。
    ///
    /// # 契约（What）
    /// - 分派开始时读取一次快照，闭包全程面对同一实现；
    /// - 闭包的返回值（包括 `Result` 中的错误）不经任何包装直接返回。
    #[inline]
    pub fn call<R>(&self, op: impl FnOnce(&T) -> R) -> R {
        let snapshot = self.shared.load();
        op(&snapshot)
    }

    /// 捕获当前实现的快照。
    #[inline]
    pub fn snapshot(&self) -> Snapshot<T> {
        self.shared.load()
    }

    /// 当前实现的世代号。
    pub fn generation(&self) -> Generation {
        self.shared.load().generation()
    }

    /// 句柄标签。
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// 派生只读调用视图，与句柄共享同一绑定。
    pub fn proxy(&self) -> SwapProxy<T> {
        SwapProxy {
            shared: Arc::clone(&self.shared),
        }
    }

    /// 原子替换当前实现，返回新实现的世代号。
    ///
    /// # 契约（What）
    /// - **前置条件**：若配置了准入校验，`next` 必须通过；否则返回 [`SwapError::Rejected`]，绑定保持不变；
    /// - **后置条件**：返回后开始分派的调用必然观测到 `next`（或更晚的替换）；
    ///   与替换竞争的调用可能观测到新旧任一实现，但不会观测到混合状态。
    pub fn replace(&self, next: Arc<T>) -> Result<Generation, SwapError> {
        self.shared.publish(next).map(|(generation, _)| generation)
    }

    /// 以可能缺失的实现执行替换；`None` 返回 [`SwapError::MissingImplementation`] 并保持原实现。
    pub fn try_replace(&self, next: Option<Arc<T>>) -> Result<Generation, SwapError> {
        match next {
            Some(next) => self.replace(next),
            None => {
                tracing::warn!(
                    handle = %self.shared.label,
                    "replacement without implementation; keeping current binding"
                );
                Err(SwapError::missing(&self.shared.label))
            }
        }
    }

    /// 替换当前实现，并把被替换下来的旧实现交还调用方（用于回收或审计）。
    pub fn swap(&self, next: Arc<T>) -> Result<Arc<T>, SwapError> {
        self.shared.publish(next).map(|(_, previous)| previous)
    }
}

impl<T> SwapHandle<T> {
    /// 以值语义构造句柄，内部自动封装为 `Arc`。
    pub fn from_value(initial: T) -> Self {
        Self::new(Arc::new(initial))
    }
}

impl<T: ?Sized> Clone for SwapHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: ?Sized> fmt::Debug for SwapHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapHandle")
            .field("label", &self.shared.label)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

/// 面向普通调用方的转发代理。
///
/// - 与 [`SwapHandle`] 共享同一绑定，但不提供任何替换操作；
/// - 句柄替换后，代理的下一次调用即观测到新实现，无需重新获取。
pub struct SwapProxy<T: ?Sized> {
    shared: Arc<Shared<T>>,
}

impl<T: ?Sized> SwapProxy<T> {
    /// 将操作分派给当前实现，语义同 [`SwapHandle::call`]。
    #[inline]
    pub fn call<R>(&self, op: impl FnOnce(&T) -> R) -> R {
        let snapshot = self.shared.load();
        op(&snapshot)
    }

    /// 捕获当前实现的快照。
    #[inline]
    pub fn snapshot(&self) -> Snapshot<T> {
        self.shared.load()
    }

    /// 当前实现的世代号。
    pub fn generation(&self) -> Generation {
        self.shared.load().generation()
    }

    /// 所属句柄的标签。
    pub fn label(&self) -> &str {
        &self.shared.label
    }
}

impl<T: ?Sized> Clone for SwapProxy<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: ?Sized> fmt::Debug for SwapProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapProxy")
            .field("label", &self.shared.label)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

pub(crate) const DEFAULT_LABEL: &str = "anonymous";
