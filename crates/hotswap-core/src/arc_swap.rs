//! 条件性 `ArcSwap` 适配层：热替换发布点的唯一入口。
//!
//! # 设计初衷（Why）
//! - `std` 构建直接复用 [`arc-swap`](https://crates.io/crates/arc-swap)，读路径锁自由，写路径为 CAS 循环；
//! - `no_std + alloc` 下该库需要 nightly 特性，因此由 `spin` 特性提供以 `spin::RwLock` 封装的回退实现；
//! - `loom-model` 下发布点改由 `loom::sync::RwLock` 承载，使 Loom 能够穷举读写交错；该特性优先于其余两者。
//!
//! # 契约说明（What）
//! - 仅暴露 `handle` 模块用到的三个方法：`new`、`load_full`、`rcu`，签名与 `arc-swap` 保持一致；
//! - 回退实现同样保证“整值发布、无撕裂读”，但写操作会短暂阻塞读者。

#[cfg(not(any(feature = "std", feature = "spin", feature = "loom-model")))]
compile_error!("hotswap-core requires one of the `std`, `spin` or `loom-model` features");

#[cfg(all(feature = "std", not(feature = "loom-model")))]
pub(crate) use ::arc_swap::ArcSwap;

#[cfg(any(not(feature = "std"), feature = "loom-model"))]
pub(crate) use fallback::ArcSwap;

#[cfg(any(not(feature = "std"), feature = "loom-model"))]
mod fallback {
    use alloc::sync::Arc;

    #[cfg(feature = "loom-model")]
    use loom::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
    #[cfg(not(feature = "loom-model"))]
    use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    /// 读写锁版本的 `ArcSwap` 仿制实现。
    ///
    /// - **逻辑（How）**：内部保存 `RwLock<Arc<T>>`；读取时持有共享锁克隆 `Arc`，`rcu` 持有独占锁计算并替换；
    /// - **契约（What）**：`rcu` 的闭包在独占锁内恰好执行一次，返回被替换下来的旧快照；
    /// - **注意事项（Trade-offs）**：闭包不得再次访问同一容器，否则在自旋锁下会死锁。
    pub(crate) struct ArcSwap<T> {
        inner: RwLock<Arc<T>>,
    }

    impl<T> ArcSwap<T> {
        pub(crate) fn new(initial: Arc<T>) -> Self {
            Self {
                inner: RwLock::new(initial),
            }
        }

        pub(crate) fn load_full(&self) -> Arc<T> {
            Arc::clone(&read(&self.inner))
        }

        pub(crate) fn rcu<R, F>(&self, mut f: F) -> Arc<T>
        where
            F: FnMut(&Arc<T>) -> R,
            R: Into<Arc<T>>,
        {
            let mut guard = write(&self.inner);
            let next = f(&guard).into();
            core::mem::replace(&mut *guard, next)
        }
    }

    // 发布点内不会执行调用方代码，锁中毒只可能来自 Loom 主动注入的 panic，直接沿用内部值。
    #[cfg(feature = "loom-model")]
    fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(feature = "loom-model")]
    fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(not(feature = "loom-model"))]
    fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read()
    }

    #[cfg(not(feature = "loom-model"))]
    fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write()
    }
}
