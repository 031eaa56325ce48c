#![cfg_attr(not(any(feature = "std", feature = "loom-model")), no_std)]
#![deny(unsafe_code)]
#![doc = "hotswap-core: 运行期可热替换的能力绑定与透明转发核心。"]
#![doc = ""]
#![doc = "== 角色定位 =="]
#![doc = "调用方持有一个稳定的间接点（[`SwapHandle`] 或其只读视图 [`SwapProxy`]），经由它调用能力（trait）上的操作；"]
#![doc = "持有替换策略的一方可随时以 [`SwapHandle::replace`] 原子发布新实现，调用方无需重新获取引用。"]
#![doc = ""]
#![doc = "== 并发语义 =="]
#![doc = "每次调用在分派开始时读取一次实现快照，并在整个调用期间只面对该实现；替换不等待在途调用，"]
#![doc = "被替换的实现在最后一个在途调用结束后自动释放。替换之间以 CAS 串行化，世代号 [`Generation`] 严格递增。"]
#![doc = ""]
#![doc = "== 错误语义 =="]
#![doc = "句柄自身只在构造或替换被拒绝时失败（[`SwapError`]）；实现返回的错误原样透传，不做包装。"]

extern crate alloc;
#[cfg(all(test, not(any(feature = "std", feature = "loom-model"))))]
extern crate std;

mod arc_swap;
mod macros;

pub mod builder;
pub mod error;
pub mod handle;

pub use builder::SwapHandleBuilder;
pub use error::SwapError;
pub use handle::{Generation, Snapshot, SwapHandle, SwapProxy};
