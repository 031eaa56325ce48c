//! 热替换句柄的配置构造器。
//!
//! # 设计初衷（Why）
//! - 将“标签”“准入校验”“初始实现”三项配置集中在一处装配，构造完成后全部不可变；
//! - 准入校验同时作用于初始实现与之后的每次替换，使“非法实现”规则只需声明一次。
//!
//! # 使用方式（How）
//! ```
//! use std::sync::Arc;
//! use hotswap_core::SwapHandle;
//!
//! let handle = SwapHandle::<str>::builder()
//!     .label("greeting")
//!     .initial(Arc::from("hello"))
//!     .admit(|candidate: &str| {
//!         if candidate.is_empty() {
//!             Err("empty greeting".into())
//!         } else {
//!             Ok(())
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert!(handle.replace(Arc::from("")).is_err());
//! assert_eq!(handle.call(|s| s.len()), 5);
//! ```

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;

use crate::error::SwapError;
use crate::handle::{DEFAULT_LABEL, SwapHandle};

/// 准入校验闭包：返回 `Err(reason)` 表示拒绝候选实现。
pub(crate) type Admission<T> = Arc<dyn Fn(&T) -> Result<(), Cow<'static, str>> + Send + Sync>;

/// [`SwapHandle`] 的构造器。
///
/// # 契约（What）
/// - `label` 默认为 `"anonymous"`，出现在错误与日志事件中；
/// - 未设置初始实现时 [`build`](Self::build) 返回 [`SwapError::MissingImplementation`]；
/// - 初始实现未通过准入校验时返回 [`SwapError::Rejected`]。
pub struct SwapHandleBuilder<T: ?Sized> {
    label: Cow<'static, str>,
    initial: Option<Arc<T>>,
    admission: Option<Admission<T>>,
}

impl<T: ?Sized> SwapHandleBuilder<T> {
    /// 空构造器。
    pub fn new() -> Self {
        Self {
            label: Cow::Borrowed(DEFAULT_LABEL),
            initial: None,
            admission: None,
        }
    }

    /// 设置句柄标签。
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// 设置初始实现。
    pub fn initial(mut self, initial: Arc<T>) -> Self {
        self.initial = Some(initial);
        self
    }

    /// 设置可能缺失的初始实现，缺失留待 [`build`](Self::build) 报告。
    pub fn initial_opt(mut self, initial: Option<Arc<T>>) -> Self {
        self.initial = initial;
        self
    }

    /// 设置准入校验。重复调用时后者覆盖前者。
    pub fn admit<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), Cow<'static, str>> + Send + Sync + 'static,
    {
        self.admission = Some(Arc::new(check));
        self
    }

    /// 完成装配。
    pub fn build(self) -> Result<SwapHandle<T>, SwapError> {
        let Self {
            label,
            initial,
            admission,
        } = self;

        let Some(initial) = initial else {
            tracing::warn!(handle = %label, "swap handle built without an initial implementation");
            return Err(SwapError::missing(&label));
        };

        if let Some(check) = &admission
            && let Err(reason) = check(&*initial)
        {
            tracing::warn!(handle = %label, %reason, "initial implementation rejected");
            return Err(SwapError::rejected(&label, reason));
        }

        Ok(SwapHandle::assemble(label, initial, admission))
    }
}

impl<T> SwapHandleBuilder<T> {
    /// 以值语义设置初始实现。
    pub fn initial_value(self, initial: T) -> Self {
        self.initial(Arc::new(initial))
    }
}

impl<T: ?Sized> Default for SwapHandleBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for SwapHandleBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapHandleBuilder")
            .field("label", &self.label)
            .field("has_initial", &self.initial.is_some())
            .field("has_admission", &self.admission.is_some())
            .finish()
    }
}
