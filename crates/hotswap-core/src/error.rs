//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 热替换核心自身只有两类失败：缺少实现、实现未通过准入校验；
//! - 实现内部抛出的错误（委托错误）不在此处建模，由 `call` 原样交还调用方。
//!
//! ## 设计要求（What）
//! - 错误携带句柄标签，便于在多句柄装配中定位来源；
//! - 提供稳定的 `hotswap.*` 错误码，供监督者或告警规则匹配。

use alloc::borrow::Cow;

use thiserror::Error;

/// 热替换句柄的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“句柄拒绝了实现”与“实现自己失败”，后者永远不会出现在本枚举中；
/// - **契约 (What)**：
///   - 构造或替换失败时，句柄保持原有实现不变；
///   - 所有变体可克隆、可比较，便于测试与跨线程传递；
/// - **设计权衡 (Trade-offs)**：标签与原因使用 `Cow<'static, str>`，静态字面量零分配，动态原因按需分配。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum SwapError {
    /// 构造或替换时未提供实现。
    ///
    /// - **触发点**：`SwapHandle::try_new(None)`、未设置初始实现的 builder、`try_replace(None)`。
    #[error("swap handle `{label}` requires an implementation")]
    MissingImplementation { label: Cow<'static, str> },

    /// 准入校验拒绝了候选实现。
    ///
    /// - **触发点**：builder 配置的 `admit` 闭包返回 `Err(reason)`；
    /// - **后置条件**：若发生在替换阶段，当前实现与世代号均保持不变。
    #[error("swap handle `{label}` rejected implementation: {reason}")]
    Rejected {
        label: Cow<'static, str>,
        reason: Cow<'static, str>,
    },
}

impl SwapError {
    /// 触发错误的句柄标签。
    pub fn label(&self) -> &str {
        match self {
            SwapError::MissingImplementation { label } | SwapError::Rejected { label, .. } => label,
        }
    }

    /// 稳定错误码，格式固定为 `hotswap.<kind>`。
    pub fn code(&self) -> &'static str {
        match self {
            SwapError::MissingImplementation { .. } => "hotswap.missing_implementation",
            SwapError::Rejected { .. } => "hotswap.rejected",
        }
    }

    pub(crate) fn missing(label: &Cow<'static, str>) -> Self {
        SwapError::MissingImplementation {
            label: label.clone(),
        }
    }

    pub(crate) fn rejected(label: &Cow<'static, str>, reason: Cow<'static, str>) -> Self {
        SwapError::Rejected {
            label: label.clone(),
            reason,
        }
    }
}
