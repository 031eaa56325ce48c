//! 能力转发宏。
//!
//! - 只生成显式的逐方法委托代码，不隐藏任何全局状态；
//! - 当前提供 [`forward_capability!`]，让句柄与代理直接满足能力 trait。

/// 为 `SwapHandle<dyn Cap>` 与 `SwapProxy<dyn Cap>` 生成能力 trait 的转发实现。
///
/// # 设计动机（Why）
/// - 调用方通常按 `&dyn Cap` 或 `impl Cap` 编写；让句柄本身实现 `Cap`，现有调用点无需任何改动；
/// - 每个方法体都是一次 `call`，因此每次调用只面对一个实现快照。
///
/// # 展开逻辑（How）
/// - 对列出的每个方法生成 `self.call(|imp| imp.method(args..))`；
/// - 同时为句柄与代理生成实现，二者行为一致。
///
/// # 契约说明（What）
/// - **前置条件**：能力 trait 以标识符形式给出且在调用处可见；方法只接收 `&self` 与按值参数；
/// - **返回值**：必须是拥有所有权的类型，借用自实现的返回值会在快照释放后悬空，编译器会拒绝；
/// - 泛型方法与关联类型不在支持范围内，这类能力请手写转发实现。
///
/// # 示例
/// ```
/// use std::sync::Arc;
/// use hotswap_core::{SwapHandle, forward_capability};
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// forward_capability! {
///     impl Greeter for dyn Greeter {
///         fn greet(&self, name: &str) -> String;
///     }
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self, name: &str) -> String {
///         format!("hello {name}")
///     }
/// }
///
/// fn greet_twice(greeter: &impl Greeter) -> String {
///     greeter.greet("a") + &greeter.greet("b")
/// }
///
/// let handle = SwapHandle::<dyn Greeter>::new(Arc::new(English));
/// assert_eq!(greet_twice(&handle.proxy()), "hello ahello b");
/// ```
#[macro_export]
macro_rules! forward_capability {
    (
        impl $capability:ident for $target:ty {
            $(
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        impl $capability for $crate::SwapHandle<$target> {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    self.call(|__implementation| __implementation.$method($($arg),*))
                }
            )*
        }

        impl $capability for $crate::SwapProxy<$target> {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    self.call(|__implementation| __implementation.$method($($arg),*))
                }
            )*
        }
    };
}
