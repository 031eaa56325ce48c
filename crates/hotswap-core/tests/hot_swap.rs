#![cfg(not(feature = "loom-model"))]
//! 热替换句柄的行为契约测试。
//!
//! # 教案级导览
//!
//! - **Why**：句柄的全部价值在于“透明”：替换前后调用结果分别等于对应实现的结果，错误原样透传；
//! - **How**：以带前缀的回显能力为载体，分别覆盖构造、替换、错误透传、在途调用与代理视图；
//! - **What**：所有用例单线程或以屏障精确控制交错，不依赖调度时序。

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;

use hotswap_core::{Generation, SwapError, SwapHandle, SwapProxy, forward_capability};

#[derive(Clone, Debug, PartialEq, Eq)]
enum EchoError {
    Refused { input: String, by: &'static str },
}

trait Echo: Send + Sync {
    fn echo(&self, input: &str) -> Result<String, EchoError>;
    fn name(&self) -> &'static str;
}

forward_capability! {
    impl Echo for dyn Echo {
        fn echo(&self, input: &str) -> Result<String, EchoError>;
        fn name(&self) -> &'static str;
    }
}

struct Prefixed {
    prefix: &'static str,
}

impl Echo for Prefixed {
    fn echo(&self, input: &str) -> Result<String, EchoError> {
        if input.is_empty() {
            return Err(EchoError::Refused {
                input: input.to_owned(),
                by: self.prefix,
            });
        }
        Ok(format!("{}:{input}", self.prefix))
    }

    fn name(&self) -> &'static str {
        self.prefix
    }
}

fn prefixed(prefix: &'static str) -> Arc<dyn Echo> {
    Arc::new(Prefixed { prefix })
}

/// 通过能力 trait 使用句柄的调用点，与普通实现的调用点写法一致。
fn echo_through(capability: &dyn Echo, input: &str) -> Result<String, EchoError> {
    capability.echo(input)
}

#[test]
fn echo_scenario_before_and_after_replacement() {
    let handle = SwapHandle::new(prefixed("A"));
    assert_eq!(handle.echo("x"), Ok("A:x".to_owned()));

    handle.replace(prefixed("B")).unwrap();
    assert_eq!(handle.echo("x"), Ok("B:x".to_owned()));

    let err = SwapHandle::<dyn Echo>::try_new(None).unwrap_err();
    assert!(matches!(err, SwapError::MissingImplementation { .. }));
    assert_eq!(err.label(), "anonymous");
}

#[test]
fn handle_is_transparent_for_every_operation() {
    let initial = prefixed("A");
    let handle = SwapHandle::new(Arc::clone(&initial));

    for input in ["x", "hello", "", "多字节"] {
        assert_eq!(handle.echo(input), initial.echo(input));
        assert_eq!(echo_through(&handle, input), initial.echo(input));
    }
    assert_eq!(handle.name(), initial.name());
}

#[test]
fn handle_is_transparent_after_replacement() {
    let handle = SwapHandle::new(prefixed("A"));
    let next = prefixed("B");
    handle.replace(Arc::clone(&next)).unwrap();

    for input in ["x", "hello", ""] {
        assert_eq!(handle.call(|c| c.echo(input)), next.echo(input));
    }
    assert_eq!(handle.name(), "B");
}

#[test]
fn delegated_errors_pass_through_unchanged() {
    let handle = SwapHandle::new(prefixed("A"));

    assert_eq!(
        handle.echo(""),
        Err(EchoError::Refused {
            input: String::new(),
            by: "A",
        })
    );

    handle.replace(prefixed("B")).unwrap();
    assert_eq!(
        handle.proxy().echo(""),
        Err(EchoError::Refused {
            input: String::new(),
            by: "B",
        })
    );
}

#[test]
fn last_sequential_replacement_wins() {
    const PREFIXES: [&str; 5] = ["p1", "p2", "p3", "p4", "p5"];
    let handle = SwapHandle::new(prefixed("p0"));

    for prefix in PREFIXES {
        let handle = handle.clone();
        thread::spawn(move || handle.replace(prefixed(prefix)).unwrap())
            .join()
            .unwrap();
    }

    assert_eq!(handle.echo("x"), Ok("p5:x".to_owned()));
    assert_eq!(handle.generation(), Generation::new(PREFIXES.len() as u64));
}

#[test]
fn proxies_follow_replacements_without_refetching() {
    let handle = SwapHandle::builder()
        .label("echo")
        .initial(prefixed("A"))
        .build()
        .unwrap();
    let proxy: SwapProxy<dyn Echo> = handle.proxy();
    let cloned = proxy.clone();

    assert_eq!(proxy.echo("x"), Ok("A:x".to_owned()));
    handle.replace(prefixed("B")).unwrap();

    assert_eq!(proxy.echo("x"), Ok("B:x".to_owned()));
    assert_eq!(cloned.echo("y"), Ok("B:y".to_owned()));
    assert_eq!(proxy.generation(), Generation::new(1));
    assert_eq!(proxy.label(), "echo");
}

#[test]
fn rejected_and_missing_replacements_keep_prior_binding() {
    let handle = SwapHandle::<dyn Echo>::builder()
        .label("echo")
        .initial(prefixed("A"))
        .admit(|candidate| {
            if candidate.name() == "bad" {
                Err(Cow::Borrowed("blocked prefix"))
            } else {
                Ok(())
            }
        })
        .build()
        .unwrap();

    let err = handle.replace(prefixed("bad")).unwrap_err();
    assert_eq!(err.code(), "hotswap.rejected");
    assert_eq!(err.to_string(), "swap handle `echo` rejected implementation: blocked prefix");

    let err = handle.try_replace(None).unwrap_err();
    assert_eq!(err.code(), "hotswap.missing_implementation");

    assert_eq!(handle.echo("x"), Ok("A:x".to_owned()));
    assert_eq!(handle.generation(), Generation::INITIAL);
}

/// 记录析构次数的实现，用于观察旧实现的释放时机。
struct Tracked {
    prefix: &'static str,
    drops: Arc<AtomicUsize>,
}

impl Echo for Tracked {
    fn echo(&self, input: &str) -> Result<String, EchoError> {
        Ok(format!("{}:{input}", self.prefix))
    }

    fn name(&self) -> &'static str {
        self.prefix
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn in_flight_call_completes_on_its_captured_implementation() {
    let drops = Arc::new(AtomicUsize::new(0));
    let old: Arc<dyn Echo> = Arc::new(Tracked {
        prefix: "old",
        drops: Arc::clone(&drops),
    });
    let handle = SwapHandle::new(old);

    let entered = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let caller = {
        let proxy = handle.proxy();
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            proxy.call(|imp| {
                entered.wait();
                release_rx.recv().unwrap();
                imp.echo("x")
            })
        })
    };

    entered.wait();
    // 在途调用仍持有旧实现：替换立即返回，旧实现尚未析构。
    let generation = handle
        .replace(Arc::new(Tracked {
            prefix: "new",
            drops: Arc::clone(&drops),
        }))
        .unwrap();
    assert_eq!(generation, Generation::new(1));
    assert_eq!(handle.echo("x"), Ok("new:x".to_owned()));
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    release_tx.send(()).unwrap();
    assert_eq!(caller.join().unwrap(), Ok("old:x".to_owned()));
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    drop(handle);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}

#[test]
fn snapshot_pins_one_implementation_across_steps() {
    let handle = SwapHandle::new(prefixed("A"));
    let snapshot = handle.snapshot();

    let first = snapshot.echo("1");
    handle.replace(prefixed("B")).unwrap();
    let second = snapshot.echo("2");

    assert_eq!(first, Ok("A:1".to_owned()));
    assert_eq!(second, Ok("A:2".to_owned()));
    assert_eq!(snapshot.generation(), Generation::INITIAL);
    assert_eq!(snapshot.into_implementation().name(), "A");
}
