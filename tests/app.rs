//! End-to-end runtime scenarios over the in-process bus.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use colony::{
    App, AppConfig, BlockingFn, HandlerFn, MemoryBus, RuntimeError, Strategy, Subscriptions,
    TaskFn, TaskUnit,
};

fn reply_handler(tag: i64) -> colony::HandlerRef {
    HandlerFn::arc(move |_topic, _message| async move { Ok(Some(json!({ "data": tag }))) })
}

async fn wait_connected(bus: &MemoryBus) {
    for _ in 0..200 {
        if bus.is_connected().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("bus never connected");
}

#[tokio::test]
async fn test_include_filter_end_to_end() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "filter_e2e");
    cfg.client_id = Some("filter_e2e_client".to_string());
    cfg.include_filter = Some(vec!["foo".to_string(), "bar".to_string()]);

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .listen("start", reply_handler(1))
        .listen("foo", reply_handler(2))
        .listen("bar", reply_handler(3))
        .build();

    tokio::spawn(app.run());
    wait_connected(&bus).await;

    let reply = bus.request("foo", Value::Null).await.unwrap();
    assert_eq!(reply["data"], 2);

    let reply = bus.request("bar", Value::Null).await.unwrap();
    assert_eq!(reply["data"], 3);

    // "start" was filtered out, so no subscription exists at all.
    let err = bus.request("start", Value::Null).await.unwrap_err();
    assert_eq!(err.as_label(), "no_responders");
    assert_eq!(bus.subscribed_topics().await, vec!["bar", "foo"]);
}

#[tokio::test]
async fn test_dynamic_bindings_override_static() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "override_e2e");
    cfg.client_id = Some("override_e2e_client".to_string());

    let mut dynamic = Subscriptions::new();
    dynamic.insert("foo".to_string(), reply_handler(20));

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .listen("foo", reply_handler(2))
        .with_subscriptions(dynamic)
        .build();

    tokio::spawn(app.run());
    wait_connected(&bus).await;

    let reply = bus.request("foo", Value::Null).await.unwrap();
    assert_eq!(reply["data"], 20);
}

#[tokio::test]
async fn test_zero_work_startup_is_idle() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "idle_e2e");
    cfg.client_id = Some("idle_e2e_client".to_string());

    let bus = MemoryBus::new();
    let app = App::builder(cfg).with_bus(Arc::new(bus.clone())).build();
    let handle = app.handle();

    let runner = tokio::spawn(app.run());
    wait_connected(&bus).await;

    assert!(bus.subscribed_topics().await.is_empty());
    // The process idles rather than exiting: run() is still pending.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());

    // Publishing through the handle still works.
    handle.publish("anywhere", Value::Null).await.unwrap();
    runner.abort();
}

#[tokio::test]
async fn test_blocking_task_under_cooperative_aborts_startup() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "contract_e2e");
    cfg.client_id = Some("contract_e2e_client".to_string());
    cfg.strategy = Strategy::Cooperative;

    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_task = ran.clone();

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .task(TaskUnit::Suspending(TaskFn::arc("ok", |_ctx| async {
            Ok(())
        })))
        .task(TaskUnit::Blocking(BlockingFn::arc("offender", move || {
            ran_in_task.store(true, Ordering::SeqCst);
            Ok(())
        })))
        .build();

    let err = app.run().await.unwrap_err();
    match err {
        RuntimeError::ConcurrencyContract { task, .. } => assert_eq!(task, "offender"),
        other => panic!("unexpected error: {other}"),
    }
    // Validation failed before anything was scheduled.
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_suspending_task_under_threaded_aborts_startup() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "contract_sym_e2e");
    cfg.client_id = Some("contract_sym_e2e_client".to_string());
    cfg.strategy = Strategy::Threaded;

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .task(TaskUnit::Suspending(TaskFn::arc("offender", |_ctx| async {
            Ok(())
        })))
        .build();

    let err = app.run().await.unwrap_err();
    assert_eq!(err.as_label(), "concurrency_contract");
}

#[tokio::test]
async fn test_threaded_launch_returns_control() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "threaded_e2e");
    cfg.client_id = Some("threaded_e2e_client".to_string());
    cfg.strategy = Strategy::Threaded;

    let runs = Arc::new(AtomicUsize::new(0));
    let runs_static = runs.clone();
    let runs_dynamic = runs.clone();

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .task(TaskUnit::Blocking(BlockingFn::arc("static_worker", move || {
            runs_static.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })))
        .with_tasks(vec![TaskUnit::Blocking(BlockingFn::arc(
            "dynamic_worker",
            move || {
                runs_dynamic.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ))])
        .build();

    // Threaded strategy: run() returns once everything is launched.
    app.run().await.unwrap();

    for _ in 0..200 {
        if runs.load(Ordering::SeqCst) == 2 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("threaded workers never ran");
}

#[tokio::test]
async fn test_one_shot_tasks_run_under_cooperative() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "coop_tasks_e2e");
    cfg.client_id = Some("coop_tasks_e2e_client".to_string());

    let runs = Arc::new(AtomicUsize::new(0));
    let runs_task = runs.clone();

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .task(TaskUnit::Suspending(TaskFn::arc("counter", move |_ctx| {
            let runs = runs_task.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })))
        .build();

    let runner = tokio::spawn(app.run());
    for _ in 0..200 {
        if runs.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // A finished one-shot does not end the process; only a termination
    // signal does.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());
    runner.abort();
}

#[tokio::test]
async fn test_subscriptions_outlive_finished_tasks() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "outlive_e2e");
    cfg.client_id = Some("outlive_e2e_client".to_string());

    let done = Arc::new(AtomicBool::new(false));
    let done_task = done.clone();

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .listen("foo", reply_handler(2))
        .task(TaskUnit::Suspending(TaskFn::arc("finite", move |_ctx| {
            let done = done_task.clone();
            async move {
                done.store(true, Ordering::SeqCst);
                Ok(())
            }
        })))
        .build();

    let runner = tokio::spawn(app.run());
    wait_connected(&bus).await;

    for _ in 0..200 {
        if done.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(done.load(Ordering::SeqCst));

    // The task set drained, but the live subscription keeps the process
    // serving: run() is still pending and requests still answer.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());
    let reply = bus.request("foo", Value::Null).await.unwrap();
    assert_eq!(reply["data"], 2);
    runner.abort();
}

#[tokio::test]
async fn test_failing_unit_does_not_stop_siblings() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "local_failure_e2e");
    cfg.client_id = Some("local_failure_e2e_client".to_string());

    let survivor_done = Arc::new(AtomicBool::new(false));
    let survivor_flag = survivor_done.clone();

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .task(TaskUnit::Suspending(TaskFn::arc("doomed", |_ctx| async {
            Err(colony::TaskError::Fail {
                error: "boom".into(),
            })
        })))
        .task(TaskUnit::Suspending(TaskFn::arc("survivor", move |_ctx| {
            let flag = survivor_flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })))
        .build();

    // The failure stays local: the survivor still finishes its work.
    let runner = tokio::spawn(app.run());
    for _ in 0..200 {
        if survivor_done.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(survivor_done.load(Ordering::SeqCst));
    assert!(!runner.is_finished());
    runner.abort();
}

#[tokio::test]
async fn test_interval_task_ticks_repeatedly() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "interval_e2e");
    cfg.client_id = Some("interval_e2e_client".to_string());

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticks_task = ticks.clone();

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .interval_task(
            1,
            TaskUnit::Suspending(TaskFn::arc("ticker", move |_ctx| {
                let ticks = ticks_task.clone();
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })),
        )
        .build();

    let runner = tokio::spawn(app.run());

    // First tick fires immediately; the unit then keeps running on its
    // interval until shutdown.
    for _ in 0..200 {
        if ticks.load(Ordering::SeqCst) >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(ticks.load(Ordering::SeqCst) >= 1);
    assert!(!runner.is_finished());
    runner.abort();
}

#[tokio::test]
async fn test_publish_reaches_subscribed_handler() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "publish_e2e");
    cfg.client_id = Some("publish_e2e_client".to_string());

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Value>(1);

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .listen(
            "metrics.report",
            HandlerFn::arc(move |_topic, message| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(message).await;
                    Ok(None)
                }
            }),
        )
        .build();
    let handle = app.handle();

    let runner = tokio::spawn(app.run());
    wait_connected(&bus).await;

    handle
        .publish("metrics.report", json!({ "rps": 7 }))
        .await
        .unwrap();

    let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("delivery timed out")
        .expect("channel closed");
    assert_eq!(delivered["rps"], 7);
    runner.abort();
}

#[tokio::test]
async fn test_handler_failure_appears_on_event_stream() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "handler_fail_e2e");
    cfg.client_id = Some("handler_fail_e2e_client".to_string());

    let bus = MemoryBus::new();
    let app = App::builder(cfg)
        .with_bus(Arc::new(bus.clone()))
        .listen(
            "boom",
            HandlerFn::arc(|_topic, _message| async move {
                Err(colony::DeliveryError::Handler("no good".to_string()))
            }),
        )
        .build();
    let handle = app.handle();
    let mut events = handle.events().subscribe();

    let runner = tokio::spawn(app.run());
    wait_connected(&bus).await;

    handle.publish("boom", Value::Null).await.unwrap();

    let failed = loop {
        let ev = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event timed out")
            .expect("hub closed");
        if ev.kind == colony::EventKind::HandlerFailed {
            break ev;
        }
    };
    assert_eq!(failed.topic.as_deref(), Some("boom"));
    assert!(failed.reason.as_deref().unwrap_or("").contains("no good"));
    runner.abort();
}

#[cfg(feature = "http")]
#[tokio::test]
async fn test_threaded_bad_http_bind_launches_nothing() {
    let mut cfg = AppConfig::new("127.0.0.1", 4222, "bad_bind_e2e");
    cfg.client_id = Some("bad_bind_e2e_client".to_string());
    cfg.strategy = Strategy::Threaded;

    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_task = ran.clone();

    let app = App::builder(cfg)
        .with_bus(Arc::new(MemoryBus::new()))
        .task(TaskUnit::Blocking(BlockingFn::arc("worker", move || {
            ran_in_task.store(true, Ordering::SeqCst);
            Ok(())
        })))
        .with_http(colony::HttpListener::bind("256.0.0.1", 0))
        .build();

    let err = app.run().await.unwrap_err();
    assert_eq!(err.as_label(), "scheduling_failed");

    // The bind failed before any thread launched, so no worker ever ran.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!ran.load(Ordering::SeqCst));
}
