use futures::future::{Aborted, abortable};
use redirect_core::{AppHandoff, EnvironmentPort, RedirectState, Scheduler};
use redirect_web::browser::{BrowserEnvironment, BrowserScheduler, PageHiddenGuard};
use redirect_web::dom;
use std::time::Duration;
use wasm_bindgen_test::*;

fn dispatch_pagehide() {
    let event = web_sys::Event::new("pagehide").expect("create pagehide event");
    dom::window()
        .expect("window")
        .dispatch_event(&event)
        .expect("dispatch pagehide");
}

#[wasm_bindgen_test]
fn environment_reads_the_live_location() {
    let env = BrowserEnvironment;
    let search = env.location_search().expect("search readable");
    assert!(search.is_empty() || search.starts_with('?'));
    assert!(!env.user_agent().expect("user agent readable").is_empty());
    assert!(env.hostname().is_ok());
    assert!(!env.impersonating_browser());
}

#[wasm_bindgen_test]
async fn browser_scheduler_sleeps() {
    BrowserScheduler.sleep(Duration::from_millis(10)).await;
}

#[wasm_bindgen_test]
async fn oversized_delays_do_not_fire_early() {
    let (task, handle) = abortable(BrowserScheduler.sleep(Duration::from_secs(u64::MAX / 2)));
    let watchdog = BrowserScheduler.sleep(Duration::from_millis(20));
    futures::pin_mut!(task);
    let early = futures::future::select(task, watchdog).await;
    assert!(matches!(early, futures::future::Either::Right(_)));
    handle.abort();
}

#[wasm_bindgen_test]
fn console_logger_installs_once() {
    let _ = console_log::init_with_level(log::Level::Info);
    assert!(console_log::init_with_level(log::Level::Debug).is_err());
    assert!(log::log_enabled!(log::Level::Info));
}

#[wasm_bindgen_test]
async fn dropping_the_guard_leaves_tasks_running() {
    let handoff = AppHandoff::new();
    let (task, handle) = abortable(BrowserScheduler.sleep(Duration::from_millis(5)));
    handoff.track(handle);
    drop(PageHiddenGuard::install(handoff).expect("guard installs"));
    assert!(task.await.is_ok());
}

#[wasm_bindgen_test]
async fn pagehide_after_opening_the_app_aborts_the_task() {
    let handoff = AppHandoff::new();
    let (task, handle) = abortable(BrowserScheduler.sleep(Duration::from_secs(5)));
    handoff.track(handle);
    handoff.observe(&RedirectState::DeepLinkAttempt);
    let _guard = PageHiddenGuard::install(handoff.clone()).expect("guard installs");

    dispatch_pagehide();
    assert_eq!(task.await, Err(Aborted));
}

#[wasm_bindgen_test]
async fn pagehide_before_opening_the_app_keeps_the_task_running() {
    let handoff = AppHandoff::new();
    let (task, handle) = abortable(BrowserScheduler.sleep(Duration::from_millis(20)));
    handoff.track(handle);
    handoff.observe(&RedirectState::CopyAttempt { attempt: 1 });
    let _guard = PageHiddenGuard::install(handoff.clone()).expect("guard installs");

    dispatch_pagehide();
    assert_eq!(task.await, Ok(()));
}
