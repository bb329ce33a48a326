use anyhow::Result;
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

pub struct WatchConfig {
    pub interval_secs: u64,
}

/// Repeats `pass` every `interval_secs` until Ctrl-C. A failed pass is
/// logged and the loop carries on; the flag is only checked between passes.
pub fn run_watch<F>(cfg: WatchConfig, pass: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    watch_until(&running, Duration::from_secs(cfg.interval_secs), pass);
    log::info!("watch loop stopped");
    Ok(())
}

fn watch_until<F>(running: &AtomicBool, interval: Duration, mut pass: F)
where
    F: FnMut() -> Result<()>,
{
    while running.load(Ordering::SeqCst) {
        if let Err(e) = pass() {
            log::error!("triage pass failed: {e:#}");
        }
        sleep_while_running(running, interval);
    }
}

/// Sleeps in short steps so Ctrl-C does not wait out a long interval.
fn sleep_while_running(running: &AtomicBool, interval: Duration) {
    let step = Duration::from_millis(200);
    let mut slept = Duration::ZERO;
    while slept < interval && running.load(Ordering::SeqCst) {
        let nap = step.min(interval - slept);
        thread::sleep(nap);
        slept += nap;
    }
}
