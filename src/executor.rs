//! Parallel Executor (C8): bounded-concurrency fan-out over a list of items,
//! preserving input order in the output, honoring a per-item deadline, and
//! converting per-item timeout/cancellation into caller-supplied fallback
//! results. Grounded in the teacher's `commands/list/collect/execution.rs`
//! dispatch pattern, using `crossbeam-channel` as that file does, but
//! replacing `rayon`'s work-stealing pool with an explicit bounded worker
//! pool per spec.md §9's "async/await → worker pool" design note — rayon has
//! no per-task deadline primitive.

use std::time::{Duration, Instant};

use crossbeam_channel::bounded;

use crate::subprocess::CancelToken;

pub struct ExecutorOptions {
    pub concurrency: usize,
    pub per_item_timeout: Duration,
}

/// Run `processor` over every item in `items` with at most `concurrency`
/// items in flight at once. `onError` synthesizes a fallback result when the
/// per-item deadline fires before `processor` returns. Output order always
/// matches input order regardless of completion order.
pub fn run<T, R, P, E>(items: Vec<T>, options: &ExecutorOptions, processor: P, on_error: E) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    P: Fn(&T, &CancelToken) -> R + Send + Sync + 'static,
    E: Fn(&T) -> R + Send + Sync + 'static,
{
    let concurrency = options.concurrency.max(1);
    let per_item_timeout = options.per_item_timeout;

    let (job_tx, job_rx) = bounded::<(usize, T)>(items.len().max(1));
    let (result_tx, result_rx) = bounded::<(usize, R)>(items.len().max(1));

    let total = items.len();
    for (idx, item) in items.into_iter().enumerate() {
        job_tx.send((idx, item)).expect("job channel open");
    }
    drop(job_tx);

    let processor = std::sync::Arc::new(processor);
    let on_error = std::sync::Arc::new(on_error);

    let workers: Vec<_> = (0..concurrency.min(total.max(1)))
        .map(|_| {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let processor = std::sync::Arc::clone(&processor);
            let on_error = std::sync::Arc::clone(&on_error);
            std::thread::spawn(move || {
                while let Ok((idx, item)) = job_rx.recv() {
                    let cancel = CancelToken::new();
                    let deadline_cancel = cancel.clone();
                    let (done_tx, done_rx) = bounded::<()>(1);
                    let timer = std::thread::spawn(move || {
                        if done_rx.recv_timeout(per_item_timeout).is_err() {
                            deadline_cancel.cancel();
                        }
                    });

                    let start = Instant::now();
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        processor(&item, &cancel)
                    }));
                    let _ = done_tx.send(());
                    let _ = timer.join();

                    let final_result = match outcome {
                        Ok(result) if start.elapsed() < per_item_timeout => result,
                        Ok(_) => on_error(&item),
                        Err(panic) => {
                            let message = panic
                                .downcast_ref::<&str>()
                                .map(|s| s.to_string())
                                .or_else(|| panic.downcast_ref::<String>().cloned())
                                .unwrap_or_else(|| "processor panicked".to_string());
                            log::warn!("[sq-trace] item processor panicked: {message}");
                            on_error(&item)
                        }
                    };

                    let _ = result_tx.send((idx, final_result));
                }
            })
        })
        .collect();
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    for (idx, result) in result_rx.iter() {
        slots[idx] = Some(result);
    }
    for worker in workers {
        let _ = worker.join();
    }

    slots.into_iter().map(|r| r.expect("every index produced")).collect()
}
