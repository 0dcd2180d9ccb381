// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::warn;

pub(crate) const MAX_WORKERS: usize = 8;

/// Runs `task` over every item on a bounded pool of scoped threads and
/// returns the results in item order. Nothing is returned until every task
/// has settled. An item whose task panicked comes back as an error; results
/// already finished by the same worker are kept.
pub(crate) fn fan_out<T, R, F>(items: &[T], task: F) -> Vec<Result<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<Result<R>>>> =
        Mutex::new((0..items.len()).map(|_| None).collect());
    let workers = items.len().min(MAX_WORKERS);

    thread::scope(|scope| {
        let handles = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        let result = task(item);
                        lock(&slots)[index] = Some(result);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            if handle.join().is_err() {
                warn!("fan-out worker panicked");
            }
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(anyhow!("worker thread panicked"))))
        .collect()
}

fn lock<V>(slots: &Mutex<V>) -> MutexGuard<'_, V> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
