// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! The task execution service: a single-threaded cooperative executor.
//!
//! User task callbacks run on one dedicated OS thread, so tasks execute
//! serially unless posted as concurrent fibers (async actors). Fibers
//! interleave on the same thread; `FiberEvent` suspends a fiber until an
//! external event fires.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use hive_util::time::Stopwatch;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum ExecutionJob {
    /// Runs to completion before the next job starts.
    Serial(Job),
    /// Spawned as a local fiber; interleaves with other fibers.
    Concurrent(Job),
    Shutdown,
}

/// One worker thread pinned to a run loop, fed through an unbounded queue.
pub struct TaskExecutionService {
    sender: mpsc::UnboundedSender<ExecutionJob>,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl TaskExecutionService {
    pub fn start() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ExecutionJob>();
        let thread = std::thread::Builder::new()
            .name("task-execution".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to build execution runtime");
                        return;
                    }
                };
                let local = tokio::task::LocalSet::new();
                local.block_on(&runtime, async move {
                    while let Some(job) = receiver.recv().await {
                        match job {
                            ExecutionJob::Serial(job) => {
                                let stopwatch = Stopwatch::new();
                                job.await;
                                tracing::debug!(
                                    elapsed_ms = stopwatch.elapsed_ms(),
                                    "serial job finished"
                                );
                            }
                            ExecutionJob::Concurrent(job) => {
                                tokio::task::spawn_local(job);
                            }
                            ExecutionJob::Shutdown => break,
                        }
                    }
                });
            })
            .expect("failed to spawn task execution thread");

        Self {
            sender,
            thread: Mutex::new(Some(thread)),
            stopped: AtomicBool::new(false),
        }
    }

    /// Post a job that runs after every previously posted serial job has
    /// finished. Returns false once the service has stopped.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender.send(ExecutionJob::Serial(Box::pin(job))).is_ok()
    }

    /// Post a job as a cooperative fiber that may interleave with others
    /// (async actor methods).
    pub fn post_concurrent<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender
            .send(ExecutionJob::Concurrent(Box::pin(job)))
            .is_ok()
    }

    /// Stop after the current job completes. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.sender.send(ExecutionJob::Shutdown);
        if let Some(thread) = self.thread.lock().take() {
            if thread.thread().id() != std::thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for TaskExecutionService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A one-shot event a fiber can suspend on.
pub struct FiberEvent {
    notify: tokio::sync::Notify,
    set: AtomicBool,
}

impl Default for FiberEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl FiberEvent {
    pub fn new() -> Self {
        Self {
            notify: tokio::sync::Notify::new(),
            set: AtomicBool::new(false),
        }
    }

    /// Suspend the current fiber until `notify` is called. Returns
    /// immediately if the event already fired.
    pub async fn wait(&self) {
        while !self.set.load(Ordering::Acquire) {
            let notified = self.notify.notified();
            if self.set.load(Ordering::Acquire) {
                break;
            }
            notified.await;
        }
    }

    pub fn notify(&self) {
        self.set.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }
}

/// Cooperatively yield the current fiber, then block it on `event`.
pub async fn yield_current_fiber(event: &FiberEvent) {
    tokio::task::yield_now().await;
    event.wait().await;
}
