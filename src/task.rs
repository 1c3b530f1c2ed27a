// Copyright (c) Radzivon Bartoshyk. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
// 1.  Redistributions of source code must retain the above copyright notice, this
// list of conditions and the following disclaimer.
//
// 2.  Redistributions in binary form must reproduce the above copyright notice,
// this list of conditions and the following disclaimer in the documentation
// and/or other materials provided with the distribution.
//
// 3.  Neither the name of the copyright holder nor the names of its
// contributors may be used to endorse or promote products derived from
// this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::progress::CancelFlag;
use crate::sharpen::{apply_prepared, prepare};
use crate::{FilterError, FilterOptions, FilterParameterSet, PixelBuffer};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

/// Lifecycle of a [FilterTask]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum TaskState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Receives task notifications from the task driver thread.
///
/// Progress is never reported after cancellation was requested, and
/// `on_finished` is called exactly once per started task. `on_progress` runs while
/// the task state is locked, it must not call back into the [FilterTask].
pub trait FilterObserver: Send + Sync {
    fn on_progress(&self, _percent: u8) {}

    fn on_finished(&self, _result: Result<&PixelBuffer, &FilterError>) {}
}

impl FilterObserver for () {}

struct TaskShared {
    state: Mutex<TaskState>,
    progress: AtomicU8,
    cancel: CancelFlag,
}

impl TaskShared {
    fn lock_state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: TaskState) {
        *self.lock_state() = state;
    }

    fn state(&self) -> TaskState {
        *self.lock_state()
    }

    /// Publishes progress unless cancellation was requested, ordered against [FilterTask::cancel]
    fn publish_progress(&self, percent: u8, observer: &dyn FilterObserver) {
        let _state = self.lock_state();
        if self.cancel.is_cancelled() {
            return;
        }
        self.progress.fetch_max(percent, Ordering::AcqRel);
        observer.on_progress(percent);
    }

    /// Moves to the terminal state, a cancel request that won the lock turns success into `Cancelled`
    fn finish(
        &self,
        mut result: Result<PixelBuffer, FilterError>,
    ) -> (TaskState, Result<PixelBuffer, FilterError>) {
        let mut state = self.lock_state();
        if result.is_ok() && self.cancel.is_cancelled() {
            result = Err(FilterError::Cancelled);
        }
        *state = match &result {
            Ok(_) => TaskState::Succeeded,
            Err(FilterError::Cancelled) => TaskState::Cancelled,
            Err(_) => TaskState::Failed,
        };
        (*state, result)
    }
}

/// Runs one filter on a background thread.
///
/// A task starts `Idle`, becomes `Running` after a successful [FilterTask::start],
/// and ends in one of `Succeeded`, `Failed` or `Cancelled`. A task is started at most once.
pub struct FilterTask {
    options: FilterOptions,
    shared: Arc<TaskShared>,
    handle: Option<JoinHandle<Result<PixelBuffer, FilterError>>>,
}

impl FilterTask {
    pub fn new(options: FilterOptions) -> FilterTask {
        FilterTask {
            options,
            shared: Arc::new(TaskShared {
                state: Mutex::new(TaskState::Idle),
                progress: AtomicU8::new(0),
                cancel: CancelFlag::new(),
            }),
            handle: None,
        }
    }

    /// Validates parameters and source, then starts filtering in the background.
    ///
    /// Invalid parameters and too small images are reported here and leave the task `Idle`.
    pub fn start(
        &mut self,
        source: Arc<PixelBuffer>,
        params: FilterParameterSet,
        observer: Arc<dyn FilterObserver>,
    ) -> Result<(), FilterError> {
        if self.shared.state() != TaskState::Idle {
            return Err(FilterError::TaskBusy);
        }
        let kernel = prepare(&source, &params)?;

        self.shared.set_state(TaskState::Running);
        let shared = self.shared.clone();
        let options = self.options;

        let spawned = std::thread::Builder::new()
            .name("libsharpen-task".to_string())
            .spawn(move || {
                let sink = |percent: u8| shared.publish_progress(percent, observer.as_ref());
                let result =
                    apply_prepared(&source, &params, &kernel, options, &shared.cancel, &sink);
                let (state, result) = shared.finish(result);
                log::debug!("Filter task finished as {state:?}");
                observer.on_finished(result.as_ref());
                result
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                log::warn!("Unable to spawn filter task: {e}");
                self.shared.set_state(TaskState::Idle);
                Err(FilterError::WorkerFailed(e.to_string()))
            }
        }
    }

    /// Requests cooperative cancellation, workers stop at the next pixel.
    ///
    /// Returns `true` when the task was running, such a task always ends `Cancelled`.
    pub fn cancel(&self) -> bool {
        let state = self.shared.lock_state();
        if *state != TaskState::Running {
            return false;
        }
        self.shared.cancel.cancel();
        true
    }

    /// Last published percentage, `0..=100`
    pub fn progress(&self) -> u8 {
        self.shared.progress.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Blocks until the task ends and takes its result
    pub fn wait(&mut self) -> Result<PixelBuffer, FilterError> {
        let handle = self.handle.take().ok_or(FilterError::TaskNotStarted)?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                self.shared.set_state(TaskState::Failed);
                Err(FilterError::WorkerFailed(
                    "filter task panicked".to_string(),
                ))
            }
        }
    }
}

impl Drop for FilterTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.cancel.cancel();
            let _ = handle.join();
        }
    }
}
