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

use crate::task::{FilterObserver, FilterTask};
use crate::{FilterError, FilterOptions, FilterParameterSet, PixelBuffer};
use std::sync::Arc;

/// Live preview of one image, owns at most one running [FilterTask].
///
/// Every parameter change replaces the task: the previous one is cancelled and joined
/// before the new one starts, so at most one task writes notifications to the observer.
pub struct PreviewSession {
    options: FilterOptions,
    observer: Arc<dyn FilterObserver>,
    task: Option<FilterTask>,
}

impl PreviewSession {
    pub fn new(options: FilterOptions, observer: Arc<dyn FilterObserver>) -> PreviewSession {
        PreviewSession {
            options,
            observer,
            task: None,
        }
    }

    /// Replaces the running task with a new one for `params`.
    ///
    /// When the new parameters are rejected the session is left without a task.
    pub fn update(
        &mut self,
        source: Arc<PixelBuffer>,
        params: FilterParameterSet,
    ) -> Result<(), FilterError> {
        if let Some(previous) = self.task.take() {
            previous.cancel();
            drop(previous);
        }
        let mut task = FilterTask::new(self.options);
        task.start(source, params, self.observer.clone())?;
        self.task = Some(task);
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.cancel();
        }
    }

    pub fn current(&self) -> Option<&FilterTask> {
        self.task.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut FilterTask> {
        self.task.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;
    use crate::task::TaskState;
    use crate::{RefocusParams, SimpleSharpParams};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Finished(Mutex<Vec<bool>>);

    impl FilterObserver for Finished {
        fn on_finished(&self, result: Result<&PixelBuffer, &FilterError>) {
            self.0.lock().unwrap().push(result.is_ok());
        }
    }

    #[test]
    fn test_update_replaces_task() {
        let mut image = PixelBuffer::new(1500, 1500, BitDepth::Eight, false).unwrap();
        image.fill([10, 20, 30, 255]);
        let source = Arc::new(image);
        let observer = Arc::new(Finished::default());
        let mut session = PreviewSession::new(FilterOptions::default(), observer.clone());
        assert!(session.current().is_none());

        session
            .update(
                source.clone(),
                FilterParameterSet::SimpleSharp(SimpleSharpParams::new(0., 3.)),
            )
            .unwrap();
        session
            .update(
                source.clone(),
                FilterParameterSet::SimpleSharp(SimpleSharpParams::from_radius(1.)),
            )
            .unwrap();
        let task = session.current_mut().unwrap();
        let result = task.wait().unwrap();
        assert_eq!(result.width, 1500);
        assert_eq!(task.state(), TaskState::Succeeded);

        let finished = observer.0.lock().unwrap().clone();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished.last(), Some(&true));
    }

    #[test]
    fn test_invalid_update_leaves_no_task() {
        let mut image = PixelBuffer::new(32, 32, BitDepth::Sixteen, true).unwrap();
        image.fill([1000, 2000, 3000, 65535]);
        let mut session = PreviewSession::new(FilterOptions::default(), Arc::new(()));
        let result = session.update(
            Arc::new(image),
            FilterParameterSet::Refocus(RefocusParams::new(4, 1., 0., 0.5, 0.03)),
        );
        assert!(result.is_err());
        assert!(session.current().is_none());
        session.cancel();
    }
}
