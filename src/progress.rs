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

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Progress is only published on multiples of this many percent
pub const PROGRESS_STEP: u8 = 5;

/// Shared cooperative cancellation flag.
///
/// Cloning shares the flag, workers poll it between output pixels.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Maps completed rows of one pass onto the `[from, to]` percentage range.
///
/// Rows are counted with an atomic increment. A percentage is published only
/// when it reaches a new multiple of [PROGRESS_STEP], publication is serialized
/// so observers always see a non decreasing sequence.
pub(crate) struct ProgressReporter<'a> {
    sink: &'a (dyn Fn(u8) + Sync),
    from: u8,
    to: u8,
    total: usize,
    done: AtomicUsize,
    last: AtomicU8,
    publish: Mutex<()>,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(
        sink: &'a (dyn Fn(u8) + Sync),
        from: u8,
        to: u8,
        total: usize,
    ) -> ProgressReporter<'a> {
        ProgressReporter {
            sink,
            from,
            to: to.max(from).min(100),
            total: total.max(1),
            done: AtomicUsize::new(0),
            last: AtomicU8::new(from),
            publish: Mutex::new(()),
        }
    }

    #[inline]
    fn percent_for(&self, done: usize) -> u8 {
        let span = (self.to - self.from) as usize;
        let value = self.from as usize + span * done.min(self.total) / self.total;
        let value = value as u8;
        if value == self.to {
            value
        } else {
            value - value % PROGRESS_STEP
        }
    }

    /// Records `units` finished rows
    pub(crate) fn advance(&self, units: usize) {
        let done = self.done.fetch_add(units, Ordering::AcqRel) + units;
        let percent = self.percent_for(done);
        if percent <= self.last.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.publish.lock().unwrap_or_else(|e| e.into_inner());
        if percent <= self.last.load(Ordering::Acquire) {
            return;
        }
        self.last.store(percent, Ordering::Release);
        log::trace!("Progress {percent}%");
        (self.sink)(percent);
    }

    /// Publishes the end of the range regardless of counted rows
    pub(crate) fn finish(&self) {
        self.advance(self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_emits_multiples_of_five() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let reporter = ProgressReporter::new(&sink, 0, 100, 1000);
        for _ in 0..1000 {
            reporter.advance(1);
        }
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, (1..=20).map(|x| x * 5).collect::<Vec<u8>>());
    }

    #[test]
    fn test_sub_range() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let reporter = ProgressReporter::new(&sink, 80, 100, 7);
        for _ in 0..7 {
            reporter.advance(1);
        }
        reporter.finish();
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&85));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().all(|&x| x % 5 == 0));
    }

    #[test]
    fn test_monotone_under_contention() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let reporter = ProgressReporter::new(&sink, 0, 100, 20_000);
        (0..20_000).into_par_iter().for_each(|_| reporter.advance(1));
        let seen = seen.lock().unwrap().clone();
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "Not monotone: {seen:?}");
        assert_eq!(seen.last(), Some(&100));
    }
}
