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

use crate::progress::{CancelFlag, ProgressReporter};
use crate::FilterError;
use rayon::prelude::*;
use rayon::ThreadPool;

fn make_pool(thread_count: usize) -> Option<ThreadPool> {
    if thread_count <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("Unable to build pool of {thread_count} threads, running inline: {e}");
            None
        }
    }
}

/// Splits destination rows into `thread_count` contiguous stripes and runs `row_op`
/// for every row. Each stripe is owned by one worker, so writes never overlap.
///
/// `row_op(y, row)` returns `false` once it observed cancellation.
pub(crate) fn for_each_row<T, F>(
    dst: &mut [T],
    row_stride: usize,
    thread_count: usize,
    cancel: &CancelFlag,
    reporter: &ProgressReporter,
    row_op: F,
) -> Result<(), FilterError>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> bool + Send + Sync,
{
    let height = dst.len() / row_stride.max(1);
    if height == 0 {
        return Ok(());
    }
    let thread_count = thread_count.clamp(1, height);
    let rows_per_stripe = height.div_ceil(thread_count);
    let stripe_len = rows_per_stripe * row_stride;
    log::debug!(
        "Dispatching {height} rows on {thread_count} threads, {} stripes",
        height.div_ceil(rows_per_stripe)
    );

    let process_stripe = |(stripe_index, stripe): (usize, &mut [T])| {
        let first_row = stripe_index * rows_per_stripe;
        for (i, row) in stripe.chunks_exact_mut(row_stride).enumerate() {
            if !row_op(first_row + i, row) {
                return;
            }
            reporter.advance(1);
        }
    };

    let pool = make_pool(thread_count);
    if let Some(pool) = &pool {
        pool.install(|| {
            dst.par_chunks_mut(stripe_len)
                .enumerate()
                .for_each(process_stripe);
        });
    } else {
        dst.chunks_mut(stripe_len)
            .enumerate()
            .for_each(process_stripe);
    }

    if cancel.is_cancelled() {
        return Err(FilterError::Cancelled);
    }
    Ok(())
}
