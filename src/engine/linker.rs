// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Forwarding between adjacent pipeline members.
//!
//! Each link owns the upstream outlet and a clone of the downstream writer.
//! Chunks move one at a time in emission order. When the downstream input is
//! saturated the upstream is paused until a slot frees up, then resumed.
//! An upstream torn down without ending its output takes the downstream
//! member down with it, so the close travels to the tail.

use std::sync::Arc;

use crate::errors::TryWriteError;
use crate::observability::messages::{
    composition::{
        BackpressureEngaged, BackpressureReleased, LinkAborted, LinkEstablished, LinkSkipped,
    },
    StructuredLog,
};
use crate::units::io::{Outlet, Pulled};
use crate::units::{Unit, Writer};

/// Link every adjacent pair and return how many links were established.
///
/// A pair whose upstream has no outlet left, or whose downstream cannot be
/// written, stays unlinked.
pub(crate) fn link_pipeline(pipeline: &[Unit]) -> usize {
    let mut established = 0;

    for pair in pipeline.windows(2) {
        let (upstream, downstream) = (&pair[0], &pair[1]);

        let Some(writer) = downstream.writer() else {
            LinkSkipped {
                from: upstream.name(),
                to: downstream.name(),
                reason: "downstream is not writable",
            }
            .log();
            continue;
        };

        let Some(outlet) = upstream.take_outlet() else {
            LinkSkipped {
                from: upstream.name(),
                to: downstream.name(),
                reason: if upstream.can_read() {
                    "upstream output is already claimed"
                } else {
                    "upstream is not readable"
                },
            }
            .log();
            continue;
        };

        LinkEstablished {
            from: upstream.name(),
            to: downstream.name(),
        }
        .log();
        tokio::spawn(forward(
            outlet,
            writer,
            downstream.clone(),
            Arc::from(upstream.name()),
        ));
        established += 1;
    }

    established
}

async fn forward(mut outlet: Outlet, writer: Writer, downstream: Unit, upstream: Arc<str>) {
    loop {
        match outlet.pull().await {
            Pulled::Chunk(chunk) => match writer.try_write(chunk) {
                Ok(()) => {}
                Err(TryWriteError::Saturated(chunk)) => {
                    BackpressureEngaged {
                        from: &upstream,
                        to: writer.unit_name(),
                    }
                    .log();
                    outlet.pause();
                    let permit = writer.ready().await;
                    outlet.resume();
                    let Ok(permit) = permit else {
                        return;
                    };
                    BackpressureReleased {
                        from: &upstream,
                        to: writer.unit_name(),
                    }
                    .log();
                    permit.write(chunk);
                }
                // Downstream is gone; dropping the outlet tells upstream
                Err(TryWriteError::Closed(_)) => return,
            },
            Pulled::End => {
                let _ = writer.end().await;
                return;
            }
            Pulled::Aborted => {
                LinkAborted {
                    from: &upstream,
                    to: downstream.name(),
                }
                .log();
                downstream.destroy(None);
                return;
            }
        }
    }
}
