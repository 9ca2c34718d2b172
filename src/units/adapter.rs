// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Standardizing adapter: turns a push-mode (legacy) outlet into a bounded,
//! pull-based one. When the bounded side fills up the legacy producer is
//! paused, and it is resumed as soon as the reader frees a slot.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::observability::messages::{
    composition::{BackpressureEngaged, BackpressureReleased},
    StructuredLog,
};
use crate::units::io::{Frame, LegacyOutlet, Outlet};

/// Standard outlets pass through untouched; legacy ones get an adapter task
pub(crate) fn standardize(outlet: Outlet, unit: Arc<str>, capacity: usize) -> Outlet {
    match outlet {
        Outlet::Standard(rx) => Outlet::Standard(rx),
        Outlet::Legacy(legacy) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            tokio::spawn(pump(legacy, tx, unit));
            Outlet::Standard(rx)
        }
    }
}

async fn pump(mut legacy: LegacyOutlet, tx: mpsc::Sender<Frame>, unit: Arc<str>) {
    while let Some(frame) = legacy.rx.recv().await {
        let end = matches!(frame, Frame::End(_));
        let permit = match tx.try_reserve() {
            Ok(permit) => permit,
            Err(mpsc::error::TrySendError::Full(())) => {
                BackpressureEngaged {
                    from: &unit,
                    to: "standardized reader",
                }
                .log();
                legacy.flow.pause();
                let permit = tx.reserve().await;
                legacy.flow.resume();
                BackpressureReleased {
                    from: &unit,
                    to: "standardized reader",
                }
                .log();
                match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                }
            }
            Err(mpsc::error::TrySendError::Closed(())) => return,
        };
        permit.send(frame);
        if end {
            return;
        }
    }
}
