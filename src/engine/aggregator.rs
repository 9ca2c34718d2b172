// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error fan-in from pipeline members onto the composite.

use crate::units::{Relay, Unit};

/// Relay every member's errors to `composite`, skipping the member the
/// composite is (identity shapes already surface that member's errors).
///
/// Returns the number of members whose errors are relayed.
pub(crate) fn aggregate_errors(pipeline: &[Unit], composite: &Unit) -> usize {
    let mut relayed = 0;
    for member in pipeline.iter().filter(|member| !member.same_as(composite)) {
        member.hub().forward_to(composite.hub(), Relay::ERRORS);
        relayed += 1;
    }
    relayed
}
