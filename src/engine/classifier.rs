// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composite shape selection.
//!
//! The externally visible shape of a pipeline depends only on the capability
//! of its head and tail, its length, and whether a lone unit follows the
//! standard read contract. The rules are checked in a fixed order:
//!
//! 1. no units at all: a fresh passthrough is head, tail and composite
//! 2. writable head and readable tail: a new duplex facade
//! 3. a lone push-mode unit: a standardizing wrapper around it
//! 4. writable head only: the head itself
//! 5. readable tail only: the tail itself
//! 6. anything else: a fresh passthrough
//!
//! Rule 2 comes before the identity rules so that a lone duplex unit still
//! gets its own facade.

use std::fmt;
use std::sync::Arc;

use crate::config::ComposeOptions;
use crate::units::adapter;
use crate::units::{ReadContract, Relay, Unit, UnitSettings};

/// Which of the classification rules produced the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeShape {
    Empty,
    Duplex,
    Standardized,
    Head,
    Tail,
    Neutral,
}

impl CompositeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositeShape::Empty => "Empty",
            CompositeShape::Duplex => "Duplex",
            CompositeShape::Standardized => "Standardized",
            CompositeShape::Head => "Head",
            CompositeShape::Tail => "Tail",
            CompositeShape::Neutral => "Neutral",
        }
    }

    /// The composite is a pipeline member rather than a new unit
    pub fn is_identity(self) -> bool {
        matches!(
            self,
            CompositeShape::Empty | CompositeShape::Head | CompositeShape::Tail
        )
    }
}

impl fmt::Display for CompositeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the composite shape for `pipeline` (before empty normalization)
pub fn classify(pipeline: &[Unit]) -> CompositeShape {
    let (Some(head), Some(tail)) = (pipeline.first(), pipeline.last()) else {
        return CompositeShape::Empty;
    };

    if head.can_write() && tail.can_read() {
        CompositeShape::Duplex
    } else if pipeline.len() == 1 && head.read_contract() == ReadContract::Legacy {
        CompositeShape::Standardized
    } else if head.can_write() {
        CompositeShape::Head
    } else if tail.can_read() {
        CompositeShape::Tail
    } else {
        CompositeShape::Neutral
    }
}

/// Build the composite unit for an already normalized, non-empty pipeline.
///
/// Synthesized composites mirror the tail's finish and close, and destroying
/// them destroys the head and tail. Identity shapes return the member.
pub(crate) fn realize(shape: CompositeShape, pipeline: &[Unit], options: &ComposeOptions) -> Unit {
    let (head, tail) = match (pipeline.first(), pipeline.last()) {
        (Some(head), Some(tail)) => (head, tail),
        _ => return Unit::passthrough(options),
    };

    let composite = match shape {
        CompositeShape::Empty | CompositeShape::Head => return head.clone(),
        CompositeShape::Tail => return tail.clone(),
        CompositeShape::Duplex => {
            let settings = wrapper_settings(head, tail, options);
            let capacity = settings.high_water_mark;
            let outlet = tail
                .take_outlet()
                .map(|outlet| adapter::standardize(outlet, Arc::from(tail.name()), capacity));
            Unit::wrapper(&composite_name(head, tail), settings, head.writer(), outlet)
        }
        CompositeShape::Standardized => {
            let settings = wrapper_settings(head, tail, options);
            let capacity = settings.high_water_mark;
            let outlet = head
                .take_outlet()
                .map(|outlet| adapter::standardize(outlet, Arc::from(head.name()), capacity));
            Unit::wrapper(&composite_name(head, tail), settings, head.writer(), outlet)
        }
        CompositeShape::Neutral => Unit::passthrough(options),
    };

    tail.hub().forward_to(composite.hub(), Relay::TERMINAL);
    composite.delegate_destroy(head.clone());
    composite.delegate_destroy(tail.clone());
    composite
}

fn wrapper_settings(head: &Unit, tail: &Unit, options: &ComposeOptions) -> UnitSettings {
    UnitSettings {
        name: Some(composite_name(head, tail)),
        ..UnitSettings::from(options)
    }
}

fn composite_name(head: &Unit, tail: &Unit) -> String {
    if head.same_as(tail) {
        format!("composite({})", head.name())
    } else {
        format!("composite({}..{})", head.name(), tail.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::{ChangeTextCaseTransform, CollectorSink, IterSource};
    use crate::units::{Capability, UnitKind};

    fn source() -> Unit {
        Unit::source(IterSource::texts(["a"]))
    }

    fn sink() -> Unit {
        Unit::sink(CollectorSink::new().0)
    }

    fn upper() -> Unit {
        Unit::transform(ChangeTextCaseTransform::upper())
    }

    #[tokio::test]
    async fn test_classification_rules_in_priority_order() {
        assert_eq!(classify(&[]), CompositeShape::Empty);
        assert_eq!(classify(&[upper()]), CompositeShape::Duplex);
        assert_eq!(classify(&[upper(), upper(), upper()]), CompositeShape::Duplex);
        assert_eq!(
            classify(&[Unit::legacy_source(IterSource::texts(["a"]))]),
            CompositeShape::Standardized
        );
        assert_eq!(classify(&[sink()]), CompositeShape::Head);
        assert_eq!(classify(&[upper(), sink()]), CompositeShape::Head);
        assert_eq!(classify(&[source()]), CompositeShape::Tail);
        assert_eq!(classify(&[source(), upper()]), CompositeShape::Tail);
        assert_eq!(classify(&[source(), sink()]), CompositeShape::Neutral);
        assert_eq!(
            classify(&[Unit::idle("neither", Capability::Neither)]),
            CompositeShape::Neutral
        );
    }

    #[tokio::test]
    async fn test_legacy_unit_in_longer_pipeline_is_not_standardized() {
        let legacy = Unit::legacy_source(IterSource::texts(["a"]));
        assert_eq!(classify(&[legacy, upper()]), CompositeShape::Tail);
    }

    #[tokio::test]
    async fn test_realize_identity_returns_member() {
        let pipeline = vec![source()];
        let composite = realize(CompositeShape::Tail, &pipeline, &ComposeOptions::default());
        assert!(composite.same_as(&pipeline[0]));
    }

    #[tokio::test]
    async fn test_realize_duplex_is_distinct_wrapper() {
        let pipeline = vec![upper(), upper()];
        let composite = realize(CompositeShape::Duplex, &pipeline, &ComposeOptions::default());

        assert!(!composite.same_as(&pipeline[0]));
        assert!(!composite.same_as(&pipeline[1]));
        assert_eq!(composite.kind(), UnitKind::Wrapper);
        assert_eq!(composite.capability(), Capability::Duplex);
        assert_eq!(
            composite.name(),
            "composite(change_text_case..change_text_case)"
        );
    }

    #[tokio::test]
    async fn test_realize_neutral_follows_options() {
        let pipeline = vec![source(), sink()];
        let composite = realize(CompositeShape::Neutral, &pipeline, &ComposeOptions::bytes());
        assert_eq!(composite.kind(), UnitKind::Passthrough);
        assert_eq!(composite.mode(), crate::units::StreamMode::Bytes);
    }
}
