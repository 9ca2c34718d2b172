// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backends::local::{
    ChangeTextCaseTransform, CollectorSink, IterSource, ReverseTextTransform,
};
use crate::backends::stub::{CountingSource, ExpectingSink, FailingTransform, SlowSink};
use crate::config::{ClosePolicy, ComposeOptions};
use crate::engine::{compose, Composer, CompositeShape, OnComplete};
use crate::errors::{UnitError, UnitErrorKind};
use crate::units::{Capability, Chunk, StreamMode, Unit, UnitEvent, UnitKind, UnitSettings};

/// End-to-end tests composing real local units
#[cfg(test)]
mod tests {
    use super::*;

    type Calls = mpsc::UnboundedReceiver<Option<UnitError>>;

    /// A completion callback reporting into a channel. The channel closes once
    /// the callback has run, so a second `recv` returning `None` proves it ran
    /// exactly once.
    fn callback() -> (impl FnOnce(Option<UnitError>) + Send + 'static, Calls) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = move |error| {
            let _ = tx.send(error);
        };
        (callback, rx)
    }

    async fn settled_once(calls: &mut Calls) -> Option<UnitError> {
        let outcome = calls.recv().await.expect("callback never ran");
        assert!(calls.recv().await.is_none(), "callback ran more than once");
        outcome
    }

    fn upper() -> Unit {
        Unit::transform(ChangeTextCaseTransform::upper())
    }

    /// A source that fails on its first item: byte mode refuses text items
    fn failing_source() -> Unit {
        Unit::source_with(
            IterSource::texts(["a"]),
            UnitSettings::named("bytes").with_mode(StreamMode::Bytes),
        )
    }

    async fn wait_closed(unit: &Unit) {
        while !unit.is_closed() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_single_read_only_unit_is_returned_itself() {
        let source = Unit::source(IterSource::texts(["a"]));
        let handle = compose(vec![source.clone()]);

        assert_eq!(handle.shape(), CompositeShape::Tail);
        assert!(handle.unit().same_as(&source));
        assert!(handle.can_read());
        assert!(!handle.can_write());
    }

    #[tokio::test]
    async fn test_single_write_only_unit_is_returned_itself() {
        let (collector, _) = CollectorSink::new();
        let sink = Unit::sink(collector);
        let handle = compose(vec![sink.clone()]);

        assert_eq!(handle.shape(), CompositeShape::Head);
        assert!(Unit::from(handle).same_as(&sink));
    }

    #[tokio::test]
    async fn test_duplex_composite_transforms_each_item_once() {
        let first = upper();
        let second = Unit::transform(ReverseTextTransform::new());
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .units(vec![first.clone(), second.clone()])
            .on_complete(on_complete)
            .compose();

        assert_eq!(handle.shape(), CompositeShape::Duplex);
        assert!(!handle.unit().same_as(&first));
        assert!(!handle.unit().same_as(&second));
        assert_eq!(handle.capability(), Capability::Duplex);

        let writer = handle.writer().unwrap();
        let reader = handle.take_reader().unwrap();
        writer.write("abc").await.unwrap();
        writer.write("de").await.unwrap();
        writer.end().await.unwrap();

        assert_eq!(
            reader.collect().await,
            vec![Chunk::from("CBA"), Chunk::from("ED")]
        );
        assert_eq!(settled_once(&mut calls).await, None);
    }

    #[tokio::test]
    async fn test_source_transform_sink_delivers_uppercase_once() {
        let (expecting, received) = ExpectingSink::new("A");
        let (on_complete, mut calls) = callback();

        let handle = Composer::new()
            .unit(Unit::source(IterSource::texts(["a"])))
            .unit(upper())
            .unit(Unit::sink(expecting))
            .on_complete(on_complete)
            .compose();

        assert_eq!(handle.shape(), CompositeShape::Neutral);
        assert_eq!(settled_once(&mut calls).await, None);
        assert_eq!(received.count(), 1);
    }

    #[tokio::test]
    async fn test_independent_failures_are_each_relayed() {
        let members: Vec<Unit> = ["a", "b", "c"]
            .into_iter()
            .map(|name| Unit::idle(name, Capability::Duplex))
            .collect();
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .units(members.clone())
            .on_complete(on_complete)
            .compose();
        let mut events = handle.subscribe();

        let errors: Vec<UnitError> = ["first", "second", "third"]
            .into_iter()
            .map(UnitError::new)
            .collect();
        for (member, error) in members.iter().zip(&errors) {
            member.emit_error(error.clone());
        }

        for error in &errors {
            assert_eq!(events.next_error().await.as_ref(), Some(error));
        }
        assert_eq!(events.try_next(), None);
        assert_eq!(settled_once(&mut calls).await, Some(errors[0].clone()));
    }

    #[tokio::test]
    async fn test_identity_composite_does_not_reemit_its_own_errors() {
        let head = Unit::idle("head", Capability::WriteOnly);
        let handle = compose(vec![head.clone(), Unit::idle("tail", Capability::Neither)]);
        let mut events = handle.subscribe();

        let error = UnitError::new("once");
        head.emit_error(error.clone());

        assert_eq!(events.next().await, Some(UnitEvent::Error(error)));
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn test_error_on_synthesized_composite_is_not_reemitted() {
        let handle = compose(vec![upper(), upper()]);
        let mut events = handle.subscribe();

        handle.unit().emit_error(UnitError::new("direct"));

        assert!(events.next_error().await.is_some());
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn test_callback_on_destroy_without_error() {
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .units(vec![upper(), upper()])
            .on_complete(on_complete)
            .compose();

        handle.destroy(None);

        assert_eq!(settled_once(&mut calls).await, None);
        assert!(handle.head().is_closed());
        assert!(handle.tail().is_closed());
    }

    #[tokio::test]
    async fn test_callback_on_destroy_with_error() {
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .units(vec![upper(), upper()])
            .on_complete(on_complete)
            .compose();
        let error = UnitError::new("aborted");

        handle.destroy(Some(error.clone()));

        assert_eq!(settled_once(&mut calls).await, Some(error));
    }

    #[tokio::test]
    async fn test_member_failure_settles_with_that_error() {
        let (on_complete, mut calls) = callback();
        let (collector, collected) = CollectorSink::new();
        let handle = Composer::new()
            .unit(Unit::source(IterSource::texts(["a"])))
            .unit(Unit::transform(FailingTransform::new("boom")))
            .unit(Unit::sink(collector))
            .on_complete(on_complete)
            .compose();
        let mut events = handle.subscribe();

        let error = settled_once(&mut calls).await.unwrap();
        assert_eq!(error.to_string(), "boom");
        assert_eq!(events.next_error().await, Some(error));
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pipeline_completes_on_a_later_turn() {
        let called = Arc::new(AtomicBool::new(false));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let flag = called.clone();

        let handle = Composer::new()
            .on_complete(move |error| {
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(error);
            })
            .compose();

        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(handle.shape(), CompositeShape::Empty);
        assert_eq!(handle.unit().kind(), UnitKind::Passthrough);
        assert!(rx.await.unwrap().is_none());
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_deferred_accesses_share_the_outcome() {
        let (collector, collected) = CollectorSink::new();
        let pipeline = Composer::new()
            .unit(Unit::source(IterSource::texts(["x", "y"])))
            .unit(upper())
            .unit(Unit::sink(collector))
            .compose_deferred();

        let early = pipeline.deferred();
        assert_eq!(early.await, Ok(()));

        // Registered after settlement
        assert_eq!((&pipeline).await, Ok(()));
        assert_eq!(pipeline.then(|| collected.texts()).await, Ok(vec!["X".to_string(), "Y".to_string()]));
        assert!(pipeline.factory().current().is_settled());
    }

    #[tokio::test]
    async fn test_deferred_rejects_with_first_error() {
        let pipeline = Composer::new()
            .unit(Unit::source(IterSource::texts(["a"])))
            .unit(Unit::transform(FailingTransform::new("bad input")))
            .unit(Unit::sink(CollectorSink::new().0))
            .compose_deferred();

        let first = pipeline.deferred();
        let second = pipeline.deferred();
        let (first, second) = tokio::join!(first, second);

        let error = first.unwrap_err();
        assert_eq!(second, Err(error.clone()));
        assert_eq!(pipeline.catch(|e| e.to_string()).await, Some("bad input".to_string()));

        let mut ran = false;
        assert_eq!(pipeline.finally(|| ran = true).await, Err(error));
        assert!(ran);
    }

    #[tokio::test]
    async fn test_deferred_does_not_consume_events() {
        let pipeline = Composer::new()
            .units(vec![upper(), upper()])
            .compose_deferred();
        let mut events = pipeline.subscribe();
        let waiting = pipeline.deferred();

        let writer = pipeline.writer().unwrap();
        let reader = pipeline.take_reader().unwrap();
        writer.write("q").await.unwrap();
        writer.end().await.unwrap();

        assert_eq!(reader.collect().await, vec![Chunk::from("Q")]);
        assert_eq!(waiting.await, Ok(()));
        assert_eq!(events.next().await, Some(UnitEvent::Finish));
        assert_eq!(events.next().await, Some(UnitEvent::Close));
    }

    #[tokio::test]
    async fn test_empty_pipeline_deferred_resolves() {
        let pipeline = Composer::new().compose_deferred();
        assert_eq!((&pipeline).await, Ok(()));
    }

    #[tokio::test]
    async fn test_lone_legacy_unit_is_standardized() {
        let legacy = Unit::legacy_source(IterSource::texts(["x", "y", "z"]));
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .unit(legacy.clone())
            .on_complete(on_complete)
            .compose();

        assert_eq!(handle.shape(), CompositeShape::Standardized);
        assert!(!handle.unit().same_as(&legacy));
        assert!(handle.can_read());
        assert!(!handle.can_write());

        let chunks = handle.take_reader().unwrap().collect().await;
        assert_eq!(
            chunks,
            vec![Chunk::from("x"), Chunk::from("y"), Chunk::from("z")]
        );
        assert_eq!(settled_once(&mut calls).await, None);
    }

    #[tokio::test]
    async fn test_backpressure_with_small_buffers_loses_nothing() {
        let (counting, produced) = CountingSource::new(50);
        let (slow, received) = SlowSink::new();
        let pipeline = Composer::new()
            .unit(Unit::legacy_source(counting))
            .unit(Unit::passthrough_with(
                UnitSettings::named("narrow").with_high_water_mark(1),
            ))
            .unit(Unit::sink_with(slow, UnitSettings::named("slow").with_high_water_mark(1)))
            .compose_deferred();

        assert_eq!((&pipeline).await, Ok(()));
        assert_eq!(produced.count(), 50);
        assert_eq!(received.count(), 50);
    }

    #[tokio::test]
    async fn test_require_finish_policy_rejects_premature_close() {
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .unit(Unit::source(IterSource::texts(["a"])))
            .unit(Unit::idle("stuck", Capability::WriteOnly))
            .options(ComposeOptions {
                close_policy: ClosePolicy::RequireFinish,
                ..ComposeOptions::default()
            })
            .on_complete(on_complete)
            .compose();

        handle.tail().destroy(None);

        let error = settled_once(&mut calls).await.unwrap();
        assert!(matches!(
            error.kind(),
            UnitErrorKind::PrematureClose { unit } if unit == "stuck"
        ));
    }

    #[tokio::test]
    async fn test_settle_success_policy_accepts_bare_close() {
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .unit(Unit::source(IterSource::texts(["a"])))
            .unit(Unit::idle("stuck", Capability::WriteOnly))
            .on_complete(on_complete)
            .compose();

        handle.tail().destroy(None);

        assert_eq!(settled_once(&mut calls).await, None);
    }

    #[tokio::test]
    async fn test_macro_with_list_options_and_callback() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let (collector, collected) = CollectorSink::new();

        let handle = crate::compose!(
            vec![
                Unit::source(IterSource::texts(["m"])),
                upper(),
                Unit::sink(collector),
            ],
            ComposeOptions::default(),
            OnComplete::new(move |error| {
                let _ = tx.send(error);
            }),
        );

        assert_eq!(handle.pipeline().len(), 3);
        assert!(rx.await.unwrap().is_none());
        assert_eq!(collected.texts(), vec!["M"]);
    }

    #[tokio::test]
    async fn test_composite_nests_inside_another_pipeline() {
        let inner = compose(vec![upper(), Unit::transform(ReverseTextTransform::new())]);
        let (collector, collected) = CollectorSink::new();

        let outer = Composer::new()
            .unit(Unit::source(IterSource::texts(["hello"])))
            .unit(inner)
            .unit(Unit::sink(collector))
            .compose_deferred();

        assert_eq!((&outer).await, Ok(()));
        assert_eq!(collected.texts(), vec!["OLLEH"]);
    }

    #[tokio::test]
    async fn test_byte_mode_pipeline_rejects_items() {
        let options = ComposeOptions::bytes();
        let pipeline = Composer::new()
            .unit(Unit::source(IterSource::texts(["text item"])))
            .unit(Unit::passthrough(&options))
            .unit(Unit::sink(CollectorSink::new().0))
            .options(options)
            .compose_deferred();

        let error = (&pipeline).await.unwrap_err();
        assert!(matches!(error.kind(), UnitErrorKind::InvalidChunk { .. }));
    }

    #[tokio::test]
    async fn test_tail_failed_before_composition_settles_with_its_error() {
        let source = failing_source();
        wait_closed(&source).await;
        let (on_complete, mut calls) = callback();

        let handle = Composer::new()
            .unit(source.clone())
            .on_complete(on_complete)
            .compose();

        assert!(handle.unit().same_as(&source));
        let error = settled_once(&mut calls).await.unwrap();
        assert!(matches!(error.kind(), UnitErrorKind::InvalidChunk { .. }));
    }

    #[tokio::test]
    async fn test_head_failed_before_composition_is_relayed_and_settles() {
        let source = failing_source();
        wait_closed(&source).await;
        let (collector, collected) = CollectorSink::new();

        let pipeline = Composer::new()
            .unit(source)
            .unit(upper())
            .unit(Unit::sink(collector))
            .compose_deferred();

        let error = (&pipeline).await.unwrap_err();
        assert!(matches!(error.kind(), UnitErrorKind::InvalidChunk { .. }));
        assert_eq!(pipeline.unit().first_error(), Some(error));
        assert!(collected.is_empty());
        wait_closed(pipeline.tail()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_early_failures_settle_on_multi_thread_runtime() {
        for _ in 0..100 {
            let pipeline = Composer::new()
                .unit(failing_source())
                .unit(upper())
                .unit(Unit::sink(CollectorSink::new().0))
                .compose_deferred();

            let outcome = tokio::time::timeout(Duration::from_secs(5), pipeline.deferred())
                .await
                .expect("pipeline never settled");
            let error = outcome.unwrap_err();
            assert!(matches!(error.kind(), UnitErrorKind::InvalidChunk { .. }));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pipelines_complete_on_multi_thread_runtime() {
        for round in 0..50 {
            let (collector, collected) = CollectorSink::new();
            let pipeline = Composer::new()
                .unit(Unit::source(IterSource::texts(["a", "b"])))
                .unit(upper())
                .unit(Unit::sink(collector))
                .compose_deferred();

            let outcome = tokio::time::timeout(Duration::from_secs(5), pipeline.deferred())
                .await
                .expect("pipeline never settled");
            assert_eq!(outcome, Ok(()), "round {round}");
            assert_eq!(collected.texts(), vec!["A", "B"]);
        }
    }

    #[tokio::test]
    async fn test_lone_source_settles_only_after_its_reader_drains_it() {
        let (on_complete, mut calls) = callback();
        let handle = Composer::new()
            .unit(Unit::source(IterSource::texts(["a", "b"])))
            .on_complete(on_complete)
            .compose();

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(calls.try_recv().is_err());
        assert!(!handle.unit().is_closed());

        let chunks = handle.take_reader().unwrap().collect().await;
        assert_eq!(chunks, vec![Chunk::from("a"), Chunk::from("b")]);
        assert_eq!(settled_once(&mut calls).await, None);
        assert!(handle.unit().ended_cleanly());
    }

    #[tokio::test]
    async fn test_dropped_reader_closes_source_without_clean_end() {
        let source = Unit::source(IterSource::texts(["a"]));
        let mut events = source.subscribe();

        drop(source.take_reader());

        assert_eq!(events.next().await, Some(UnitEvent::Close));
        assert!(!source.ended_cleanly());
    }
}
