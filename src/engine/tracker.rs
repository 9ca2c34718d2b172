// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Completion tracking: turns the first terminal event of a pipeline into a
//! single settle outcome.
//!
//! Three event families are watched: errors on the composite, and the tail's
//! finish and close. An error settles the pipeline as failed; a finish, or a
//! close accepted by the [`ClosePolicy`], settles it as successful. Later
//! events stay visible to direct listeners but never settle again.

use std::fmt;

use crate::config::{ClosePolicy, ComposeOptions};
use crate::errors::UnitError;
use crate::observability::messages::{composition::PipelineSettled, StructuredLog};
use crate::units::{Events, Unit, UnitEvent};

/// Outcome of a settled pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Success,
    Failure(UnitError),
}

impl Settlement {
    pub fn error(&self) -> Option<&UnitError> {
        match self {
            Settlement::Success => None,
            Settlement::Failure(error) => Some(error),
        }
    }

    pub fn into_error(self) -> Option<UnitError> {
        match self {
            Settlement::Success => None,
            Settlement::Failure(error) => Some(error),
        }
    }

    pub fn to_result(&self) -> Result<(), UnitError> {
        match self {
            Settlement::Success => Ok(()),
            Settlement::Failure(error) => Err(error.clone()),
        }
    }
}

/// Pending until the first settle, then fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CompletionSignal {
    #[default]
    Pending,
    Settled(Settlement),
}

impl CompletionSignal {
    /// Record `outcome` unless already settled; returns whether it was recorded
    pub fn settle(&mut self, outcome: Settlement) -> bool {
        if self.is_settled() {
            return false;
        }
        *self = CompletionSignal::Settled(outcome);
        true
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, CompletionSignal::Settled(_))
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            CompletionSignal::Pending => None,
            CompletionSignal::Settled(settlement) => Some(settlement),
        }
    }
}

/// Completion callback, called once with the first error or `None`
pub struct OnComplete(Box<dyn FnOnce(Option<UnitError>) + Send + 'static>);

impl OnComplete {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Option<UnitError>) + Send + 'static,
    {
        Self(Box::new(callback))
    }

    pub(crate) fn call(self, error: Option<UnitError>) {
        (self.0)(error)
    }
}

impl fmt::Debug for OnComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnComplete(..)")
    }
}

/// Listeners registered at compose time.
///
/// Members may have failed or closed before composition, so the composite's
/// recorded errors and the tail's closed state are consulted alongside the
/// live listeners.
pub(crate) struct Observation {
    composite: Unit,
    errors: Events,
    terminal: Events,
    tail: Unit,
    policy: ClosePolicy,
    tail_closed: bool,
}

impl Observation {
    pub fn new(composite: &Unit, tail: &Unit, options: &ComposeOptions) -> Self {
        Self {
            composite: composite.clone(),
            errors: composite.subscribe(),
            terminal: tail.subscribe(),
            tail: tail.clone(),
            policy: options.close_policy,
            tail_closed: tail.is_closed(),
        }
    }

    /// Wait for the first settling event.
    ///
    /// A composite error wins over a tail event seen in the same turn: errors
    /// reach the composite before the failing unit's close is published. An
    /// error recorded before this observation subscribed counts as well.
    pub async fn settlement(mut self) -> Settlement {
        if let Some(error) = self.composite.first_error() {
            return Settlement::Failure(error);
        }
        // Closed before anyone listened; its close will never be observed
        if self.tail_closed {
            return self.after_terminal(true);
        }
        let mut errors_open = true;

        loop {
            tokio::select! {
                biased;
                error = self.errors.next_error(), if errors_open => match error {
                    Some(error) => {
                        return Settlement::Failure(self.composite.first_error().unwrap_or(error))
                    }
                    None => errors_open = false,
                },
                event = self.terminal.next() => match event {
                    Some(UnitEvent::Finish) => return self.after_terminal(false),
                    Some(UnitEvent::Close) => return self.after_terminal(true),
                    Some(UnitEvent::Error(_)) => {}
                    // The tail's bus outlives this observation, which holds the tail
                    None => return self.after_terminal(true),
                },
            }
        }
    }

    fn after_terminal(&self, closed: bool) -> Settlement {
        // Relayed before the tail's event, possibly still queued unread
        if let Some(error) = self.composite.first_error() {
            return Settlement::Failure(error);
        }

        if closed && self.policy == ClosePolicy::RequireFinish && !self.tail.ended_cleanly() {
            return Settlement::Failure(UnitError::premature_close(self.tail.name()));
        }
        Settlement::Success
    }

    pub fn composite_name(&self) -> &str {
        self.composite.name()
    }
}

/// Settle `signal` and log the outcome; false when it was already settled
pub(crate) fn record(signal: &mut CompletionSignal, composite: &str, outcome: Settlement) -> bool {
    if !signal.settle(outcome) {
        return false;
    }
    PipelineSettled {
        composite,
        error: signal.settlement().and_then(Settlement::error),
    }
    .log();
    true
}

/// Run the completion callback once the pipeline settles
pub(crate) fn track(observation: Observation, on_complete: OnComplete) {
    tokio::spawn(async move {
        let composite = observation.composite_name().to_string();
        let mut signal = CompletionSignal::Pending;
        let outcome = observation.settlement().await;
        if record(&mut signal, &composite, outcome.clone()) {
            on_complete.call(outcome.into_error());
        }
    });
}

/// Empty pipelines settle successfully on a later scheduling turn
pub(crate) fn track_empty(composite: &str, on_complete: OnComplete) {
    let composite = composite.to_string();
    tokio::spawn(async move {
        let mut signal = CompletionSignal::Pending;
        if record(&mut signal, &composite, Settlement::Success) {
            on_complete.call(None);
        }
    });
}
