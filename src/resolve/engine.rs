use serde::Serialize;
use tracing::{debug, trace};

use crate::command::command_model::FillCommand;
use crate::dom::{Document, NodeId};
use crate::resolve::strategy::{StrategyResult, by_criterion, by_locator};

/// Progress of one command through its strategy chain.
///
/// Strategy 0 is the primary locator; strategies `1..` are the command's
/// fallback criteria in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolutionState {
    NotTried,
    Tried { strategy: usize },
    Resolved { strategy: usize, node: NodeId },
    Exhausted,
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionState::Resolved { .. } | ResolutionState::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Hit,
    Miss,
    /// The selector string was rejected by the query engine. Counts as a miss.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub strategy: usize,
    pub description: String,
    pub outcome: AttemptOutcome,
}

/// Where resolution ended and how it got there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub state: ResolutionState,
    pub attempts: Vec<Attempt>,
}

impl Resolution {
    pub fn node(&self) -> Option<NodeId> {
        match self.state {
            ResolutionState::Resolved { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Index of the strategy that found the element.
    pub fn strategy(&self) -> Option<usize> {
        match self.state {
            ResolutionState::Resolved { strategy, .. } => Some(strategy),
            _ => None,
        }
    }

    pub fn via_primary(&self) -> bool {
        self.strategy() == Some(0)
    }
}

/// Steps one command through its strategies against a document.
///
/// Never mutates the document, so resolving the same command twice against
/// an unchanged document yields the same element.
pub struct Resolver<'a> {
    command: &'a FillCommand,
    doc: &'a Document,
    state: ResolutionState,
    attempts: Vec<Attempt>,
}

impl<'a> Resolver<'a> {
    pub fn new(command: &'a FillCommand, doc: &'a Document) -> Self {
        Self {
            command,
            doc,
            state: ResolutionState::NotTried,
            attempts: Vec::new(),
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    fn strategy_count(&self) -> usize {
        1 + self.command.fallback_locators.len()
    }

    fn run_strategy(&self, index: usize) -> (String, StrategyResult) {
        if index == 0 {
            let locator = &self.command.locator;
            (format!("locator {}", locator), by_locator(locator, self.doc))
        } else {
            let criterion = &self.command.fallback_locators[index - 1];
            (criterion.describe(), by_criterion(criterion, self.doc))
        }
    }

    /// Advance one transition. Terminal states are absorbing.
    pub fn step(&mut self) -> ResolutionState {
        let next = match self.state {
            ResolutionState::NotTried => 0,
            ResolutionState::Tried { strategy } => strategy + 1,
            terminal => return terminal,
        };

        if next >= self.strategy_count() {
            self.state = ResolutionState::Exhausted;
            return self.state;
        }

        let (description, result) = self.run_strategy(next);
        let outcome = match result {
            Ok(Some(node)) => {
                self.state = ResolutionState::Resolved { strategy: next, node };
                AttemptOutcome::Hit
            }
            Ok(None) => {
                self.state = ResolutionState::Tried { strategy: next };
                AttemptOutcome::Miss
            }
            Err(invalid) => {
                debug!(selector = %invalid.selector, reason = %invalid.reason, "invalid selector, treating as miss");
                self.state = ResolutionState::Tried { strategy: next };
                AttemptOutcome::Invalid(invalid.reason)
            }
        };

        trace!(key = %self.command.field_key, strategy = next, %description, ?outcome, "resolution attempt");
        self.attempts.push(Attempt {
            strategy: next,
            description,
            outcome,
        });
        self.state
    }

    /// Step until resolved or exhausted.
    pub fn run(mut self) -> Resolution {
        while !self.step().is_terminal() {}
        Resolution {
            state: self.state,
            attempts: self.attempts,
        }
    }
}

/// Resolve a command against the current document.
pub fn resolve(command: &FillCommand, doc: &Document) -> Resolution {
    let resolution = Resolver::new(command, doc).run();
    match resolution.node() {
        Some(node) => debug!(
            key = %command.field_key,
            element = %doc.describe(node),
            strategy = ?resolution.strategy(),
            "resolved"
        ),
        None => debug!(
            key = %command.field_key,
            tried = resolution.attempts.len(),
            "no strategy matched"
        ),
    }
    resolution
}
