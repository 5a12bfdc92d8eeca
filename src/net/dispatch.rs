//! Bookkeeping for dispatched persistence requests.
//!
//! DESIGN
//! ======
//! Mutations are applied to the page before they are persisted, so the
//! ledger's job is what happens afterwards:
//!
//! - **move coalescing**: each instance has at most one move in flight. Moves
//!   made while it is outstanding collapse into a single queued move, sent
//!   when the in-flight one settles. The first move is never delayed.
//! - **failure record**: failed requests are kept with their error so the
//!   board can surface them and offer a retry. A failed move that already has
//!   a newer move queued behind it is dropped, the queued move supersedes it.
//! - **rollback hints**: each request carries the cheap undo the board
//!   should apply if it fails.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use std::collections::HashMap;

use uuid::Uuid;

use super::types::{ActionError, ActionRequest, ActionResponse};
use crate::state::ids::{WidgetInstanceId, WidgetTypeId};

/// Undo to apply when a request fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Rollback {
    #[default]
    None,
    /// An add failed: the type's trigger may be enabled again.
    ReleaseAdd(WidgetTypeId),
    /// A save failed: put back the widget's last confirmed content.
    RestoreContent(WidgetInstanceId),
}

/// A request cleared for sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub id: Uuid,
    pub request: ActionRequest,
}

/// A failed request kept for reporting and retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncFailure {
    pub request_id: Uuid,
    pub request: ActionRequest,
    pub error: ActionError,
}

/// Outcome of one request, handed back to the board.
#[derive(Debug)]
pub struct Settled {
    pub request: ActionRequest,
    pub rollback: Rollback,
    pub result: Result<ActionResponse, ActionError>,
    /// Queued move to send now that this one is done.
    pub follow_up: Option<Outbound>,
}

#[derive(Debug)]
struct InFlight {
    request: ActionRequest,
    rollback: Rollback,
}

#[derive(Debug)]
struct MoveSlot {
    in_flight: Uuid,
    queued: Option<ActionRequest>,
}

#[derive(Debug, Default)]
pub struct DispatchLedger {
    in_flight: HashMap<Uuid, InFlight>,
    move_slots: HashMap<WidgetInstanceId, MoveSlot>,
    failures: Vec<SyncFailure>,
}

impl DispatchLedger {
    /// Register `request`. Returns the request to send now, or `None` when a
    /// move was folded into the instance's queued slot.
    pub fn begin(&mut self, request: ActionRequest, rollback: Rollback) -> Option<Outbound> {
        if let ActionRequest::Move { guid, .. } = &request {
            if let Some(slot) = self.move_slots.get_mut(guid) {
                slot.queued = Some(request);
                return None;
            }
            let id = Uuid::new_v4();
            self.move_slots.insert(guid.clone(), MoveSlot { in_flight: id, queued: None });
            self.in_flight.insert(id, InFlight { request: request.clone(), rollback });
            return Some(Outbound { id, request });
        }
        let id = Uuid::new_v4();
        self.in_flight.insert(id, InFlight { request: request.clone(), rollback });
        Some(Outbound { id, request })
    }

    /// Close out request `id`. Unknown ids (already settled) yield `None`.
    pub fn settle(&mut self, id: Uuid, result: Result<ActionResponse, ActionError>) -> Option<Settled> {
        let InFlight { request, rollback } = self.in_flight.remove(&id)?;

        let mut follow_up = None;
        if let ActionRequest::Move { guid, .. } = &request {
            if let Some(mut slot) = self.move_slots.remove(guid) {
                if slot.in_flight == id {
                    if let Some(queued) = slot.queued.take() {
                        let next = Uuid::new_v4();
                        self.in_flight.insert(next, InFlight { request: queued.clone(), rollback: Rollback::None });
                        self.move_slots.insert(guid.clone(), MoveSlot { in_flight: next, queued: None });
                        follow_up = Some(Outbound { id: next, request: queued });
                    }
                } else {
                    self.move_slots.insert(guid.clone(), slot);
                }
            }
        }

        if let Err(error) = &result {
            if follow_up.is_none() {
                self.failures.push(SyncFailure { request_id: id, request: request.clone(), error: error.clone() });
            }
        }

        Some(Settled { request, rollback, result, follow_up })
    }

    /// Record a failure detected after a transport-level success.
    pub fn record_failure(&mut self, request_id: Uuid, request: ActionRequest, error: ActionError) {
        self.failures.push(SyncFailure { request_id, request, error });
    }

    /// Drop the queued move of an instance that left the board. The move
    /// already in flight still settles normally.
    pub fn forget_instance(&mut self, instance: &WidgetInstanceId) {
        if let Some(slot) = self.move_slots.get_mut(instance) {
            slot.queued = None;
        }
    }

    #[must_use]
    pub fn failures(&self) -> &[SyncFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<SyncFailure> {
        std::mem::take(&mut self.failures)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn queued_move(&self, instance: &WidgetInstanceId) -> Option<&ActionRequest> {
        self.move_slots.get(instance).and_then(|slot| slot.queued.as_ref())
    }
}
