//! Test transport that parks requests until the test resolves them.

use std::cell::RefCell;
use std::rc::Rc;

use super::api::{ActionTransport, Completion};
use super::types::{ActionError, ActionRequest, ActionResponse};

struct Parked {
    request: ActionRequest,
    done: Option<Completion>,
}

/// Cheap clone handle; clones share the same queue.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    parked: Rc<RefCell<Vec<Parked>>>,
}

impl RecordingTransport {
    /// Every request sent so far, in order.
    pub(crate) fn requests(&self) -> Vec<ActionRequest> {
        self.parked.borrow().iter().map(|p| p.request.clone()).collect()
    }

    pub(crate) fn sent(&self) -> usize {
        self.parked.borrow().len()
    }

    pub(crate) fn last(&self) -> Option<ActionRequest> {
        self.parked.borrow().last().map(|p| p.request.clone())
    }

    /// Run the completion of request `index`. The queue borrow is released
    /// first so the completion may send follow-up requests.
    pub(crate) fn resolve(&self, index: usize, result: Result<ActionResponse, ActionError>) {
        let done = self.parked.borrow_mut()[index].done.take();
        if let Some(done) = done {
            done(result);
        }
    }

    pub(crate) fn succeed(&self, index: usize) {
        self.resolve(index, Ok(ActionResponse::default()));
    }

    pub(crate) fn succeed_with(&self, index: usize, output: &str) {
        self.resolve(index, Ok(ActionResponse::with_output(output)));
    }

    pub(crate) fn fail(&self, index: usize) {
        self.resolve(index, Err(ActionError::Status(500)));
    }
}

impl ActionTransport for RecordingTransport {
    fn send(&self, request: ActionRequest, done: Completion) {
        self.parked.borrow_mut().push(Parked { request, done: Some(done) });
    }
}
