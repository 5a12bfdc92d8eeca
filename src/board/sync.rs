//! Request dispatch and completion handling.

use std::rc::Rc;

use uuid::Uuid;

use super::{BoardInner, WidgetBoard};
use crate::dom::Page;
use crate::net::dispatch::{Outbound, Rollback, Settled};
use crate::net::types::{ActionError, ActionRequest, ActionResponse};
use crate::state::ids::WidgetTypeId;

impl<P: Page + 'static> WidgetBoard<P> {
    /// Register `request` with the ledger and send it unless it was folded
    /// into a queued move.
    pub(super) fn dispatch(&self, request: ActionRequest, rollback: Rollback) {
        let outbound = self.inner.borrow_mut().ledger.begin(request, rollback);
        if let Some(outbound) = outbound {
            self.send(outbound);
        }
    }

    fn send(&self, outbound: Outbound) {
        let Outbound { id, request } = outbound;
        let weak = Rc::downgrade(&self.inner);
        let transport = Rc::clone(&self.transport);
        self.transport.send(
            request,
            Box::new(move |result| {
                if let Some(inner) = weak.upgrade() {
                    WidgetBoard { inner, transport }.settle(id, result);
                }
            }),
        );
    }

    fn settle(&self, id: Uuid, result: Result<ActionResponse, ActionError>) {
        let settled = self.inner.borrow_mut().ledger.settle(id, result);
        let Some(Settled { request, rollback, result, follow_up }) = settled else {
            return;
        };

        {
            let mut inner = self.inner.borrow_mut();
            match result {
                Ok(response) => inner.apply_success(id, request, rollback, response),
                Err(error) => {
                    leptos::logging::warn!("{} failed: {error}", request.kind().endpoint());
                    inner.apply_rollback(rollback);
                }
            }
        }

        if let Some(next) = follow_up {
            self.send(next);
        }
    }

    /// Resend every recorded failure. Adds and saves redo their optimistic
    /// step first; moves are resent with the widget's current placement and
    /// dropped if it is gone. Returns how many requests were resent.
    pub fn retry_failed(&self) -> usize {
        let failures = self.inner.borrow_mut().ledger.take_failures();
        let mut resent = 0;
        for failure in failures {
            let prepared = {
                let mut inner = self.inner.borrow_mut();
                inner.prepare_retry(failure.request)
            };
            if let Some((request, rollback)) = prepared {
                self.dispatch(request, rollback);
                resent += 1;
            }
        }
        resent
    }
}

impl<P: Page> BoardInner<P> {
    fn apply_success(&mut self, id: Uuid, request: ActionRequest, rollback: Rollback, response: ActionResponse) {
        let kind = request.kind();
        let output = response.output.filter(|html| !html.trim().is_empty());
        if kind.expects_fragment() && output.is_none() {
            leptos::logging::warn!("{} returned no markup", kind.endpoint());
            self.ledger.record_failure(id, request, ActionError::MissingOutput);
            self.apply_rollback(rollback);
            return;
        }

        match (request, output) {
            (ActionRequest::Add { handler, .. }, Some(html)) => self.insert_added(&handler, &html),
            (ActionRequest::SaveSettings { guid: Some(guid), .. }, Some(html)) => {
                self.content.confirm(&guid, &html);
                let widget = self.widget_element(&guid);
                self.page.set_content_html(&widget, &html);
            }
            _ => {}
        }
    }

    fn insert_added(&mut self, handler: &WidgetTypeId, html: &str) {
        self.availability.settle_add(handler);

        let column = self.config.add_column.clone();
        let column_element = self.column_element(&column);
        let placed = self
            .page
            .prepend_fragment(&column_element, html)
            .ok_or_else(|| super::BoardError::NotDisplayed(column_element.clone()))
            .and_then(|scanned| self.instance_from_scan(&scanned))
            .and_then(|instance| {
                let instance_id = instance.instance_id.clone();
                let type_id = instance.type_id.clone();
                self.layout.insert_at_front(&column, instance)?;
                Ok((instance_id, type_id))
            });

        match placed {
            Ok((instance_id, type_id)) => {
                self.bind_instance(&instance_id);
                if &type_id != handler {
                    self.refresh_trigger(&type_id);
                }
                self.after_layout_change();
            }
            Err(e) => leptos::logging::warn!("added {handler} widget could not be placed: {e}"),
        }
        self.refresh_trigger(handler);
    }

    fn apply_rollback(&mut self, rollback: Rollback) {
        match rollback {
            Rollback::None => {}
            Rollback::ReleaseAdd(type_id) => {
                self.availability.settle_add(&type_id);
                self.refresh_trigger(&type_id);
            }
            Rollback::RestoreContent(instance_id) => {
                if let Some(html) = self.content.fail(&instance_id) {
                    let widget = self.widget_element(&instance_id);
                    self.page.set_content_html(&widget, &html);
                }
            }
        }
    }

    fn prepare_retry(&mut self, request: ActionRequest) -> Option<(ActionRequest, Rollback)> {
        match request {
            ActionRequest::Add { handler, .. } => {
                if let Err(e) = self.reserve_add(&handler) {
                    leptos::logging::warn!("not retrying add: {e}");
                    return None;
                }
                let request = ActionRequest::Add {
                    handler: handler.clone(),
                    user_guid: self.config.user_guid.clone(),
                    context: self.page.context_value(),
                };
                Some((request, Rollback::ReleaseAdd(handler)))
            }
            ActionRequest::Move { guid, .. } => {
                let placed = self.layout.get(&guid)?;
                let request = ActionRequest::Move {
                    column: placed.column.clone(),
                    position: placed.position,
                    guid,
                };
                Some((request, Rollback::None))
            }
            ActionRequest::Remove { guid } => {
                (!self.layout.contains(&guid)).then_some((ActionRequest::Remove { guid }, Rollback::None))
            }
            ActionRequest::SaveSettings { guid: Some(guid), fields } => {
                if !self.layout.contains(&guid) {
                    return None;
                }
                let rollback = self.show_loading(&guid);
                Some((ActionRequest::SaveSettings { guid: Some(guid), fields }, rollback))
            }
            ActionRequest::SaveSettings { guid: None, .. } => None,
        }
    }
}
