//! Gesture handlers.
//!
//! Each handler validates its input, applies the visible change to the page
//! and the layout model, then hands the matching request to the dispatcher.
//! Edit and collapse toggles are local only.

use super::{BoardError, WidgetBoard};
use crate::dom::Page;
use crate::net::dispatch::Rollback;
use crate::net::types::ActionRequest;
use crate::state::ids::{ColumnId, WidgetInstanceId, WidgetTypeId};
use crate::util::ident::IdKind;

impl<P: Page + 'static> WidgetBoard<P> {
    pub(super) fn on_add_clicked(&self, trigger: &str) -> Result<(), BoardError> {
        let (request, type_id) = {
            let mut inner = self.inner.borrow_mut();
            let type_id = WidgetTypeId::new(inner.decode(IdKind::WidgetType, trigger)?);
            inner.reserve_add(&type_id)?;
            let request = ActionRequest::Add {
                handler: type_id.clone(),
                user_guid: inner.config.user_guid.clone(),
                context: inner.page.context_value(),
            };
            (request, type_id)
        };
        self.dispatch(request, Rollback::ReleaseAdd(type_id));
        Ok(())
    }

    pub(super) fn on_delete_clicked(&self, widget: &str, button: &str) -> Result<(), BoardError> {
        let guid = {
            let mut inner = self.inner.borrow_mut();
            let instance_id = match inner.codec.decode(IdKind::DeleteButton, button) {
                Some(id) => WidgetInstanceId::new(id),
                None => WidgetInstanceId::new(inner.decode(IdKind::Instance, widget)?),
            };
            if !inner.layout.contains(&instance_id) {
                return Err(BoardError::UnknownWidget(widget.to_owned()));
            }

            let element = inner.widget_element(&instance_id);
            inner.page.remove_widget(&element);
            if let Some(bindings) = inner.bindings.remove(&instance_id) {
                bindings.dispose(&mut inner.page);
            }
            inner.ledger.forget_instance(&instance_id);
            inner.content.forget(&instance_id);
            if let Some(removed) = inner.layout.remove(&instance_id) {
                inner.refresh_trigger(&removed.type_id);
            }
            inner.after_layout_change();
            instance_id
        };
        self.dispatch(ActionRequest::Remove { guid }, Rollback::None);
        Ok(())
    }

    pub(super) fn on_edit_toggled(&self, widget: &str) -> Result<(), BoardError> {
        let mut inner = self.inner.borrow_mut();
        let instance_id = inner.placed_instance(widget)?;
        let open = inner.layout.get_mut(&instance_id).map(|w| {
            w.edit_open = !w.edit_open;
            w.edit_open
        });
        if let Some(open) = open {
            inner.page.slide_settings(widget, open);
        }
        Ok(())
    }

    pub(super) fn on_collapse_toggled(&self, widget: &str) -> Result<(), BoardError> {
        let mut inner = self.inner.borrow_mut();
        let instance_id = inner.placed_instance(widget)?;
        let collapsed = inner.layout.get_mut(&instance_id).map(|w| {
            w.collapsed = !w.collapsed;
            w.collapsed
        });
        if let Some(collapsed) = collapsed {
            inner.page.set_collapse_marker(widget, collapsed);
            inner.page.slide_body(widget, !collapsed);
        }
        Ok(())
    }

    pub(super) fn on_settings_submitted(&self, widget: &str, fields: Vec<(String, String)>) -> Result<(), BoardError> {
        let (request, rollback) = {
            let mut inner = self.inner.borrow_mut();
            let instance_id = inner.placed_instance(widget)?;
            if let Some(w) = inner.layout.get_mut(&instance_id) {
                w.edit_open = false;
            }
            inner.page.slide_settings(widget, false);
            let rollback = inner.show_loading(&instance_id);
            (ActionRequest::SaveSettings { guid: Some(instance_id), fields }, rollback)
        };
        self.dispatch(request, rollback);
        Ok(())
    }

    pub(super) fn on_drag_stopped(&self, widget: &str) -> Result<(), BoardError> {
        let request = {
            let mut inner = self.inner.borrow_mut();
            inner.page.reset_drag_offset(widget);

            let instance_id = inner.placed_instance(widget)?;
            let (column_element, index) = inner
                .page
                .drop_position(widget)
                .ok_or_else(|| BoardError::NotDisplayed(widget.to_owned()))?;
            let column = ColumnId::new(inner.decode(IdKind::Column, &column_element)?);
            let placement = inner.layout.reorder(&instance_id, &column, index)?;

            // The page order wins over the model for both touched columns.
            let mut touched = vec![placement.to_column.clone()];
            if placement.from_column != placement.to_column {
                touched.push(placement.from_column.clone());
            }
            for column_id in &touched {
                let element = inner.column_element(column_id);
                let order: Vec<WidgetInstanceId> = inner
                    .page
                    .column_order(&element)
                    .iter()
                    .filter_map(|id| inner.codec.decode(IdKind::Instance, id))
                    .map(WidgetInstanceId::from)
                    .collect();
                inner.layout.resync_column(column_id, &order)?;
            }
            inner.after_layout_change();

            // The backend gets the displayed index, which also counts
            // children the model skipped.
            ActionRequest::Move { guid: instance_id, column, position: index }
        };
        self.dispatch(request, Rollback::None);
        Ok(())
    }
}

impl<P: Page> super::BoardInner<P> {
    /// Claim an add of `type_id`: single-instance triggers are detached until
    /// the add settles.
    pub(super) fn reserve_add(&mut self, type_id: &WidgetTypeId) -> Result<(), BoardError> {
        let Some(trigger) = self.availability.get(type_id) else {
            return Err(BoardError::UnknownTrigger(type_id.clone()));
        };
        if !trigger.multiple && !trigger.available {
            return Err(BoardError::Unavailable(type_id.clone()));
        }
        self.availability.begin_add(type_id);
        if let Some(update) = self.availability.mark_unavailable(type_id) {
            super::bindings::apply_trigger_update(&mut self.page, &mut self.availability, update);
        }
        Ok(())
    }

    /// Swap the content region for the loading placeholder and return the
    /// rollback that puts the confirmed content back.
    pub(super) fn show_loading(&mut self, instance_id: &WidgetInstanceId) -> Rollback {
        let widget = self.widget_element(instance_id);
        let shown = self.page.content_html(&widget).unwrap_or_default();
        self.content.begin(instance_id, shown);
        let placeholder = self.config.loading_placeholder.clone();
        self.page.set_content_html(&widget, &placeholder);
        Rollback::RestoreContent(instance_id.clone())
    }
}
