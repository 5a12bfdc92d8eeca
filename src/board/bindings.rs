//! Listener bookkeeping for widget instances and add triggers.

use crate::dom::{Control, ListenerKey, Page, Target};
use crate::state::availability::{AvailabilityTracker, TriggerUpdate};

/// Listeners attached to one widget's controls. Dispose when the widget
/// leaves the page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstanceBindings {
    keys: Vec<ListenerKey>,
}

impl InstanceBindings {
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn dispose<P: Page + ?Sized>(self, page: &mut P) {
        for key in self.keys {
            page.unlisten(key);
        }
    }
}

/// Attach the delete, edit, collapse and settings-submit listeners of the
/// widget container `widget`. Controls missing from the markup are skipped.
pub fn bind_instance_handlers<P: Page + ?Sized>(page: &mut P, widget: &str) -> InstanceBindings {
    let keys = Control::ALL
        .into_iter()
        .filter_map(|control| page.listen(&Target::Control { widget: widget.to_owned(), control }))
        .collect();
    InstanceBindings { keys }
}

/// Push one availability change to the page: detach the old listener, swap
/// the class tokens, and attach a fresh listener when enabling.
pub(crate) fn apply_trigger_update<P: Page + ?Sized>(
    page: &mut P,
    availability: &mut AvailabilityTracker,
    update: TriggerUpdate,
) {
    if let Some(key) = update.detach {
        page.unlisten(key);
    }
    page.set_trigger_available(&update.element_id, update.available);
    if update.available {
        if let Some(key) = page.listen(&Target::Trigger(update.element_id.clone())) {
            availability.attach(&update.type_id, key);
        }
    }
}
