//! Add-trigger availability for widget types.
//!
//! DESIGN
//! ======
//! Availability is derived: a single-instance type is addable iff no instance
//! of it is placed and no add of it is in flight. The tracker keeps the last
//! applied state plus the listener attached to each trigger, and reports the
//! page changes needed to get from one to the other as [`TriggerUpdate`]s.
//! Updates that enable a trigger always carry the previous listener for
//! detaching first, so a trigger never ends up with two listeners.

#[cfg(test)]
#[path = "availability_test.rs"]
mod availability_test;

use std::collections::BTreeMap;

use super::ids::WidgetTypeId;
use super::layout::LayoutState;
use crate::dom::ListenerKey;

/// One add-panel trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddTrigger {
    pub element_id: String,
    /// Type permits several instances per page.
    pub multiple: bool,
    /// Last state applied to the page.
    pub available: bool,
    listener: Option<ListenerKey>,
    pending_adds: usize,
}

impl AddTrigger {
    #[must_use]
    pub fn listener(&self) -> Option<ListenerKey> {
        self.listener
    }

    #[must_use]
    pub fn pending_adds(&self) -> usize {
        self.pending_adds
    }
}

/// Page change for one trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerUpdate {
    pub type_id: WidgetTypeId,
    pub element_id: String,
    pub available: bool,
    /// Listener to remove before anything else.
    pub detach: Option<ListenerKey>,
}

#[derive(Clone, Debug, Default)]
pub struct AvailabilityTracker {
    triggers: BTreeMap<WidgetTypeId, AddTrigger>,
}

impl AvailabilityTracker {
    /// Register a trigger found on the page. No listener is attached yet.
    pub fn register(&mut self, type_id: WidgetTypeId, element_id: String, multiple: bool, available: bool) {
        self.triggers.insert(
            type_id,
            AddTrigger { element_id, multiple, available, listener: None, pending_adds: 0 },
        );
    }

    #[must_use]
    pub fn get(&self, type_id: &WidgetTypeId) -> Option<&AddTrigger> {
        self.triggers.get(type_id)
    }

    /// Unknown types have no trigger and are never addable.
    #[must_use]
    pub fn is_available(&self, type_id: &WidgetTypeId) -> bool {
        self.triggers.get(type_id).is_some_and(|t| t.available)
    }

    #[must_use]
    pub fn is_single_instance(&self, type_id: &WidgetTypeId) -> bool {
        self.triggers.get(type_id).is_some_and(|t| !t.multiple)
    }

    /// Detach a single-instance trigger. No-op for multi-instance types and
    /// for triggers already detached.
    pub fn mark_unavailable(&mut self, type_id: &WidgetTypeId) -> Option<TriggerUpdate> {
        let trigger = self.triggers.get_mut(type_id)?;
        if trigger.multiple || (!trigger.available && trigger.listener.is_none()) {
            return None;
        }
        trigger.available = false;
        Some(TriggerUpdate {
            type_id: type_id.clone(),
            element_id: trigger.element_id.clone(),
            available: false,
            detach: trigger.listener.take(),
        })
    }

    /// Re-enable a single-instance trigger. Calling it on an already
    /// available trigger still detaches the current listener so the caller's
    /// fresh attach leaves exactly one.
    pub fn mark_available(&mut self, type_id: &WidgetTypeId) -> Option<TriggerUpdate> {
        let trigger = self.triggers.get_mut(type_id)?;
        if trigger.multiple {
            return None;
        }
        trigger.available = true;
        Some(TriggerUpdate {
            type_id: type_id.clone(),
            element_id: trigger.element_id.clone(),
            available: true,
            detach: trigger.listener.take(),
        })
    }

    /// Record the listener attached after applying an enabling update.
    pub fn attach(&mut self, type_id: &WidgetTypeId, key: ListenerKey) {
        if let Some(trigger) = self.triggers.get_mut(type_id) {
            trigger.listener = Some(key);
        }
    }

    pub fn begin_add(&mut self, type_id: &WidgetTypeId) {
        if let Some(trigger) = self.triggers.get_mut(type_id) {
            trigger.pending_adds += 1;
        }
    }

    pub fn settle_add(&mut self, type_id: &WidgetTypeId) {
        if let Some(trigger) = self.triggers.get_mut(type_id) {
            trigger.pending_adds = trigger.pending_adds.saturating_sub(1);
        }
    }

    fn wanted(trigger: &AddTrigger, layout: &LayoutState, type_id: &WidgetTypeId) -> bool {
        trigger.multiple || (trigger.pending_adds == 0 && layout.count_of_type(type_id) == 0)
    }

    /// Bring one trigger in line with the layout. Returns `None` when the
    /// page already matches.
    pub fn refresh(&mut self, type_id: &WidgetTypeId, layout: &LayoutState) -> Option<TriggerUpdate> {
        let trigger = self.triggers.get(type_id)?;
        let wanted = Self::wanted(trigger, layout, type_id);
        if trigger.available == wanted && trigger.listener.is_some() == wanted {
            return None;
        }
        match (trigger.multiple, wanted) {
            (false, true) => self.mark_available(type_id),
            (false, false) => self.mark_unavailable(type_id),
            (true, _) => {
                let trigger = self.triggers.get_mut(type_id)?;
                trigger.available = wanted;
                Some(TriggerUpdate {
                    type_id: type_id.clone(),
                    element_id: trigger.element_id.clone(),
                    available: wanted,
                    detach: trigger.listener.take(),
                })
            }
        }
    }

    /// Recompute every trigger from the layout.
    pub fn reconcile(&mut self, layout: &LayoutState) -> Vec<TriggerUpdate> {
        let types: Vec<WidgetTypeId> = self.triggers.keys().cloned().collect();
        types.iter().filter_map(|t| self.refresh(t, layout)).collect()
    }
}
