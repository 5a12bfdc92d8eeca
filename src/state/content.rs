//! Last confirmed content of widgets with settings saves in flight.
//!
//! While a save is outstanding the content region shows the loading
//! placeholder, so the page itself cannot say what to put back. The tracker
//! remembers the content the server last confirmed and only hands it back
//! once no other save for the widget is still pending.

#[cfg(test)]
#[path = "content_test.rs"]
mod content_test;

use std::collections::HashMap;

use super::ids::WidgetInstanceId;

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingSave {
    confirmed: String,
    in_flight: usize,
}

#[derive(Debug, Default)]
pub struct ContentTracker {
    pending: HashMap<WidgetInstanceId, PendingSave>,
}

impl ContentTracker {
    /// A save is starting. `shown` is what the page displays right now and is
    /// only kept when no earlier save is pending, since otherwise it is the
    /// placeholder.
    pub fn begin(&mut self, instance: &WidgetInstanceId, shown: String) {
        self.pending
            .entry(instance.clone())
            .or_insert(PendingSave { confirmed: shown, in_flight: 0 })
            .in_flight += 1;
    }

    /// A save succeeded with `html`.
    pub fn confirm(&mut self, instance: &WidgetInstanceId, html: &str) {
        let Some(save) = self.pending.get_mut(instance) else {
            return;
        };
        save.confirmed = html.to_owned();
        self.finish(instance);
    }

    /// A save failed. Returns the content to restore, or `None` while another
    /// save for the widget is still in flight.
    pub fn fail(&mut self, instance: &WidgetInstanceId) -> Option<String> {
        let confirmed = self.pending.get(instance)?.confirmed.clone();
        self.finish(instance).then_some(confirmed)
    }

    /// The widget left the board.
    pub fn forget(&mut self, instance: &WidgetInstanceId) {
        self.pending.remove(instance);
    }

    #[must_use]
    pub fn is_pending(&self, instance: &WidgetInstanceId) -> bool {
        self.pending.contains_key(instance)
    }

    /// Count one save down. Returns true when it was the last one.
    fn finish(&mut self, instance: &WidgetInstanceId) -> bool {
        let Some(save) = self.pending.get_mut(instance) else {
            return false;
        };
        save.in_flight = save.in_flight.saturating_sub(1);
        if save.in_flight > 0 {
            return false;
        }
        self.pending.remove(instance);
        true
    }
}
