//! Widget board context: one per page.
//!
//! SYSTEM CONTEXT
//! ==============
//! `WidgetBoard` owns the page projection, the layout model, trigger
//! availability and the request ledger, and routes every [`BoardEvent`] to
//! its handler. It is a cheap `Rc` handle; transport completions keep only a
//! weak reference and do nothing once the board is gone.
//!
//! Handlers finish their page and model mutation and release the state
//! borrow before a request reaches the transport, so a completion never sees
//! a half-applied change.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

mod bindings;
mod handlers;
mod sync;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub use bindings::{InstanceBindings, bind_instance_handlers};

use crate::config::BoardConfig;
use crate::dom::{BoardEvent, Disposition, Page, ScannedWidget};
use crate::net::api::ActionTransport;
use crate::net::dispatch::{DispatchLedger, SyncFailure};
use crate::state::availability::AvailabilityTracker;
use crate::state::content::ContentTracker;
use crate::state::ids::{ColumnId, WidgetInstanceId, WidgetTypeId};
use crate::state::layout::{LayoutError, LayoutState, WidgetInstance};
use crate::util::equal_height::equalize_heights;
use crate::util::ident::{ClassMarker, IdCodec, IdKind};

/// Why a gesture was ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("{id:?} does not carry a {kind:?} identifier")]
    MalformedId { kind: IdKind, id: String },
    #[error("no placed widget for element {0}")]
    UnknownWidget(String),
    #[error("no add trigger for widget type {0}")]
    UnknownTrigger(WidgetTypeId),
    #[error("widget type {0} cannot be added again")]
    Unavailable(WidgetTypeId),
    #[error("element {0} is not on the page")]
    NotDisplayed(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

pub(crate) struct BoardInner<P> {
    page: P,
    config: BoardConfig,
    codec: IdCodec,
    layout: LayoutState,
    availability: AvailabilityTracker,
    content: ContentTracker,
    bindings: HashMap<WidgetInstanceId, InstanceBindings>,
    ledger: DispatchLedger,
}

impl<P: Page> BoardInner<P> {
    fn decode(&self, kind: IdKind, id: &str) -> Result<String, BoardError> {
        self.codec
            .decode(kind, id)
            .map(str::to_owned)
            .ok_or_else(|| BoardError::MalformedId { kind, id: id.to_owned() })
    }

    /// Instance id behind a widget container id, if that widget is placed.
    fn placed_instance(&self, widget: &str) -> Result<WidgetInstanceId, BoardError> {
        let instance_id = WidgetInstanceId::new(self.decode(IdKind::Instance, widget)?);
        if !self.layout.contains(&instance_id) {
            return Err(BoardError::UnknownWidget(widget.to_owned()));
        }
        Ok(instance_id)
    }

    fn widget_element(&self, instance_id: &WidgetInstanceId) -> String {
        self.codec.encode(IdKind::Instance, instance_id.as_str())
    }

    fn column_element(&self, column: &ColumnId) -> String {
        self.codec.encode(IdKind::Column, column.as_str())
    }

    fn instance_from_scan(&self, widget: &ScannedWidget) -> Result<WidgetInstance, BoardError> {
        let instance_id = self.decode(IdKind::Instance, &widget.element_id)?;
        let type_id = self
            .codec
            .decode_token(IdKind::InstanceType, &widget.class_list)
            .ok_or_else(|| BoardError::MalformedId { kind: IdKind::InstanceType, id: widget.class_list.clone() })?;
        let mut instance = WidgetInstance::new(instance_id.into(), type_id.into());
        instance.collapsed = widget.collapsed;
        Ok(instance)
    }

    /// Bind a placed widget's controls, replacing any earlier bindings.
    fn bind_instance(&mut self, instance_id: &WidgetInstanceId) {
        if let Some(previous) = self.bindings.remove(instance_id) {
            previous.dispose(&mut self.page);
        }
        let widget = self.widget_element(instance_id);
        let bindings = bind_instance_handlers(&mut self.page, &widget);
        self.bindings.insert(instance_id.clone(), bindings);
    }

    fn refresh_trigger(&mut self, type_id: &WidgetTypeId) {
        if let Some(update) = self.availability.refresh(type_id, &self.layout) {
            bindings::apply_trigger_update(&mut self.page, &mut self.availability, update);
        }
    }

    fn level_heights(&mut self) -> Option<f64> {
        let selector = self.config.column_selector();
        equalize_heights(&mut self.page, &selector)
    }

    fn after_layout_change(&mut self) {
        if self.config.relevel_on_change {
            self.level_heights();
        }
    }
}

/// Per-page widget board.
pub struct WidgetBoard<P: Page + 'static> {
    inner: Rc<RefCell<BoardInner<P>>>,
    transport: Rc<dyn ActionTransport>,
}

impl<P: Page + 'static> Clone for WidgetBoard<P> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner), transport: Rc::clone(&self.transport) }
    }
}

/// Non-owning board handle for page listeners, which live inside the board.
pub struct WeakBoard<P: Page + 'static> {
    inner: Weak<RefCell<BoardInner<P>>>,
    transport: Rc<dyn ActionTransport>,
}

impl<P: Page + 'static> WeakBoard<P> {
    #[must_use]
    pub fn upgrade(&self) -> Option<WidgetBoard<P>> {
        let inner = self.inner.upgrade()?;
        Some(WidgetBoard { inner, transport: Rc::clone(&self.transport) })
    }
}

impl<P: Page + 'static> WidgetBoard<P> {
    /// Build the board from what `page` currently shows, bind every trigger
    /// and widget, and level the columns once.
    ///
    /// Returns `None` without touching the page when it has no widget area.
    pub fn init(page: P, transport: Rc<dyn ActionTransport>, config: BoardConfig) -> Option<Self> {
        if !page.has_widget_area() {
            return None;
        }

        let codec = config.codec();
        let scan = page.scan();
        let mut columns = Vec::new();
        for column in &scan.columns {
            match codec.decode(IdKind::Column, &column.element_id) {
                Some(id) => columns.push((ColumnId::new(id), &column.widgets)),
                None => leptos::logging::warn!("skipping column {}", column.element_id),
            }
        }

        let mut inner = BoardInner {
            page,
            config,
            codec,
            layout: LayoutState::new(columns.iter().map(|(id, _)| id.clone())),
            availability: AvailabilityTracker::default(),
            content: ContentTracker::default(),
            bindings: HashMap::new(),
            ledger: DispatchLedger::default(),
        };

        for (column_id, widgets) in &columns {
            for widget in widgets.iter() {
                let placed = inner
                    .instance_from_scan(widget)
                    .and_then(|instance| inner.layout.append(column_id, instance).map_err(BoardError::from));
                if let Err(e) = placed {
                    leptos::logging::warn!("skipping widget {}: {e}", widget.element_id);
                }
            }
        }

        for trigger in &scan.triggers {
            let Some(type_id) = inner.codec.decode(IdKind::WidgetType, &trigger.element_id) else {
                leptos::logging::warn!("skipping add trigger {}", trigger.element_id);
                continue;
            };
            let multiple = inner.codec.has_class(&trigger.class_list, ClassMarker::Multiple);
            let available = inner.codec.has_class(&trigger.class_list, ClassMarker::Available);
            inner
                .availability
                .register(type_id.into(), trigger.element_id.clone(), multiple, available);
        }

        for update in inner.availability.reconcile(&inner.layout) {
            bindings::apply_trigger_update(&mut inner.page, &mut inner.availability, update);
        }
        let placed: Vec<WidgetInstanceId> = inner.layout.instances().map(|w| w.instance_id.clone()).collect();
        for instance_id in &placed {
            inner.bind_instance(instance_id);
        }
        inner.level_heights();

        leptos::logging::log!(
            "widget board ready: {} columns, {} widgets",
            inner.layout.columns().len(),
            placed.len()
        );
        Some(Self { inner: Rc::new(RefCell::new(inner)), transport })
    }

    /// Route a gesture to its handler. Rejected gestures are logged and
    /// dropped; nothing is dispatched for them.
    pub fn handle(&self, event: BoardEvent) -> Disposition {
        let disposition = match event {
            BoardEvent::DragStopped { .. } => Disposition::PASS,
            _ => Disposition::PREVENT,
        };
        let result = match event {
            BoardEvent::AddClicked { trigger } => self.on_add_clicked(&trigger),
            BoardEvent::DeleteClicked { widget, button } => self.on_delete_clicked(&widget, &button),
            BoardEvent::EditToggled { widget } => self.on_edit_toggled(&widget),
            BoardEvent::CollapseToggled { widget } => self.on_collapse_toggled(&widget),
            BoardEvent::SettingsSubmitted { widget, fields } => self.on_settings_submitted(&widget, fields),
            BoardEvent::DragStopped { widget } => self.on_drag_stopped(&widget),
        };
        if let Err(e) = result {
            leptos::logging::warn!("widget gesture ignored: {e}");
        }
        disposition
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakBoard<P> {
        WeakBoard { inner: Rc::downgrade(&self.inner), transport: Rc::clone(&self.transport) }
    }

    /// Re-run equal-height leveling; returns the height applied.
    pub fn level_heights(&self) -> Option<f64> {
        self.inner.borrow_mut().level_heights()
    }

    #[must_use]
    pub fn layout(&self) -> LayoutState {
        self.inner.borrow().layout.clone()
    }

    #[must_use]
    pub fn instance(&self, instance_id: &WidgetInstanceId) -> Option<WidgetInstance> {
        self.inner.borrow().layout.get(instance_id).cloned()
    }

    #[must_use]
    pub fn is_available(&self, type_id: &WidgetTypeId) -> bool {
        self.inner.borrow().availability.is_available(type_id)
    }

    #[must_use]
    pub fn config(&self) -> BoardConfig {
        self.inner.borrow().config.clone()
    }

    /// Listeners currently attached to a widget's controls.
    #[must_use]
    pub fn bound_controls(&self, instance_id: &WidgetInstanceId) -> usize {
        self.inner.borrow().bindings.get(instance_id).map_or(0, InstanceBindings::len)
    }

    /// Requests that failed and have not been retried.
    #[must_use]
    pub fn failures(&self) -> Vec<SyncFailure> {
        self.inner.borrow().ledger.failures().to_vec()
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.borrow().ledger.in_flight_count()
    }
}
