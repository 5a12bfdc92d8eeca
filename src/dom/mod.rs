//! Page projection seam between the board and the displayed markup.
//!
//! SYSTEM CONTEXT
//! ==============
//! `WidgetBoard` never touches `web_sys` directly. It reads and mutates the
//! page through [`Page`], which has a browser implementation (`web`, hydrate
//! only) and an in-memory one (`memory`) used by tests and non-browser hosts.
//!
//! Listeners are data here: the board asks the page to `listen` on a
//! [`Target`], gets a [`ListenerKey`] back, and later `unlisten`s it. When a
//! bound control fires, the page turns it into a [`BoardEvent`] and hands it
//! to the board's event router.

pub mod memory;
#[cfg(feature = "hydrate")]
pub mod web;

/// Handle for one attached listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(pub u64);

/// Controls inside one widget container that carry listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    DeleteButton,
    EditButton,
    CollapseButton,
    SettingsForm,
}

impl Control {
    pub const ALL: [Self; 4] = [Self::DeleteButton, Self::EditButton, Self::CollapseButton, Self::SettingsForm];
}

/// Something a listener can be attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// Add-panel trigger, by element id.
    Trigger(String),
    /// A control within the widget container with element id `widget`.
    Control { widget: String, control: Control },
}

/// A user gesture routed to the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    AddClicked { trigger: String },
    DeleteClicked { widget: String, button: String },
    EditToggled { widget: String },
    CollapseToggled { widget: String },
    SettingsSubmitted { widget: String, fields: Vec<(String, String)> },
    /// Raised by the drag-and-drop collaborator once the item is dropped.
    DragStopped { widget: String },
}

/// What the page should do with the originating DOM event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Disposition {
    pub prevent_default: bool,
}

impl Disposition {
    pub const PREVENT: Self = Self { prevent_default: true };
    pub const PASS: Self = Self { prevent_default: false };
}

/// One widget container as found on the page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScannedWidget {
    pub element_id: String,
    pub class_list: String,
    /// Collapse control carries the collapsed marker.
    pub collapsed: bool,
}

/// One column container and its widgets in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScannedColumn {
    pub element_id: String,
    pub widgets: Vec<ScannedWidget>,
}

/// One add-panel trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScannedTrigger {
    pub element_id: String,
    pub class_list: String,
}

/// Everything the board reads from the page at init.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageScan {
    pub columns: Vec<ScannedColumn>,
    pub triggers: Vec<ScannedTrigger>,
}

/// Read/write access to the displayed board.
///
/// Element addressing is by id: triggers and columns by their own id,
/// widget parts by the id of the enclosing widget container.
pub trait Page {
    /// Whether the page has any column container at all.
    fn has_widget_area(&self) -> bool;

    fn scan(&self) -> PageScan;

    /// Value of the hidden `widget_context` input.
    fn context_value(&self) -> Option<String>;

    fn listen(&mut self, target: &Target) -> Option<ListenerKey>;

    fn unlisten(&mut self, key: ListenerKey);

    /// Swap the trigger's available/unavailable class tokens.
    fn set_trigger_available(&mut self, trigger: &str, available: bool);

    /// Insert `html` as the first child of `column` and describe the widget
    /// container it produced.
    fn prepend_fragment(&mut self, column: &str, html: &str) -> Option<ScannedWidget>;

    /// Remove the widget container. Returns false if it was not on the page.
    fn remove_widget(&mut self, widget: &str) -> bool;

    fn content_html(&self, widget: &str) -> Option<String>;

    fn set_content_html(&mut self, widget: &str, html: &str);

    /// Animated reveal/hide of the settings region.
    fn slide_settings(&mut self, widget: &str, visible: bool);

    /// Animated reveal/hide of the body container.
    fn slide_body(&mut self, widget: &str, visible: bool);

    /// Put or clear the collapsed marker on the collapse control.
    fn set_collapse_marker(&mut self, widget: &str, collapsed: bool);

    /// Column element id and index of the widget as currently displayed.
    fn drop_position(&self, widget: &str) -> Option<(String, usize)>;

    /// Widget element ids of `column` in display order.
    fn column_order(&self, column: &str) -> Vec<String>;

    /// Clear the `top`/`left` offsets the drag helper leaves behind.
    fn reset_drag_offset(&mut self, widget: &str);

    /// Rendered height of every column container matched by `selector`.
    fn column_heights(&self, selector: &str) -> Vec<(String, f64)>;

    fn set_min_height(&mut self, column: &str, px: f64);
}
