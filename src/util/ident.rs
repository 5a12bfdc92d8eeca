//! Composite element identifier codec.
//!
//! DESIGN
//! ======
//! Every element the board touches is named `<ns>-widget-<kind>-<value>`.
//! Decoding takes the text after the first occurrence of the exact prefix,
//! scanning from the left, so an instance id that happens to contain another
//! prefix's text is still split at the right place. A missing prefix or an
//! empty suffix decodes to `None`; callers treat that as "not ours" and no-op.

#[cfg(test)]
#[path = "ident_test.rs"]
mod ident_test;

/// Namespace used by server-rendered markup when none is configured.
pub const DEFAULT_NAMESPACE: &str = "elgg";

/// Identifier families carried in element ids and class tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// Add-panel trigger id, value is the widget type.
    WidgetType,
    /// Widget container id, value is the instance id.
    Instance,
    /// Column container id, value is the column id.
    Column,
    /// Delete control id, value is the instance id.
    DeleteButton,
    /// Class token on the widget container, value is the widget type.
    InstanceType,
}

impl IdKind {
    fn marker(self) -> &'static str {
        match self {
            Self::WidgetType => "widget-type-",
            Self::Instance => "widget-",
            Self::Column => "widget-col-",
            Self::DeleteButton => "widget-delete-button-",
            Self::InstanceType => "widget-instance-",
        }
    }
}

/// Plain class tokens that carry state rather than identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassMarker {
    /// Column container.
    Columns,
    /// Widget container.
    Widget,
    /// Add trigger may be clicked.
    Available,
    /// Add trigger is detached.
    Unavailable,
    /// Widget type permits several instances.
    Multiple,
    /// Collapse control of a collapsed widget.
    Collapsed,
    /// Container of the add triggers.
    AddPanel,
    DeleteButton,
    EditButton,
    CollapseButton,
    /// Settings region holding the edit form.
    EditPanel,
    /// Region replaced by saved-settings markup.
    Content,
    /// Region hidden when the widget is collapsed.
    Body,
}

impl ClassMarker {
    fn marker(self) -> &'static str {
        match self {
            Self::Columns => "widgets",
            Self::Widget => "widget",
            Self::Available => "widget-available",
            Self::Unavailable => "widget-unavailable",
            Self::Multiple => "widget-multiple",
            Self::Collapsed => "widget-collapsed",
            Self::AddPanel => "widgets-add-panel",
            Self::DeleteButton => "widget-delete-button",
            Self::EditButton => "widget-edit-button",
            Self::CollapseButton => "widget-collapse-button",
            Self::EditPanel => "widget-edit",
            Self::Content => "widget-content",
            Self::Body => "widget-container",
        }
    }
}

/// Return the text after the first occurrence of `prefix` in `composite`.
pub fn decode<'a>(composite: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let start = composite.find(prefix)? + prefix.len();
    let value = &composite[start..];
    (!value.is_empty()).then_some(value)
}

/// Return the suffix of the first whitespace-separated token starting with `prefix`.
pub fn decode_token<'a>(class_list: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    class_list
        .split_whitespace()
        .find_map(|token| token.strip_prefix(prefix).filter(|value| !value.is_empty()))
}

/// Whether `class_list` contains `token` as a whole word.
pub fn has_token(class_list: &str, token: &str) -> bool {
    class_list.split_whitespace().any(|t| t == token)
}

/// Namespace-aware encoder/decoder for board identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdCodec {
    namespace: String,
}

impl Default for IdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl IdCodec {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    fn qualify(&self, marker: &str) -> String {
        if self.namespace.is_empty() {
            marker.to_owned()
        } else {
            format!("{}-{marker}", self.namespace)
        }
    }

    /// Full prefix for `kind`, e.g. `elgg-widget-col-`.
    #[must_use]
    pub fn prefix(&self, kind: IdKind) -> String {
        self.qualify(kind.marker())
    }

    /// Full class token for `marker`, e.g. `elgg-widget-available`.
    #[must_use]
    pub fn class(&self, marker: ClassMarker) -> String {
        self.qualify(marker.marker())
    }

    pub fn decode<'a>(&self, kind: IdKind, composite: &'a str) -> Option<&'a str> {
        decode(composite, &self.prefix(kind))
    }

    pub fn decode_token<'a>(&self, kind: IdKind, class_list: &'a str) -> Option<&'a str> {
        decode_token(class_list, &self.prefix(kind))
    }

    #[must_use]
    pub fn encode(&self, kind: IdKind, value: &str) -> String {
        format!("{}{value}", self.prefix(kind))
    }

    #[must_use]
    pub fn has_class(&self, class_list: &str, marker: ClassMarker) -> bool {
        has_token(class_list, &self.class(marker))
    }
}
