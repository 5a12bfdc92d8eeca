//! Column layout model for placed widgets.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page is the authority on widget order; this model mirrors it so
//! handlers can answer "which column, which position, how many of this type"
//! without walking the DOM. Every mutation renumbers the columns it touches,
//! so positions inside a column are always `0..len` with no gaps.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use super::ids::{ColumnId, WidgetInstanceId, WidgetTypeId};

/// One placed widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetInstance {
    pub instance_id: WidgetInstanceId,
    pub type_id: WidgetTypeId,
    /// Column the widget currently lives in.
    pub column: ColumnId,
    /// Zero-based index within `column`.
    pub position: usize,
    /// Body hidden via the collapse control.
    pub collapsed: bool,
    /// Settings region revealed via the edit control.
    pub edit_open: bool,
}

impl WidgetInstance {
    /// A freshly placed widget: expanded, settings closed. Column and position
    /// are assigned when it is inserted.
    pub fn new(instance_id: WidgetInstanceId, type_id: WidgetTypeId) -> Self {
        Self {
            instance_id,
            type_id,
            column: ColumnId::new(""),
            position: 0,
            collapsed: false,
            edit_open: false,
        }
    }
}

/// An ordered column of widgets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    instances: Vec<WidgetInstance>,
}

impl Column {
    fn new(id: ColumnId) -> Self {
        Self { id, instances: Vec::new() }
    }

    #[must_use]
    pub fn instances(&self) -> &[WidgetInstance] {
        &self.instances
    }

    fn index_of(&self, instance_id: &WidgetInstanceId) -> Option<usize> {
        self.instances.iter().position(|w| &w.instance_id == instance_id)
    }

    fn renumber(&mut self) {
        for (position, widget) in self.instances.iter_mut().enumerate() {
            widget.position = position;
            widget.column = self.id.clone();
        }
    }
}

/// Where a moved widget came from and where it landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub from_column: ColumnId,
    pub from_position: usize,
    pub to_column: ColumnId,
    pub to_position: usize,
}

impl Placement {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from_column == self.to_column && self.from_position == self.to_position
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown column: {0}")]
    UnknownColumn(ColumnId),
    #[error("unknown widget instance: {0}")]
    UnknownInstance(WidgetInstanceId),
    #[error("widget instance already placed: {0}")]
    DuplicateInstance(WidgetInstanceId),
}

/// All columns of one board, in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutState {
    columns: Vec<Column>,
}

impl LayoutState {
    pub fn new(column_ids: impl IntoIterator<Item = ColumnId>) -> Self {
        let mut layout = Self::default();
        for id in column_ids {
            layout.add_column(id);
        }
        layout
    }

    /// Register a column; existing columns are left untouched.
    pub fn add_column(&mut self, id: ColumnId) {
        if self.column(&id).is_none() {
            self.columns.push(Column::new(id));
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    fn column_mut(&mut self, id: &ColumnId) -> Result<&mut Column, LayoutError> {
        self.columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| LayoutError::UnknownColumn(id.clone()))
    }

    fn locate(&self, instance_id: &WidgetInstanceId) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, column)| column.index_of(instance_id).map(|wi| (ci, wi)))
    }

    #[must_use]
    pub fn get(&self, instance_id: &WidgetInstanceId) -> Option<&WidgetInstance> {
        let (ci, wi) = self.locate(instance_id)?;
        Some(&self.columns[ci].instances[wi])
    }

    pub fn get_mut(&mut self, instance_id: &WidgetInstanceId) -> Option<&mut WidgetInstance> {
        let (ci, wi) = self.locate(instance_id)?;
        Some(&mut self.columns[ci].instances[wi])
    }

    #[must_use]
    pub fn contains(&self, instance_id: &WidgetInstanceId) -> bool {
        self.locate(instance_id).is_some()
    }

    #[must_use]
    pub fn column_of(&self, instance_id: &WidgetInstanceId) -> Option<&ColumnId> {
        self.get(instance_id).map(|w| &w.column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.instances.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of placed widgets of `type_id` across all columns.
    #[must_use]
    pub fn count_of_type(&self, type_id: &WidgetTypeId) -> usize {
        self.instances().filter(|w| &w.type_id == type_id).count()
    }

    pub fn instances(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.columns.iter().flat_map(|c| c.instances.iter())
    }

    /// Append during the initial page scan, preserving document order.
    ///
    /// # Errors
    ///
    /// Fails if the column is unknown or the instance is already placed.
    pub fn append(&mut self, column: &ColumnId, instance: WidgetInstance) -> Result<(), LayoutError> {
        if self.contains(&instance.instance_id) {
            return Err(LayoutError::DuplicateInstance(instance.instance_id));
        }
        let col = self.column_mut(column)?;
        col.instances.push(instance);
        col.renumber();
        Ok(())
    }

    /// Place a new widget at position 0 of `column`, shifting the rest down.
    ///
    /// # Errors
    ///
    /// Fails if the column is unknown or the instance is already placed.
    pub fn insert_at_front(&mut self, column: &ColumnId, instance: WidgetInstance) -> Result<(), LayoutError> {
        if self.contains(&instance.instance_id) {
            return Err(LayoutError::DuplicateInstance(instance.instance_id));
        }
        let col = self.column_mut(column)?;
        col.instances.insert(0, instance);
        col.renumber();
        Ok(())
    }

    /// Move a widget to `position` in `column`. Positions past the end land
    /// at the end. Source and destination columns are both renumbered.
    ///
    /// # Errors
    ///
    /// Fails if the widget or the destination column is unknown.
    pub fn reorder(
        &mut self,
        instance_id: &WidgetInstanceId,
        column: &ColumnId,
        position: usize,
    ) -> Result<Placement, LayoutError> {
        let dest = self
            .columns
            .iter()
            .position(|c| &c.id == column)
            .ok_or_else(|| LayoutError::UnknownColumn(column.clone()))?;
        let (ci, wi) = self
            .locate(instance_id)
            .ok_or_else(|| LayoutError::UnknownInstance(instance_id.clone()))?;

        let from_column = self.columns[ci].id.clone();
        let widget = self.columns[ci].instances.remove(wi);
        self.columns[ci].renumber();

        let dest_col = &mut self.columns[dest];
        let to_position = position.min(dest_col.instances.len());
        dest_col.instances.insert(to_position, widget);
        dest_col.renumber();

        Ok(Placement {
            from_column,
            from_position: wi,
            to_column: column.clone(),
            to_position,
        })
    }

    /// Drop a widget and recompact its former column.
    pub fn remove(&mut self, instance_id: &WidgetInstanceId) -> Option<WidgetInstance> {
        let (ci, wi) = self.locate(instance_id)?;
        let widget = self.columns[ci].instances.remove(wi);
        self.columns[ci].renumber();
        Some(widget)
    }

    /// Rebuild `column` from the order shown on the page.
    ///
    /// Ids listed in `order` are pulled into the column (from wherever the
    /// model had them) in that order; unknown ids are skipped. Widgets the
    /// model had in this column but the page no longer lists keep their
    /// relative order at the end until their own column is resynced.
    ///
    /// # Errors
    ///
    /// Fails if the column is unknown.
    pub fn resync_column(&mut self, column: &ColumnId, order: &[WidgetInstanceId]) -> Result<(), LayoutError> {
        let dest = self
            .columns
            .iter()
            .position(|c| &c.id == column)
            .ok_or_else(|| LayoutError::UnknownColumn(column.clone()))?;

        let mut touched = vec![dest];
        let mut rebuilt = Vec::with_capacity(order.len());
        for id in order {
            if let Some((ci, wi)) = self.locate(id) {
                rebuilt.push(self.columns[ci].instances.remove(wi));
                if !touched.contains(&ci) {
                    touched.push(ci);
                }
            }
        }
        let leftovers = std::mem::take(&mut self.columns[dest].instances);
        rebuilt.extend(leftovers);
        self.columns[dest].instances = rebuilt;

        for ci in touched {
            self.columns[ci].renumber();
        }
        Ok(())
    }

    /// True when every column's positions run `0..len` and each widget
    /// records the column it sits in.
    #[must_use]
    pub fn is_compact(&self) -> bool {
        self.columns.iter().all(|c| {
            c.instances
                .iter()
                .enumerate()
                .all(|(i, w)| w.position == i && w.column == c.id)
        })
    }

    /// Column ids with their widget ids in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ColumnId, Vec<WidgetInstanceId>)> {
        self.columns
            .iter()
            .map(|c| (c.id.clone(), c.instances.iter().map(|w| w.instance_id.clone()).collect()))
            .collect()
    }
}
