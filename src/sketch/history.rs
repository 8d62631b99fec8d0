use crate::sketch::model::Drawable;
use crate::sketch::surface::Surface;

/// Committed drawables plus the redo buffer. Both are strictly LIFO at the
/// tail; committing anything forecloses the redo path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryStore {
    committed: Vec<Drawable>,
    redo_buffer: Vec<Drawable>,
}

impl HistoryStore {
    pub fn commit(&mut self, drawable: impl Into<Drawable>) {
        let drawable = drawable.into();
        tracing::debug!(
            kind = ?drawable.kind(),
            discarded_redo = self.redo_buffer.len(),
            "commit drawable"
        );
        self.committed.push(drawable);
        self.redo_buffer.clear();
    }

    /// Returns `true` when a drawable moved to the redo buffer.
    pub fn undo(&mut self) -> bool {
        let Some(drawable) = self.committed.pop() else {
            return false;
        };
        self.redo_buffer.push(drawable);
        true
    }

    /// Returns `true` when a drawable moved back to the committed list.
    pub fn redo(&mut self) -> bool {
        let Some(drawable) = self.redo_buffer.pop() else {
            return false;
        };
        self.committed.push(drawable);
        true
    }

    pub fn clear(&mut self) {
        tracing::debug!(
            committed = self.committed.len(),
            redo = self.redo_buffer.len(),
            "clear history"
        );
        self.committed.clear();
        self.redo_buffer.clear();
    }

    pub fn committed(&self) -> &[Drawable] {
        &self.committed
    }

    pub fn redo_buffer(&self) -> &[Drawable] {
        &self.redo_buffer
    }

    pub fn undo_len(&self) -> usize {
        self.committed.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Displays every committed drawable in commit order.
    pub fn replay<S: Surface + ?Sized>(&self, surface: &mut S) {
        for drawable in &self.committed {
            drawable.display(surface);
        }
    }
}
