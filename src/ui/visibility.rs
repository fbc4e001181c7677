//! Shared show/hide state for interface surfaces.
//!
//! The end-meeting dialog and the payment footer each get one cell
//! with a single writer. Views read the current value or wait for the
//! next change; redundant writes do not wake waiters.

use tokio::sync::watch;

/// Writer side of one visibility flag.
#[derive(Debug)]
pub(crate) struct VisibilityCell {
    tx: watch::Sender<bool>,
}

impl VisibilityCell {
    pub(crate) fn new(visible: bool) -> Self {
        let (tx, _rx) = watch::channel(visible);
        Self { tx }
    }

    /// Update the flag. Waiters wake only when the value changes.
    pub(crate) fn set(&self, visible: bool) {
        self.tx.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
    }

    pub(crate) fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn view(&self) -> VisibilityView {
        VisibilityView {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader side of one visibility flag.
#[derive(Debug, Clone)]
pub(crate) struct VisibilityView {
    rx: watch::Receiver<bool>,
}

impl VisibilityView {
    pub(crate) fn get(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next change and return the new value, or `None`
    /// when the writer side has been dropped.
    pub(crate) async fn changed(&mut self) -> Option<bool> {
        match self.rx.changed().await {
            Ok(()) => Some(*self.rx.borrow_and_update()),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initial_value() {
        assert!(VisibilityCell::new(true).is_visible());
        assert!(!VisibilityCell::new(false).is_visible());
    }

    #[tokio::test]
    async fn test_view_observes_change() {
        let cell = VisibilityCell::new(false);
        let mut view = cell.view();

        cell.set(true);

        assert_eq!(view.changed().await, Some(true));
        assert!(view.get());
    }

    #[tokio::test]
    async fn test_redundant_set_does_not_wake() {
        let cell = VisibilityCell::new(false);
        let mut view = cell.view();

        cell.set(false);

        let woke = tokio::time::timeout(Duration::from_millis(20), view.changed()).await;
        assert!(woke.is_err());
    }

    #[tokio::test]
    async fn test_cells_are_independent() {
        let dialog = VisibilityCell::new(false);
        let footer = VisibilityCell::new(true);

        dialog.set(true);

        assert!(dialog.is_visible());
        assert!(footer.is_visible());

        footer.set(false);

        assert!(dialog.is_visible());
        assert!(!footer.is_visible());
    }

    #[tokio::test]
    async fn test_changed_none_after_writer_dropped() {
        let cell = VisibilityCell::new(false);
        let mut view = cell.view();
        drop(cell);

        assert_eq!(view.changed().await, None);
    }
}
