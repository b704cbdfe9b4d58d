//! Rendering-handle contract.
//!
//! The crate never draws pixels; it hands [`ChartData`] to a caller-supplied
//! [`RenderTarget`]. The one ordering guarantee imposed on callers is
//! encapsulated in [`ChartSlot`]: a visual slot holds at most one live
//! target, and the previous target is disposed before a replacement is
//! installed, so backend resources never leak. Rendering with no target
//! installed is a no-op, not an error.

use crate::chart::{ChartData, SeriesStyle};

/// Error surfaced by a rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The backend rejected or failed the draw call.
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// A caller-supplied rendering handle (e.g. one chart instance).
pub trait RenderTarget {
    /// Draw (or redraw) the chart on this target.
    fn draw(&mut self, data: &ChartData, style: &SeriesStyle) -> Result<(), RenderError>;

    /// Release backend resources. Called exactly once, before the target is
    /// replaced or dropped from its slot.
    fn dispose(&mut self);
}

/// One visual slot on the dashboard, owning at most one live target.
#[derive(Default)]
pub struct ChartSlot {
    target: Option<Box<dyn RenderTarget>>,
}

impl std::fmt::Debug for ChartSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSlot")
            .field("occupied", &self.target.is_some())
            .finish()
    }
}

impl ChartSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a target is currently installed.
    pub fn is_occupied(&self) -> bool {
        self.target.is_some()
    }

    /// Install a target, disposing the previous one first.
    pub fn install(&mut self, target: Box<dyn RenderTarget>) {
        if let Some(mut old) = self.target.take() {
            old.dispose();
        }
        self.target = Some(target);
    }

    /// Dispose and remove the current target, if any.
    pub fn clear(&mut self) {
        if let Some(mut old) = self.target.take() {
            old.dispose();
        }
    }

    /// Render onto the installed target.
    ///
    /// Returns `Ok(false)` without touching anything when no target is
    /// installed, `Ok(true)` after a successful draw.
    pub fn render(
        &mut self,
        data: &ChartData,
        style: &SeriesStyle,
    ) -> Result<bool, RenderError> {
        match self.target.as_mut() {
            None => Ok(false),
            Some(target) => target.draw(data, style).map(|()| true),
        }
    }
}

impl Drop for ChartSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ProbeTarget {
        draws: Arc<AtomicUsize>,
        disposals: Arc<AtomicUsize>,
    }

    impl RenderTarget for ProbeTarget {
        fn draw(&mut self, _data: &ChartData, _style: &SeriesStyle) -> Result<(), RenderError> {
            let _ = self.draws.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn dispose(&mut self) {
            let _ = self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn probe(
        draws: &Arc<AtomicUsize>,
        disposals: &Arc<AtomicUsize>,
    ) -> Box<dyn RenderTarget> {
        Box::new(ProbeTarget {
            draws: Arc::clone(draws),
            disposals: Arc::clone(disposals),
        })
    }

    #[test]
    fn test_render_without_target_is_noop() {
        let mut slot = ChartSlot::new();
        let rendered = slot
            .render(&ChartData::default(), &SeriesStyle::default())
            .expect("no-op never fails");
        assert!(!rendered);
    }

    #[test]
    fn test_install_disposes_previous_target() {
        let draws = Arc::new(AtomicUsize::new(0));
        let disposals = Arc::new(AtomicUsize::new(0));
        let mut slot = ChartSlot::new();

        slot.install(probe(&draws, &disposals));
        assert_eq!(disposals.load(Ordering::SeqCst), 0);

        slot.install(probe(&draws, &disposals));
        assert_eq!(
            disposals.load(Ordering::SeqCst),
            1,
            "old target disposed before replacement"
        );

        let rendered = slot
            .render(&ChartData::default(), &SeriesStyle::default())
            .expect("draw succeeds");
        assert!(rendered);
        assert_eq!(draws.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_disposes_installed_target() {
        let draws = Arc::new(AtomicUsize::new(0));
        let disposals = Arc::new(AtomicUsize::new(0));
        {
            let mut slot = ChartSlot::new();
            slot.install(probe(&draws, &disposals));
        }
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }
}
