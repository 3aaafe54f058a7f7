//! Unwind ladder
//!
//! Each acquisition that must be undone if a later step fails pushes a rung
//! holding its release action. On failure the ladder is unwound, running
//! every rung in reverse order of acquisition; on success it is dismissed
//! and nothing runs.
//!
//! Rungs receive the service context at unwind time instead of capturing
//! it, so the steps in between keep full access to the services.

use alloc::boxed::Box;
use alloc::vec::Vec;

struct Rung<'a, C: ?Sized> {
    label: &'static str,
    undo: Box<dyn FnOnce(&mut C) + 'a>,
}

/// Stack of pending undo actions over a context `C`
pub struct UnwindLadder<'a, C: ?Sized> {
    rungs: Vec<Rung<'a, C>>,
}

impl<'a, C: ?Sized> UnwindLadder<'a, C> {
    /// Create an empty ladder
    pub fn new() -> Self {
        Self { rungs: Vec::new() }
    }

    /// Record how to undo the step that just succeeded
    pub fn push<F>(&mut self, label: &'static str, undo: F)
    where
        F: FnOnce(&mut C) + 'a,
    {
        log::trace!("unwind: armed '{}'", label);
        self.rungs.push(Rung {
            label,
            undo: Box::new(undo),
        });
    }

    /// Number of pending undo actions
    pub fn depth(&self) -> usize {
        self.rungs.len()
    }

    /// Labels of pending undo actions, most recent first
    pub fn pending(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rungs.iter().rev().map(|r| r.label)
    }

    /// Run every pending undo action, most recent first
    pub fn unwind(mut self, ctx: &mut C) {
        while let Some(rung) = self.rungs.pop() {
            log::debug!("unwind: {}", rung.label);
            (rung.undo)(ctx);
        }
    }

    /// Drop every pending undo action without running it
    pub fn dismiss(mut self) {
        self.rungs.clear();
    }
}

impl<C: ?Sized> Default for UnwindLadder<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Drop for UnwindLadder<'_, C> {
    fn drop(&mut self) {
        if !self.rungs.is_empty() {
            log::warn!(
                "unwind: ladder dropped with {} pending undo action(s)",
                self.rungs.len()
            );
        }
    }
}
