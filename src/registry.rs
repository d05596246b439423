//! Ordered, de-duplicated selection of input images
//!
//! Every mutation refreshes the attached [`PreviewSurface`], including
//! removals of paths that were never selected.

use std::path::{Path, PathBuf};

/// Something that displays the current selection
pub trait PreviewSurface {
    /// Re-render from the full, ordered selection
    fn refresh(&mut self, paths: &[PathBuf]);
}

/// Preview surface that renders nothing
#[derive(Debug, Default)]
pub struct NoPreview;

impl PreviewSurface for NoPreview {
    fn refresh(&mut self, _paths: &[PathBuf]) {}
}

/// Mutations of the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Files picked by the user, in pick order
    Add(Vec<PathBuf>),
    /// Remove one file
    Remove(PathBuf),
    /// Drop the whole selection
    Clear,
}

/// The image selection registry
pub struct SelectionRegistry<S: PreviewSurface = NoPreview> {
    paths: Vec<PathBuf>,
    surface: S,
}

impl Default for SelectionRegistry<NoPreview> {
    fn default() -> Self {
        Self::new(NoPreview)
    }
}

impl<S: PreviewSurface> SelectionRegistry<S> {
    pub fn new(surface: S) -> Self {
        Self {
            paths: Vec::new(),
            surface,
        }
    }

    /// Apply a selection event
    pub fn update(&mut self, event: SelectionEvent) {
        match event {
            SelectionEvent::Add(paths) => self.add(paths),
            SelectionEvent::Remove(path) => self.remove(&path),
            SelectionEvent::Clear => self.clear(),
        }
    }

    /// Append every path not already selected, keeping first-seen order
    pub fn add<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            let path = path.into();
            if self.contains(&path) {
                log::debug!("Already selected: {}", path.display());
            } else {
                self.paths.push(path);
            }
        }
        self.refresh();
    }

    /// Remove a path; unknown paths are ignored
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
        self.refresh();
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.refresh();
    }

    /// Current selection in insertion order
    #[must_use]
    pub fn list(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn refresh(&mut self) {
        self.surface.refresh(&self.paths);
    }
}
