//! Slide navigation: the current index, wraparound arithmetic, and the render
//! step that keeps slide and thumbnail "active" markers in lockstep.

use crate::model::Slide;
use log::{debug, trace};

/// A generated navigation control, one per slide.
#[derive(Clone, Debug, PartialEq)]
pub struct Thumbnail {
    pub index: usize,
    pub label: String,
    pub is_active: bool,
}

/// Label shown on the thumbnail for slide `index` (0-based).
pub fn thumbnail_label(index: usize, slide: &Slide) -> String {
    let position = index + 1;
    match slide.primary_heading() {
        Some(heading) => format!("{}. {}", position, heading),
        None => format!("{}. Slide {}", position, position),
    }
}

/// Builds the fixed thumbnail row for a deck. All thumbnails start inactive.
pub fn build_thumbnails(slides: &[Slide]) -> Vec<Thumbnail> {
    slides
        .iter()
        .enumerate()
        .map(|(index, slide)| Thumbnail { index, label: thumbnail_label(index, slide), is_active: false })
        .collect()
}

/// Maps any integer onto `[0, len)`. `len` must be non-zero.
pub fn normalize_index(index: i64, len: usize) -> usize {
    let n = len as i64;
    (((index % n) + n) % n) as usize
}

/// Current-slide bookkeeping for a deck of fixed size.
#[derive(Debug)]
pub struct NavigationState {
    current: usize,
    slide_active: Vec<bool>,
    thumbnails: Vec<Thumbnail>,
}

impl NavigationState {
    /// Creates navigation over `slides` with slide 0 current.
    ///
    /// Returns `None` for an empty slide list.
    pub fn new(slides: &[Slide]) -> Option<Self> {
        if slides.is_empty() {
            return None;
        }
        let mut state = Self {
            current: 0,
            slide_active: vec![false; slides.len()],
            thumbnails: build_thumbnails(slides),
        };
        state.render();
        Some(state)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.slide_active.len()
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    pub fn is_slide_active(&self, index: usize) -> bool {
        self.slide_active.get(index).copied().unwrap_or(false)
    }

    /// Makes `index` (normalized modulo the slide count) the current slide.
    pub fn go_to(&mut self, index: i64) {
        let target = normalize_index(index, self.len());
        if target != self.current {
            debug!("Navigating from slide {} to {} (requested {}).", self.current, target, index);
        }
        self.current = target;
        self.render();
    }

    pub fn next(&mut self) {
        self.go_to(self.current as i64 + 1);
    }

    pub fn previous(&mut self) {
        self.go_to(self.current as i64 - 1);
    }

    fn render(&mut self) {
        self.slide_active.iter_mut().for_each(|a| *a = false);
        self.thumbnails.iter_mut().for_each(|t| t.is_active = false);
        self.slide_active[self.current] = true;
        self.thumbnails[self.current].is_active = true;
        trace!("Rendered active marker on slide {}.", self.current);
    }
}
