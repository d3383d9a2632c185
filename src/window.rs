//! Narration windows and the per-node range filter.
//!
//! A window restricts narration to part of a file: everything, one named
//! function, or an inclusive span of lines. The filter answers, for each
//! syntax node, whether its opening token, closing token, or any part of it
//! falls inside the window.

use crate::ast::Span;
use crate::source::SourceMap;

/// What part of the file to narrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Window {
    /// The whole file.
    All,
    /// Only the body of the named function (including nested literals).
    Function(String),
    /// Only nodes touching lines `start..=end`, 1-based.
    Lines(u32, u32),
}

impl Window {
    /// True when the window excludes anything.
    pub fn restrictive(&self) -> bool {
        !matches!(self, Window::All)
    }
}

/// Per-pass filter pairing a [`Window`] with the line table and the stack of
/// enclosing function names.
pub struct RangeFilter<'a> {
    window: Window,
    map: &'a SourceMap,
    stack: Vec<String>,
}

impl<'a> RangeFilter<'a> {
    pub fn new(window: Window, map: &'a SourceMap) -> Self {
        RangeFilter {
            window,
            map,
            stack: Vec::new(),
        }
    }

    pub fn restrictive(&self) -> bool {
        self.window.restrictive()
    }

    pub fn enter_function(&mut self, name: &str) {
        self.stack.push(name.to_string());
    }

    pub fn leave_function(&mut self) {
        self.stack.pop();
    }

    fn in_target_function(&self, name: &str) -> bool {
        self.stack.iter().any(|f| f == name)
    }

    fn line_in(&self, line: u32, start: u32, end: u32) -> bool {
        line >= start && line <= end
    }

    /// Opening token of the node falls inside the window.
    pub fn start_in(&self, span: Span) -> bool {
        match &self.window {
            Window::All => true,
            Window::Function(name) => self.in_target_function(name),
            Window::Lines(s, e) => self.line_in(self.map.line_of(span.start), *s, *e),
        }
    }

    /// Closing token of the node falls inside the window.
    pub fn end_in(&self, span: Span) -> bool {
        match &self.window {
            Window::All => true,
            Window::Function(name) => self.in_target_function(name),
            Window::Lines(s, e) => self.line_in(self.map.line_of(span.end), *s, *e),
        }
    }

    /// Either boundary of the node falls inside the window. Used for atomic
    /// nodes spoken as a single phrase.
    pub fn contains(&self, span: Span) -> bool {
        self.start_in(span) || self.end_in(span)
    }

    /// A single position falls inside the window.
    pub fn pos_in(&self, offset: u32) -> bool {
        match &self.window {
            Window::All => true,
            Window::Function(name) => self.in_target_function(name),
            Window::Lines(s, e) => self.line_in(self.map.line_of(offset), *s, *e),
        }
    }
}
