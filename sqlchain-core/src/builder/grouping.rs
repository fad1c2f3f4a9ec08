//! WHERE clause buffer with nested AND/OR grouping

use crate::operator::Conjunction;

/// One level of parenthesized nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    mode: Conjunction,
    /// Buffer length before the group's conjunction and `" ("` were written
    mark: usize,
    /// Buffer length right after `" ("`
    open: usize,
}

/// The WHERE text together with its stack of grouping frames.
///
/// The bottom frame is an `AND` frame that is never popped. A conjunction
/// is written in front of a predicate or group iff the buffer is non-empty
/// and does not end with an open parenthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    text: String,
    frames: Vec<Frame>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            frames: vec![Frame {
                mode: Conjunction::And,
                mark: 0,
                open: 0,
            }],
        }
    }

    /// Mode of the innermost open frame
    pub fn mode(&self) -> Conjunction {
        self.frames
            .last()
            .map(|frame| frame.mode)
            .unwrap_or_default()
    }

    /// Number of open groups above the base frame
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Append `" <predicate> "`, preceded by the current conjunction if needed
    pub fn push_predicate(&mut self, predicate: &str) {
        self.conjoin();
        self.text.push(' ');
        self.text.push_str(predicate);
        self.text.push(' ');
    }

    /// Open a parenthesized group whose members are joined by `mode`
    pub fn start(&mut self, mode: Conjunction) {
        let mark = self.text.len();
        self.conjoin();
        self.text.push_str(" (");
        self.frames.push(Frame {
            mode,
            mark,
            open: self.text.len(),
        });
    }

    /// Close the innermost group. An empty group is erased together with the
    /// conjunction written for it. Returns `false` if only the base frame is
    /// left, in which case nothing changes.
    pub fn end(&mut self) -> bool {
        if self.frames.len() == 1 {
            return false;
        }
        let Some(frame) = self.frames.pop() else {
            return false;
        };

        if self.text.len() == frame.open {
            self.text.truncate(frame.mark);
        } else {
            let trimmed = self.text.trim_end().len();
            self.text.truncate(trimmed);
            self.text.push(')');
        }
        true
    }

    /// Close every group above the base frame; returns how many were open
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        while self.end() {
            closed += 1;
        }
        closed
    }

    fn conjoin(&mut self) {
        if self.text.is_empty() || self.text.ends_with('(') {
            return;
        }
        if !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str("\n ");
        self.text.push_str(self.mode().as_str());
    }
}

impl Default for WhereClause {
    fn default() -> Self {
        Self::new()
    }
}
