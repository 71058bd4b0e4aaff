//! Writing changes back to the source text
//!
//! An element tree that was built with origin knows where its heads and
//! tails live in the source. [`Element::edits`] compares the tree with the
//! tokens of the unchanged source and computes the patches that turn the
//! source into the tree's output; [`Element::edit`] applies them to a
//! [`TextBuffer`].

use crate::error::{DomError, Result};
use crate::range::Range;
use crate::token::Token;

use super::element::{Element, ElementData};
use super::points::SpacedPoint;
use super::whitespace::collapse_whitespace;

/// Replace the text in `[pos, end)` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edit {
    pub pos: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn new(pos: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            pos,
            end,
            text: text.into(),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.pos == self.end
    }
}

/// The part of the source the edits may delete from.
///
/// New and modified text is always written, but nothing outside this range
/// is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRange {
    pub start: usize,
    pub end: usize,
}

impl EditRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The range covered by the tokens, empty if there are none.
    pub fn of_tokens(tokens: &[Token]) -> Self {
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => Self::new(first.pos, last.end),
            _ => Self::new(0, 0),
        }
    }
}

/// A text document that can take a batch of edits.
pub trait TextBuffer {
    /// Apply the edits, which are sorted and don't overlap, all at once.
    ///
    /// Either all edits are applied or, on error, none.
    fn apply_edits(&mut self, edits: &[Edit]) -> Result<()>;
}

/// Check that the edits are ordered, don't overlap and fit in the text.
fn check_edits(edits: &[Edit], len: usize, is_boundary: impl Fn(usize) -> bool) -> Result<()> {
    let mut last = 0;
    for e in edits {
        if e.pos < last || e.end < e.pos || e.end > len || !is_boundary(e.pos) || !is_boundary(e.end) {
            return Err(DomError::InvalidEdit {
                pos: e.pos,
                end: e.end,
                len,
            });
        }
        last = e.end;
    }
    Ok(())
}

impl TextBuffer for String {
    fn apply_edits(&mut self, edits: &[Edit]) -> Result<()> {
        check_edits(edits, self.len(), |i| self.is_char_boundary(i))?;
        let mut text = String::with_capacity(self.len());
        let mut last = 0;
        for e in edits {
            text.push_str(&self[last..e.pos]);
            text.push_str(&e.text);
            last = e.end;
        }
        text.push_str(&self[last..]);
        *self = text;
        Ok(())
    }
}

#[cfg(feature = "ropey")]
impl TextBuffer for ropey::Rope {
    fn apply_edits(&mut self, edits: &[Edit]) -> Result<()> {
        let len = self.len_bytes();
        check_edits(edits, len, |i| i == len || self.char_to_byte(self.byte_to_char(i)) == i)?;
        // backwards, so earlier offsets stay valid
        for e in edits.iter().rev() {
            let start = self.byte_to_char(e.pos);
            let end = self.byte_to_char(e.end);
            self.remove(start..end);
            self.insert(start, &e.text);
        }
        Ok(())
    }
}

/// What came before the point being handled.
struct Pending {
    /// whitespace desired after the previous point
    after: String,
    /// the previous point was inserted as new text
    inserted: bool,
}

/// Computes the edits, walking the points in lockstep with the tokens.
struct Differ<'a> {
    tokens: &'a [Token],
    /// index of the first token not yet scanned
    cursor: usize,
    /// position in the source up to which everything is handled
    pos: usize,
    /// end of the last positioned point that was walked over
    consumed: Option<usize>,
    /// nothing after this position is deleted
    end: usize,
    pending: Option<Pending>,
    edits: Vec<Edit>,
}

impl<'a> Differ<'a> {
    fn new(tokens: &'a [Token], range: EditRange) -> Self {
        Self {
            tokens,
            cursor: 0,
            pos: range.start,
            consumed: None,
            end: range.end,
            pending: None,
            edits: Vec::new(),
        }
    }

    /// Add an edit, joining it with the previous one when they touch.
    fn push(&mut self, pos: usize, end: usize, text: String) {
        log::trace!("edit {}..{} {:?}", pos, end, text);
        match self.edits.last_mut() {
            Some(last) if last.end == pos => {
                last.end = end;
                last.text.push_str(&text);
            }
            _ => self.edits.push(Edit { pos, end, text }),
        }
    }

    /// The end of the old content between the current position and `until`.
    fn scan_gap(&mut self, until: usize) -> usize {
        let mut del_end = self.pos;
        while let Some(t) = self.tokens.get(self.cursor) {
            if t.pos >= until {
                break;
            }
            if t.pos >= self.pos {
                del_end = t.end.min(until);
            }
            self.cursor += 1;
        }
        del_end
    }

    /// Whether a point at `pos` lies before text that was already walked
    /// over.
    fn moved_back(&self, pos: usize) -> bool {
        self.consumed.is_some_and(|c| pos < c)
    }

    fn handle(&mut self, spaced: SpacedPoint) {
        let SpacedPoint {
            before,
            point,
            after,
        } = spaced;
        let space = match &self.pending {
            Some(p) => collapse_whitespace([p.after.as_str(), before.as_str()]),
            None => String::new(),
        };
        match point.span() {
            Some((pos, end)) if !self.moved_back(pos) && pos < self.pos => {
                // before the range: never deleted from, but written if changed
                if point.modified {
                    self.push(pos, end, point.text);
                }
                self.consumed = Some(end);
                self.pos = self.pos.max(end);
                self.pending = Some(Pending {
                    after,
                    inserted: false,
                });
            }
            Some((pos, end)) if !self.moved_back(pos) => {
                let gap_end = pos.min(self.end.max(self.pos));
                let del_end = self.scan_gap(pos).min(gap_end);
                let after_new = self.pending.as_ref().is_some_and(|p| p.inserted);
                if del_end > self.pos {
                    if self.pending.is_none() {
                        // nothing precedes: remove everything up to here
                        self.push(self.pos, gap_end, String::new());
                    } else if del_end < gap_end && !(after_new && space.contains('\n')) {
                        // keep the whitespace after the removed content
                        self.push(self.pos, del_end, String::new());
                    } else {
                        self.push(self.pos, gap_end, space);
                    }
                } else if pos == self.pos && after_new && !space.is_empty() {
                    self.push(pos, pos, space);
                } else if after_new && space.contains('\n') {
                    self.push(self.pos, pos, space);
                }
                if point.modified {
                    self.push(pos, end, point.text);
                }
                self.pos = end;
                self.consumed = Some(end);
                self.pending = Some(Pending {
                    after,
                    inserted: false,
                });
            }
            span => {
                if span.is_some() {
                    log::warn!(
                        "text {:?} moved back before position {}, inserting it again",
                        point.text,
                        self.pos
                    );
                }
                if !point.text.is_empty() {
                    let pos = self.pos;
                    self.push(pos, pos, space + &point.text);
                    self.pending = Some(Pending {
                        after,
                        inserted: true,
                    });
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Edit> {
        if self.pos < self.end {
            self.push(self.pos, self.end, String::new());
        }
        self.edits
    }
}

impl Element {
    /// Compute the edits that turn the source into our output.
    ///
    /// `tokens` are the tokens of the unchanged source this tree was built
    /// from; the edits may delete anything between the first and the last
    /// token.
    pub fn edits(&self, tokens: &[Token]) -> Result<Vec<Edit>> {
        self.edits_in(tokens, EditRange::of_tokens(tokens))
    }

    /// Compute the edits, deleting nothing outside `range`.
    pub fn edits_in(&self, tokens: &[Token], range: EditRange) -> Result<Vec<Edit>> {
        let mut differ = Differ::new(tokens, range);
        for spaced in self.points() {
            differ.handle(spaced?);
        }
        Ok(differ.finish())
    }

    /// Write our changes back to the buffer holding the source.
    ///
    /// All edits are computed before the buffer is touched and then applied
    /// in one batch. Returns the number of edits. Afterwards the tree is
    /// stale: build a new one from the new text before editing again.
    pub fn edit<B: TextBuffer + ?Sized>(&self, buffer: &mut B, tokens: &[Token]) -> Result<usize> {
        self.edit_in(buffer, tokens, EditRange::of_tokens(tokens))
    }

    /// Like [`Element::edit`], deleting nothing outside `range`.
    pub fn edit_in<B: TextBuffer + ?Sized>(
        &self,
        buffer: &mut B,
        tokens: &[Token],
        range: EditRange,
    ) -> Result<usize> {
        let edits = self.edits_in(tokens, range)?;
        buffer.apply_edits(&edits)?;
        log::debug!("applied {} edits", edits.len());
        Ok(edits.len())
    }
}

impl Range<ElementData> {
    /// The part of the source between the start and the end node.
    ///
    /// A missing boundary falls back to the ancestor, or to the whole token
    /// range if the ancestor is the root.
    pub fn edit_range(&self, tokens: &[Token]) -> EditRange {
        let full = EditRange::of_tokens(tokens);
        let ancestor = self.ancestor();
        let (first, last) = if ancestor.is_root() {
            (None, None)
        } else {
            (ancestor.pos(), ancestor.end())
        };
        EditRange::new(
            self.start_node()
                .and_then(|n| n.pos())
                .or(first)
                .unwrap_or(full.start),
            self.end_node()
                .and_then(|n| n.end())
                .or(last)
                .unwrap_or(full.end),
        )
    }

    /// The edits of the ancestor, deleting nothing outside the range.
    pub fn edits(&self, tokens: &[Token]) -> Result<Vec<Edit>> {
        self.ancestor().edits_in(tokens, self.edit_range(tokens))
    }

    /// Write the changes of the ancestor back to the buffer, deleting
    /// nothing outside the range.
    pub fn edit<B: TextBuffer + ?Sized>(&self, buffer: &mut B, tokens: &[Token]) -> Result<usize> {
        self.ancestor()
            .edit_in(buffer, tokens, self.edit_range(tokens))
    }
}
