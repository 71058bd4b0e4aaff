//! Pretty-printing an element tree with indentation
//!
//! The [`Indenter`] writes the heads and tails of a tree, combining the
//! whitespace between them like [`Element::write`] does. Every newline in
//! the whitespace starts a new output line. Elements whose type returns true
//! for [`ElementType::indent_children`] open an indent level; the level only
//! takes effect when a line break occurs inside the element. A new level is
//! one `indent_width` deeper than the level below it, or, if the element
//! names a child to align with and that child appeared on the previous line,
//! at the column of that child.
//!
//! [`ElementType::indent_children`]: super::ElementType::indent_children

use crate::error::Result;

use super::element::Element;
use super::spacing::Space;
use super::whitespace::collapse_whitespace;

/// Options for the [`Indenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndentOptions {
    /// spaces per indent level
    pub indent_width: usize,
    /// spaces in front of every output line
    pub start_indent: usize,
    /// maximum column to align a child with
    pub max_align_indent: usize,
}

impl Default for IndentOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            start_indent: 0,
            max_align_indent: 16,
        }
    }
}

impl IndentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn with_start_indent(mut self, start_indent: usize) -> Self {
        self.start_indent = start_indent;
        self
    }

    pub fn with_max_align_indent(mut self, max_align_indent: usize) -> Self {
        self.max_align_indent = max_align_indent;
        self
    }
}

/// An indent level that is entered, but has not seen a newline yet.
struct PendingLevel {
    align_indices: Vec<usize>,
    /// (child index, part index on the current line)
    align_positions: Vec<(usize, usize)>,
}

impl PendingLevel {
    /// The part index of the preferred child that was seen.
    fn align_part(&self) -> Option<usize> {
        self.align_indices.iter().find_map(|index| {
            self.align_positions
                .iter()
                .find(|(i, _)| i == index)
                .map(|&(_, part)| part)
        })
    }
}

#[derive(Debug, Default)]
struct Line {
    indent: usize,
    parts: Vec<String>,
}

impl Line {
    /// The column where the part at `index` starts.
    fn column(&self, index: usize) -> usize {
        self.parts[..index.min(self.parts.len())]
            .iter()
            .map(|p| p.chars().count())
            .sum()
    }
}

/// Writes an element tree as indented text.
pub struct Indenter {
    options: IndentOptions,
    lines: Vec<Line>,
    indent_stack: Vec<usize>,
    pending: Vec<PendingLevel>,
    /// levels left that were already in effect
    dedenters: usize,
    whitespace: Vec<String>,
    can_dedent: bool,
}

impl Default for Indenter {
    fn default() -> Self {
        Self::new(IndentOptions::default())
    }
}

impl Indenter {
    pub fn new(options: IndentOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            indent_stack: Vec::new(),
            pending: Vec::new(),
            dedenters: 0,
            whitespace: Vec::new(),
            can_dedent: false,
        }
    }

    pub fn options(&self) -> &IndentOptions {
        &self.options
    }

    /// Return the indented output of the node, every line ending with a
    /// newline.
    pub fn write(&mut self, node: &Element) -> Result<String> {
        self.lines = vec![Line::default()];
        self.indent_stack.clear();
        self.pending.clear();
        self.dedenters = 0;
        self.whitespace.clear();
        self.can_dedent = false;

        self.output_node(node, None)?;

        // strip leading whitespace
        while let Some(first) = self.lines.first_mut() {
            match first.parts.first() {
                Some(part) if part.chars().all(char::is_whitespace) => {
                    first.parts.remove(0);
                }
                Some(_) => break,
                None => {
                    self.lines.remove(0);
                }
            }
        }

        let start = " ".repeat(self.options.start_indent);
        Ok(self
            .lines
            .iter()
            .map(|line| format!("{}{}{}\n", start, " ".repeat(line.indent), line.parts.concat()))
            .collect())
    }

    fn output_node(&mut self, node: &Element, index: Option<usize>) -> Result<()> {
        let data = node.data();
        let class = data.class();
        let head = data.write_head()?.filter(|s| !s.is_empty());
        let tail = data.write_tail()?.filter(|s| !s.is_empty());
        let children = node.children();
        let indent = class.indent_children();

        self.add_whitespace(data.space(Space::Before));
        if let Some(head) = head {
            self.output_head(head, index, class.indent_override(node));
            if tail.is_some() || !children.is_empty() {
                self.add_whitespace(data.space(Space::AfterHead));
            }
        }
        if indent {
            self.enter_indent(class.indent_align_indices(node));
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                let space = class.concat(node, &children[i - 1], child);
                self.add_whitespace(&space);
            }
            self.output_node(child, Some(i))?;
        }
        if indent {
            self.leave_indent();
        }
        if let Some(tail) = tail {
            self.add_whitespace(data.space(Space::BeforeTail));
            self.output_tail(tail);
        }
        self.add_whitespace(data.space(Space::After));
        Ok(())
    }

    fn add_whitespace(&mut self, whitespace: &str) {
        self.whitespace.push(whitespace.to_string());
    }

    fn enter_indent(&mut self, align_indices: Vec<usize>) {
        self.pending.push(PendingLevel {
            align_indices,
            align_positions: Vec::new(),
        });
    }

    fn leave_indent(&mut self) {
        if self.pending.pop().is_none() {
            self.dedenters += 1;
        }
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn dedent(&mut self) {
        let keep = self.indent_stack.len().saturating_sub(self.dedenters);
        self.indent_stack.truncate(keep);
        self.dedenters = 0;
    }

    fn current_line(&mut self) -> &mut Line {
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn new_line(&mut self) {
        if self.dedenters > 0 {
            self.dedent();
        }
        // columns are taken from the line that is ending
        let (line_indent, columns): (usize, Vec<Option<usize>>) = match self.lines.last() {
            Some(line) => (
                line.indent,
                self.pending
                    .iter()
                    .map(|level| level.align_part().map(|part| line.column(part)))
                    .collect(),
            ),
            None => (0, vec![None; self.pending.len()]),
        };
        for column in columns {
            let indent = match column {
                Some(column) if column <= self.options.max_align_indent => line_indent + column,
                _ => self.current_indent() + self.options.indent_width,
            };
            self.indent_stack.push(indent);
        }
        self.pending.clear();
        self.can_dedent = !self.indent_stack.is_empty();
        let indent = self.current_indent();
        self.lines.push(Line {
            indent,
            parts: Vec::new(),
        });
    }

    /// Output the collected whitespace; newlines start new lines.
    fn output_space(&mut self) {
        let whitespace = collapse_whitespace(self.whitespace.iter().map(String::as_str));
        self.whitespace.clear();
        for c in whitespace.chars() {
            if c == '\n' {
                self.new_line();
            } else {
                self.current_line().parts.push(c.to_string());
            }
        }
    }

    fn output_head(&mut self, text: String, index: Option<usize>, indent_override: Option<usize>) {
        self.output_space();
        self.can_dedent = false;
        let line = self.current_line();
        if line.parts.is_empty() {
            if let Some(indent) = indent_override {
                line.indent = indent;
            }
        }
        let part = line.parts.len();
        line.parts.push(text);
        if let (Some(level), Some(index)) = (self.pending.last_mut(), index) {
            if level.align_indices.contains(&index) {
                level.align_positions.push((index, part));
            }
        }
    }

    fn output_tail(&mut self, text: String) {
        self.output_space();
        if self.can_dedent && self.dedenters > 0 {
            self.dedent();
            let indent = self.current_indent();
            self.current_line().indent = indent;
        }
        self.current_line().parts.push(text);
    }
}

impl Element {
    /// The output of this element and its children with indentation.
    pub fn write_indented(&self, options: IndentOptions) -> Result<String> {
        Indenter::new(options).write(self)
    }
}
