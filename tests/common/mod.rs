//! 集成测试辅助工具
//!
//! Two toy languages to build element trees from: music lists like
//! `{ c4 d8 }` and s-expressions like `(if a "b" ; c)`. Tokens are produced by
//! a small nom lexer; the transform builds elements with or without origin.

#![allow(dead_code)]

use std::any::TypeId;

use anyhow::{anyhow, bail, Result};
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_till};
use nom::character::complete::{char, digit1, multispace0, not_line_ending, one_of};
use nom::combinator::recognize;
use nom::multi::many0;
use nom::sequence::{delimited, pair};
use nom::{IResult, Parser};

use textdom::dom::{Element, ElementType, Fraction, Mapped, Shape, Spacing, Value};
use textdom::{DomError, Token};

// ---------------------------------------------------------------------------
// lexing

/// 把文本切分成 token，跳过空白
fn lex_with<'a, F>(text: &'a str, mut token: F) -> Result<Vec<Token>>
where
    F: FnMut(&'a str) -> IResult<&'a str, &'a str>,
{
    let mut tokens = Vec::new();
    let mut rest = text;
    loop {
        let (r, _) = multispace0::<&str, nom::error::Error<&str>>(rest)
            .map_err(|e| anyhow!("{e:?}"))?;
        if r.is_empty() {
            break;
        }
        let pos = text.len() - r.len();
        let (r, t) = token(r).map_err(|e| anyhow!("lex error at {pos}: {e:?}"))?;
        tokens.push(Token::new(pos, t));
        rest = r;
    }
    Ok(tokens)
}

fn pitch(input: &str) -> IResult<&str, &str> {
    recognize(pair(one_of("abcdefg"), many0(alt((tag("is"), tag("es")))))).parse(input)
}

fn music_token(input: &str) -> IResult<&str, &str> {
    alt((tag("{"), tag("}"), pitch, digit1)).parse(input)
}

fn scheme_token(input: &str) -> IResult<&str, &str> {
    alt((
        tag("("),
        tag(")"),
        recognize(delimited(char('"'), take_till(|c: char| c == '"'), char('"'))),
        recognize(pair(char(';'), not_line_ending)),
        is_not(" \t\r\n()\";"),
    ))
    .parse(input)
}

pub fn lex_music(text: &str) -> Result<Vec<Token>> {
    lex_with(text, music_token)
}

pub fn lex_scheme(text: &str) -> Result<Vec<Token>> {
    lex_with(text, scheme_token)
}

// ---------------------------------------------------------------------------
// music elements

#[derive(Debug)]
pub struct MusicDocument;
#[derive(Debug)]
pub struct MusicList;
#[derive(Debug)]
pub struct Note;
#[derive(Debug)]
pub struct Duration;

impl ElementType for MusicDocument {
    fn name(&self) -> &'static str {
        "MusicDocument"
    }
    fn shape(&self) -> Shape {
        Shape::Bare
    }
    fn spacing(&self) -> Spacing {
        Spacing::between(" ")
    }
}

impl ElementType for MusicList {
    fn name(&self) -> &'static str {
        "MusicList"
    }
    fn shape(&self) -> Shape {
        Shape::Block
    }
    fn spacing(&self) -> Spacing {
        Spacing::between(" ")
    }
    fn default_head(&self) -> Option<Value> {
        Some("{".into())
    }
    fn default_tail(&self) -> Option<Value> {
        Some("}".into())
    }
    fn indent_align_indices(&self, _node: &Element) -> Vec<usize> {
        vec![0]
    }
}

impl ElementType for Note {
    fn name(&self) -> &'static str {
        "Note"
    }
    fn check_head(&self, head: &Value) -> bool {
        head.as_text()
            .is_some_and(|s| pitch(s).is_ok_and(|(rest, _)| rest.is_empty()))
    }
}

impl ElementType for Duration {
    fn name(&self) -> &'static str {
        "Duration"
    }
    fn check_head(&self, head: &Value) -> bool {
        head.as_fraction().is_some_and(|f| f.numerator() == 1)
    }
    /// `4` is a quarter note
    fn read_head(&self, origin: &[Token]) -> Value {
        origin
            .first()
            .and_then(|t| t.text.parse().ok())
            .and_then(|den| Fraction::new(1, den))
            .map(Value::Fraction)
            .unwrap_or(Value::Integer(0))
    }
    fn write_head(&self, head: &Value) -> textdom::Result<String> {
        match head.as_fraction() {
            Some(f) if f.numerator() == 1 => Ok(f.denominator().to_string()),
            _ => Err(DomError::InvalidHead {
                element: self.name(),
                value: head.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// scheme elements

#[derive(Debug)]
pub struct SchemeDocument;
#[derive(Debug)]
pub struct List;
#[derive(Debug)]
pub struct Identifier;
#[derive(Debug)]
pub struct Str;
#[derive(Debug)]
pub struct Comment;
#[derive(Debug)]
pub struct LineComment;
#[derive(Debug)]
pub struct Boolean;

impl ElementType for SchemeDocument {
    fn name(&self) -> &'static str {
        "SchemeDocument"
    }
    fn shape(&self) -> Shape {
        Shape::Bare
    }
    fn spacing(&self) -> Spacing {
        Spacing::between(" ")
    }
}

impl ElementType for List {
    fn name(&self) -> &'static str {
        "List"
    }
    fn shape(&self) -> Shape {
        Shape::Block
    }
    fn spacing(&self) -> Spacing {
        Spacing::between(" ")
    }
    fn default_head(&self) -> Option<Value> {
        Some("(".into())
    }
    fn default_tail(&self) -> Option<Value> {
        Some(")".into())
    }
    /// 以标识符开头的列表对齐到第一个参数
    fn indent_align_indices(&self, node: &Element) -> Vec<usize> {
        match node.first() {
            Some(first) if first.is_a::<Identifier>() => vec![1],
            _ => vec![0],
        }
    }
}

impl ElementType for Identifier {
    fn name(&self) -> &'static str {
        "Identifier"
    }
}

impl ElementType for Str {
    fn name(&self) -> &'static str {
        "Str"
    }
    fn read_head(&self, origin: &[Token]) -> Value {
        let text: String = origin.iter().map(|t| t.text.as_str()).collect();
        Value::Text(text.trim_matches('"').to_string())
    }
    fn write_head(&self, head: &Value) -> textdom::Result<String> {
        Ok(format!("\"{}\"", head))
    }
}

impl ElementType for Comment {
    fn name(&self) -> &'static str {
        "Comment"
    }
}

impl ElementType for LineComment {
    fn name(&self) -> &'static str {
        "LineComment"
    }
    fn spacing(&self) -> Spacing {
        Spacing::NONE.with_after("\n")
    }
    fn indent_override(&self, node: &Element) -> Option<usize> {
        node.head()
            .is_some_and(|h| h.to_string().starts_with(";;;"))
            .then_some(0)
    }
    fn is_instance_of(&self, ty: TypeId) -> bool {
        ty == TypeId::of::<LineComment>() || ty == TypeId::of::<Comment>()
    }
}

/// `#t` 和 `#f`
impl ElementType for Boolean {
    fn name(&self) -> &'static str {
        "Boolean"
    }
    fn mapping(&self) -> &'static [(&'static str, Mapped)] {
        &[("#t", Mapped::Boolean(true)), ("#f", Mapped::Boolean(false))]
    }
}

// ---------------------------------------------------------------------------
// transform

/// Builds element trees from tokens.
///
/// With `with_origin` the elements keep their tokens and can write back
/// their changes.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub with_origin: bool,
}

impl Transform {
    pub fn new(with_origin: bool) -> Self {
        Self { with_origin }
    }

    fn element(&self, class: &'static dyn ElementType, head: &[Token], tail: &[Token]) -> Element {
        if self.with_origin {
            Element::with_origin(class, head, tail)
        } else {
            Element::from_origin(class, head, tail)
        }
    }

    pub fn music(&self, tokens: &[Token]) -> Result<Element> {
        let doc = Element::create(&MusicDocument);
        let mut i = 0;
        while i < tokens.len() {
            let (node, next) = self.music_item(tokens, i)?;
            doc.append(node);
            i = next;
        }
        Ok(doc)
    }

    fn music_item(&self, tokens: &[Token], i: usize) -> Result<(Element, usize)> {
        let token = &tokens[i];
        match token.text.as_str() {
            "{" => {
                let mut children = Vec::new();
                let mut j = i + 1;
                loop {
                    match tokens.get(j) {
                        Some(t) if t.text == "}" => break,
                        Some(_) => {
                            let (node, next) = self.music_item(tokens, j)?;
                            children.push(node);
                            j = next;
                        }
                        None => bail!("missing }} for {{ at {}", token.pos),
                    }
                }
                let node = self
                    .element(&MusicList, &tokens[i..=i], &tokens[j..=j])
                    .with_children(children);
                Ok((node, j + 1))
            }
            text if pitch(text).is_ok() => {
                let note = self.element(&Note, &tokens[i..=i], &[]);
                match tokens.get(i + 1) {
                    Some(t) if t.text.bytes().all(|b| b.is_ascii_digit()) => {
                        note.append(self.element(&Duration, &tokens[i + 1..=i + 1], &[]));
                        Ok((note, i + 2))
                    }
                    _ => Ok((note, i + 1)),
                }
            }
            text => bail!("unexpected {:?} at {}", text, token.pos),
        }
    }

    pub fn scheme(&self, tokens: &[Token]) -> Result<Element> {
        let doc = Element::create(&SchemeDocument);
        let mut i = 0;
        while i < tokens.len() {
            let (node, next) = self.scheme_item(tokens, i)?;
            doc.append(node);
            i = next;
        }
        Ok(doc)
    }

    fn scheme_item(&self, tokens: &[Token], i: usize) -> Result<(Element, usize)> {
        let token = &tokens[i];
        let text = token.text.as_str();
        let node = match text {
            "(" => {
                let mut children = Vec::new();
                let mut j = i + 1;
                loop {
                    match tokens.get(j) {
                        Some(t) if t.text == ")" => break,
                        Some(_) => {
                            let (node, next) = self.scheme_item(tokens, j)?;
                            children.push(node);
                            j = next;
                        }
                        None => bail!("missing ) for ( at {}", token.pos),
                    }
                }
                let node = self
                    .element(&List, &tokens[i..=i], &tokens[j..=j])
                    .with_children(children);
                return Ok((node, j + 1));
            }
            ")" => bail!("unexpected ) at {}", token.pos),
            _ if text.starts_with('"') => self.element(&Str, &tokens[i..=i], &[]),
            _ if text.starts_with(';') => self.element(&LineComment, &tokens[i..=i], &[]),
            "#t" | "#f" => self.element(&Boolean, &tokens[i..=i], &[]),
            _ => self.element(&Identifier, &tokens[i..=i], &[]),
        };
        Ok((node, i + 1))
    }
}

// ---------------------------------------------------------------------------
// shortcuts

/// Lex and transform music, keeping the origin.
pub fn music(text: &str) -> Result<(Vec<Token>, Element)> {
    let tokens = lex_music(text)?;
    let doc = Transform::new(true).music(&tokens)?;
    Ok((tokens, doc))
}

/// Lex and transform scheme, keeping the origin.
pub fn scheme(text: &str) -> Result<(Vec<Token>, Element)> {
    let tokens = lex_scheme(text)?;
    let doc = Transform::new(true).scheme(&tokens)?;
    Ok((tokens, doc))
}

/// The first descendant with the given head text.
pub fn find(node: &Element, head: &str) -> Result<Element> {
    node.descendants()
        .find(|n| n.head().is_some_and(|h| h.as_text() == Some(head)))
        .ok_or_else(|| anyhow!("no element {head:?}"))
}

/// Every child points back to its parent.
pub fn assert_parents(node: &Element) {
    for child in node.children() {
        assert!(
            child.parent().is_some_and(|p| p.same(node)),
            "wrong parent for {:?}",
            child
        );
        assert_parents(&child);
    }
}

/// Apply the edits of the tree to the text, checking the result.
pub fn edited(text: &str, tokens: &[Token], tree: &Element) -> Result<(usize, String)> {
    let mut buffer = text.to_string();
    let count = tree.edit(&mut buffer, tokens)?;
    Ok((count, buffer))
}
