//! Building trees from a flat stream of elements
//!
//! A transformer often produces a flat list of elements where some elements
//! take the ones that follow as arguments, like a command followed by its
//! parameters. [`build_tree`] nests them using [`ElementType::signatures`].

use std::any::TypeId;
use std::collections::HashMap;

use crate::node::NodeData;

use super::element::{Element, ElementType, Shape};

type Signatures = Vec<Vec<TypeId>>;

/// Keep the signatures that accept `node` next, minus their first type.
fn advance(signatures: Signatures, node: &Element) -> Signatures {
    let data = node.data();
    signatures
        .into_iter()
        .filter(|s| s.first().is_some_and(|&ty| data.is_instance_of(ty)))
        .map(|mut s| {
            s.remove(0);
            s
        })
        .collect()
}

/// Nest elements that take arguments, returning the remaining top level
/// elements.
///
/// An element whose type has signatures adopts the following elements as
/// long as they match one of its signatures; it is complete when a signature
/// is exhausted. Existing children count as arguments already given. An
/// element that doesn't fit finishes the pending element before it.
///
/// Elements for which `ignore` returns true are adopted anyway without
/// consuming an argument, e.g. comments between a command and its
/// arguments.
pub fn build_tree(
    nodes: impl IntoIterator<Item = Element>,
    ignore: Option<&dyn Fn(&Element) -> bool>,
) -> Vec<Element> {
    let ignored = |n: &Element| ignore.is_some_and(|f| f(n));
    let mut stack: Vec<(Element, Signatures)> = Vec::new();
    let mut result = Vec::new();

    for node in nodes {
        let mut signatures = node.class().signatures();
        if !signatures.is_empty() {
            for child in node.children().iter().filter(|c| !ignored(*c)) {
                signatures.retain(|s| s.len() > 1);
                signatures = advance(signatures, child);
                if signatures.is_empty() {
                    break;
                }
            }
            if !signatures.is_empty() {
                stack.push((node, signatures));
                continue;
            }
        }
        add(&mut stack, node, &ignored, &mut result);
    }
    // unfinished elements
    while let Some((node, _)) = stack.pop() {
        add(&mut stack, node, &ignored, &mut result);
    }
    result
}

/// Feed a node to the element on top of the stack, collecting the elements
/// that are finished and have nowhere to go.
fn add(
    stack: &mut Vec<(Element, Signatures)>,
    node: Element,
    ignored: &impl Fn(&Element) -> bool,
    result: &mut Vec<Element>,
) {
    let mut pending = vec![node];
    while !pending.is_empty() {
        let Some((parent, signatures)) = stack.last_mut() else {
            break;
        };
        let Some(node) = pending.pop() else {
            break;
        };
        if ignored(&node) {
            parent.append(node);
            continue;
        }
        let fitting = advance(std::mem::take(signatures), &node);
        if fitting.is_empty() {
            // finish the parent and try again
            pending.push(node);
        } else {
            parent.append(node);
            let remaining: Signatures = fitting.into_iter().filter(|s| !s.is_empty()).collect();
            if !remaining.is_empty() {
                *signatures = remaining;
                continue;
            }
        }
        if let Some((parent, _)) = stack.pop() {
            pending.push(parent);
        }
    }
    result.extend(pending.into_iter().rev());
}

/// Map the written head text of each type to the type.
///
/// Types with a [mapping] contribute every text in it, other types with a
/// head contribute the text of their default head.
///
/// [mapping]: ElementType::mapping
pub fn head_mapping(
    types: &[&'static dyn ElementType],
) -> HashMap<String, &'static dyn ElementType> {
    let mut map = HashMap::new();
    for &class in types {
        let mapping = class.mapping();
        if !mapping.is_empty() {
            for (text, _) in mapping {
                map.insert(text.to_string(), class);
            }
        } else if class.shape() != Shape::Bare {
            if let Some(text) = class.default_head().and_then(|h| class.write_head(&h).ok()) {
                map.insert(text, class);
            }
        }
    }
    map
}
