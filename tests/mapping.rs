mod common;

use anyhow::Result;
use common::*;
use textdom::dom::{build_tree, head_mapping, Edit, Element, Value};
use textdom::DomError;

#[test]
fn test_mapped_head_round_trip() -> Result<()> {
    let text = "(if #t a b)";
    let (tokens, doc) = scheme(text)?;
    let flag = doc.descendants_of_type::<Boolean>().next().unwrap();
    assert_eq!(flag.head(), Some(Value::Boolean(true)));
    assert_eq!(doc.write()?, text);

    flag.set_head(false)?;
    assert_eq!(doc.edits(&tokens)?, vec![Edit::new(4, 6, "#f")]);
    // only mapped values are accepted
    assert!(matches!(
        flag.set_head("#t"),
        Err(DomError::InvalidHead { element: "Boolean", .. })
    ));
    let (_, result) = edited(text, &tokens, &doc)?;
    assert_eq!(result, "(if #f a b)");
    let (_, reread) = scheme(&result)?;
    assert!(reread.equals(&doc));
    Ok(())
}

#[test]
fn test_new_mapped_element() -> Result<()> {
    let text = "(a)";
    let (tokens, doc) = scheme(text)?;
    doc.get(0).unwrap().append(Element::with_head(&Boolean, true)?);
    assert_eq!(edited(text, &tokens, &doc)?, (1, "(a #t)".to_string()));
    assert!(Element::with_head(&Boolean, "yes").is_err());
    Ok(())
}

#[test]
fn test_head_mapping() {
    let map = head_mapping(&[&Boolean, &List, &Identifier]);
    assert_eq!(map.len(), 3);
    assert_eq!(map["#t"].name(), "Boolean");
    assert_eq!(map["#f"].name(), "Boolean");
    assert_eq!(map["("].name(), "List");
}

#[test]
fn test_build_tree_without_signatures() -> Result<()> {
    // nothing takes arguments, so the stream stays flat
    let (_, doc) = scheme("a #t (b)")?;
    let nodes = doc.take(..)?;
    let tree = build_tree(nodes, None);
    assert_eq!(tree.len(), 3);
    assert!(tree.iter().all(|n| n.parent().is_none()));
    assert!(tree[1].is_a::<Boolean>());
    Ok(())
}
