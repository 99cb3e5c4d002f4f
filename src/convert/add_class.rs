//! Class attribute overrides.

use crate::dom::{Dom, NodeId, Selector};

/// Add each word of `classes` to every element matching `selector`.
///
/// Words already present on the element are not repeated.
pub fn add_class(dom: &mut Dom, root: NodeId, selector: &Selector, classes: &str) {
    for element in selector.match_all(dom, root) {
        let mut merged: Vec<String> = dom.classes(element).map(str::to_string).collect();
        for class in classes.split_whitespace() {
            if !merged.iter().any(|c| c == class) {
                merged.push(class.to_string());
            }
        }
        if !merged.is_empty() {
            dom.set_attr(element, "class", merged.join(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_adds_and_merges() {
        let mut dom = parse_html(r#"<table><tr><td>x</td></tr></table><table class="wide table"></table>"#);
        let root = content_root(&dom);
        add_class(&mut dom, root, &Selector::compile("table").unwrap(), "table table-sm");

        assert_eq!(
            serialize_children(&dom, root).unwrap(),
            concat!(
                r#"<table class="table table-sm"><tbody><tr><td>x</td></tr></tbody></table>"#,
                r#"<table class="wide table table-sm"></table>"#,
            )
        );
    }

    #[test]
    fn test_blank_classes_add_nothing() {
        let mut dom = parse_html("<p>x</p>");
        let root = content_root(&dom);
        add_class(&mut dom, root, &Selector::compile("p").unwrap(), "  ");
        assert_eq!(serialize_children(&dom, root).unwrap(), "<p>x</p>");
    }
}
