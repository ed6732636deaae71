//! Structural pass over converter output.
//!
//! Contentful's rich-text validator rejects several shapes the HTML converter
//! produces: text directly under the document, hyperlinks wrapping
//! embedded assets, hyperlinks wrapping hyperlinks, bare hyperlinks in list
//! items, and wrapper objects without a `nodeType`. [`normalize`] rewrites a
//! node sequence into an equivalent one without them. It performs no I/O;
//! embedded assets are relinked in a separate pass afterwards.

use crate::error::RichTextError;
use crate::node::{Block, EmbeddedAsset, Node, OtherNode};

/// Parse a stored rich-text JSON document.
pub fn parse_document(json: &str) -> Result<Node, RichTextError> {
    Ok(serde_json::from_str(json)?)
}

/// Normalize the content of a document root. An untagged root is accepted
/// and becomes a `document`.
pub fn normalize_document(root: Node) -> Result<Node, RichTextError> {
    match root {
        Node::Document(Block { data, content }) => Ok(Node::Document(Block {
            data,
            content: normalize(content),
        })),
        Node::Untagged(content) => Ok(Node::document(normalize(content))),
        other => Err(RichTextError::MalformedTree(format!(
            "expected a document root, found {}",
            other.node_type().unwrap_or("untagged")
        ))),
    }
}

/// Rewrite the children of a container so they satisfy the validator.
pub fn normalize(content: Vec<Node>) -> Vec<Node> {
    let mut sections = Vec::with_capacity(content.len());

    for node in content {
        match node {
            Node::Untagged(children) => sections.extend(normalize(children)),

            // No text at the root.
            text @ Node::Text(_) => sections.push(Node::paragraph(vec![text])),

            // Hyperlinks may not contain embedded assets; the assets follow
            // the link instead.
            Node::Hyperlink(link) => {
                let link = innermost_link(link);
                let (assets, inline): (Vec<Node>, Vec<Node>) = splice_untagged(link.content)
                    .into_iter()
                    .partition(Node::is_embedded_asset);

                sections.push(Node::paragraph(vec![Node::Hyperlink(Block {
                    data: link.data,
                    content: inline,
                })]));
                sections.extend(assets);
            }

            Node::OrderedList(list) => sections.push(Node::OrderedList(clean_list(list))),
            Node::UnorderedList(list) => sections.push(Node::UnorderedList(clean_list(list))),

            other => sections.push(other),
        }
    }

    remove_double_hyperlinks(sections)
}

/// Drop whitespace-only text between items and paragraph-wrap hyperlinks
/// sitting directly in an item. Untagged wrappers are spliced first so their
/// children get the same treatment.
fn clean_list(list: Block) -> Block {
    let content = splice_untagged(list.content)
        .into_iter()
        .filter(|node| !node.is_blank_text())
        .map(|node| match node {
            Node::ListItem(item) => Node::ListItem(wrap_item_links(item)),
            other => other,
        })
        .collect();

    Block {
        data: list.data,
        content,
    }
}

fn wrap_item_links(item: Block) -> Block {
    let content = splice_untagged(item.content)
        .into_iter()
        .map(|node| match node {
            link @ Node::Hyperlink(_) => Node::paragraph(vec![link]),
            other => other,
        })
        .collect();

    Block {
        data: item.data,
        content,
    }
}

/// Follow a chain of hyperlinks whose only child is another hyperlink down to
/// the innermost one.
fn innermost_link(mut link: Block) -> Block {
    loop {
        match link.content.as_mut_slice() {
            [Node::Hyperlink(inner)] => link = std::mem::take(inner),
            _ => return link,
        }
    }
}

/// Replace untagged wrappers with their children, at any depth, without
/// wrapping anything.
fn splice_untagged(content: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(content.len());
    for node in content {
        match node {
            Node::Untagged(children) => out.extend(splice_untagged(children)),
            other => out.push(other),
        }
    }
    out
}

/// Collapse single-child hyperlink nesting everywhere in the tree. Links with
/// zero or several children are left alone even if one child is a link.
/// Untagged wrappers below the top level are spliced away on the same walk.
fn remove_double_hyperlinks(content: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(content.len());

    for node in content {
        let node = match node {
            Node::Untagged(children) => {
                out.extend(remove_double_hyperlinks(children));
                continue;
            }
            Node::Hyperlink(Block { data, content }) => Node::Hyperlink(innermost_link(Block {
                data,
                content: remove_double_hyperlinks(content),
            })),
            Node::Document(b) => Node::Document(dedupe_block(b)),
            Node::Paragraph(b) => Node::Paragraph(dedupe_block(b)),
            Node::OrderedList(b) => Node::OrderedList(dedupe_block(b)),
            Node::UnorderedList(b) => Node::UnorderedList(dedupe_block(b)),
            Node::ListItem(b) => Node::ListItem(dedupe_block(b)),
            Node::EmbeddedAsset(asset) => Node::EmbeddedAsset(EmbeddedAsset {
                content: remove_double_hyperlinks(asset.content),
                ..asset
            }),
            Node::Other(other) => Node::Other(OtherNode {
                content: other.content.map(remove_double_hyperlinks),
                ..other
            }),
            text @ Node::Text(_) => text,
        };
        out.push(node);
    }

    out
}

fn dedupe_block(block: Block) -> Block {
    Block {
        data: block.data,
        content: remove_double_hyperlinks(block.content),
    }
}
