use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::RichTextError;

/// Opaque `data` map carried on every node.
pub type Data = Map<String, Value>;

/// One node of a rich-text tree.
///
/// `Untagged` only occurs in converter output (a wrapper with `content` but
/// no `nodeType`) and never survives normalization. `Other` carries every
/// tagged node type the normalizer has no rule for (headings, quotes, rules,
/// entry links, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub enum Node {
    Document(Block),
    Paragraph(Block),
    Text(Text),
    Hyperlink(Block),
    OrderedList(Block),
    UnorderedList(Block),
    ListItem(Block),
    EmbeddedAsset(EmbeddedAsset),
    Untagged(Vec<Node>),
    Other(OtherNode),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub data: Data,
    pub content: Vec<Node>,
}

impl Block {
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            data: Data::new(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub marks: Vec<Value>,
    pub data: Data,
}

/// An `embedded-asset-block`. `target` is pulled out of `data` so the asset
/// pass can rewrite it without touching the rest of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedAsset {
    pub target: AssetTarget,
    pub data: Data,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherNode {
    pub node_type: String,
    pub data: Data,
    pub content: Option<Vec<Node>>,
}

/// What an embedded asset points at.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetTarget {
    /// Inline description of remote media, not yet uploaded.
    Descriptor(AssetDescriptor),
    /// Link to an asset that already exists in the space.
    Link(String),
    Unknown(Value),
}

/// Remote media as described by the HTML converter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetDescriptor {
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AssetTarget {
    pub fn link(id: impl Into<String>) -> Self {
        AssetTarget::Link(id.into())
    }

    pub fn to_value(&self) -> Value {
        match self {
            AssetTarget::Descriptor(d) => {
                let mut file = Map::new();
                insert_opt(&mut file, "url", &d.url);
                insert_opt(&mut file, "fileName", &d.file_name);
                insert_opt(&mut file, "contentType", &d.content_type);

                let mut fields = Map::new();
                insert_opt(&mut fields, "title", &d.title);
                insert_opt(&mut fields, "description", &d.description);
                fields.insert("file".to_string(), Value::Object(file));

                json!({ "sys": { "type": "Asset" }, "fields": fields })
            }
            AssetTarget::Link(id) => json!({
                "sys": { "id": id, "type": "Link", "linkType": "Asset" }
            }),
            AssetTarget::Unknown(value) => value.clone(),
        }
    }
}

impl From<Value> for AssetTarget {
    fn from(value: Value) -> Self {
        let sys = &value["sys"];
        if sys["type"] == "Asset" {
            let fields = &value["fields"];
            let file = &fields["file"];
            return AssetTarget::Descriptor(AssetDescriptor {
                url: string_at(&file["url"]),
                content_type: string_at(&file["contentType"]),
                file_name: string_at(&file["fileName"]),
                title: string_at(&fields["title"]),
                description: string_at(&fields["description"]),
            });
        }
        if sys["type"] == "Link" && sys["linkType"] == "Asset" {
            if let Some(id) = sys["id"].as_str() {
                return AssetTarget::Link(id.to_string());
            }
        }
        AssetTarget::Unknown(value)
    }
}

fn string_at(value: &Value) -> Option<String> {
    value.as_str().map(String::from)
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

// --- Constructors and accessors ---

impl Node {
    pub fn document(content: Vec<Node>) -> Self {
        Node::Document(Block::new(content))
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph(Block::new(content))
    }

    pub fn text(value: &str) -> Self {
        Node::Text(Text {
            value: value.to_string(),
            marks: Vec::new(),
            data: Data::new(),
        })
    }

    pub fn hyperlink(uri: &str, content: Vec<Node>) -> Self {
        let mut data = Data::new();
        data.insert("uri".to_string(), Value::String(uri.to_string()));
        Node::Hyperlink(Block { data, content })
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Node::OrderedList(Block::new(items))
    }

    pub fn unordered_list(items: Vec<Node>) -> Self {
        Node::UnorderedList(Block::new(items))
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Node::ListItem(Block::new(content))
    }

    pub fn embedded_asset(target: AssetTarget) -> Self {
        Node::EmbeddedAsset(EmbeddedAsset {
            target,
            data: Data::new(),
            content: Vec::new(),
        })
    }

    /// The `nodeType` tag, `None` for untagged wrappers.
    pub fn node_type(&self) -> Option<&str> {
        Some(match self {
            Node::Document(_) => "document",
            Node::Paragraph(_) => "paragraph",
            Node::Text(_) => "text",
            Node::Hyperlink(_) => "hyperlink",
            Node::OrderedList(_) => "ordered-list",
            Node::UnorderedList(_) => "unordered-list",
            Node::ListItem(_) => "list-item",
            Node::EmbeddedAsset(_) => "embedded-asset-block",
            Node::Other(other) => other.node_type.as_str(),
            Node::Untagged(_) => return None,
        })
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Document(b)
            | Node::Paragraph(b)
            | Node::Hyperlink(b)
            | Node::OrderedList(b)
            | Node::UnorderedList(b)
            | Node::ListItem(b) => Some(&b.content),
            Node::EmbeddedAsset(asset) => Some(&asset.content),
            Node::Untagged(content) => Some(content),
            Node::Other(other) => other.content.as_deref(),
            Node::Text(_) => None,
        }
    }

    pub fn is_embedded_asset(&self) -> bool {
        matches!(self, Node::EmbeddedAsset(_))
    }

    /// A text node holding nothing but whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.value.trim().is_empty())
    }
}

/// Every embedded-asset target in the tree, depth-first, parents before
/// children.
pub fn asset_targets_mut(nodes: &mut [Node]) -> Vec<&mut AssetTarget> {
    let mut targets = Vec::new();
    collect_targets(nodes, &mut targets);
    targets
}

fn collect_targets<'a>(nodes: &'a mut [Node], out: &mut Vec<&'a mut AssetTarget>) {
    for node in nodes {
        match node {
            Node::EmbeddedAsset(asset) => {
                out.push(&mut asset.target);
                collect_targets(&mut asset.content, out);
            }
            Node::Document(b)
            | Node::Paragraph(b)
            | Node::Hyperlink(b)
            | Node::OrderedList(b)
            | Node::UnorderedList(b)
            | Node::ListItem(b) => collect_targets(&mut b.content, out),
            Node::Untagged(content) => collect_targets(content, out),
            Node::Other(OtherNode {
                content: Some(content),
                ..
            }) => collect_targets(content, out),
            Node::Other(_) | Node::Text(_) => {}
        }
    }
}

// --- JSON ---

#[derive(Deserialize)]
struct RawNode {
    #[serde(rename = "nodeType", default)]
    node_type: Option<String>,
    #[serde(default)]
    data: Option<Data>,
    #[serde(default)]
    content: Option<Vec<Node>>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    marks: Option<Vec<Value>>,
}

impl TryFrom<RawNode> for Node {
    type Error = RichTextError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let RawNode {
            node_type,
            data,
            content,
            value,
            marks,
        } = raw;
        let data = data.unwrap_or_default();

        let Some(node_type) = node_type else {
            return content.map(Node::Untagged).ok_or_else(|| {
                RichTextError::MalformedTree("node has neither nodeType nor content".to_string())
            });
        };

        let block = |content: Option<Vec<Node>>, data: Data| -> Result<Block, RichTextError> {
            let content = content.ok_or_else(|| {
                RichTextError::MalformedTree(format!("{node_type} node is missing content"))
            })?;
            Ok(Block { data, content })
        };

        let node = match node_type.as_str() {
            "document" => Node::Document(block(content, data)?),
            "paragraph" => Node::Paragraph(block(content, data)?),
            "hyperlink" => Node::Hyperlink(block(content, data)?),
            "ordered-list" => Node::OrderedList(block(content, data)?),
            "unordered-list" => Node::UnorderedList(block(content, data)?),
            "list-item" => Node::ListItem(block(content, data)?),
            "text" => Node::Text(Text {
                value: value.ok_or_else(|| {
                    RichTextError::MalformedTree("text node is missing value".to_string())
                })?,
                marks: marks.unwrap_or_default(),
                data,
            }),
            "embedded-asset-block" => {
                let mut data = data;
                let target = data.remove("target").ok_or_else(|| {
                    RichTextError::MalformedTree(
                        "embedded-asset-block is missing data.target".to_string(),
                    )
                })?;
                Node::EmbeddedAsset(EmbeddedAsset {
                    target: AssetTarget::from(target),
                    data,
                    content: content.unwrap_or_default(),
                })
            }
            _ => Node::Other(OtherNode {
                node_type: node_type.clone(),
                data,
                content,
            }),
        };
        Ok(node)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Node::Text(text) => {
                map.serialize_entry("nodeType", "text")?;
                map.serialize_entry("value", &text.value)?;
                map.serialize_entry("marks", &text.marks)?;
                map.serialize_entry("data", &text.data)?;
            }
            Node::EmbeddedAsset(asset) => {
                let mut data = asset.data.clone();
                data.insert("target".to_string(), asset.target.to_value());
                map.serialize_entry("nodeType", "embedded-asset-block")?;
                map.serialize_entry("data", &data)?;
                map.serialize_entry("content", &asset.content)?;
            }
            Node::Untagged(content) => {
                map.serialize_entry("content", content)?;
            }
            Node::Other(other) => {
                map.serialize_entry("nodeType", &other.node_type)?;
                map.serialize_entry("data", &other.data)?;
                if let Some(ref content) = other.content {
                    map.serialize_entry("content", content)?;
                }
            }
            Node::Document(b)
            | Node::Paragraph(b)
            | Node::Hyperlink(b)
            | Node::OrderedList(b)
            | Node::UnorderedList(b)
            | Node::ListItem(b) => {
                map.serialize_entry("nodeType", &self.node_type())?;
                map.serialize_entry("data", &b.data)?;
                map.serialize_entry("content", &b.content)?;
            }
        }
        map.end()
    }
}
