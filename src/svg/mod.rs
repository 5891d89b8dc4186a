//! SVG parsing: a typed element tree with transform propagation.

pub mod path;
pub mod shape;
pub mod transform;

use crate::{Error, Result};
use kurbo::Affine;
use log::debug;

/// A parsed SVG document.
///
/// Groups survive parsing; their transforms are pushed down onto leaves by
/// [`SvgDocument::leaves`], composing left to right in source order.
pub struct SvgDocument {
    pub nodes: Vec<SvgNode>,
}

pub enum SvgNode {
    Group { transform: Option<String>, children: Vec<SvgNode> },
    Leaf(Element),
}

/// A drawable leaf element.
///
/// The `transform` attribute is kept as its raw string and parsed into a
/// matrix on demand.
pub struct Element {
    pub transform: Option<String>,
    pub kind: ElementKind,
}

pub enum ElementKind {
    Path {
        d: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline {
        points: String,
    },
    Polygon {
        points: String,
    },
}

impl ElementKind {
    pub fn is_shape(&self) -> bool {
        !matches!(self, ElementKind::Path { .. })
    }
}

impl SvgDocument {
    /// Parse an SVG document.
    ///
    /// Unknown element types are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| Error::MalformedSvg(e.to_string()))?;

        let root = doc.root_element();
        if !root.tag_name().name().eq_ignore_ascii_case("svg") {
            return Err(Error::MalformedSvg("missing <svg> root element".into()));
        }

        Ok(Self { nodes: parse_children(root)? })
    }

    /// The document's leaves, each with its fully composed transform.
    pub fn leaves(&self) -> Result<Vec<(&Element, Affine)>> {
        let mut leaves = Vec::new();
        collect_leaves(&self.nodes, Affine::IDENTITY, &mut leaves)?;
        Ok(leaves)
    }
}

fn collect_leaves<'a>(
    nodes: &'a [SvgNode],
    parent: Affine,
    out: &mut Vec<(&'a Element, Affine)>,
) -> Result<()> {
    for node in nodes {
        match node {
            SvgNode::Group { transform, children } => {
                let affine = parent * parse_opt_transform(transform)?;
                collect_leaves(children, affine, out)?;
            }
            SvgNode::Leaf(element) => {
                let affine = parent * parse_opt_transform(&element.transform)?;
                out.push((element, affine));
            }
        }
    }
    Ok(())
}

fn parse_opt_transform(transform: &Option<String>) -> Result<Affine> {
    match transform {
        Some(t) => transform::parse_transform(t),
        None => Ok(Affine::IDENTITY),
    }
}

fn parse_children(node: roxmltree::Node) -> Result<Vec<SvgNode>> {
    let mut nodes = Vec::new();

    for child in node.children().filter(|n| n.is_element()) {
        let transform = child.attribute("transform").map(str::to_owned);

        let kind = match child.tag_name().name() {
            "g" => {
                nodes.push(SvgNode::Group { transform, children: parse_children(child)? });
                continue;
            }
            "path" => ElementKind::Path {
                d: child.attribute("d").unwrap_or_default().to_owned(),
            },
            "rect" => ElementKind::Rect {
                x: attr(child, "x")?,
                y: attr(child, "y")?,
                width: attr(child, "width")?,
                height: attr(child, "height")?,
                rx: attr_opt(child, "rx")?,
                ry: attr_opt(child, "ry")?,
            },
            "circle" => ElementKind::Circle {
                cx: attr(child, "cx")?,
                cy: attr(child, "cy")?,
                r: attr(child, "r")?,
            },
            "ellipse" => ElementKind::Ellipse {
                cx: attr(child, "cx")?,
                cy: attr(child, "cy")?,
                rx: attr_opt(child, "rx")?,
                ry: attr_opt(child, "ry")?,
            },
            "line" => ElementKind::Line {
                x1: attr(child, "x1")?,
                y1: attr(child, "y1")?,
                x2: attr(child, "x2")?,
                y2: attr(child, "y2")?,
            },
            "polyline" => ElementKind::Polyline {
                points: child.attribute("points").unwrap_or_default().to_owned(),
            },
            "polygon" => ElementKind::Polygon {
                points: child.attribute("points").unwrap_or_default().to_owned(),
            },
            other => {
                debug!("skipping unsupported element <{other}>");
                continue;
            }
        };

        nodes.push(SvgNode::Leaf(Element { transform, kind }));
    }

    Ok(nodes)
}

/// A numeric attribute; absent defaults to 0.
fn attr(node: roxmltree::Node, name: &str) -> Result<f64> {
    attr_opt(node, name).map(|v| v.unwrap_or(0.0))
}

/// A numeric attribute that distinguishes absent from zero.
fn attr_opt(node: roxmltree::Node, name: &str) -> Result<Option<f64>> {
    match node.attribute(name) {
        Some(raw) => {
            let trimmed = raw.trim().trim_end_matches("px").trim();
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| Error::MalformedSvg(format!("bad attribute {name}=\"{raw}\"")))
        }
        None => Ok(None),
    }
}
