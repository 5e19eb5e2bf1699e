//! Per-graph layout configuration.
//!
//! Builds a [`LayoutConfig`] from a graph document's attributes. Every
//! attribute is read through the typed accessors in [`crate::attr`]; values
//! that fail coercion produce at most a warning and fall back to their
//! defaults. Attribute values are in inches where they describe geometry and
//! are converted to points here.

use crate::POINTS_PER_INCH;
use crate::attr::{AttributeStore, double_prefix, int_prefix, map_token, map_token_ci, parse_bool};
use crate::diag::Diagnostics;
use crate::graph::GraphDoc;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::BitOr;

pub const DEFAULT_NODESEP: f64 = 0.25;
pub const MIN_NODESEP: f64 = 0.02;
pub const DEFAULT_RANKSEP: f64 = 0.5;
pub const MIN_RANKSEP: f64 = 0.02;
pub const DEFAULT_FONTSIZE: f64 = 14.0;
pub const MIN_FONTSIZE: f64 = 1.0;
pub const DEFAULT_FONTNAME: &str = "Times-Roman";
pub const DEFAULT_COLOR: &str = "black";

/// Padding added around a reserved label on each axis.
const LABEL_GAP: f64 = 4.0;

pub fn points(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pointf {
    pub x: f64,
    pub y: f64,
}

/// A drawing or page size in points. `hard_limit` is set by the trailing `!`
/// marker: the size must not be exceeded rather than being a hint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeSpec {
    pub width: f64,
    pub height: f64,
    pub hard_limit: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rankdir {
    #[default]
    TopToBottom,
    LeftToRight,
    BottomToTop,
    RightToLeft,
}

impl Rankdir {
    fn from_attr(value: Option<&str>) -> Self {
        map_token(
            value,
            &[
                ("LR", Rankdir::LeftToRight),
                ("BT", Rankdir::BottomToTop),
                ("RL", Rankdir::RightToLeft),
            ],
            Rankdir::TopToBottom,
        )
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            1 => Rankdir::LeftToRight,
            2 => Rankdir::BottomToTop,
            3 => Rankdir::RightToLeft,
            _ => Rankdir::TopToBottom,
        }
    }
}

/// Requested and effective rank direction packed into adjacent bit-fields:
/// the effective direction (what layout actually uses) in the low two bits,
/// the requested direction (what the attribute said) in the next two.
///
/// When the caller opted out of honoring the request, the effective field is
/// forced to top-to-bottom while the requested field still records the
/// attribute value for consumers that need it.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RankdirPack(u8);

impl RankdirPack {
    pub fn new(requested: Rankdir, use_requested: bool) -> Self {
        let req = requested as u8;
        let eff = if use_requested { req } else { 0 };
        Self(req << 2 | eff)
    }

    pub fn effective(self) -> Rankdir {
        Rankdir::from_bits(self.0)
    }

    pub fn requested(self) -> Rankdir {
        Rankdir::from_bits(self.0 >> 2)
    }

    /// Whether ranks run horizontally, swapping label border slots.
    pub fn flipped(self) -> bool {
        matches!(
            self.effective(),
            Rankdir::LeftToRight | Rankdir::RightToLeft
        )
    }
}

impl fmt::Debug for RankdirPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankdirPack")
            .field("requested", &self.requested())
            .field("effective", &self.effective())
            .finish()
    }
}

impl Serialize for RankdirPack {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Pack {
            requested: Rankdir,
            effective: Rankdir,
        }
        Pack {
            requested: self.requested(),
            effective: self.effective(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMode {
    #[default]
    Local,
    Global,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ratio {
    Auto,
    Compress,
    Expand,
    Fill,
    Value(f64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontNameKind {
    Native,
    Ps,
    Svg,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Big5,
}

impl Charset {
    pub fn canonical_name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Big5 => "BIG-5",
        }
    }
}

const CHARSET_ALIASES: &[(&str, Charset)] = &[
    ("utf-8", Charset::Utf8),
    ("utf8", Charset::Utf8),
    ("latin-1", Charset::Latin1),
    ("latin1", Charset::Latin1),
    ("l1", Charset::Latin1),
    ("ISO-8859-1", Charset::Latin1),
    ("ISO_8859-1", Charset::Latin1),
    ("ISO8859-1", Charset::Latin1),
    ("ISO-IR-100", Charset::Latin1),
    ("big-5", Charset::Big5),
    ("big5", Charset::Big5),
];

/// Charset attribute lookup: case-insensitive alias match, with a warning
/// and a UTF-8 fallback for unsupported values.
pub fn charset_from_attr(value: Option<&str>, diag: &Diagnostics) -> Charset {
    let Some(p) = value.filter(|v| !v.is_empty()) else {
        return Charset::Utf8;
    };
    if let Some((_, charset)) = CHARSET_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(p))
    {
        return *charset;
    }
    diag.warning(format_args!("Unsupported charset \"{p}\" - assuming utf-8"));
    Charset::Utf8
}

/// Label position flags: one of top/bottom, optionally one of left/right
/// (centered when neither is set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelPos(u8);

impl LabelPos {
    pub const TOP: LabelPos = LabelPos(1);
    pub const BOTTOM: LabelPos = LabelPos(2);
    pub const LEFT: LabelPos = LabelPos(4);
    pub const RIGHT: LabelPos = LabelPos(8);

    pub fn contains(self, other: LabelPos) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LabelPos {
    type Output = LabelPos;

    fn bitor(self, rhs: LabelPos) -> LabelPos {
        LabelPos(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLabel {
    pub text: String,
    pub font_size: f64,
    pub font_name: String,
    pub font_color: String,
    pub pos: LabelPos,
    /// Estimated size in points, before padding.
    pub dimen: Pointf,
}

/// Border slot indices for reserved label space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    Bottom = 0,
    Left = 1,
    Top = 2,
    Right = 3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutConfig {
    pub node_sep: f64,
    pub rank_sep: f64,
    pub exact_ranksep: bool,
    pub size: Option<SizeSpec>,
    pub page: Option<SizeSpec>,
    pub dpi: f64,
    pub quantum: f64,
    pub rankdir: RankdirPack,
    pub cluster_mode: ClusterMode,
    pub ratio: Option<Ratio>,
    pub fontnames: FontNameKind,
    pub centered: bool,
    pub landscape: bool,
    pub concentrate: bool,
    pub reduce: bool,
    pub charset: Charset,
    pub show_boxes: i64,
    pub label: Option<GraphLabel>,
    /// Space reserved for subgraph labels, indexed by [`BorderSide`].
    pub border: [Pointf; 4],
    pub id: Option<String>,
    pub font_path: Option<String>,
    pub image_path: Option<String>,
}

/// Caller-supplied knobs for one graph's initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitContext<'a> {
    /// Honor the requested rank direction. Engines that do not rank simply
    /// force the effective direction to top-to-bottom.
    pub use_rankdir: bool,
    pub reduce: bool,
    /// Set when running under a server; suppresses the `imagepath` lookup so
    /// request-driven environments cannot inject filesystem paths.
    pub server_context: bool,
    pub font_path_override: Option<&'a str>,
}

/// Populates a [`LayoutConfig`] from a root graph document.
///
/// Labels of the document's immediate subgraphs reserve space in this
/// config's border slots; the subgraphs' own configurations are the layout
/// engine's concern.
pub fn init_graph_config(doc: &GraphDoc, ctx: &InitContext<'_>, diag: &Diagnostics) -> LayoutConfig {
    let attrs = &doc.attrs;
    let mut cfg = LayoutConfig::default();

    // set up early in case label sizing ever needs it
    cfg.font_path = attrs
        .get_nonempty("fontpath")
        .or(ctx.font_path_override)
        .map(str::to_string);

    cfg.charset = charset_from_attr(attrs.get("charset"), diag);

    if !ctx.server_context {
        cfg.image_path = attrs.get_nonempty("imagepath").map(str::to_string);
    }

    cfg.quantum = attrs.get_double("quantum", 0.0, 0.0);
    cfg.rankdir = RankdirPack::new(Rankdir::from_attr(attrs.get("rankdir")), ctx.use_rankdir);
    cfg.node_sep = points(attrs.get_double("nodesep", DEFAULT_NODESEP, MIN_NODESEP));

    let ranksep = match attrs.get("ranksep") {
        Some(p) => {
            if p.contains("equally") {
                cfg.exact_ranksep = true;
            }
            match double_prefix(p) {
                Some(v) if v < MIN_RANKSEP => MIN_RANKSEP,
                Some(v) => v,
                None => DEFAULT_RANKSEP,
            }
        }
        None => DEFAULT_RANKSEP,
    };
    cfg.rank_sep = points(ranksep);

    cfg.show_boxes = attrs.get_int("showboxes", 0, 0);
    cfg.fontnames = map_token(
        attrs.get("fontnames"),
        &[
            ("gd", FontNameKind::Native),
            ("ps", FontNameKind::Ps),
            ("svg", FontNameKind::Svg),
        ],
        FontNameKind::None,
    );

    cfg.ratio = ratio_from_attr(attrs.get("ratio"));
    cfg.size = attrs.get_dimension("size").map(SizeSpec::from_inches);
    cfg.page = attrs.get_dimension("page").map(SizeSpec::from_inches);

    cfg.centered = attrs.get_bool("center", false);

    if let Some(p) = attrs.get("rotate") {
        cfg.landscape = int_prefix(p) == Some(90);
    } else if let Some(p) = attrs.get("orientation") {
        cfg.landscape = p.starts_with(['l', 'L']);
    } else if let Some(p) = attrs.get("landscape") {
        cfg.landscape = parse_bool(Some(p)).unwrap_or(false);
    }

    cfg.cluster_mode = map_token_ci(
        attrs.get("clusterrank"),
        &[
            ("local", ClusterMode::Local),
            ("global", ClusterMode::Global),
            ("none", ClusterMode::None),
        ],
        ClusterMode::Local,
    );
    cfg.concentrate = attrs.get_bool("concentrate", false);
    cfg.reduce = ctx.reduce;

    cfg.dpi = attrs
        .get_nonempty("dpi")
        .or_else(|| attrs.get_nonempty("resolution"))
        .and_then(double_prefix)
        .unwrap_or(0.0);

    cfg.label = init_graph_label(attrs, true);

    for sub in &doc.subgraphs {
        if let Some(label) = init_graph_label(&sub.attrs, false) {
            let flipped = cfg.rankdir.flipped();
            reserve_label_border(&mut cfg, &label, flipped);
        }
    }

    if let Some(id) = attrs.get_nonempty("id") {
        cfg.id = Some(id.to_string());
    }

    cfg
}

impl SizeSpec {
    fn from_inches(d: crate::attr::Dimension) -> Self {
        Self {
            width: points(d.x),
            height: points(d.y),
            hard_limit: d.hard_limit,
        }
    }
}

/// `ratio` attribute: single-character dispatch on the first letter for the
/// named policies; anything else falls through to a numeric parse where a
/// positive value selects a fixed aspect ratio.
fn ratio_from_attr(value: Option<&str>) -> Option<Ratio> {
    let p = value.filter(|v| !v.is_empty())?;
    match p.as_bytes()[0] {
        b'a' => (p == "auto").then_some(Ratio::Auto),
        b'c' => (p == "compress").then_some(Ratio::Compress),
        b'e' => (p == "expand").then_some(Ratio::Expand),
        b'f' => (p == "fill").then_some(Ratio::Fill),
        _ => match double_prefix(p) {
            Some(v) if v > 0.0 => Some(Ratio::Value(v)),
            _ => None,
        },
    }
}

/// Builds the label descriptor for a graph, if its `label` attribute is
/// non-empty. A root graph defaults the label to the bottom unless `t` was
/// requested; a subgraph defaults to the top unless `b` was requested.
pub fn init_graph_label(attrs: &AttributeStore, is_root: bool) -> Option<GraphLabel> {
    let text = attrs.get_nonempty("label")?;
    let font_size = attrs.get_double("fontsize", DEFAULT_FONTSIZE, MIN_FONTSIZE);
    let font_name = attrs.get_nonempty("fontname").unwrap_or(DEFAULT_FONTNAME);
    let font_color = attrs.get_nonempty("fontcolor").unwrap_or(DEFAULT_COLOR);

    let loc = attrs.get("labelloc");
    let mut pos = if is_root {
        if loc.is_some_and(|p| p.starts_with('t')) {
            LabelPos::TOP
        } else {
            LabelPos::BOTTOM
        }
    } else if loc.is_some_and(|p| p.starts_with('b')) {
        LabelPos::BOTTOM
    } else {
        LabelPos::TOP
    };
    if let Some(just) = attrs.get("labeljust") {
        if just.starts_with('l') {
            pos = pos | LabelPos::LEFT;
        } else if just.starts_with('r') {
            pos = pos | LabelPos::RIGHT;
        }
    }

    Some(GraphLabel {
        text: text.to_string(),
        font_size,
        font_name: font_name.to_string(),
        font_color: font_color.to_string(),
        pos,
        dimen: estimate_label_size(text, font_size),
    })
}

/// Deterministic stand-in for text shaping: width scales with the widest
/// line, height with the line count.
fn estimate_label_size(text: &str, font_size: f64) -> Pointf {
    let mut lines = 0usize;
    let mut widest = 0usize;
    for line in text.split('\n') {
        lines += 1;
        widest = widest.max(line.chars().count());
    }
    Pointf {
        x: widest as f64 * font_size * 0.65,
        y: lines as f64 * font_size * 1.2,
    }
}

/// Reserves a subgraph label's padded size in one of the parent's border
/// slots, picked by the label position. When the parent's drawing is
/// flipped the vertical slots trade places with the horizontal ones and the
/// reserved extent is transposed; the labels themselves are restored to top
/// or bottom after rotation.
pub fn reserve_label_border(parent: &mut LayoutConfig, label: &GraphLabel, flipped: bool) {
    let mut dimen = label.dimen;
    dimen.x += 2.0 * LABEL_GAP;
    dimen.y += 2.0 * LABEL_GAP;
    if !flipped {
        let side = if label.pos.contains(LabelPos::TOP) {
            BorderSide::Top
        } else {
            BorderSide::Bottom
        };
        parent.border[side as usize] = dimen;
    } else {
        let side = if label.pos.contains(LabelPos::TOP) {
            BorderSide::Right
        } else {
            BorderSide::Left
        };
        parent.border[side as usize] = Pointf {
            x: dimen.y,
            y: dimen.x,
        };
    }
}
