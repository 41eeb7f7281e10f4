//! Layout parser (component D).
//!
//! Parses the multiplexer's compact layout string (checksum already
//! stripped by the caller) into a tree of horizontal/vertical splits and
//! leaf panes. See spec §4.D for the grammar.

use crate::error::{CoreError, CoreResult};

/// A node in a parsed layout tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    /// A leaf pane occupying a rectangular region.
    Leaf {
        /// Numeric pane id (without the `%` prefix).
        pane_id: u32,
        /// Width in cells.
        w: u16,
        /// Height in cells.
        h: u16,
        /// X offset in cells.
        x: u16,
        /// Y offset in cells.
        y: u16,
    },
    /// Children arranged side-by-side (left to right).
    HSplit {
        /// Child nodes, left to right.
        children: Vec<LayoutNode>,
        /// Width in cells.
        w: u16,
        /// Height in cells.
        h: u16,
        /// X offset in cells.
        x: u16,
        /// Y offset in cells.
        y: u16,
    },
    /// Children stacked top to bottom.
    VSplit {
        /// Child nodes, top to bottom.
        children: Vec<LayoutNode>,
        /// Width in cells.
        w: u16,
        /// Height in cells.
        h: u16,
        /// X offset in cells.
        x: u16,
        /// Y offset in cells.
        y: u16,
    },
}

impl LayoutNode {
    /// Width in cells, regardless of node kind.
    #[must_use]
    pub fn w(&self) -> u16 {
        match self {
            Self::Leaf { w, .. } | Self::HSplit { w, .. } | Self::VSplit { w, .. } => *w,
        }
    }

    /// Height in cells, regardless of node kind.
    #[must_use]
    pub fn h(&self) -> u16 {
        match self {
            Self::Leaf { h, .. } | Self::HSplit { h, .. } | Self::VSplit { h, .. } => *h,
        }
    }

    /// Collects every leaf pane id in the tree, depth-first.
    #[must_use]
    pub fn leaf_pane_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        self.collect_leaf_ids(&mut ids);
        ids
    }

    fn collect_leaf_ids(&self, out: &mut Vec<u32>) {
        match self {
            Self::Leaf { pane_id, .. } => out.push(*pane_id),
            Self::HSplit { children, .. } | Self::VSplit { children, .. } => {
                for child in children {
                    child.collect_leaf_ids(out);
                }
            }
        }
    }

    /// Re-serializes this node back into the compact layout string form
    /// (without a checksum prefix). Used for the round-trip property
    /// test and for debugging.
    #[must_use]
    pub fn to_layout_string(&self) -> String {
        match self {
            Self::Leaf { pane_id, w, h, x, y } => format!("{w}x{h},{x},{y},{pane_id}"),
            Self::HSplit { children, w, h, x, y } => {
                let inner: Vec<String> = children.iter().map(Self::to_layout_string).collect();
                format!("{w}x{h},{x},{y}{{{}}}", inner.join(","))
            }
            Self::VSplit { children, w, h, x, y } => {
                let inner: Vec<String> = children.iter().map(Self::to_layout_string).collect();
                format!("{w}x{h},{x},{y}[{}]", inner.join(","))
            }
        }
    }
}

/// Strips a leading 4-hex-digit checksum and its following comma from a
/// raw `%layout-change` layout string, if present. Layout strings handed
/// to [`parse_layout`] directly (e.g. in tests) typically already omit it.
#[must_use]
pub fn strip_checksum(input: &str) -> &str {
    if let Some(idx) = input.find(',') {
        let (prefix, rest) = input.split_at(idx);
        if prefix.len() == 4 && !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return &rest[1..];
        }
    }
    input
}

/// Parses a compact layout string (checksum already stripped) into a
/// [`LayoutNode`] tree.
pub fn parse_layout(input: &str) -> CoreResult<LayoutNode> {
    let mut cursor = Cursor::new(input);
    let node = cursor.parse_node()?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(CoreError::ProtocolError(format!(
            "trailing garbage in layout string: {:?}",
            cursor.remainder()
        )));
    }
    Ok(node)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { bytes: input.as_bytes(), pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn remainder(&self) -> &str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, ch: u8) -> CoreResult<()> {
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(CoreError::ProtocolError(format!(
                "expected '{}' at offset {}, found {:?}",
                ch as char,
                self.pos,
                self.peek().map(|b| b as char)
            )))
        }
    }

    fn parse_digits(&mut self) -> CoreResult<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(CoreError::ProtocolError(format!(
                "expected digits at offset {start}"
            )));
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CoreError::ProtocolError(format!("invalid number at offset {start}")))
    }

    fn parse_u16(&mut self) -> CoreResult<u16> {
        let v = self.parse_digits()?;
        u16::try_from(v)
            .map_err(|_| CoreError::ProtocolError(format!("dimension out of range: {v}")))
    }

    /// `dims := DIGIT+ 'x' DIGIT+`
    fn parse_dims(&mut self) -> CoreResult<(u16, u16)> {
        let w = self.parse_u16()?;
        self.expect(b'x')?;
        let h = self.parse_u16()?;
        Ok((w, h))
    }

    /// `pos := DIGIT+ ',' DIGIT+`
    fn parse_pos(&mut self) -> CoreResult<(u16, u16)> {
        let x = self.parse_u16()?;
        self.expect(b',')?;
        let y = self.parse_u16()?;
        Ok((x, y))
    }

    /// `layout := dims ',' pos ( '{' children '}' | '[' children ']' | ',' paneId )`
    fn parse_node(&mut self) -> CoreResult<LayoutNode> {
        let (w, h) = self.parse_dims()?;
        self.expect(b',')?;
        let (x, y) = self.parse_pos()?;

        match self.peek() {
            Some(b'{') => {
                self.pos += 1;
                let children = self.parse_children(b'}')?;
                Ok(LayoutNode::HSplit { children, w, h, x, y })
            }
            Some(b'[') => {
                self.pos += 1;
                let children = self.parse_children(b']')?;
                Ok(LayoutNode::VSplit { children, w, h, x, y })
            }
            Some(b',') => {
                self.pos += 1;
                let pane_id = self.parse_digits()?;
                Ok(LayoutNode::Leaf { pane_id, w, h, x, y })
            }
            other => Err(CoreError::ProtocolError(format!(
                "expected '{{', '[' or ',' at offset {}, found {:?}",
                self.pos,
                other.map(|b| b as char)
            ))),
        }
    }

    /// `children := layout (',' layout)*`
    fn parse_children(&mut self, closing: u8) -> CoreResult<Vec<LayoutNode>> {
        let mut children = vec![self.parse_node()?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            children.push(self.parse_node()?);
        }
        self.expect(closing)?;
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_leaf() {
        let tree = parse_layout("80x24,0,0,0").unwrap();
        assert_eq!(
            tree,
            LayoutNode::Leaf { pane_id: 0, w: 80, h: 24, x: 0, y: 0 }
        );
    }

    #[test]
    fn parses_hsplit() {
        let tree = parse_layout("161x49,0,0{80x49,0,0,0,80x49,81,0,1}").unwrap();
        match tree {
            LayoutNode::HSplit { children, w, h, x, y } => {
                assert_eq!((w, h, x, y), (161, 49, 0, 0));
                assert_eq!(children.len(), 2);
                assert_eq!(children[0].w(), 80);
                assert_eq!(children[1].w(), 80);
            }
            other => panic!("expected HSplit, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_vsplit_inside_hsplit() {
        let tree = parse_layout(
            "161x49,0,0{80x49,0,0,0,80x49,81,0[80x24,81,0,1,80x24,81,25,2]}",
        )
        .unwrap();
        let ids = tree.leaf_pane_ids();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn round_trip_single_leaf() {
        let original = "80x24,0,0,0";
        let tree = parse_layout(original).unwrap();
        assert_eq!(tree.to_layout_string(), original);
        let reparsed = parse_layout(&tree.to_layout_string()).unwrap();
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn round_trip_nested_tree() {
        let original = "161x49,0,0{80x49,0,0,0,80x49,81,0[80x24,81,0,1,80x24,81,25,2]}";
        let tree = parse_layout(original).unwrap();
        let reparsed = parse_layout(&tree.to_layout_string()).unwrap();
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn hsplit_width_invariant_holds_for_real_string() {
        let tree = parse_layout("161x49,0,0{80x49,0,0,0,80x49,81,0,1}").unwrap();
        if let LayoutNode::HSplit { children, w, .. } = &tree {
            let sum: u32 = children.iter().map(|c| c.w() as u32).sum();
            assert_eq!(w.to_owned() as u32, sum + (children.len() as u32 - 1));
        } else {
            panic!("expected HSplit");
        }
    }

    #[test]
    fn strip_checksum_removes_leading_hex_prefix() {
        assert_eq!(strip_checksum("a1b2,80x24,0,0,0"), "80x24,0,0,0");
    }

    #[test]
    fn strip_checksum_leaves_string_without_checksum_untouched() {
        assert_eq!(strip_checksum("80x24,0,0,0"), "80x24,0,0,0");
    }

    #[test]
    fn trailing_garbage_is_protocol_error() {
        assert!(parse_layout("80x24,0,0,0 garbage").is_err());
    }

    #[test]
    fn missing_closing_brace_is_protocol_error() {
        assert!(parse_layout("161x49,0,0{80x49,0,0,0").is_err());
    }

    // Generates synthetic layout strings that satisfy the HSplit/VSplit
    // width/height sum invariant by construction, for the property tests
    // below (invariants 1 and 2 from spec §8).
    fn arb_leaf(w: u16, h: u16, x: u16, y: u16, id: u32) -> LayoutNode {
        LayoutNode::Leaf { pane_id: id, w, h, x, y }
    }

    #[test]
    fn prop_hsplit_and_vsplit_invariants_and_round_trip() {
        // Two leaves side by side sharing one border column.
        let left = arb_leaf(40, 24, 0, 0, 0);
        let right = arb_leaf(39, 24, 41, 0, 1);
        let hsplit = LayoutNode::HSplit { children: vec![left, right], w: 80, h: 24, x: 0, y: 0 };

        let sum_w: u32 = match &hsplit {
            LayoutNode::HSplit { children, .. } => children.iter().map(|c| c.w() as u32).sum(),
            _ => unreachable!(),
        };
        assert_eq!(hsplit.w() as u32, sum_w + 1);

        let s = hsplit.to_layout_string();
        let reparsed = parse_layout(&s).unwrap();
        assert_eq!(reparsed, hsplit);

        let top = arb_leaf(80, 11, 0, 0, 0);
        let bottom = arb_leaf(80, 12, 0, 12, 1);
        let vsplit = LayoutNode::VSplit { children: vec![top, bottom], w: 80, h: 24, x: 0, y: 0 };
        let sum_h: u32 = match &vsplit {
            LayoutNode::VSplit { children, .. } => children.iter().map(|c| c.h() as u32).sum(),
            _ => unreachable!(),
        };
        assert_eq!(vsplit.h() as u32, sum_h + 1);

        let s = vsplit.to_layout_string();
        let reparsed = parse_layout(&s).unwrap();
        assert_eq!(reparsed, vsplit);
    }

    proptest::proptest! {
        #[test]
        fn prop_leaf_round_trip(w in 1u16..500, h in 1u16..500, x in 0u16..500, y in 0u16..500, id in 0u32..1000) {
            let leaf = arb_leaf(w, h, x, y, id);
            let s = leaf.to_layout_string();
            let reparsed = parse_layout(&s).unwrap();
            proptest::prop_assert_eq!(reparsed, leaf);
        }
    }
}
