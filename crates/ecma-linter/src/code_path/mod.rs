//! Control-flow code paths.
//!
//! A code path is built for the program and for every function-like node.
//! It is a graph of segments (basic blocks): each segment records its
//! predecessors, successors, and whether it is reachable from the path's
//! initial segment. Loop back-edges are reported as events rather than
//! stored as successors, keeping the stored graph acyclic.
//!
//! The analyzer (see [`analyzer`]) drives segment creation from the AST
//! walk and emits the synthetic code-path events interleaved with node
//! events in the documented order.

pub mod analyzer;

use ecma_ast::NodeId;

pub use analyzer::CodePathAnalyzer;

/// Index of a segment within its [`CodePath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(u32);

impl SegmentId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What opened a code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePathOrigin {
    Program,
    Function,
}

/// A basic block of a code path.
#[derive(Debug)]
pub struct CodePathSegment {
    /// Human-readable id, unique within the path (`s1_0`, `s1_1`, …).
    pub id: String,
    /// Whether any chain of predecessors connects this segment to the
    /// path's initial segment.
    pub reachable: bool,
    /// Predecessor segments (loop back-edges excluded).
    pub prev: Vec<SegmentId>,
    /// Successor segments (loop back-edges excluded).
    pub next: Vec<SegmentId>,
}

/// An intra-procedural control-flow graph.
#[derive(Debug)]
pub struct CodePath {
    /// Path id, unique within one lint run (`p1`, `p2`, …).
    pub id: String,
    pub origin: CodePathOrigin,
    /// The `Program` or function node that opened the path.
    pub root_node: NodeId,
    pub initial_segment: SegmentId,
    /// Segments that flow off the end of the path.
    pub final_segments: Vec<SegmentId>,
    /// Segments ended by an explicit `return`.
    pub returned_segments: Vec<SegmentId>,
    /// Segments ended by a `throw`.
    pub thrown_segments: Vec<SegmentId>,
    segments: Vec<CodePathSegment>,
}

impl CodePath {
    pub(crate) fn new(id: String, origin: CodePathOrigin, root_node: NodeId) -> Self {
        let mut path = Self {
            id,
            origin,
            root_node,
            initial_segment: SegmentId(0),
            final_segments: Vec::new(),
            returned_segments: Vec::new(),
            thrown_segments: Vec::new(),
            segments: Vec::new(),
        };
        path.initial_segment = path.add_segment(true, &[]);
        path
    }

    pub(crate) fn add_segment(&mut self, reachable: bool, prev: &[SegmentId]) -> SegmentId {
        let id = SegmentId(u32::try_from(self.segments.len()).unwrap_or(u32::MAX));
        let reachable = reachable || prev.iter().any(|p| self.segment(*p).reachable);
        self.segments.push(CodePathSegment {
            id: format!("{}_{}", self.id, self.segments.len()),
            reachable,
            prev: prev.to_vec(),
            next: Vec::new(),
        });
        for p in prev {
            self.segments[p.index()].next.push(id);
        }
        id
    }

    #[must_use]
    pub fn segment(&self, id: SegmentId) -> &CodePathSegment {
        &self.segments[id.index()]
    }

    pub fn segments(&self) -> impl Iterator<Item = &CodePathSegment> {
        self.segments.iter()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// A synthetic code-path event, delivered interleaved with node events.
#[derive(Debug)]
pub enum PathEvent<'p> {
    Start {
        path: &'p CodePath,
        node: NodeId,
    },
    End {
        path: &'p CodePath,
        node: NodeId,
    },
    SegmentStart {
        path: &'p CodePath,
        segment: SegmentId,
        node: NodeId,
    },
    SegmentEnd {
        path: &'p CodePath,
        segment: SegmentId,
        node: NodeId,
    },
    SegmentLoop {
        path: &'p CodePath,
        from: SegmentId,
        to: SegmentId,
        node: NodeId,
    },
}

impl PathEvent<'_> {
    #[must_use]
    pub const fn kind(&self) -> PathEventKind {
        match self {
            Self::Start { .. } => PathEventKind::Start,
            Self::End { .. } => PathEventKind::End,
            Self::SegmentStart { .. } => PathEventKind::SegmentStart,
            Self::SegmentEnd { .. } => PathEventKind::SegmentEnd,
            Self::SegmentLoop { .. } => PathEventKind::SegmentLoop,
        }
    }
}

/// The reserved listener keys rules subscribe to for code-path events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathEventKind {
    Start,
    End,
    SegmentStart,
    SegmentEnd,
    SegmentLoop,
}

impl PathEventKind {
    /// The reserved listener key for this event kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Start => "onCodePathStart",
            Self::End => "onCodePathEnd",
            Self::SegmentStart => "onCodePathSegmentStart",
            Self::SegmentEnd => "onCodePathSegmentEnd",
            Self::SegmentLoop => "onCodePathSegmentLoop",
        }
    }

    /// Map a reserved listener key to its event kind.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "onCodePathStart" => Some(Self::Start),
            "onCodePathEnd" => Some(Self::End),
            "onCodePathSegmentStart" => Some(Self::SegmentStart),
            "onCodePathSegmentEnd" => Some(Self::SegmentEnd),
            "onCodePathSegmentLoop" => Some(Self::SegmentLoop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_reachability_propagates() {
        let mut path = CodePath::new("p1".to_string(), CodePathOrigin::Program, NodeId::from_raw(0));
        let initial = path.initial_segment;
        let next = path.add_segment(false, &[initial]);
        assert!(path.segment(next).reachable, "reachable predecessor");

        let orphan = path.add_segment(false, &[]);
        assert!(!path.segment(orphan).reachable, "no predecessors");

        let after_orphan = path.add_segment(false, &[orphan]);
        assert!(!path.segment(after_orphan).reachable);

        let rejoined = path.add_segment(false, &[next, orphan]);
        assert!(path.segment(rejoined).reachable, "any reachable predecessor");
    }

    #[test]
    fn test_prev_next_links() {
        let mut path = CodePath::new("p1".to_string(), CodePathOrigin::Program, NodeId::from_raw(0));
        let initial = path.initial_segment;
        let a = path.add_segment(false, &[initial]);
        let b = path.add_segment(false, &[initial]);
        assert_eq!(path.segment(initial).next, vec![a, b]);
        assert_eq!(path.segment(a).prev, vec![initial]);
    }

    #[test]
    fn test_reserved_keys() {
        assert_eq!(
            PathEventKind::from_key("onCodePathStart"),
            Some(PathEventKind::Start)
        );
        assert_eq!(
            PathEventKind::from_key("onCodePathSegmentLoop"),
            Some(PathEventKind::SegmentLoop)
        );
        assert_eq!(PathEventKind::from_key("Identifier"), None);
    }
}
