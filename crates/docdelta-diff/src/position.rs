//! Position bookkeeping shared by the diff layers.
//!
//! Every record is expressed in the old document's coordinate space. An
//! inserted item has no old position of its own, so it is anchored on the
//! old item that precedes the insertion point.

/// An item that occupies a span of the flat document coordinate space.
pub trait Positioned {
    /// Absolute position of the item's opening token.
    fn pos(&self) -> usize;
    /// Tree depth (0 = direct child of the root).
    fn depth(&self) -> usize;
    /// Number of positions the item occupies.
    fn node_size(&self) -> usize;
}

/// Anchor for an item inserted at `depth` after `previous`.
///
/// A sibling at the same depth is skipped over entirely; a previous item at
/// another depth is the container being entered, so the anchor is its first
/// content position. Insertions at the very start anchor at 0.
pub fn insertion_anchor<P: Positioned + ?Sized>(previous: Option<&P>, depth: usize) -> usize {
    match previous {
        Some(prev) if prev.depth() == depth => prev.pos() + prev.node_size(),
        Some(prev) => prev.pos() + 1,
        None => 0,
    }
}

/// Map an index into a flattened old sequence to an absolute offset.
///
/// An index one past the end (a trailing insertion) maps to `end_pos`.
pub fn index_to_offset<T>(
    items: &[T],
    index: usize,
    end_pos: usize,
    offset_of: impl Fn(&T) -> usize,
) -> usize {
    items.get(index).map(offset_of).unwrap_or(end_pos)
}
