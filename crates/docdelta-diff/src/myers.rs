//! Myers' O(ND) shortest edit script.
//!
//! Implements Eugene Myers' greedy algorithm from "An O(ND) Difference
//! Algorithm and Its Variations" (1986) over arbitrary slices, using a
//! caller-supplied equality predicate instead of `PartialEq`. The result is
//! a flat list of [`EditOp`]s; pairing deletions with insertions into
//! modifications is left to [`crate::sequence`].

/// A single step of an edit script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// The current old item matches the current new item.
    Equal,
    /// The current new item is inserted.
    Insert,
    /// The current old item is deleted.
    Delete,
}

/// Compute the shortest edit script transforming `old` into `new`.
///
/// Shared leading and trailing runs are matched before the search, which
/// keeps the script minimal and reports an edit in the middle of a sequence
/// as one contiguous run between the shared prefix and suffix.
pub fn edit_script<T, F>(old: &[T], new: &[T], mut eq: F) -> Vec<EditOp>
where
    F: FnMut(&T, &T) -> bool,
{
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|&(a, b)| eq(a, b))
        .count();

    let old_rest = &old[prefix..];
    let new_rest = &new[prefix..];
    let suffix = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|&(a, b)| eq(a, b))
        .count();

    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    let mut ops = Vec::with_capacity(old.len() + new.len());
    ops.extend(std::iter::repeat(EditOp::Equal).take(prefix));
    ops.extend(shortest_path(old_mid, new_mid, &mut eq));
    ops.extend(std::iter::repeat(EditOp::Equal).take(suffix));
    ops
}

/// Core greedy search on sequences with no shared prefix or suffix.
fn shortest_path<T, F>(old: &[T], new: &[T], eq: &mut F) -> Vec<EditOp>
where
    F: FnMut(&T, &T) -> bool,
{
    let n = old.len();
    let m = new.len();

    if n == 0 && m == 0 {
        return Vec::new();
    }
    if n == 0 {
        return vec![EditOp::Insert; m];
    }
    if m == 0 {
        return vec![EditOp::Delete; n];
    }

    let max_d = n + m;
    let offset = max_d as isize;
    // v[k + offset] = furthest x reached on diagonal k = x - y.
    let mut v = vec![0isize; 2 * max_d + 2];
    // trace[d] = snapshot of v after the search for edit distance d.
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let (n_i, m_i) = (n as isize, m as isize);

    'search: for d in 0..=max_d as isize {
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;

            while x < n_i && y < m_i && eq(&old[x as usize], &new[y as usize]) {
                x += 1;
                y += 1;
            }
            v[idx] = x;

            if x >= n_i && y >= m_i {
                break 'search;
            }
            k += 2;
        }
        trace.push(v.clone());
    }

    backtrack(&trace, n, m, offset)
}

/// Walk the recorded endpoints from `(n, m)` back to the origin.
fn backtrack(trace: &[Vec<isize>], n: usize, m: usize, offset: isize) -> Vec<EditOp> {
    let mut ops = Vec::with_capacity(n + m);
    let (mut x, mut y) = (n as isize, m as isize);

    // trace.len() is the final edit distance: the last step never pushes.
    for d in (1..=trace.len() as isize).rev() {
        let v = &trace[(d - 1) as usize];
        let k = x - y;
        let down = k == -d
            || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize]);
        let prev_k = if down {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(EditOp::Equal);
            x -= 1;
            y -= 1;
        }
        if x > prev_x {
            ops.push(EditOp::Delete);
        } else {
            ops.push(EditOp::Insert);
        }
        x = prev_x;
        y = prev_y;
    }

    while x > 0 && y > 0 {
        ops.push(EditOp::Equal);
        x -= 1;
        y -= 1;
    }

    ops.reverse();
    ops
}
