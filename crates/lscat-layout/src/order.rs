#![forbid(unsafe_code)]

//! Canonical emission order.
//!
//! In a grouped batch the first `headers` indices are header items and the
//! rest are children. Items must be shown one header at a time, each followed
//! by its children:
//!
//! ```text
//! headers = 30, group_size = 4
//! 0, 30, 31, 32, 1, 33, 34, 35, 2, 36, 37, 38, ...
//! ```
//!
//! With no headers the order is the identity.

use std::fmt;

/// Emission order for `total` items of which the first `headers` are headers.
///
/// Each header is followed by up to `group_size - 1` children in ascending
/// order. Children left over once the headers run out follow in ascending
/// order.
///
/// # Errors
///
/// [`OrderError::ZeroGroupSize`] when `group_size == 0`, and
/// [`OrderError::TooManyHeaders`] when `headers > total`.
pub fn canonical_order(
    total: usize,
    headers: usize,
    group_size: usize,
) -> Result<Vec<usize>, OrderError> {
    if group_size == 0 {
        return Err(OrderError::ZeroGroupSize);
    }
    if headers > total {
        return Err(OrderError::TooManyHeaders { headers, total });
    }

    let children_per_group = group_size - 1;
    let mut order = Vec::with_capacity(total);
    let mut children = headers..total;

    for header in 0..headers {
        order.push(header);
        order.extend(children.by_ref().take(children_per_group));
    }
    order.extend(children);

    debug_assert_eq!(order.len(), total);
    Ok(order)
}

/// `0..total`, the order of an ungrouped batch.
pub fn identity_order(total: usize) -> Vec<usize> {
    (0..total).collect()
}

/// Invalid Order Generator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    /// A group must hold at least its header.
    ZeroGroupSize,
    /// More headers than items.
    TooManyHeaders { headers: usize, total: usize },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGroupSize => write!(f, "group size must be at least 1"),
            Self::TooManyHeaders { headers, total } => {
                write!(f, "{headers} headers do not fit in a batch of {total} items")
            }
        }
    }
}

impl std::error::Error for OrderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_headers_with_three_children() {
        let order = canonical_order(120, 30, 4).unwrap();
        assert_eq!(&order[..12], &[0, 30, 31, 32, 1, 33, 34, 35, 2, 36, 37, 38]);
        assert_eq!(&order[116..], &[29, 117, 118, 119]);
    }

    #[test]
    fn no_headers_is_identity() {
        assert_eq!(canonical_order(30, 0, 4).unwrap(), identity_order(30));
    }

    #[test]
    fn group_size_one_is_all_headers() {
        assert_eq!(canonical_order(3, 3, 1).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn short_last_group() {
        // Three headers but only five children instead of six.
        assert_eq!(
            canonical_order(8, 3, 3).unwrap(),
            vec![0, 3, 4, 1, 5, 6, 2, 7]
        );
    }

    #[test]
    fn leftover_children_trail() {
        assert_eq!(canonical_order(6, 1, 2).unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(canonical_order(7, 2, 2).unwrap(), vec![0, 2, 1, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_batch() {
        assert!(canonical_order(0, 0, 4).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(canonical_order(4, 1, 0), Err(OrderError::ZeroGroupSize));
        assert_eq!(
            canonical_order(4, 5, 4),
            Err(OrderError::TooManyHeaders {
                headers: 5,
                total: 4
            })
        );
    }
}
