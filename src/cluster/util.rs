/// `n * (n + 1) / 2`.
#[inline]
pub fn triangular_number(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Decode a cell number into `(row, col)` of a lower-triangular matrix that
/// includes the diagonal, enumerated row by row.
///
/// `0 -> (0, 0)`, `1 -> (1, 0)`, `2 -> (1, 1)`, `3 -> (2, 0)`, ... The result
/// always satisfies `col <= row`; `col == row` marks a self pair.
pub fn gauss_pair(i: usize) -> (usize, usize) {
    // Inverse of the triangular number, then correct for float rounding.
    let mut row = ((2.0 * i as f64 + 0.25).sqrt() - 0.5) as usize;
    while triangular_number(row) > i {
        row -= 1;
    }
    while triangular_number(row + 1) <= i {
        row += 1;
    }
    (row, i - triangular_number(row))
}

/// Inverse of [`gauss_pair`]. Expects `col <= row`.
#[inline]
pub fn pair_index(row: usize, col: usize) -> usize {
    debug_assert!(col <= row);
    triangular_number(row) + col
}

/// Number of unordered pairs of distinct elements among `n`.
#[inline]
pub fn num_pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
