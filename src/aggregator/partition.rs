/// The bad-vote matrix of one data partition.
///
/// `votes[row * n_classes + class]` counts the trees that put `row`
/// in the wrong `class`. Cells only ever grow.
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    n_rows: usize,
    n_classes: usize,
    votes: Vec<u32>,
}


impl Partition {
    pub(crate) fn new(n_rows: usize, n_classes: usize) -> Self {
        Self { n_rows, n_classes, votes: vec![0; n_rows * n_classes] }
    }


    #[inline]
    pub(crate) fn n_rows(&self) -> usize {
        self.n_rows
    }


    #[inline]
    pub(crate) fn add(&mut self, row: usize, class: usize) {
        self.votes[row * self.n_classes + class] += 1;
    }


    #[inline]
    pub(crate) fn row(&self, row: usize) -> &[u32] {
        let start = row * self.n_classes;
        &self.votes[start..start + self.n_classes]
    }


    /// Returns the number of rows the majority of `n_trees` trees
    /// gets wrong.
    pub(crate) fn bad_rows(&self, n_trees: usize) -> usize {
        (0..self.n_rows).filter(|&row| is_bad(self.row(row), n_trees))
            .count()
    }
}


/// A row is good iff the trees voting for its true class
/// strictly outnumber the most popular wrong class.
/// The most popular wrong class is the first maximum of a linear scan.
#[inline]
pub(crate) fn is_bad(votes: &[u32], n_trees: usize) -> bool {
    let mut best_bad = 0;
    let mut total_bad = 0;
    for &v in votes {
        if v > best_bad { best_bad = v; }
        total_bad += v as i64;
    }
    if total_bad == 0 { return false; }

    let good = n_trees as i64 - total_bad;
    good <= best_bad as i64
}
