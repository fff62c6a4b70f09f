//! Per-wedge helpers over curvelet coefficients.

use curvelet_common::{Result, error::Error, verify_arg};
use curvelet_memory::Complex64;
use curvelet_ragged::{RaggedCollection, WedgeIndex};
use ndarray::{Array2, ArrayBase, ArrayView, Axis, Data, Dimension, Ix2, Slice};

/// Applies `f` to every wedge together with its position in the collection.
pub fn apply_along_wedges<T, U>(
    coeffs: &RaggedCollection<T>,
    mut f: impl FnMut(&T, WedgeIndex) -> U,
) -> RaggedCollection<U> {
    coeffs.map_indexed(|index, wedge| f(wedge, index))
}

/// Root mean square magnitude of a wedge, `sqrt(sum |a_i|^2 / N)`.
///
/// An empty wedge has zero energy.
pub fn energy<S, D>(wedge: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = Complex64>,
    D: Dimension,
{
    if wedge.is_empty() {
        return 0.0;
    }
    let sum: f64 = wedge.iter().map(|c| c.norm_sqr()).sum();
    (sum / wedge.len() as f64).sqrt()
}

/// Energy of every cell of a `rows x cols` split of a 2-D wedge, following the
/// uneven rules of [`array_split_nd`].
pub fn energy_split<S>(wedge: &ArrayBase<S, Ix2>, rows: usize, cols: usize) -> Result<Array2<f64>>
where
    S: Data<Elem = Complex64>,
{
    let split = array_split_nd(wedge.view(), &[rows, cols])?;
    let mut out = Array2::zeros((rows, cols));
    for ((i, j), cell) in out.indexed_iter_mut() {
        *cell = split.get(&[i, j]).map_or(0.0, energy);
    }
    Ok(out)
}

/// Nested sub-views produced by [`array_split_nd`] and [`split_nd`].
///
/// One level of nesting per split axis; the leaves keep the rank of the input.
#[derive(Debug, Clone)]
pub enum Split<'a, A, D: Dimension> {
    Leaf(ArrayView<'a, A, D>),
    Node(Vec<Split<'a, A, D>>),
}

impl<'a, A, D: Dimension> Split<'a, A, D> {
    /// The view at the end of `path`, one index per nesting level.
    pub fn get(&self, path: &[usize]) -> Option<&ArrayView<'a, A, D>> {
        match (self, path.split_first()) {
            (Split::Leaf(view), None) => Some(view),
            (Split::Node(children), Some((&first, rest))) => children.get(first)?.get(rest),
            _ => None,
        }
    }

    /// Sub-splits of a node, or nothing for a leaf.
    pub fn children(&self) -> &[Split<'a, A, D>] {
        match self {
            Split::Leaf(_) => &[],
            Split::Node(children) => children,
        }
    }

    /// All leaves, depth first.
    pub fn leaves(&self) -> Vec<&ArrayView<'a, A, D>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'s>(&'s self, out: &mut Vec<&'s ArrayView<'a, A, D>>) {
        match self {
            Split::Leaf(view) => out.push(view),
            Split::Node(children) => children.iter().for_each(|c| c.collect_leaves(out)),
        }
    }
}

/// Splits the trailing `splits.len()` axes of `array` recursively, `splits[k]`
/// pieces along the k-th of them.
///
/// An axis of length `l` split into `n` pieces gives `l % n` pieces of length
/// `l / n + 1` followed by pieces of length `l / n`; pieces may be empty.
pub fn array_split_nd<'a, A, D: Dimension>(
    array: ArrayView<'a, A, D>,
    splits: &[usize],
) -> Result<Split<'a, A, D>> {
    check_splits(array.ndim(), splits)?;
    let first = array.ndim() - splits.len();
    Ok(split_recursive(array, first, splits))
}

/// Like [`array_split_nd`], but every piece along an axis must have the same
/// length.
pub fn split_nd<'a, A, D: Dimension>(
    array: ArrayView<'a, A, D>,
    splits: &[usize],
) -> Result<Split<'a, A, D>> {
    check_splits(array.ndim(), splits)?;
    let first = array.ndim() - splits.len();
    for (k, &n) in splits.iter().enumerate() {
        if array.len_of(Axis(first + k)) % n != 0 {
            return Err(Error::invalid_arg(
                "splits",
                "array split does not result in an equal division",
            ));
        }
    }
    Ok(split_recursive(array, first, splits))
}

fn check_splits(ndim: usize, splits: &[usize]) -> Result<()> {
    verify_arg!(splits, !splits.is_empty() && splits.len() <= ndim);
    verify_arg!(splits, splits.iter().all(|&n| n > 0));
    Ok(())
}

fn split_recursive<'a, A, D: Dimension>(
    array: ArrayView<'a, A, D>,
    axis: usize,
    splits: &[usize],
) -> Split<'a, A, D> {
    let Some((&n, rest)) = splits.split_first() else {
        return Split::Leaf(array);
    };
    let len = array.len_of(Axis(axis));
    let (base, extra) = (len / n, len % n);
    let mut start = 0;
    let children = (0..n)
        .map(|k| {
            let end = start + base + usize::from(k < extra);
            let mut part = array.clone();
            part.slice_axis_inplace(Axis(axis), Slice::from(start..end));
            start = end;
            split_recursive(part, axis + 1, rest)
        })
        .collect();
    Split::Node(children)
}

/// Index of the first maximum of `array`, or `None` if it is empty or has no
/// comparable elements.
///
/// Complex wedges are usually reduced first, e.g. `wedge.mapv(|c| c.norm())`.
pub fn ndargmax<A, S, D>(array: &ArrayBase<S, D>) -> Option<D::Pattern>
where
    A: PartialOrd,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut best: Option<(D::Pattern, &A)> = None;
    for (index, value) in array.indexed_iter() {
        let better = match &best {
            None => value.partial_cmp(value).is_some(),
            Some((_, max)) => value > *max,
        };
        if better {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}
