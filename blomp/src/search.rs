//! Searching for tree parameters that hit a size or quality target.

use log::{debug, info};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    block::Block,
    builder::{build_tree_with_pool, BlockPool, BlockTreeDesc},
    codec::estimated_size,
    compare::{score, similarity},
    error::{Error, Result},
    geometry::MAX_DEPTH,
    raster::Image,
};

/// Threshold the search starts from, also its first step size.
pub const START_THRESHOLD: f32 = 2.0;

/// Past this threshold every region merges, so there is no point in
/// searching further.
pub const THRESHOLD_LIMIT: f32 = 1.1;

/// With automatic stopping, the search ends once the size has not changed
/// for this many iterations.
const STABLE_ITERATIONS: u32 = 5;

/// What the search tries to reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchTarget {
    /// Estimated file size in bytes.
    Size(u64),

    /// Similarity to the source image, see [`similarity`].
    Similarity(f32),
}

impl SearchTarget {
    fn value(&self) -> f64 {
        match *self {
            SearchTarget::Size(size) => size as f64,
            SearchTarget::Similarity(similarity) => similarity as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The last tree that was built.
    pub tree: Block,

    /// The parameters `tree` was built with.
    pub desc: BlockTreeDesc,

    /// Number of iterations that actually ran.
    pub iterations: u32,

    pub estimated_size: u64,
}

/// Bisect the variation threshold towards `target`, keeping the maximum
/// depth of `desc`.
///
/// Runs `max_iterations` times, or with `max_iterations == 0` until the
/// estimated size stays the same for several iterations in a row.
pub fn search_threshold(
    img: &Image,
    desc: &BlockTreeDesc,
    target: SearchTarget,
    max_iterations: u32,
) -> Result<SearchResult> {
    let auto_stop = max_iterations == 0;

    let mut desc = desc.with_threshold(START_THRESHOLD);
    let mut step = START_THRESHOLD;
    let mut measured = 0.0;

    let mut pool = BlockPool::default();
    let mut generated = match target {
        SearchTarget::Similarity(_) => Some(Image::new(img.width(), img.height())),
        SearchTarget::Size(_) => None,
    };

    let mut previous_size = None;
    let mut stable = 0;
    let mut iterations = 0;

    let (tree, size) = loop {
        iterations += 1;
        step /= 2.0;

        // Below the target there is room for more detail
        if measured < target.value() {
            desc.variation_threshold -= step;
        } else {
            desc.variation_threshold += step;
        }

        let tree = build_tree_with_pool(img, &desc, &mut pool)?;
        let size = estimated_size(&tree);

        measured = match generated.as_mut() {
            Some(generated) => {
                tree.rasterize(generated)?;
                similarity(img, generated)? as f64
            }
            None => size as f64,
        };

        debug!(
            "iteration {iterations}: threshold {} -> {size} bytes",
            desc.variation_threshold
        );

        if auto_stop && previous_size == Some(size) {
            stable += 1;
        } else {
            stable = 0;
        }

        if (auto_stop && stable == STABLE_ITERATIONS)
            || (!auto_stop && iterations >= max_iterations)
            || desc.variation_threshold > THRESHOLD_LIMIT
        {
            break (tree, size);
        }

        previous_size = Some(size);
    };

    info!(
        "threshold search finished after {iterations} iterations: depth {}, threshold {}, {size} bytes",
        desc.max_depth, desc.variation_threshold
    );

    Ok(SearchResult {
        tree,
        desc,
        iterations,
        estimated_size: size,
    })
}

#[derive(Debug, Clone)]
pub struct OptiResult {
    /// The best scoring threshold search.
    pub best: SearchResult,

    /// Similarity of the best tree to the source image.
    pub similarity: f32,

    pub score: f32,

    /// Iterations used across every depth.
    pub iterations: u32,
}

/// Run [`search_threshold`] for every maximum depth and keep the result
/// with the best [`score`] against `original_size`.
///
/// Depths are searched in parallel. Ties go to the lowest depth.
pub fn search_depth_and_threshold(
    img: &Image,
    target: SearchTarget,
    max_iterations: u32,
    original_size: u64,
) -> Result<OptiResult> {
    let candidates = (0..=MAX_DEPTH)
        .into_par_iter()
        .map(|max_depth| -> Result<OptiResult> {
            debug!("running threshold search {}/{}", max_depth + 1, MAX_DEPTH + 1);

            let desc = BlockTreeDesc::default().with_depth(max_depth);
            let result = search_threshold(img, &desc, target, max_iterations)?;

            let mut generated = Image::new(img.width(), img.height());
            result.tree.rasterize(&mut generated)?;
            let similarity = similarity(img, &generated)?;
            let score = score(similarity, original_size, result.estimated_size);

            debug!(
                "depth {max_depth}: threshold {}, {} bytes, similarity {similarity}, score {score}",
                result.desc.variation_threshold, result.estimated_size
            );

            Ok(OptiResult {
                iterations: result.iterations,
                best: result,
                similarity,
                score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let iterations = candidates.iter().map(|c| c.iterations).sum();
    let best = candidates
        .into_iter()
        .reduce(|best, candidate| {
            let beats_nan = best.score.is_nan() && !candidate.score.is_nan();
            if candidate.score > best.score || beats_nan {
                candidate
            } else {
                best
            }
        })
        .ok_or_else(|| Error::InvalidDescriptor("no depth to search".into()))?;

    info!(
        "depth search picked depth {}, threshold {} with score {}",
        best.best.desc.max_depth, best.best.desc.variation_threshold, best.score
    );

    Ok(OptiResult { iterations, ..best })
}
