//! Minimization strategies: which vtree nodes each pass searches, and when
//! to stop.

use log::debug;

/// Searched vtree nodes: those whose subtree has between `min_vars` and
/// `max_vars` variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRegion {
    pub min_vars: usize,
    pub max_vars: usize,
}

impl SearchRegion {
    pub fn new(min_vars: usize, max_vars: usize) -> Self {
        Self { min_vars, max_vars }
    }

    /// Every vtree node.
    pub fn all() -> Self {
        Self::new(0, usize::MAX)
    }

    pub fn contains(&self, var_count: usize) -> bool {
        self.min_vars <= var_count && var_count <= self.max_vars
    }
}

/// Chooses the search region of every pass.
pub trait SddMinimizationStrategy {
    /// The region of the first pass, or `None` to not search at all.
    fn first_region(&mut self, num_vars: usize) -> Option<SearchRegion>;

    /// The region of the next pass, given the total size before and after
    /// the last one. `None` ends the minimization.
    fn next_region(&mut self, size_before: usize, size_after: usize) -> Option<SearchRegion>;
}

/// Searches the whole vtree, pass after pass, while passes keep improving.
#[derive(Debug, Default, Clone)]
pub struct BottomUpStrategy;

impl SddMinimizationStrategy for BottomUpStrategy {
    fn first_region(&mut self, _num_vars: usize) -> Option<SearchRegion> {
        Some(SearchRegion::all())
    }

    fn next_region(&mut self, size_before: usize, size_after: usize) -> Option<SearchRegion> {
        (size_after < size_before).then(SearchRegion::all)
    }
}

/// Searches progressively smaller subtrees: up to a half of the variables,
/// then a quarter, and so on.
///
/// A pass that improves is repeated with the same threshold.
#[derive(Debug, Clone)]
pub struct DecreasingThresholdStrategy {
    threshold: usize,
    min_threshold: usize,
}

impl DecreasingThresholdStrategy {
    /// Stops once the threshold drops below `min_threshold` variables.
    pub fn new(min_threshold: usize) -> Self {
        Self {
            threshold: 0,
            min_threshold: min_threshold.max(1),
        }
    }

    fn region(&self) -> SearchRegion {
        SearchRegion::new(0, self.threshold)
    }
}

impl Default for DecreasingThresholdStrategy {
    fn default() -> Self {
        // the smallest fragments span three variables
        Self::new(3)
    }
}

impl SddMinimizationStrategy for DecreasingThresholdStrategy {
    fn first_region(&mut self, num_vars: usize) -> Option<SearchRegion> {
        self.threshold = num_vars / 2;
        (self.threshold >= self.min_threshold).then(|| self.region())
    }

    fn next_region(&mut self, size_before: usize, size_after: usize) -> Option<SearchRegion> {
        if size_after >= size_before {
            self.threshold /= 2;
            debug!("decreasing threshold to {} variable(s)", self.threshold);
        }
        (self.threshold >= self.min_threshold).then(|| self.region())
    }
}

/// Slides a window of variable counts over `[3, n]`, doubling its width
/// after every sweep. Once a single window covers everything, sweeps repeat
/// while they improve.
#[derive(Debug, Clone)]
pub struct WindowStrategy {
    initial_width: usize,
    width: usize,
    low: usize,
    num_vars: usize,
    improved: bool,
}

const SMALLEST_FRAGMENT: usize = 3;

impl WindowStrategy {
    pub fn new(initial_width: usize) -> Self {
        let initial_width = initial_width.max(1);
        Self {
            initial_width,
            width: initial_width,
            low: SMALLEST_FRAGMENT,
            num_vars: 0,
            improved: false,
        }
    }

    fn region(&self) -> SearchRegion {
        SearchRegion::new(self.low, (self.low + self.width - 1).min(self.num_vars))
    }

    fn covers_everything(&self) -> bool {
        SMALLEST_FRAGMENT + self.width > self.num_vars
    }
}

impl Default for WindowStrategy {
    fn default() -> Self {
        Self::new(2)
    }
}

impl SddMinimizationStrategy for WindowStrategy {
    fn first_region(&mut self, num_vars: usize) -> Option<SearchRegion> {
        self.num_vars = num_vars;
        self.width = self.initial_width;
        self.low = SMALLEST_FRAGMENT;
        self.improved = false;
        (num_vars >= SMALLEST_FRAGMENT).then(|| self.region())
    }

    fn next_region(&mut self, size_before: usize, size_after: usize) -> Option<SearchRegion> {
        self.improved |= size_after < size_before;
        self.low += self.width;
        if self.low > self.num_vars {
            // sweep finished
            if self.covers_everything() {
                if !self.improved {
                    return None;
                }
            } else {
                self.width *= 2;
                debug!("window width is now {}", self.width);
            }
            self.low = SMALLEST_FRAGMENT;
            self.improved = false;
        }
        Some(self.region())
    }
}
