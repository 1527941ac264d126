//! Filter trait and ordered filter chain.

use cf_fragment::Fragment;
use rayon::prelude::*;

/// A content filter: one independent transformation of a message body.
///
/// Filters are stateless and shared across threads. [`apply`] is only
/// called right after [`is_applicable`] returned `true` for the same
/// fragment, and returns a new fragment instead of mutating its input.
///
/// [`apply`]: Filter::apply
/// [`is_applicable`]: Filter::is_applicable
///
/// # Example
///
/// ```
/// use cf_filters::{Filter, FilterChain};
/// use cf_fragment::{Fragment, Node};
///
/// struct Shout;
///
/// impl Filter for Shout {
///     fn name(&self) -> &str { "shout" }
///
///     fn is_applicable(&self, fragment: &Fragment) -> bool {
///         fragment.nodes().iter().any(|node| node.as_text().is_some())
///     }
///
///     fn apply(&self, fragment: &Fragment) -> Fragment {
///         Fragment::new(vec![Node::text(fragment.to_plain_text().to_uppercase())])
///     }
/// }
///
/// let chain = FilterChain::new().with(Shout);
/// let out = chain.run(Fragment::parse("hello").unwrap());
/// assert_eq!(out.to_html(), "HELLO");
/// ```
pub trait Filter: Send + Sync {
    /// Filter name, used in logs.
    fn name(&self) -> &str;

    /// Whether the filter should run on this fragment.
    fn is_applicable(&self, fragment: &Fragment) -> bool;

    /// Transform the fragment.
    fn apply(&self, fragment: &Fragment) -> Fragment;
}

/// Ordered sequence of filters.
///
/// Each applicable filter receives the output of the previous one.
/// Filters are never reordered or retried.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    #[must_use]
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append a boxed filter.
    #[must_use]
    pub fn with_boxed(mut self, filter: Box<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Run every applicable filter in order.
    #[must_use]
    pub fn run(&self, fragment: Fragment) -> Fragment {
        self.filters.iter().fold(fragment, |fragment, filter| {
            if filter.is_applicable(&fragment) {
                tracing::debug!(filter = filter.name(), "Applying filter");
                filter.apply(&fragment)
            } else {
                tracing::debug!(filter = filter.name(), "Skipping filter");
                fragment
            }
        })
    }

    /// Run the chain over independent fragments in parallel.
    ///
    /// Uses the global rayon thread pool. Output order matches input order.
    #[must_use]
    pub fn run_all(&self, fragments: Vec<Fragment>) -> Vec<Fragment> {
        fragments
            .into_par_iter()
            .map(|fragment| self.run(fragment))
            .collect()
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
