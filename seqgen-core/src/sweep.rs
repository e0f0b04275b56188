//! Cartesian-product expansion of sweep overrides.
//!
//! A sweep is a pure function from a list of (key, value-list) axes to an
//! ordered sequence of combinations. The iterator is lazy and restartable so
//! sweep execution and configuration resolution stay independently testable.

/// Lazy iterator over the cartesian product of sweep axes.
///
/// Axes are iterated in the order given, with the last axis varying fastest.
/// An empty axis list yields exactly one empty combination (the single-run
/// case); an axis with an empty value list yields nothing.
#[derive(Debug, Clone)]
pub struct Cartesian {
    axes: Vec<(String, Vec<String>)>,
    indices: Vec<usize>,
    done: bool,
}

impl Cartesian {
    pub fn new(axes: Vec<(String, Vec<String>)>) -> Self {
        let done = axes.iter().any(|(_, values)| values.is_empty());
        let indices = vec![0; axes.len()];
        Self {
            axes,
            indices,
            done,
        }
    }

    /// Total number of combinations the full product contains.
    pub fn total(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    /// Number of combinations not yet yielded.
    fn remaining(&self) -> usize {
        if self.done {
            return 0;
        }
        // The current index vector read as a mixed-radix number is the rank
        // of the next combination.
        let mut rank = 0usize;
        for ((_, values), &i) in self.axes.iter().zip(&self.indices) {
            rank = rank * values.len() + i;
        }
        self.total() - rank
    }
}

impl Iterator for Cartesian {
    type Item = Vec<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let combo = self
            .axes
            .iter()
            .zip(&self.indices)
            .map(|((key, values), &i)| (key.clone(), values[i].clone()))
            .collect();

        // Advance the index vector, carrying from the last axis.
        let mut pos = self.axes.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.axes[pos].1.len() {
                break;
            }
            self.indices[pos] = 0;
        }

        Some(combo)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Cartesian {}
