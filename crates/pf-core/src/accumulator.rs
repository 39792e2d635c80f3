//! Parallel accumulators for prefirable and unprefirable events.

/// One accumulator per classification outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefireSplit<T> {
    pub prefirable: T,
    pub unprefirable: T,
}

impl<T> PrefireSplit<T> {
    pub fn new(prefirable: T, unprefirable: T) -> Self {
        PrefireSplit {
            prefirable,
            unprefirable,
        }
    }

    /// Build both sides from the same constructor, given the split label.
    pub fn from_fn(mut make: impl FnMut(Split) -> T) -> Self {
        PrefireSplit {
            prefirable: make(Split::Prefirable),
            unprefirable: make(Split::Unprefirable),
        }
    }

    pub fn select(&self, unprefirable: bool) -> &T {
        if unprefirable {
            &self.unprefirable
        } else {
            &self.prefirable
        }
    }

    pub fn select_mut(&mut self, unprefirable: bool) -> &mut T {
        if unprefirable {
            &mut self.unprefirable
        } else {
            &mut self.prefirable
        }
    }

    /// Iterate `(split, value)` with the unprefirable side first.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &T)> {
        [
            (Split::Unprefirable, &self.unprefirable),
            (Split::Prefirable, &self.prefirable),
        ]
        .into_iter()
    }
}

/// Side of a [`PrefireSplit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Prefirable,
    Unprefirable,
}

impl Split {
    /// Capitalised label used in histogram names.
    pub fn label(self) -> &'static str {
        match self {
            Split::Prefirable => "Prefirable",
            Split::Unprefirable => "Unprefirable",
        }
    }
}
