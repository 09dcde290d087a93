//! Named-key summaries over loaded collections.
//!
//! Consumers rendering a slice often need a handful of extrema or folds
//! (coldest sample, total precipitation, ...). These maps bind a name to a
//! comparison or reduction function once and recompute every bound summary
//! in a single scan; results are queried by ordinary name lookup.

use std::collections::HashMap;

/// A "less than" predicate for minimum tracking.
pub type Comparator<T> = fn(&T, &T) -> bool;

/// A fold step combining an accumulator with the next element.
pub type Reducer<T, R> = fn(R, &T) -> R;

/// Tracks, per named comparator, the element a scanned collection
/// minimizes under that predicate.
pub struct Comparators<T> {
    comparators: HashMap<&'static str, Comparator<T>>,
    analysis: HashMap<&'static str, T>,
}

impl<T: Clone> Comparators<T> {
    pub fn new(comparators: HashMap<&'static str, Comparator<T>>) -> Self {
        Self {
            comparators,
            analysis: HashMap::new(),
        }
    }

    /// Recomputes every named minimum over `collection`. An empty
    /// collection clears previous results.
    pub fn scan(&mut self, collection: &[T]) {
        self.analysis.clear();
        for (name, less) in &self.comparators {
            let winner = collection
                .iter()
                .reduce(|best, next| if less(next, best) { next } else { best });
            if let Some(winner) = winner {
                self.analysis.insert(*name, winner.clone());
            }
        }
    }

    /// Result of the last scan for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.analysis.get(name)
    }
}

/// Folds a scanned collection under named reduction functions, each with
/// its own seed value.
pub struct Reducers<T, R> {
    reducers: HashMap<&'static str, (R, Reducer<T, R>)>,
    analysis: HashMap<&'static str, R>,
}

impl<T, R: Clone> Reducers<T, R> {
    pub fn new(reducers: HashMap<&'static str, (R, Reducer<T, R>)>) -> Self {
        Self {
            reducers,
            analysis: HashMap::new(),
        }
    }

    pub fn scan(&mut self, collection: &[T]) {
        for (name, (seed, fold)) in &self.reducers {
            let folded = collection
                .iter()
                .fold(seed.clone(), |acc, item| fold(acc, item));
            self.analysis.insert(*name, folded);
        }
    }

    /// Result of the last scan for `name`; before any scan, the seed
    /// registered under `name`.
    pub fn get(&self, name: &str) -> Option<&R> {
        self.analysis
            .get(name)
            .or_else(|| self.reducers.get(name).map(|(seed, _)| seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Sample {
        temperature: f64,
        wind: f64,
    }

    fn samples() -> Vec<Sample> {
        vec![
            Sample { temperature: 3.0, wind: 12.0 },
            Sample { temperature: -7.5, wind: 4.0 },
            Sample { temperature: 11.0, wind: 9.5 },
        ]
    }

    #[test]
    fn comparators_track_named_minimums() {
        let mut analysis = Comparators::new(HashMap::from([
            ("coldest", (|a: &Sample, b: &Sample| a.temperature < b.temperature) as Comparator<Sample>),
            ("calmest", (|a: &Sample, b: &Sample| a.wind < b.wind) as Comparator<Sample>),
        ]));

        assert!(analysis.get("coldest").is_none());

        analysis.scan(&samples());
        assert_eq!(analysis.get("coldest").unwrap().temperature, -7.5);
        assert_eq!(analysis.get("calmest").unwrap().wind, 4.0);
        assert!(analysis.get("unknown").is_none());
    }

    #[test]
    fn comparators_clear_on_empty_scan() {
        let mut analysis = Comparators::new(HashMap::from([(
            "coldest",
            (|a: &Sample, b: &Sample| a.temperature < b.temperature) as Comparator<Sample>,
        )]));
        analysis.scan(&samples());
        analysis.scan(&[]);
        assert!(analysis.get("coldest").is_none());
    }

    #[test]
    fn reducers_fold_with_seed_fallback() {
        let mut analysis = Reducers::new(HashMap::from([
            ("total_wind", (0.0, (|acc: f64, s: &Sample| acc + s.wind) as Reducer<Sample, f64>)),
            ("count", (0.0, (|acc: f64, _: &Sample| acc + 1.0) as Reducer<Sample, f64>)),
        ]));

        // Before any scan the registered seed answers.
        assert_eq!(analysis.get("total_wind"), Some(&0.0));

        analysis.scan(&samples());
        assert_eq!(analysis.get("total_wind"), Some(&25.5));
        assert_eq!(analysis.get("count"), Some(&3.0));
        assert!(analysis.get("unknown").is_none());
    }
}
