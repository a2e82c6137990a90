//! Basket (transaction) data

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A list of baskets, each a set of distinct items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSet {
    baskets: Vec<BTreeSet<String>>,
}

impl TransactionSet {
    pub fn new(baskets: Vec<BTreeSet<String>>) -> Self {
        Self { baskets }
    }

    /// Parse one basket per line. Items are trimmed, surrounding quotes are
    /// removed, repeated items in a basket collapse, blank lines are skipped.
    pub fn parse(content: &str, delimiter: char) -> Self {
        let baskets = content
            .lines()
            .map(|line| {
                line.split(delimiter)
                    .map(|item| item.trim().trim_matches('"').trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect::<BTreeSet<String>>()
            })
            .filter(|basket| !basket.is_empty())
            .collect();
        Self { baskets }
    }

    pub fn len(&self) -> usize {
        self.baskets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baskets.is_empty()
    }

    pub fn baskets(&self) -> &[BTreeSet<String>] {
        &self.baskets
    }

    /// Every distinct item, sorted
    pub fn items(&self) -> BTreeSet<&str> {
        self.baskets
            .iter()
            .flat_map(|basket| basket.iter().map(|s| s.as_str()))
            .collect()
    }

    /// Number of baskets containing every item of `itemset`
    pub fn count_containing<'a, I>(&self, itemset: I) -> usize
    where
        I: IntoIterator<Item = &'a String> + Clone,
    {
        self.baskets
            .iter()
            .filter(|basket| itemset.clone().into_iter().all(|item| basket.contains(item)))
            .count()
    }

    /// Basket size distribution: size → number of baskets
    pub fn size_distribution(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for basket in &self.baskets {
            *sizes.entry(basket.len()).or_insert(0) += 1;
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_baskets() {
        let text = "citrus fruit,semi-finished bread,margarine\n\ntropical fruit,yogurt,coffee\nwhole milk,whole milk\n";
        let set = TransactionSet::parse(text, ',');
        assert_eq!(set.len(), 3);
        assert_eq!(set.baskets()[2].len(), 1);
        assert!(set.items().contains("yogurt"));
        assert_eq!(set.size_distribution().get(&3), Some(&2));
    }

    #[test]
    fn test_count_containing() {
        let set = TransactionSet::parse("a,b\na,c\nb,c\na,b,c\n", ',');
        let ab: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set.count_containing(&ab), 2);
    }
}
