//! Association rule measures over transaction data

use crate::data::TransactionSet;
use crate::error::{NotebookError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// `lhs => rhs` over item sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub lhs: BTreeSet<String>,
    pub rhs: BTreeSet<String>,
}

impl Rule {
    /// The consequent must be non-empty and share no item with the antecedent.
    pub fn new(lhs: &[&str], rhs: &[&str]) -> Result<Self> {
        let lhs: BTreeSet<String> = lhs.iter().map(|s| s.trim().to_string()).collect();
        let rhs: BTreeSet<String> = rhs.iter().map(|s| s.trim().to_string()).collect();
        if rhs.is_empty() {
            return Err(NotebookError::Config("rule needs at least one consequent item".to_string()));
        }
        if let Some(item) = lhs.intersection(&rhs).next() {
            return Err(NotebookError::Config(format!(
                "item '{}' appears on both sides of the rule",
                item
            )));
        }
        Ok(Self { lhs, rhs })
    }

    /// Every item on either side
    pub fn items(&self) -> BTreeSet<String> {
        self.lhs.union(&self.rhs).cloned().collect()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |s: &BTreeSet<String>| s.iter().cloned().collect::<Vec<_>>().join(",");
        write!(f, "{{{}}} => {{{}}}", side(&self.lhs), side(&self.rhs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleMeasures {
    /// Share of transactions containing every item of the rule
    pub support: f64,
    /// `support(lhs ∪ rhs) / support(lhs)`
    pub confidence: f64,
    /// `confidence / support(rhs)`
    pub lift: f64,
    /// Transactions containing every item of the rule
    pub count: usize,
}

/// Single-item support, most frequent first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFrequency {
    pub item: String,
    pub count: usize,
    pub support: f64,
}

impl TransactionSet {
    /// Share of transactions containing all of `items`; 0 for an empty set
    pub fn support(&self, items: &BTreeSet<String>) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.count_containing(items.iter()) as f64 / self.len() as f64
    }

    pub fn measure(&self, rule: &Rule) -> RuleMeasures {
        let both = rule.items();
        let count = self.count_containing(both.iter());
        let support = self.support(&both);
        let lhs_support = self.support(&rule.lhs);
        let rhs_support = self.support(&rule.rhs);
        let confidence = if lhs_support > 0.0 { support / lhs_support } else { 0.0 };
        let lift = if rhs_support > 0.0 { confidence / rhs_support } else { 0.0 };
        RuleMeasures {
            support,
            confidence,
            lift,
            count,
        }
    }

    /// Support of every item, sorted by descending count then name
    pub fn item_frequency(&self) -> Vec<ItemFrequency> {
        let n = self.len().max(1) as f64;
        let mut frequencies: Vec<ItemFrequency> = self
            .items()
            .into_iter()
            .map(|item| {
                let count = self.count_containing(std::iter::once(&item.to_string()));
                ItemFrequency {
                    item: item.to_string(),
                    count,
                    support: count as f64 / n,
                }
            })
            .collect();
        frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
        frequencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groceries() -> TransactionSet {
        TransactionSet::parse(
            "whole milk,yogurt,rolls/buns\n\
             whole milk,other vegetables\n\
             yogurt,other vegetables,whole milk\n\
             soda\n\
             rolls/buns,soda\n",
            ',',
        )
    }

    #[test]
    fn test_measures() {
        let rule = Rule::new(&["yogurt"], &["whole milk"]).unwrap();
        let m = groceries().measure(&rule);
        assert_eq!(m.count, 2);
        assert!((m.support - 0.4).abs() < 1e-12);
        assert!((m.confidence - 1.0).abs() < 1e-12);
        // support(whole milk) = 0.6
        assert!((m.lift - 1.0 / 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_lift_is_confidence_over_rhs_support() {
        let set = groceries();
        let rule = Rule::new(&["other vegetables"], &["yogurt"]).unwrap();
        let m = set.measure(&rule);
        let rhs = set.support(&rule.rhs);
        assert!((m.lift - m.confidence / rhs).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_antecedent() {
        let m = groceries().measure(&Rule::new(&["caviar"], &["soda"]).unwrap());
        assert_eq!(m.count, 0);
        assert_eq!(m.confidence, 0.0);
        assert_eq!(m.lift, 0.0);
    }

    #[test]
    fn test_invalid_rules() {
        assert!(Rule::new(&["soda"], &[]).is_err());
        assert!(Rule::new(&["soda"], &["soda"]).is_err());
    }

    #[test]
    fn test_item_frequency_order() {
        let freq = groceries().item_frequency();
        assert_eq!(freq[0].item, "whole milk");
        assert_eq!(freq[0].count, 3);
        assert!((freq[0].support - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new(&["yogurt", "other vegetables"], &["whole milk"]).unwrap();
        assert_eq!(rule.to_string(), "{other vegetables,yogurt} => {whole milk}");
    }
}
