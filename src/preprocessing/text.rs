//! Text column to term-presence features

use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only",
    "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Tokenizer applied to every document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCleaner {
    pub remove_numbers: bool,
    pub remove_stop_words: bool,
    pub min_token_length: usize,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self {
            remove_numbers: true,
            remove_stop_words: true,
            min_token_length: 1,
        }
    }
}

impl TextCleaner {
    /// Lowercase, replace punctuation (and optionally digits) with spaces,
    /// split on whitespace and drop stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphabetic() || (c.is_ascii_digit() && !self.remove_numbers) {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() >= self.min_token_length)
            .filter(|t| !(self.remove_stop_words && ENGLISH_STOP_WORDS.contains(t)))
            .map(|t| t.to_string())
            .collect()
    }
}

/// Learns a vocabulary from training documents and turns a text column into
/// one "Yes"/"No" presence column per term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermMatrixBuilder {
    column: String,
    min_frequency: usize,
    cleaner: TextCleaner,
    vocabulary: Vec<String>,
    is_fitted: bool,
}

impl TermMatrixBuilder {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            min_frequency: 5,
            cleaner: TextCleaner::default(),
            vocabulary: Vec::new(),
            is_fitted: false,
        }
    }

    /// Minimum number of training documents a term must appear in
    pub fn with_min_frequency(mut self, min_frequency: usize) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    pub fn with_cleaner(mut self, cleaner: TextCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Document frequency of every term in the column
    pub fn document_frequencies(&self, table: &Table) -> Result<BTreeMap<String, usize>> {
        let mut frequencies = BTreeMap::new();
        for doc in table.labels_opt(&self.column)? {
            let terms: BTreeSet<String> = self
                .cleaner
                .tokenize(doc.as_deref().unwrap_or(""))
                .into_iter()
                .collect();
            for term in terms {
                *frequencies.entry(term).or_insert(0) += 1;
            }
        }
        Ok(frequencies)
    }

    /// Learn the vocabulary from `table` (normally the training side)
    pub fn fit(&mut self, table: &Table) -> Result<&mut Self> {
        if table.role(&self.column) != Some(ColumnRole::Categorical) {
            return Err(NotebookError::DataFormat(format!(
                "text column '{}' not found or not a string column",
                self.column
            )));
        }
        self.vocabulary = self
            .document_frequencies(table)?
            .into_iter()
            .filter(|(_, df)| *df >= self.min_frequency)
            .map(|(term, _)| term)
            .collect();
        self.is_fitted = true;
        info!(column = %self.column, terms = self.vocabulary.len(), "learned vocabulary");
        Ok(self)
    }

    /// Replace the text column with term presence columns.
    ///
    /// A term whose name collides with an existing column gets a `_term` suffix.
    pub fn transform(&self, table: &Table) -> Result<Table> {
        if !self.is_fitted {
            return Err(NotebookError::Config("term matrix builder is not fitted".to_string()));
        }
        let docs: Vec<BTreeSet<String>> = table
            .labels_opt(&self.column)?
            .into_iter()
            .map(|doc| self.cleaner.tokenize(doc.as_deref().unwrap_or("")).into_iter().collect())
            .collect();

        let mut out = table.drop(&self.column)?;
        for term in &self.vocabulary {
            let name = if out.has_column(term) {
                format!("{}_term", term)
            } else {
                term.clone()
            };
            let presence = docs
                .iter()
                .map(|terms| Some(if terms.contains(term) { "Yes" } else { "No" }.to_string()))
                .collect();
            out = out.with_categorical_column(&name, presence)?;
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, table: &Table) -> Result<Table> {
        self.fit(table)?;
        self.transform(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sms() -> Table {
        let df = df!(
            "type" => &["ham", "spam", "ham", "spam"],
            "text" => &[
                "Hope you are having a good week. Just checking in",
                "FREE entry in 2 a wkly comp to win FA Cup final tkts",
                "Good week? Call me later",
                "WINNER!! You have been selected to receive a free prize. Call 09061701461",
            ],
        )
        .unwrap();
        Table::from_frame(df).unwrap()
    }

    #[test]
    fn test_tokenize_strips_numbers_punctuation_stop_words() {
        let tokens = TextCleaner::default().tokenize("WINNER!! You have won 1000 pounds.");
        assert_eq!(tokens, vec!["winner", "won", "pounds"]);
    }

    #[test]
    fn test_vocabulary_respects_min_frequency() {
        let mut builder = TermMatrixBuilder::new("text").with_min_frequency(2);
        builder.fit(&sms()).unwrap();
        assert_eq!(builder.vocabulary(), &["call", "free", "good", "week"]);
    }

    #[test]
    fn test_transform_yes_no_columns() {
        let mut builder = TermMatrixBuilder::new("text").with_min_frequency(2);
        let table = builder.fit_transform(&sms()).unwrap();
        assert!(!table.has_column("text"));
        assert_eq!(table.n_cols(), 5);
        assert_eq!(table.labels("free").unwrap(), vec!["No", "Yes", "No", "Yes"]);
        assert_eq!(table.role("call"), Some(ColumnRole::Categorical));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let builder = TermMatrixBuilder::new("text");
        assert!(builder.transform(&sms()).is_err());
    }
}
