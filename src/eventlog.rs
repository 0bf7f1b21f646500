//! Event logs as ordered activity sequences.
//!
//! Only the label sequence of each trace matters here. Two on-disk forms are
//! read: a JSON array of arrays of labels, and a plain text form with one
//! trace per line whose labels are separated by whitespace or commas (lines
//! starting with `#` are comments).

use crate::error::LogError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// An ordered collection of traces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    traces: Vec<Vec<String>>,
}

impl EventLog {
    /// Build a log from anything that yields label sequences.
    #[must_use]
    pub fn from_traces<I, T, S>(traces: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            traces: traces
                .into_iter()
                .map(|t| t.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Parse the plain text form.
    #[must_use]
    pub fn parse_text(text: &str) -> Self {
        let traces = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                line.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|label| !label.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .collect();
        Self { traces }
    }

    /// Parse the JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not an array of label arrays.
    pub fn from_json_str(text: &str) -> Result<Self, LogError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a log file, choosing the form by extension (`.json`) or by a
    /// leading `[`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds no
    /// traces.
    pub fn from_path(path: &Path) -> Result<Self, LogError> {
        let text = fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().is_some_and(|ext| ext == "json")
            || text.trim_start().starts_with('[');
        let log = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::parse_text(&text)
        };
        if log.is_empty() {
            return Err(LogError::Empty);
        }
        Ok(log)
    }

    /// The traces in recorded order.
    #[must_use]
    pub fn traces(&self) -> &[Vec<String>] {
        &self.traces
    }

    /// Number of traces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the log holds no traces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Distinct activity labels, sorted.
    #[must_use]
    pub fn alphabet(&self) -> Vec<String> {
        self.traces
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Distinct traces with their frequencies, in lexicographic order.
    #[must_use]
    pub fn variants(&self) -> Vec<(Vec<String>, usize)> {
        let mut counts: BTreeMap<&[String], usize> = BTreeMap::new();
        for trace in &self.traces {
            *counts.entry(trace.as_slice()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(trace, n)| (trace.to_vec(), n))
            .collect()
    }

    /// How often each label is directly followed by another.
    #[must_use]
    pub fn directly_follows(&self) -> BTreeMap<(String, String), usize> {
        let mut relation = BTreeMap::new();
        for trace in &self.traces {
            for pair in trace.windows(2) {
                *relation
                    .entry((pair[0].clone(), pair[1].clone()))
                    .or_default() += 1;
            }
        }
        relation
    }

    /// Labels in order of their average position within traces, ties broken
    /// by label.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn activities_by_position(&self) -> Vec<String> {
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for trace in &self.traces {
            let len = trace.len().max(1) as f64;
            for (i, label) in trace.iter().enumerate() {
                let entry = sums.entry(label.as_str()).or_insert((0.0, 0));
                entry.0 += i as f64 / len;
                entry.1 += 1;
            }
        }
        let mut ranked: Vec<(&str, f64)> = sums
            .into_iter()
            .map(|(label, (sum, n))| (label, sum / n as f64))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().map(|(label, _)| label.to_owned()).collect()
    }

    /// Keep `ceil(fraction * len)` traces chosen without replacement,
    /// preserving their order. At least one trace is kept.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn sample<R: Rng>(&self, fraction: f64, rng: &mut R) -> Self {
        if fraction >= 1.0 || self.traces.len() <= 1 {
            return self.clone();
        }
        let len = self.traces.len();
        let keep = ((fraction * len as f64).ceil() as usize).clamp(1, len);
        let mut indices = rand::seq::index::sample(rng, len, keep).into_vec();
        indices.sort_unstable();
        Self {
            traces: indices.into_iter().map(|i| self.traces[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::io::Write;

    #[test]
    fn test_parse_text() {
        let log = EventLog::parse_text("# comment\nA B C\n\nA,C\n");
        assert_eq!(log.len(), 2);
        assert_eq!(log.traces()[1], vec!["A", "C"]);
        assert_eq!(log.alphabet(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_variants_are_grouped() {
        let log = EventLog::from_traces([vec!["A", "B"], vec!["A", "C"], vec!["A", "B"]]);
        let variants = log.variants();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0], (vec!["A".to_owned(), "B".to_owned()], 2));
    }

    #[test]
    fn test_directly_follows() {
        let log = EventLog::from_traces([vec!["A", "B", "A", "B"]]);
        let df = log.directly_follows();
        assert_eq!(df[&("A".to_owned(), "B".to_owned())], 2);
        assert_eq!(df[&("B".to_owned(), "A".to_owned())], 1);
    }

    #[test]
    fn test_activities_by_position() {
        let log = EventLog::from_traces([vec!["C", "A", "B"], vec!["C", "B"]]);
        assert_eq!(log.activities_by_position(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_sample_size() {
        let mut rng = SmallRng::seed_from_u64(3);
        let log = EventLog::from_traces((0..10).map(|i| vec![format!("a{i}")]));
        assert_eq!(log.sample(0.25, &mut rng).len(), 3);
        assert_eq!(log.sample(0.01, &mut rng).len(), 1);
        assert_eq!(log.sample(1.0, &mut rng), log);
    }

    #[test]
    fn test_from_path_json_and_text() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"[["A","B"],["A"]]"#).unwrap();
        let log = EventLog::from_path(json.path()).unwrap();
        assert_eq!(log.len(), 2);

        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "A B\nB A").unwrap();
        let log = EventLog::from_path(text.path()).unwrap();
        assert_eq!(log.traces()[1], vec!["B", "A"]);

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(EventLog::from_path(empty.path()), Err(LogError::Empty)));
    }
}
