//! Per-run research notes.

use serde::{Deserialize, Serialize};

/// One piece of gathered information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Tool that produced it, e.g. `web_search`.
    pub source: String,
    pub information: String,
}

/// What a run searched for and what came back.
///
/// Notes are scoped to one run and are never fed back to the oracle; they
/// exist for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchNotes {
    searches: Vec<String>,
    findings: Vec<Finding>,
}

impl ResearchNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_search(&mut self, query: impl Into<String>) {
        self.searches.push(query.into());
    }

    pub fn add_finding(&mut self, source: impl Into<String>, information: impl Into<String>) {
        self.findings.push(Finding {
            source: source.into(),
            information: information.into(),
        });
    }

    pub fn searches(&self) -> &[String] {
        &self.searches
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty() && self.findings.is_empty()
    }

    /// Human-readable summary of the run's research.
    pub fn summary(&self) -> String {
        let mut out = format!("Performed {} searches:\n", self.searches.len());
        for (i, query) in self.searches.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, query));
        }
        out.push_str(&format!("\nGathered {} findings.", self.findings.len()));
        out
    }
}
