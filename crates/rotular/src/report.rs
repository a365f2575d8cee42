//! Compliance report assembly.
//!
//! The report is the run's only output: counts, per-element detail
//! partitioned by verdict, and the overall compliance flag. Judgment
//! failures never reach this module as errors; the orchestrator
//! converts them into synthesized non-descriptive verdicts first, so
//! a report always covers every audited element.

use serde::{Deserialize, Serialize};

use crate::descriptor::ElementTag;
use crate::locator::Locator;
use crate::recover::JudgedVerdict;

/// One audited element with its verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedElement {
    /// Element kind
    #[serde(rename = "type")]
    pub element_type: ElementTag,
    /// The text that was judged (with fallback annotation, if any)
    pub text: String,
    /// Structural locator, rendered XPath-like in output
    pub locator: Locator,
    /// The verdict
    pub descriptive: bool,
    /// Evaluation comment
    pub evaluation: String,
    /// Improvement recommendations, empty when none
    pub recommendations: Vec<String>,
}

impl AnalyzedElement {
    /// Combine an element's identity with a recovered verdict.
    #[must_use]
    pub fn from_verdict(
        element_type: ElementTag,
        text: String,
        locator: Locator,
        verdict: JudgedVerdict,
    ) -> Self {
        Self {
            element_type,
            text,
            locator,
            descriptive: verdict.descriptive,
            evaluation: verdict.evaluation,
            recommendations: verdict.recommendations,
        }
    }

    /// Synthesized verdict for an element whose judgment call or reply
    /// recovery failed: counted non-descriptive with a diagnostic
    /// evaluation, so the failure surfaces in the report instead of
    /// silently shrinking it.
    #[must_use]
    pub fn failed_judgment(
        element_type: ElementTag,
        text: String,
        locator: Locator,
        diagnostic: &str,
    ) -> Self {
        Self {
            element_type,
            text,
            locator,
            descriptive: false,
            evaluation: format!("Analysis failed: {diagnostic}"),
            recommendations: vec![],
        }
    }
}

/// The WCAG 2.4.6 compliance report for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Audited page URL
    pub url: String,
    /// Total audited elements
    pub total_elements: usize,
    /// Heading count (h1-h6)
    pub total_headings: usize,
    /// Label count
    pub total_labels: usize,
    /// How many elements were judged descriptive
    pub descriptive_elements: usize,
    /// How many were not
    pub non_descriptive_elements: usize,
    /// Detail for the descriptive partition
    pub descriptive_elements_details: Vec<AnalyzedElement>,
    /// Detail for the non-descriptive partition
    pub non_descriptive_elements_details: Vec<AnalyzedElement>,
    /// Overall verdict: true exactly when no element needs improvement
    pub wcag_2_4_6_compliant: bool,
}

impl ComplianceReport {
    /// Partition analyzed elements into the final report.
    ///
    /// The two partitions always sum to the total, and compliance
    /// holds exactly when the non-descriptive partition is empty. An
    /// element set with no entries at all is reported compliant with
    /// zero counts.
    #[must_use]
    pub fn assemble(url: impl Into<String>, elements: Vec<AnalyzedElement>) -> Self {
        let total_elements = elements.len();
        let total_headings = elements
            .iter()
            .filter(|e| e.element_type.is_heading())
            .count();
        let total_labels = total_elements - total_headings;

        let (descriptive, non_descriptive): (Vec<_>, Vec<_>) =
            elements.into_iter().partition(|e| e.descriptive);

        Self {
            url: url.into(),
            total_elements,
            total_headings,
            total_labels,
            descriptive_elements: descriptive.len(),
            non_descriptive_elements: non_descriptive.len(),
            wcag_2_4_6_compliant: non_descriptive.is_empty(),
            descriptive_elements_details: descriptive,
            non_descriptive_elements_details: non_descriptive,
        }
    }

    /// Every analyzed element, descriptive partition first
    pub fn all_elements(&self) -> impl Iterator<Item = &AnalyzedElement> {
        self.descriptive_elements_details
            .iter()
            .chain(self.non_descriptive_elements_details.iter())
    }
}
