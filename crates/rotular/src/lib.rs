//! Rotular: WCAG 2.4.6 Headings and Labels auditor
//!
//! Rotular (Spanish: "to label") audits a rendered page against WCAG
//! success criterion 2.4.6: every heading (h1-h6) and form label must
//! describe its topic or purpose. Locating the elements and judging
//! their text are split across three collaborators:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ROTULAR Pipeline                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐  │
//! │  │ Browser  │──►│ Correlate │──►│  Judge  │──►│  Report  │  │
//! │  │ snapshot │   │ live/     │   │ (remote │   │ assembly │  │
//! │  │ + static │   │ static    │   │  model) │   │          │  │
//! │  │ parse    │   │ elements  │   │         │   │          │  │
//! │  └──────────┘   └───────────┘   └─────────┘   └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline core is pure and synchronous; the browser (`browser`
//! feature, CDP via chromiumoxide) and the judgment endpoint (`llm`
//! feature, OpenAI-compatible chat completions) sit behind async trait
//! seams so the whole audit runs against fixtures in tests.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Audit orchestration: snapshot, correlate, judge, report
pub mod audit;
/// Browser configuration and the CDP-backed snapshot source
pub mod browser;
/// Live/static element correlation
pub mod correlate;
/// Element descriptors and the accessible-text fallback chain
pub mod descriptor;
/// Judgment collaborator seam and prompts
pub mod judge;
/// Structural element locators
pub mod locator;
/// Text normalization
pub mod normalize;
/// Structured-verdict recovery from free-form replies
pub mod recover;
/// Compliance report types
pub mod report;
/// Error and result types
pub mod result;
/// Static HTML parse
pub mod static_dom;

pub use audit::{AuditConfig, Auditor, DomSource, PageSnapshot};
pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::BrowserSession;
pub use correlate::{Correlation, CorrelationIndex, MatchTier};
pub use descriptor::{ElementDescriptor, ElementTag, FallbackDepth, RawElementRead, TextSource};
pub use judge::{ElementSubmission, Judge, JudgeError};
#[cfg(feature = "llm")]
pub use judge::LlmJudge;
pub use locator::{Locator, PathSegment};
pub use normalize::normalize;
pub use recover::{recover_batch, recover_object, recover_verdict, JudgedVerdict, RecoveryError};
pub use report::{AnalyzedElement, ComplianceReport};
pub use result::{AuditError, AuditResult, SkipReason};
pub use static_dom::{parse_elements, NodeContext, StaticElementNode};
