//! Audit orchestration: snapshot, correlate, judge, report.
//!
//! [`Auditor`] is generic over its two collaborator seams so the whole
//! pipeline runs against fixture sources and scripted judges in tests.
//! The browser-backed [`DomSource`] lives behind the `browser` feature;
//! the chat-completions [`Judge`](crate::judge::Judge) behind `llm`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::correlate::CorrelationIndex;
use crate::descriptor::{extract, ElementDescriptor, FallbackDepth, RawElementRead};
use crate::judge::{ElementSubmission, Judge};
use crate::recover::{recover_batch, recover_verdict};
use crate::report::{AnalyzedElement, ComplianceReport};
use crate::result::AuditResult;
use crate::static_dom::{parse_elements, StaticElementNode};

/// Everything read from a page in one visit: the serialized source for
/// the static parse and one raw read per audited live element.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    /// Page source at snapshot time
    pub html: String,
    /// Raw per-element reads, in browser query order
    pub elements: Vec<RawElementRead>,
}

/// Source of page snapshots. One session, one or more pages, closed
/// exactly once.
#[async_trait]
pub trait DomSource {
    /// Navigate to `url`, wait for the document, and collect a snapshot
    async fn snapshot(&mut self, url: &str) -> AuditResult<PageSnapshot>;

    /// Release the session. Called on every audit exit path.
    async fn close(&mut self) -> AuditResult<()>;
}

/// Per-run configuration, passed in at construction. No process-wide
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditConfig {
    /// How deep the alternate-text fallback chain goes
    pub fallback_depth: FallbackDepth,
    /// Judge every element in one call instead of one call per element
    pub batch: bool,
}

/// The audit pipeline.
pub struct Auditor<D, J> {
    source: D,
    judge: J,
    config: AuditConfig,
}

impl<D, J> Auditor<D, J>
where
    D: DomSource + Send,
    J: Judge + Send + Sync,
{
    /// Create an auditor with default configuration
    pub fn new(source: D, judge: J) -> Self {
        Self::with_config(source, judge, AuditConfig::default())
    }

    /// Create an auditor with explicit configuration
    pub fn with_config(source: D, judge: J, config: AuditConfig) -> Self {
        Self {
            source,
            judge,
            config,
        }
    }

    /// Audit one page.
    ///
    /// Run-level failures (launch, navigation, evaluation) propagate;
    /// per-element failures degrade to skips or synthesized
    /// non-descriptive verdicts. The session is closed on every exit
    /// path, success or failure.
    pub async fn run(mut self, url: &str) -> AuditResult<ComplianceReport> {
        let outcome = self.run_inner(url).await;
        if let Err(close_err) = self.source.close().await {
            warn!(error = %close_err, "session close failed");
        }
        outcome
    }

    async fn run_inner(&mut self, url: &str) -> AuditResult<ComplianceReport> {
        info!(url, "starting audit");
        let snapshot = self.source.snapshot(url).await?;

        let descriptors = self.build_descriptors(&snapshot.elements);
        let nodes = parse_elements(&snapshot.html);
        info!(
            live = descriptors.len(),
            parsed = nodes.len(),
            "page snapshot collected"
        );

        let index = CorrelationIndex::new(descriptors);
        let targets: Vec<JudgmentTarget> = nodes
            .iter()
            .map(|node| JudgmentTarget::prepare(&index, node))
            .collect();

        let analyzed = if self.config.batch {
            self.judge_batched(url, targets).await
        } else {
            self.judge_sequential(url, targets).await
        };

        Ok(ComplianceReport::assemble(url, analyzed))
    }

    fn build_descriptors(&self, reads: &[RawElementRead]) -> Vec<ElementDescriptor> {
        reads
            .iter()
            .filter_map(|read| match extract(read, self.config.fallback_depth) {
                Ok(descriptor) => Some(descriptor),
                Err(skip) => {
                    warn!(tag = %read.tag, reason = %skip, "element skipped");
                    None
                }
            })
            .collect()
    }

    /// One judgment call per element, strictly sequential; each call
    /// blocks the next.
    async fn judge_sequential(&self, url: &str, targets: Vec<JudgmentTarget>) -> Vec<AnalyzedElement> {
        let total = targets.len();
        let mut analyzed = Vec::with_capacity(total);

        for (i, target) in targets.into_iter().enumerate() {
            info!(element = i + 1, total, tag = %target.submission.element_type, "judging element");
            let element = match self.judge.judge_element(url, &target.submission).await {
                Ok(reply) => {
                    debug!(reply = %reply, "raw judgment reply");
                    match recover_verdict(&reply) {
                        Ok(verdict) => target.analyzed(verdict),
                        Err(err) => {
                            warn!(error = %err, "verdict recovery failed");
                            target.failed(&err.to_string())
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "judgment call failed");
                    target.failed(&err.to_string())
                }
            };
            analyzed.push(element);
        }

        analyzed
    }

    /// Single judgment call covering every element. Reply entries are
    /// applied positionally; elements the reply omits (or whose entry
    /// lost its verdict to truncation repair) get a synthesized
    /// failure.
    async fn judge_batched(&self, url: &str, targets: Vec<JudgmentTarget>) -> Vec<AnalyzedElement> {
        if targets.is_empty() {
            return vec![];
        }

        let submissions: Vec<ElementSubmission> =
            targets.iter().map(|t| t.submission.clone()).collect();
        info!(total = targets.len(), "judging batch");

        let entries = match self.judge.judge_batch(url, &submissions).await {
            Ok(reply) => {
                debug!(reply = %reply, "raw batch reply");
                match recover_batch(&reply) {
                    Ok(entries) => entries,
                    Err(err) => {
                        warn!(error = %err, "batch recovery failed");
                        let message = err.to_string();
                        return targets.into_iter().map(|t| t.failed(&message)).collect();
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "batch judgment call failed");
                let message = err.to_string();
                return targets.into_iter().map(|t| t.failed(&message)).collect();
            }
        };

        let mut verdicts = entries.into_iter().map(|entry| entry.verdict);
        targets
            .into_iter()
            .map(|target| match verdicts.next() {
                Some(Some(verdict)) => target.analyzed(verdict),
                Some(None) => target.failed("batch reply entry carried no verdict"),
                None => target.failed("batch reply omitted this element"),
            })
            .collect()
    }
}

/// One static node resolved against the live index and ready for
/// judgment.
struct JudgmentTarget {
    submission: ElementSubmission,
    element: AnalyzedElement,
}

impl JudgmentTarget {
    fn prepare(index: &CorrelationIndex, node: &StaticElementNode) -> Self {
        let correlation = index.correlate(node);

        // Judged text: live descriptor text (annotated with the
        // fallback that produced it) when one correlated, else the
        // static parse text.
        let text = match correlation.descriptor {
            Some(desc) => match desc.annotation() {
                Some(note) if desc.normalized_text.is_empty() => note,
                Some(note) => format!("{} {note}", desc.normalized_text),
                None => desc.normalized_text.clone(),
            },
            None => crate::normalize::normalize(&node.text),
        };

        let submission = ElementSubmission {
            element_type: node.tag.as_str().to_string(),
            text: text.clone(),
            markup: node.markup.clone(),
            context: Some(node.context.clone()),
        };

        // The verdict fields are filled in after judgment; this holds
        // the element's identity.
        let element = AnalyzedElement {
            element_type: node.tag,
            text,
            locator: correlation.locator,
            descriptive: false,
            evaluation: String::new(),
            recommendations: vec![],
        };

        Self {
            submission,
            element,
        }
    }

    fn analyzed(self, verdict: crate::recover::JudgedVerdict) -> AnalyzedElement {
        AnalyzedElement::from_verdict(
            self.element.element_type,
            self.element.text,
            self.element.locator,
            verdict,
        )
    }

    fn failed(self, diagnostic: &str) -> AnalyzedElement {
        AnalyzedElement::failed_judgment(
            self.element.element_type,
            self.element.text,
            self.element.locator,
            diagnostic,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeError;
    use crate::locator::Locator;
    use crate::result::AuditError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixtureSource {
        snapshot: PageSnapshot,
        closes: Arc<AtomicUsize>,
    }

    impl FixtureSource {
        fn new(html: &str, elements: Vec<RawElementRead>) -> Self {
            Self {
                snapshot: PageSnapshot {
                    html: html.to_string(),
                    elements,
                },
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl DomSource for FixtureSource {
        async fn snapshot(&mut self, _url: &str) -> AuditResult<PageSnapshot> {
            Ok(self.snapshot.clone())
        }

        async fn close(&mut self) -> AuditResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DomSource for FailingSource {
        async fn snapshot(&mut self, url: &str) -> AuditResult<PageSnapshot> {
            Err(AuditError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
        }

        async fn close(&mut self) -> AuditResult<()> {
            Ok(())
        }
    }

    /// Replies with a fixed verdict per call, counting calls.
    struct ScriptedJudge {
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedJudge {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl Judge for ScriptedJudge {
        async fn judge_element(
            &self,
            _url: &str,
            _submission: &ElementSubmission,
        ) -> Result<String, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        async fn judge_batch(
            &self,
            _url: &str,
            _submissions: &[ElementSubmission],
        ) -> Result<String, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct UnreachableJudge;

    #[async_trait]
    impl Judge for UnreachableJudge {
        async fn judge_element(
            &self,
            _url: &str,
            _submission: &ElementSubmission,
        ) -> Result<String, JudgeError> {
            Err(JudgeError::Transport {
                message: "connection refused".to_string(),
            })
        }

        async fn judge_batch(
            &self,
            _url: &str,
            _submissions: &[ElementSubmission],
        ) -> Result<String, JudgeError> {
            Err(JudgeError::Transport {
                message: "connection refused".to_string(),
            })
        }
    }

    fn heading_read(text: &str, id: &str) -> RawElementRead {
        RawElementRead {
            tag: "h1".to_string(),
            id: Some(id.to_string()),
            visible_text: Some(text.to_string()),
            locator: Some(Locator::ById(id.to_string())),
            ..RawElementRead::default()
        }
    }

    const POSITIVE: &str = r#"{"descriptive": true, "evaluation": "Clear", "recommendations": []}"#;

    #[tokio::test]
    async fn test_single_heading_audit() {
        let source = FixtureSource::new(
            r#"<html><body><h1 id="main">Welcome</h1></body></html>"#,
            vec![heading_read("Welcome", "main")],
        );
        let auditor = Auditor::new(source, ScriptedJudge::new(POSITIVE));
        let report = auditor.run("https://example.com").await.unwrap();

        assert_eq!(report.total_elements, 1);
        assert_eq!(report.total_headings, 1);
        assert!(report.wcag_2_4_6_compliant);
        let element = &report.descriptive_elements_details[0];
        assert_eq!(element.locator, Locator::ById("main".to_string()));
        assert_eq!(element.text, "Welcome");
    }

    #[tokio::test]
    async fn test_judge_failure_degrades_not_aborts() {
        let source = FixtureSource::new(
            r#"<html><body><h1 id="main">Welcome</h1></body></html>"#,
            vec![heading_read("Welcome", "main")],
        );
        let auditor = Auditor::new(source, UnreachableJudge);
        let report = auditor.run("https://example.com").await.unwrap();

        assert_eq!(report.total_elements, 1);
        assert!(!report.wcag_2_4_6_compliant);
        let element = &report.non_descriptive_elements_details[0];
        assert!(element.evaluation.contains("Analysis failed"));
    }

    #[tokio::test]
    async fn test_navigation_failure_propagates() {
        let auditor = Auditor::new(FailingSource, ScriptedJudge::new(POSITIVE));
        let err = auditor.run("https://nowhere.invalid").await.unwrap_err();
        assert!(matches!(err, AuditError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_batch_mode_makes_one_call() {
        let html = r#"<html><body><h1 id="a">Alpha</h1><h1 id="b">Beta</h1></body></html>"#;
        let reads = vec![heading_read("Alpha", "a"), heading_read("Beta", "b")];
        let judge = ScriptedJudge::new(
            r#"{"elements": [
                {"type": "h1", "text": "Alpha", "descriptive": true, "evaluation": "ok", "recommendations": []},
                {"type": "h1", "text": "Beta", "descriptive": false, "evaluation": "vague", "recommendations": ["be specific"]}
            ]}"#,
        );
        let calls = judge.counter();
        let auditor = Auditor::with_config(
            FixtureSource::new(html, reads),
            judge,
            AuditConfig {
                batch: true,
                ..AuditConfig::default()
            },
        );
        let report = auditor.run("https://example.com").await.unwrap();

        assert_eq!(report.total_elements, 2);
        assert_eq!(report.descriptive_elements, 1);
        assert_eq!(report.non_descriptive_elements, 1);
        // One call total, not one per element
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_reply_short_entries_synthesize_failures() {
        let html = r#"<html><body><h1 id="a">Alpha</h1><h1 id="b">Beta</h1></body></html>"#;
        let reads = vec![heading_read("Alpha", "a"), heading_read("Beta", "b")];
        let judge = ScriptedJudge::new(
            r#"{"elements": [
                {"type": "h1", "text": "Alpha", "descriptive": true, "evaluation": "ok", "recommendations": []}
            ]}"#,
        );
        let auditor = Auditor::with_config(
            FixtureSource::new(html, reads),
            judge,
            AuditConfig {
                batch: true,
                ..AuditConfig::default()
            },
        );
        let report = auditor.run("https://example.com").await.unwrap();

        assert_eq!(report.total_elements, 2);
        assert_eq!(report.descriptive_elements, 1);
        assert_eq!(report.non_descriptive_elements, 1);
        assert!(report.non_descriptive_elements_details[0]
            .evaluation
            .contains("omitted"));
    }

    #[tokio::test]
    async fn test_skipped_read_still_reports_static_node() {
        // The live read failed; the static node still appears, judged
        // on its static text, with an unresolved locator.
        let mut bad = heading_read("Welcome", "main");
        bad.error = Some("stale element".to_string());
        let source = FixtureSource::new(
            r#"<html><body><h1 id="main">Welcome</h1></body></html>"#,
            vec![bad],
        );
        let auditor = Auditor::new(source, ScriptedJudge::new(POSITIVE));
        let report = auditor.run("https://example.com").await.unwrap();

        assert_eq!(report.total_elements, 1);
        let element = &report.descriptive_elements_details[0];
        assert_eq!(element.locator, Locator::Unresolved);
        assert_eq!(element.text, "Welcome");
    }

    #[tokio::test]
    async fn test_session_closed_exactly_once() {
        let source = FixtureSource::new(
            r#"<html><body><h1 id="main">Welcome</h1></body></html>"#,
            vec![heading_read("Welcome", "main")],
        );
        let closes = Arc::clone(&source.closes);
        let auditor = Auditor::new(source, ScriptedJudge::new(POSITIVE));
        auditor.run("https://example.com").await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_page_reports_compliant() {
        let source = FixtureSource::new(r"<html><body><p>nothing</p></body></html>", vec![]);
        let auditor = Auditor::new(source, ScriptedJudge::new(POSITIVE));
        let report = auditor.run("https://example.com").await.unwrap();
        assert_eq!(report.total_elements, 0);
        assert!(report.wcag_2_4_6_compliant);
    }
}
