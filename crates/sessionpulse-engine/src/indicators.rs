use regex::{Regex, RegexBuilder};
use sessionpulse_types::{SessionRecord, ToolExecutionRecord};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

// NOTE: Indicator extraction design
//
// Regex tables are a heuristic oracle, not ground truth. The resolver only
// ever sees the `IndicatorSet` produced by an `IndicatorClassifier`, so an
// ML- or schema-based classifier can be swapped in without touching it.
//
// Indicator strings are "category:pattern" where pattern is the regex source
// text. Completion fragments (see completion.rs) match against these strings,
// so renaming a pattern changes which transactions count as completed.

const SUCCESS_PATTERNS: &[(&str, &[&str])] = &[
    (
        "authentication",
        &[
            r"login.*success",
            r"authenticated",
            r"logged.?in",
            r"regist(?:ered|ration.*success)",
            r"welcome",
        ],
    ),
    (
        "transaction",
        &[
            r"order.*(?:placed|confirmed|created)",
            r"payment.*(?:success|complete|accepted)",
            r"checkout.*complete",
            r"purchase.*(?:success|complete)",
        ],
    ),
    (
        "data_operations",
        &[
            r"retrieved",
            r"found\s+\d+",
            r"account.*created",
            r"record.*(?:created|updated|saved)",
            r"saved",
        ],
    ),
    (
        "navigation",
        &[r"redirect", r"page.*loaded", r"navigated"],
    ),
    (
        "form_submission",
        &[r"submitted", r"form.*(?:accepted|success)", r"thank\s+you"],
    ),
    (
        "general",
        &[r"success", r#""status"\s*:\s*"ok""#, r"completed"],
    ),
];

const FAILURE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "authentication",
        &[
            r"unauthori[sz]ed",
            r"invalid.*(?:credentials|password|token)",
            r"login.*fail",
            r"access.*denied",
            r"forbidden",
        ],
    ),
    (
        "validation",
        &[
            r"validation.*(?:error|fail)",
            r"required\s+field",
            r"missing.*(?:field|parameter)",
            r"malformed",
        ],
    ),
    (
        "server_errors",
        &[
            r"internal\s+server\s+error",
            r"service\s+unavailable",
            r"bad\s+gateway",
            r"gateway\s+timeout",
        ],
    ),
    (
        "business_logic",
        &[
            r"insufficient",
            r"out\s+of\s+stock",
            r"not\s+allowed",
            r"limit\s+exceeded",
            r"already\s+exists",
        ],
    ),
    ("general", &[r"error", r"fail(?:ed|ure)?", r"exception"]),
];

/// Evidence found in one piece of text, as "category:pattern" strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSet {
    pub success: BTreeSet<String>,
    pub failure: BTreeSet<String>,
}

impl IndicatorSet {
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.failure.is_empty()
    }

    pub fn merge(&mut self, other: IndicatorSet) {
        self.success.extend(other.success);
        self.failure.extend(other.failure);
    }
}

/// Strategy that turns response text into success/failure evidence.
pub trait IndicatorClassifier: Send + Sync {
    fn classify(&self, text: &str) -> IndicatorSet;
}

struct CompiledPattern {
    label: String,
    regex: Regex,
}

/// Category-partitioned list of case-insensitive patterns.
pub struct PatternTable {
    patterns: Vec<CompiledPattern>,
}

impl PatternTable {
    pub fn new(categories: &[(&str, &[&str])]) -> Result<Self, regex::Error> {
        let mut patterns = Vec::new();
        for (category, sources) in categories {
            for source in *sources {
                let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
                patterns.push(CompiledPattern {
                    label: format!("{}:{}", category, source),
                    regex,
                });
            }
        }
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Labels of every pattern that matches `text`, in table order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.patterns
            .iter()
            .filter(move |p| p.regex.is_match(text))
            .map(|p| p.label.as_str())
    }
}

static DEFAULT_SUCCESS: LazyLock<Arc<PatternTable>> =
    LazyLock::new(|| Arc::new(PatternTable::new(SUCCESS_PATTERNS).unwrap()));
static DEFAULT_FAILURE: LazyLock<Arc<PatternTable>> =
    LazyLock::new(|| Arc::new(PatternTable::new(FAILURE_PATTERNS).unwrap()));

/// Default classifier backed by the built-in success/failure tables.
#[derive(Clone)]
pub struct RegexIndicatorClassifier {
    success: Arc<PatternTable>,
    failure: Arc<PatternTable>,
}

impl Default for RegexIndicatorClassifier {
    fn default() -> Self {
        Self {
            success: Arc::clone(&DEFAULT_SUCCESS),
            failure: Arc::clone(&DEFAULT_FAILURE),
        }
    }
}

impl RegexIndicatorClassifier {
    /// Build a classifier from caller-supplied tables.
    pub fn with_tables(success: PatternTable, failure: PatternTable) -> Self {
        Self {
            success: Arc::new(success),
            failure: Arc::new(failure),
        }
    }
}

impl IndicatorClassifier for RegexIndicatorClassifier {
    fn classify(&self, text: &str) -> IndicatorSet {
        let mut set = IndicatorSet::default();
        if text.is_empty() {
            return set;
        }
        set.success
            .extend(self.success.matches(text).map(str::to_string));
        set.failure
            .extend(self.failure.matches(text).map(str::to_string));
        set
    }
}

/// Collect the evidence carried by one execution's response payload.
///
/// Error messages are not scanned; they feed the error summary and the
/// critical-error check instead.
pub fn extract_indicators(
    classifier: &dyn IndicatorClassifier,
    execution: &ToolExecutionRecord,
) -> IndicatorSet {
    classifier.classify(&execution.response.to_text())
}

/// Merge evidence into a session; sets deduplicate repeated matches.
pub fn apply_indicators(record: &mut SessionRecord, indicators: IndicatorSet) {
    record.success_indicators.extend(indicators.success);
    record.failure_indicators.extend(indicators.failure);
}
