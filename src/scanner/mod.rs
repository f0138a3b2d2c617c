//! Line scanner: a single-forward-pass, per-line translatability classifier.
//!
//! The scanner answers one question for every line of one source file: "is
//! this line translatable display content?" All dialect variability lives in
//! data ([`DialectProfile`]): scope rules for multi-line constructs, an
//! ordered rule list of line tests, and a fallback policy. The core loop
//! below never changes per file.
//!
//! Multi-line constructs (block comments, multi-line data literals,
//! multi-line statements) are modeled purely as scope entry/exit: there is
//! no lookahead and no backtracking, so scanning is O(lines).

pub mod detectors;
pub mod profiles;

pub use profiles::{DialectProfile, ProfileRegistry};

use crate::scanner::detectors as det;

/// A single predicate over one trimmed line. Composable with
/// [`LineTest::AnyOf`] / [`LineTest::AllOf`] / [`LineTest::Not`].
#[derive(Debug, Clone)]
pub enum LineTest {
    Contains(&'static str),
    ContainsAny(Vec<&'static str>),
    StartsWith(&'static str),
    StartsWithAny(Vec<&'static str>),
    EndsWithAny(Vec<&'static str>),
    Equals(&'static str),
    EqualsAny(Vec<&'static str>),
    Is(Detector),
    AnyOf(Vec<LineTest>),
    AllOf(Vec<LineTest>),
    Not(Box<LineTest>),
    /// Never matches. Used as the exit of scopes that only EOF closes.
    Never,
}

/// Named fine-grained detectors from [`detectors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    Comment,
    EventMarker,
    OnlyMarks,
    JsonProperty,
    TagSpan,
    TagLabel,
    TagInput,
    WidgetPrint,
    WidgetOption,
    WidgetLink,
    WidgetsOnly,
}

impl Detector {
    fn matches(self, line: &str) -> bool {
        match self {
            Detector::Comment => det::is_comment(line),
            Detector::EventMarker => det::is_event_marker(line),
            Detector::OnlyMarks => det::is_only_marks(line),
            Detector::JsonProperty => det::is_json_property(line),
            Detector::TagSpan => det::is_tag_span(line),
            Detector::TagLabel => det::is_tag_label(line),
            Detector::TagInput => det::is_tag_input(line),
            Detector::WidgetPrint => det::is_widget_print(line),
            Detector::WidgetOption => det::is_widget_option(line),
            Detector::WidgetLink => det::is_widget_link(line),
            Detector::WidgetsOnly => det::is_widgets_only(line),
        }
    }
}

impl LineTest {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LineTest::Contains(p) => line.contains(p),
            LineTest::ContainsAny(ps) => ps.iter().any(|p| line.contains(p)),
            LineTest::StartsWith(p) => line.starts_with(p),
            LineTest::StartsWithAny(ps) => ps.iter().any(|p| line.starts_with(p)),
            LineTest::EndsWithAny(ps) => ps.iter().any(|p| line.ends_with(p)),
            LineTest::Equals(p) => line == *p,
            LineTest::EqualsAny(ps) => ps.iter().any(|p| line == *p),
            LineTest::Is(d) => d.matches(line),
            LineTest::AnyOf(ts) => ts.iter().any(|t| t.matches(line)),
            LineTest::AllOf(ts) => ts.iter().all(|t| t.matches(line)),
            LineTest::Not(t) => !t.matches(line),
            LineTest::Never => false,
        }
    }
}

/// One entry of a profile's ordered rule list: first matching rule wins.
#[derive(Debug, Clone)]
pub struct LineRule {
    pub test: LineTest,
    pub translatable: bool,
}

impl LineRule {
    pub fn mark(test: LineTest) -> Self {
        Self {
            test,
            translatable: true,
        }
    }

    pub fn skip(test: LineTest) -> Self {
        Self {
            test,
            translatable: false,
        }
    }
}

/// Classification of lines inside an open scope.
#[derive(Debug, Clone)]
pub enum BodyPolicy {
    /// Every body line gets the same classification.
    Fixed(bool),
    /// Body lines run their own ordered rule list, then the fallback flag.
    Rules(Vec<LineRule>, bool),
}

impl BodyPolicy {
    fn classify(&self, line: &str) -> bool {
        match self {
            BodyPolicy::Fixed(flag) => *flag,
            BodyPolicy::Rules(rules, fallback) => rules
                .iter()
                .find(|r| r.test.matches(line))
                .map(|r| r.translatable)
                .unwrap_or(*fallback),
        }
    }
}

/// A multi-line construct: entered when `entry` matches, left when `exit`
/// matches. Boundary lines (entry and exit) get `boundary_translatable`.
#[derive(Debug, Clone)]
pub struct ScopeRule {
    pub name: &'static str,
    pub entry: LineTest,
    pub exit: LineTest,
    pub body: BodyPolicy,
    pub boundary_translatable: bool,
    /// Whether further scopes may open while this one is innermost.
    /// Comment blocks swallow everything; data literals let comment blocks
    /// nest inside them.
    pub allow_nested: bool,
}

/// Classification for lines no scope and no rule claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Translatable,
    NotTranslatable,
    /// Translatable unless the line is a bare delimiter/marker with no
    /// alphanumeric content.
    UnlessOnlyMarks,
}

impl Fallback {
    fn classify(self, line: &str) -> bool {
        match self {
            Fallback::Translatable => true,
            Fallback::NotTranslatable => false,
            Fallback::UnlessOnlyMarks => !det::is_only_marks(line),
        }
    }
}

/// Mutable per-file scanner state: the stack of open scopes.
///
/// Created per file, discarded after the file's last line. Each stack slot
/// remembers the 1-based line that opened the scope so unmatched entries
/// can be reported precisely.
#[derive(Debug, Default)]
pub struct ScanState {
    stack: Vec<(usize, usize)>, // (scope index, entry line number)
}

impl ScanState {
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Result of scanning one file.
#[derive(Debug)]
pub struct ScanOutcome {
    /// One flag per input line: true = translatable.
    pub flags: Vec<bool>,
    /// One warning per scope still open at EOF.
    pub warnings: Vec<String>,
}

/// Classify every line of one file against a dialect profile.
///
/// Per line, in order: (1) if any open scope's exit matches, pop down to it
/// and emit its boundary classification; (2) try to enter a new scope when
/// nesting is allowed; (3) let the innermost open scope's body policy
/// classify; (4) run the profile's ordered rule list; (5) fall back to the
/// profile's fallback policy. Empty lines are never translatable.
///
/// A file ending with open scopes is tolerated: the lines from the first
/// unmatched entry onward are demoted to non-translatable, and one warning
/// per unmatched scope is recorded.
pub fn scan_lines<S: AsRef<str>>(profile: &DialectProfile, lines: &[S]) -> ScanOutcome {
    let mut state = ScanState::default();
    let mut flags = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() {
            flags.push(false);
            continue;
        }

        // 1. Exit check, innermost first. Popping down to the matching
        // scope also discards anything nested above it.
        if let Some(pos) = state
            .stack
            .iter()
            .rposition(|&(i, _)| profile.scopes[i].exit.matches(line))
        {
            let (scope_idx, _) = state.stack[pos];
            flags.push(profile.scopes[scope_idx].boundary_translatable);
            state.stack.truncate(pos);
            continue;
        }

        // 2. Entry check, gated on the innermost scope's nesting policy.
        let may_enter = state
            .stack
            .last()
            .is_none_or(|&(i, _)| profile.scopes[i].allow_nested);
        if may_enter {
            let already_open = |i: usize| state.stack.iter().any(|&(open, _)| open == i);
            if let Some((i, scope)) = profile
                .scopes
                .iter()
                .enumerate()
                .find(|(i, s)| !already_open(*i) && s.entry.matches(line))
            {
                state.stack.push((i, idx + 1));
                flags.push(scope.boundary_translatable);
                continue;
            }
        }

        // 3. Innermost scope body.
        if let Some(&(i, _)) = state.stack.last() {
            flags.push(profile.scopes[i].body.classify(line));
            continue;
        }

        // 4. Ordered rule list, first match wins.
        if let Some(rule) = profile.rules.iter().find(|r| r.test.matches(line)) {
            flags.push(rule.translatable);
            continue;
        }

        // 5. Fallback policy.
        flags.push(profile.fallback.classify(line));
    }

    let warnings = state
        .stack
        .iter()
        .map(|&(i, entry_line)| {
            format!(
                "scope '{}' opened at line {} was never closed",
                profile.scopes[i].name, entry_line
            )
        })
        .collect();

    // An entry without an exit means the body classification was never
    // confirmed; everything from the outermost unmatched entry onward is
    // demoted to non-translatable.
    if let Some(&(_, entry_line)) = state.stack.first() {
        for flag in flags.iter_mut().skip(entry_line - 1) {
            *flag = false;
        }
    }

    ScanOutcome { flags, warnings }
}
