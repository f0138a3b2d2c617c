//! Dialect profiles: data-described rule sets driving the line scanner.
//!
//! The corpus this pipeline targets has per-file quirks: some files are
//! pure data with one translatable property, some are widget soup with
//! narrative text in between, some carry multi-line JSON literals inside
//! `<<set>>` statements. All of that variability is expressed here as data:
//! a profile is scope rules + an ordered rule list + a fallback policy,
//! and profiles are selected by a `(parent_dir, file_name)` lookup with a
//! normal-case default. The scanner's core loop never branches on file
//! names.

use std::{collections::HashMap, path::Path, sync::LazyLock};

use super::{BodyPolicy, Detector, Fallback, LineRule, LineTest, ScopeRule};

/// Declarative rule set for one script/template variant.
#[derive(Debug, Clone)]
pub struct DialectProfile {
    pub name: &'static str,
    /// Multi-line constructs, tried in order for entry.
    pub scopes: Vec<ScopeRule>,
    /// Ordered line rules, first match wins.
    pub rules: Vec<LineRule>,
    /// Policy for lines nothing claimed.
    pub fallback: Fallback,
}

fn block_comment_scope() -> ScopeRule {
    ScopeRule {
        name: "block-comment",
        entry: LineTest::AllOf(vec![
            LineTest::StartsWithAny(vec!["/*", "<!--"]),
            LineTest::Not(Box::new(LineTest::EndsWithAny(vec!["*/", "-->"]))),
        ]),
        exit: LineTest::EndsWithAny(vec!["*/", "-->"]),
        body: BodyPolicy::Fixed(false),
        boundary_translatable: false,
        allow_nested: false,
    }
}

fn script_scope() -> ScopeRule {
    ScopeRule {
        name: "script-block",
        entry: LineTest::Equals("<<script>>"),
        exit: LineTest::Equals("<</script>>"),
        // Embedded code is opaque except for the one string-building idiom
        // the corpus displays to the player.
        body: BodyPolicy::Rules(
            vec![LineRule::mark(LineTest::Contains(".replace(/[^a-zA-Z"))],
            false,
        ),
        boundary_translatable: false,
        allow_nested: false,
    }
}

fn multiline_statement_scope(name: &'static str, keyword: &'static str) -> ScopeRule {
    ScopeRule {
        name,
        entry: LineTest::AllOf(vec![
            LineTest::StartsWith(keyword),
            LineTest::Not(Box::new(LineTest::Contains(">>"))),
        ]),
        exit: LineTest::Contains(">>"),
        body: BodyPolicy::Fixed(false),
        boundary_translatable: false,
        allow_nested: false,
    }
}

fn data_literal_scope(body: BodyPolicy) -> ScopeRule {
    ScopeRule {
        name: "data-literal",
        entry: LineTest::AllOf(vec![
            LineTest::StartsWithAny(vec!["<<set ", "<<run "]),
            LineTest::Not(Box::new(LineTest::Contains(">>"))),
        ]),
        exit: LineTest::EndsWithAny(vec!["}>>", "})>>", "]>>", ")>>", "});>>"]),
        body,
        boundary_translatable: false,
        allow_nested: true,
    }
}

/// Exclusion rules shared by every prose-bearing profile: comments, passage
/// markers and symbol-only lines are never content.
fn common_exclusions() -> Vec<LineRule> {
    vec![
        LineRule::skip(LineTest::Is(Detector::Comment)),
        LineRule::skip(LineTest::Is(Detector::EventMarker)),
        LineRule::skip(LineTest::Is(Detector::OnlyMarks)),
    ]
}

/// Display-tag detectors shared by prose-bearing profiles.
fn display_tag_rules() -> Vec<LineRule> {
    vec![
        LineRule::mark(LineTest::Is(Detector::TagSpan)),
        LineRule::mark(LineTest::Is(Detector::TagLabel)),
        LineRule::mark(LineTest::Is(Detector::TagInput)),
        LineRule::mark(LineTest::Is(Detector::WidgetPrint)),
        LineRule::mark(LineTest::Is(Detector::WidgetOption)),
        LineRule::mark(LineTest::Is(Detector::WidgetLink)),
    ]
}

/// The normal-case profile: exclusion rules, display-tag detectors, then
/// "structural lines are not content, everything else is".
fn normal() -> DialectProfile {
    let mut rules = common_exclusions();
    rules.extend(display_tag_rules());
    rules.push(LineRule::skip(LineTest::Is(Detector::WidgetsOnly)));
    rules.push(LineRule::skip(LineTest::Is(Detector::JsonProperty)));
    DialectProfile {
        name: "normal",
        scopes: vec![
            block_comment_scope(),
            script_scope(),
            multiline_statement_scope("multiline-if", "<<if "),
            multiline_statement_scope("multiline-error", "<<error "),
            data_literal_scope(BodyPolicy::Fixed(false)),
        ],
        rules,
        fallback: Fallback::Translatable,
    }
}

/// Only lines matching the given test are content; everything else is
/// structure. Covers the corpus's many "this file has exactly one
/// translatable shape" cases.
fn match_only(name: &'static str, test: LineTest) -> DialectProfile {
    DialectProfile {
        name,
        scopes: Vec::new(),
        rules: vec![LineRule::mark(test)],
        fallback: Fallback::NotTranslatable,
    }
}

fn passage_footer() -> DialectProfile {
    let mut rules = common_exclusions();
    rules.push(LineRule::mark(LineTest::AnyOf(vec![
        LineTest::Contains("<span"),
        LineTest::Contains("<<link"),
        LineTest::Not(Box::new(LineTest::StartsWith("<"))),
    ])));
    DialectProfile {
        name: "passage-footer",
        scopes: vec![
            ScopeRule {
                name: "error-block",
                entry: LineTest::EqualsAny(vec!["<<error {", "<<script>>"]),
                exit: LineTest::EqualsAny(vec!["}>>", "<</script>>"]),
                body: BodyPolicy::Fixed(false),
                boundary_translatable: false,
                allow_nested: false,
            },
        ],
        rules,
        fallback: Fallback::NotTranslatable,
    }
}

fn static_data() -> DialectProfile {
    DialectProfile {
        name: "static-data",
        scopes: vec![
            block_comment_scope(),
            ScopeRule {
                name: "setup-literal",
                entry: LineTest::AllOf(vec![
                    LineTest::Contains("<<set setup."),
                    LineTest::Not(Box::new(LineTest::Contains(">>"))),
                ]),
                exit: LineTest::EndsWithAny(vec!["}>>"]),
                body: BodyPolicy::Rules(
                    vec![LineRule::skip(LineTest::Is(Detector::Comment))],
                    true,
                ),
                boundary_translatable: false,
                allow_nested: true,
            },
        ],
        rules: vec![LineRule::mark(LineTest::ContainsAny(vec![
            r#""name": ""#,
            r#""message": ""#,
        ]))],
        fallback: Fallback::NotTranslatable,
    }
}

fn data_literal() -> DialectProfile {
    let mut rules = common_exclusions();
    rules.extend(display_tag_rules());
    rules.push(LineRule::skip(LineTest::Is(Detector::WidgetsOnly)));
    DialectProfile {
        name: "data-literal",
        scopes: vec![
            block_comment_scope(),
            data_literal_scope(BodyPolicy::Rules(
                vec![LineRule::mark(LineTest::ContainsAny(vec![
                    r#""start""#,
                    r#""joiner""#,
                    r#""end""#,
                ]))],
                false,
            )),
        ],
        rules,
        fallback: Fallback::Translatable,
    }
}

fn widget_heavy() -> DialectProfile {
    let mut rules = common_exclusions();
    rules.extend(display_tag_rules());
    // Ternary string literals and chained widget output read as content.
    rules.push(LineRule::mark(LineTest::ContainsAny(vec![">>.", r#"? ""#])));
    rules.push(LineRule::skip(LineTest::Is(Detector::WidgetsOnly)));
    rules.push(LineRule::skip(LineTest::Is(Detector::JsonProperty)));
    DialectProfile {
        name: "widget-heavy",
        scopes: vec![
            block_comment_scope(),
            multiline_statement_scope("multiline-if", "<<if "),
            data_literal_scope(BodyPolicy::Fixed(false)),
        ],
        rules,
        fallback: Fallback::Translatable,
    }
}

fn generation() -> DialectProfile {
    DialectProfile {
        name: "generation",
        scopes: vec![ScopeRule {
            name: "description-pool",
            entry: LineTest::Contains("set _d to"),
            exit: LineTest::Contains("]>>"),
            body: BodyPolicy::Fixed(true),
            // The opening line already carries the first pool entry.
            boundary_translatable: true,
            allow_nested: false,
        }],
        rules: vec![LineRule::mark(LineTest::Is(Detector::TagSpan))],
        fallback: Fallback::NotTranslatable,
    }
}

/// Profile selector entry: `dir == None` matches any directory. A selector
/// matches when the file's parent (or grandparent) directory name equals
/// `dir` and the file name equals `file`.
struct FileOverride {
    dir: Option<&'static str>,
    file: &'static str,
    profile: &'static str,
}

/// Directory-driven profile selection with a normal-case default.
pub struct ProfileRegistry {
    normal: DialectProfile,
    profiles: HashMap<&'static str, DialectProfile>,
    overrides: Vec<FileOverride>,
    /// Directory name prefixes that pin the normal profile outright.
    normal_prefixes: Vec<&'static str>,
}

static BUILTIN: LazyLock<ProfileRegistry> = LazyLock::new(ProfileRegistry::new);

impl ProfileRegistry {
    fn new() -> Self {
        let mut profiles = HashMap::new();
        for profile in [
            passage_footer(),
            static_data(),
            data_literal(),
            widget_heavy(),
            generation(),
            match_only(
                "version-info",
                LineTest::StartsWithAny(vec!["<h", "<p", "[["]),
            ),
            match_only("link-only", LineTest::Contains("<<link [[")),
            match_only(
                "span-or-link",
                LineTest::ContainsAny(vec!["<span ", "<<link "]),
            ),
            match_only("span-only", LineTest::Contains("<span ")),
            match_only("name-property", LineTest::Contains(r#""name": "#)),
            match_only("name-cap", LineTest::Contains("name_cap")),
            match_only(
                "start-screen",
                LineTest::AnyOf(vec![
                    LineTest::Contains("<span "),
                    LineTest::Contains("<<link [["),
                    LineTest::AllOf(vec![
                        LineTest::Not(Box::new(LineTest::StartsWith("<"))),
                        LineTest::Not(Box::new(LineTest::Is(Detector::OnlyMarks))),
                        LineTest::Not(Box::new(LineTest::Is(Detector::EventMarker))),
                    ]),
                ]),
            ),
            match_only(
                "string-returns",
                LineTest::ContainsAny(vec!["return `", "return '", r#"return ""#, "either("]),
            ),
            match_only(
                "labelled-fields",
                LineTest::ContainsAny(vec!["title: ", "desc: ", "hint: ", ".html"]),
            ),
            match_only(
                "named-colours",
                LineTest::ContainsAny(vec![r#"name_cap: ""#, r#"name: ""#]),
            ),
            match_only(
                "word-pool",
                LineTest::ContainsAny(vec!["const wordList", "wordList.push"]),
            ),
            match_only("quoted-strings", LineTest::ContainsAny(vec!["'", "\"", "`"])),
        ] {
            profiles.insert(profile.name, profile);
        }

        let overrides = vec![
            // Twee corpus, keyed by the game tree's directory layout.
            file_override(Some("00-framework-tools"), "waiting-room.twee", "passage-footer"),
            file_override(Some("01-config"), "start.twee", "start-screen"),
            file_override(Some("01-config"), "versionInfo.twee", "version-info"),
            file_override(Some("04-Variables"), "canvasmodel-example.twee", "link-only"),
            file_override(Some("04-Variables"), "variables-versionUpdate.twee", "span-or-link"),
            file_override(Some("04-Variables"), "variables-passageFooter.twee", "passage-footer"),
            file_override(Some("04-Variables"), "variables-static.twee", "static-data"),
            file_override(Some("04-Variables"), "pregnancyVar.twee", "name-property"),
            file_override(Some("04-Variables"), "hair-styles.twee", "name-cap"),
            file_override(Some("base-clothing"), "clothing-sets.twee", "data-literal"),
            file_override(Some("base-clothing"), "images.twee", "span-only"),
            file_override(Some("base-clothing"), "wardrobes.twee", "widget-heavy"),
            file_override(Some("base-combat"), "generation.twee", "generation"),
            file_override(Some("base-combat"), "actions.twee", "widget-heavy"),
            file_override(Some("base-combat"), "widgets.twee", "widget-heavy"),
            // Script corpus: data files with one translatable shape each.
            file_override(None, "macros.js", "string-returns"),
            file_override(None, "feats.js", "labelled-fields"),
            file_override(None, "colours.js", "named-colours"),
            file_override(None, "children-story-functions.js", "word-pool"),
            file_override(None, "weather-descriptions.js", "quoted-strings"),
            file_override(None, "stat-changes.js", "string-returns"),
        ];

        Self {
            normal: normal(),
            profiles,
            overrides,
            normal_prefixes: vec!["overworld-", "loc-", "special-"],
        }
    }

    /// The process-wide builtin registry.
    pub fn builtin() -> &'static ProfileRegistry {
        &BUILTIN
    }

    pub fn get(&self, name: &str) -> Option<&DialectProfile> {
        if name == self.normal.name {
            return Some(&self.normal);
        }
        self.profiles.get(name)
    }

    /// Select the profile for a source file by `(parent_dir, file_name)`.
    ///
    /// Precedence: prefix-pinned directories, then file overrides (a file
    /// override may name the parent or grandparent directory), then the
    /// normal default.
    pub fn select(&self, rel_path: &Path) -> &DialectProfile {
        let file_name = rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let dir_name = dir_component(rel_path, 1);
        let parent_name = dir_component(rel_path, 2);

        let normal = &self.normal;

        if self
            .normal_prefixes
            .iter()
            .any(|prefix| dir_name.starts_with(prefix))
        {
            return normal;
        }

        for ov in &self.overrides {
            if ov.file != file_name {
                continue;
            }
            let dir_matches = match ov.dir {
                None => true,
                Some(dir) => dir == dir_name || dir == parent_name,
            };
            if dir_matches {
                return self.profiles.get(ov.profile).unwrap_or(normal);
            }
        }

        normal
    }
}

fn file_override(
    dir: Option<&'static str>,
    file: &'static str,
    profile: &'static str,
) -> FileOverride {
    FileOverride { dir, file, profile }
}

fn dir_component(rel_path: &Path, up: usize) -> &str {
    let mut current = rel_path;
    for _ in 0..up {
        match current.parent() {
            Some(p) => current = p,
            None => return "",
        }
    }
    current
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_is_normal() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.select(Path::new("some-dir/random-file.twee"));
        assert_eq!(profile.name, "normal");
    }

    #[test]
    fn test_file_override_by_parent_dir() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.select(Path::new("01-config/versionInfo.twee"));
        assert_eq!(profile.name, "version-info");
    }

    #[test]
    fn test_file_override_by_grandparent_dir() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.select(Path::new("base-combat/sub/actions.twee"));
        assert_eq!(profile.name, "widget-heavy");
    }

    #[test]
    fn test_any_dir_override() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.select(Path::new("02-Helpers/macros.js"));
        assert_eq!(profile.name, "string-returns");
    }

    #[test]
    fn test_prefix_pins_normal() {
        let registry = ProfileRegistry::builtin();
        // Even a file name with an override stays normal in a pinned dir.
        let profile = registry.select(Path::new("overworld-town/macros.js"));
        assert_eq!(profile.name, "normal");
    }

    #[test]
    fn test_version_info_profile_classification() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.get("version-info").unwrap();
        let outcome = crate::scanner::scan_lines(
            profile,
            &["<h2>Release notes</h2>", "<<set $x to 1>>", "[[Back]]"],
        );
        assert_eq!(outcome.flags, vec![true, false, true]);
    }

    #[test]
    fn test_normal_profile_prose_and_widgets() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.get("normal").unwrap();
        let lines = [
            ":: Passage",
            "You open the door.",
            "<<set $door to 1>>",
            "<span class=\"gold\">A warm light.</span>",
            "/* comment",
            "hidden",
            "*/",
        ];
        let outcome = crate::scanner::scan_lines(profile, &lines);
        assert_eq!(
            outcome.flags,
            vec![false, true, false, true, false, false, false]
        );
    }
}
