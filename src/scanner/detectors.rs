//! Fine-grained line detectors for the templated-script dialect.
//!
//! These are the building blocks dialect profiles compose: each answers one
//! narrow question about a single trimmed line. None of them look at
//! neighbouring lines; multi-line constructs are the scanner's scope rules.

use std::sync::LazyLock;

use regex::Regex;

static TAG_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span.*?>["\w.\-+$]"#).unwrap());

static TAG_LABEL_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<label>[\w\-+]").unwrap());

static TAG_LABEL_CLOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w</label>").unwrap());

static TAG_INPUT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<input.*?value=""#).unwrap());

static WIDGET_PRINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<<(?:print|=|-)\s[^<]*["'`\w]+[\-?\s\w.$,'"<>\[\]()/]+(?:\)>>|">>|'>>|`>>|\]>>|>>)"#)
        .unwrap()
});

static WIDGET_OPTION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<<option\s""#).unwrap());

static WIDGET_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<<link\s*(\[\[|"\w|`\w|'\w|"\(|`\(|'\(|_\w|`)"#).unwrap()
});

static JSON_PROPERTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\w"]*\s*:\s*[ `'/$.\w":,|(){}\[\]]+,*$"#).unwrap()
});

static WIDGET_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<(?:[^<>]*?|run.*?|for.*?)>>").unwrap());

static HTML_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[/\s\w"=\-@$+'.]*>"#).unwrap());

static VAR_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[$_][^_][#;\w.()\[\]"'`]*"#).unwrap());

/// Single-line comment: `/* ... */`, `<!-- ... -->`, or a continuation
/// marker of a block comment.
pub fn is_comment(line: &str) -> bool {
    if line.starts_with('*') || line.starts_with("*/") || line.starts_with("-->") {
        return true;
    }
    (line.starts_with("/*") || line.starts_with("<!--"))
        && (line.ends_with("*/") || line.ends_with("-->"))
}

/// Passage/event header marker (`:: PassageName`).
pub fn is_event_marker(line: &str) -> bool {
    line.contains("::")
}

/// Line made of symbols only, no ASCII alphanumeric content.
pub fn is_only_marks(line: &str) -> bool {
    !line.chars().any(|c| c.is_ascii_alphanumeric())
}

/// JSON-property-shaped line (`key: value,`), structural data rather than
/// display text.
pub fn is_json_property(line: &str) -> bool {
    JSON_PROPERTY_REGEX.is_match(line)
}

/// `<span ...>` tag immediately followed by literal content.
pub fn is_tag_span(line: &str) -> bool {
    TAG_SPAN_REGEX.is_match(line)
}

/// `<label>` tag with literal content on either side.
pub fn is_tag_label(line: &str) -> bool {
    TAG_LABEL_OPEN_REGEX.is_match(line) || TAG_LABEL_CLOSE_REGEX.is_match(line)
}

/// `<input ... value="...">` tag carrying a literal value.
pub fn is_tag_input(line: &str) -> bool {
    TAG_INPUT_REGEX.is_match(line)
}

/// Print-style widget (`<<print ...>>`, `<<= ...>>`, `<<- ...>>`) whose
/// argument carries literal content.
pub fn is_widget_print(line: &str) -> bool {
    WIDGET_PRINT_REGEX.is_match(line)
}

/// `<<option "...">>` widget.
pub fn is_widget_option(line: &str) -> bool {
    WIDGET_OPTION_REGEX.is_match(line)
}

/// `<<link ...>>` widget with a literal or bracketed label.
pub fn is_widget_link(line: &str) -> bool {
    WIDGET_LINK_REGEX.is_match(line)
}

/// True when the line contains only widgets, tags and variable references,
/// with no residual display text.
///
/// Works by stripping widget spans, then HTML tags, then variable
/// references, and checking whether anything alphanumeric survives. The
/// three passes short-circuit as soon as the residue is clean, mirroring
/// the cheap-to-expensive ordering of the checks.
pub fn is_widgets_only(line: &str) -> bool {
    // Lines with no markup and no variable sigils can't be widgets-only.
    if !line.contains('<') && !line.contains('$') && !line.starts_with('_') {
        return false;
    }

    let residue_is_clean =
        |s: &str| s.trim().is_empty() || is_comment(s.trim()) || is_only_marks(s.trim());

    let cleaned = WIDGET_SPAN_REGEX.replace_all(line, "");
    if !cleaned.contains('<') && !cleaned.contains('$') && !cleaned.starts_with('_') {
        return residue_is_clean(&cleaned);
    }

    let cleaned = HTML_TAG_REGEX.replace_all(&cleaned, "");
    if !cleaned.contains('$') && !cleaned.starts_with('_') {
        return residue_is_clean(&cleaned);
    }

    let cleaned = VAR_REF_REGEX.replace_all(&cleaned, "");
    residue_is_clean(&cleaned)
}
