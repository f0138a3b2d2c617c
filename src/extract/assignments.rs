//! Assignment side-stream: `<<set>>` / `<<run>>` statement extraction.
//!
//! Alongside the line-level dictionary, extraction collects every variable
//! assignment in the corpus. The assigned values that are plain text (not
//! numbers, booleans or null) are translation candidates of their own; the
//! rest document the variable surface for downstream tooling.

use std::sync::LazyLock;

use regex::Regex;

static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$_][$A-Za-z_][$0-9A-Za-z_]*").unwrap());

static TO_SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\sto").unwrap());

static ASSIGN_OPERATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+\-*/%]*=").unwrap());

static IS_SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\sis\s").unwrap());

/// Mutating-call suffixes whose argument is the assigned value.
const MUTATING_CALLS: [&str; 5] = [".push(", ".pushUnique(", ".delete(", ".deleteAt(", ".splice("];

/// Value assigned to a variable, coerced from its literal spelling.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignedValue {
    Number(f64),
    Bool(bool),
    Null,
    Text(String),
}

impl AssignedValue {
    /// Only plain text is a translation candidate.
    pub fn is_translatable(&self) -> bool {
        matches!(self, AssignedValue::Text(_))
    }

    fn coerce(raw: &str) -> Self {
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<f64>() {
                return AssignedValue::Number(n);
            }
        }
        match raw {
            "true" => AssignedValue::Bool(true),
            "false" => AssignedValue::Bool(false),
            "null" => AssignedValue::Null,
            _ => AssignedValue::Text(raw.to_owned()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AssignedValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// One parsed assignment: the variable written, the value, and the raw
/// statement it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub variable: String,
    pub value: AssignedValue,
    pub raw_line: String,
}

/// A `<<set ...>>` / `<<run ...>>` statement found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStatement {
    /// `set` or `run`.
    pub head: String,
    /// Everything between the keyword and the closing `>>`.
    pub body: String,
}

impl SetStatement {
    pub fn raw_line(&self) -> String {
        format!("<<{} {}>>", self.head, self.body)
    }
}

/// Find every `<<set>>` and `<<run>>` statement in a file's content.
///
/// The closing `>>` is matched with awareness of string literals (backtick,
/// double and single quotes, with backslash escapes), `[[...]]` link markup
/// and `/* ... */` comments, so a `>` inside any of those never terminates
/// the statement.
pub fn find_statements(content: &str) -> Vec<SetStatement> {
    let mut statements = Vec::new();
    let bytes = content.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(offset) = content[pos..].find("<<") else {
            break;
        };
        let start = pos + offset;
        let after = &content[start + 2..];
        let head = if after.starts_with("set") && is_keyword_boundary(after.as_bytes().get(3)) {
            "set"
        } else if after.starts_with("run") && is_keyword_boundary(after.as_bytes().get(3)) {
            "run"
        } else {
            pos = start + 2;
            continue;
        };

        let body_start = start + 2 + head.len();
        match find_statement_end(content, body_start) {
            Some(end) => {
                statements.push(SetStatement {
                    head: head.to_owned(),
                    body: content[body_start..end].trim().to_owned(),
                });
                pos = end + 2;
            }
            None => {
                pos = start + 2;
            }
        }
    }

    statements
}

fn is_keyword_boundary(byte: Option<&u8>) -> bool {
    match byte {
        None => true,
        Some(b) => b.is_ascii_whitespace() || *b == b'>',
    }
}

/// Scan from `from` to the statement's closing `>>`, skipping over string
/// literals, link markup and comments. Returns the byte index of the `>>`.
fn find_statement_end(content: &str, from: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b'>' if bytes.get(i + 1) == Some(&b'>') => return Some(i),
            b'\n' => return None,
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\n' {
                        return None;
                    }
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'[' if bytes.get(i + 1) == Some(&b'[') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b']' && bytes.get(i + 1) == Some(&b']')) {
                    if bytes[i] == b'\n' {
                        return None;
                    }
                    i += 1;
                }
                i += 2;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    None
}

/// Parse a statement body into an assignment.
///
/// Separators are tried in order: the `to` keyword, compound assignment
/// operators, the `is` keyword, known mutating-call suffixes, a
/// parenthesis-wrapped argument, then a bare variable reference.
/// Increment/decrement tails and clock mutations are not assignments.
pub fn parse_assignment(statement: &SetStatement) -> Option<Assignment> {
    let body = statement.body.as_str();
    if body.ends_with("++") || body.ends_with("--") || body.contains("Time.set") {
        return None;
    }

    let (variable, target) = if TO_SEPARATOR_REGEX.is_match(body) {
        split_once_at(&TO_SEPARATOR_REGEX, body)
    } else if ASSIGN_OPERATOR_REGEX.is_match(body) {
        split_once_at(&ASSIGN_OPERATOR_REGEX, body)
    } else if IS_SEPARATOR_REGEX.is_match(body) {
        split_once_at(&IS_SEPARATOR_REGEX, body)
    } else if let Some(call) = MUTATING_CALLS.iter().find(|c| body.contains(*c)) {
        let variable = first_variable(body)?;
        let target = body.rsplit(call).next().unwrap_or(body);
        (variable.to_owned(), target.trim_end_matches(')').to_owned())
    } else if body.contains('(') {
        let variable = first_variable(body)?;
        let target = body
            .split_once('(')
            .map(|(_, rest)| rest.trim_end_matches(')'))
            .unwrap_or(body);
        (variable.to_owned(), target.to_owned())
    } else {
        let variable = first_variable(body)?;
        (variable.to_owned(), body.to_owned())
    };

    Some(Assignment {
        variable: variable.trim().to_owned(),
        value: AssignedValue::coerce(target.trim()),
        raw_line: statement.raw_line(),
    })
}

fn split_once_at(separator: &Regex, body: &str) -> (String, String) {
    match separator.find(body) {
        Some(m) => (body[..m.start()].to_owned(), body[m.end()..].to_owned()),
        None => (body.to_owned(), body.to_owned()),
    }
}

fn first_variable(body: &str) -> Option<&str> {
    VARIABLE_REGEX.find(body).map(|m| m.as_str())
}

/// All distinct variable references in a file's content, sorted.
pub fn collect_variables(content: &str) -> Vec<String> {
    let mut vars: Vec<String> = VARIABLE_REGEX
        .find_iter(content)
        .map(|m| m.as_str().to_owned())
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(body: &str) -> Option<Assignment> {
        parse_assignment(&SetStatement {
            head: "set".into(),
            body: body.into(),
        })
    }

    #[test]
    fn test_find_statements() {
        let content = "\
:: Start\n\
<<set $name to \"Alice\">>\n\
<<run $inventory.push(\"item\")>>\n\
<<settings>>\n\
<<set $link to [[Next >> page|next]]>>\n";
        let found = find_statements(content);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].body, "$name to \"Alice\"");
        assert_eq!(found[1].head, "run");
        assert_eq!(found[2].body, "$link to [[Next >> page|next]]");
    }

    #[test]
    fn test_statement_end_respects_quotes() {
        let found = find_statements("<<set $s to \"a >> b\">> tail");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body, "$s to \"a >> b\"");
    }

    #[test]
    fn test_parse_to_separator() {
        let a = parse("$name to \"Alice\"").unwrap();
        assert_eq!(a.variable, "$name");
        assert_eq!(a.value, AssignedValue::Text("\"Alice\"".into()));
        assert_eq!(a.raw_line, "<<set $name to \"Alice\">>");
    }

    #[test]
    fn test_parse_compound_operator() {
        let a = parse("$gold += 5").unwrap();
        assert_eq!(a.variable, "$gold");
        assert_eq!(a.value, AssignedValue::Number(5.0));
    }

    #[test]
    fn test_parse_mutating_call() {
        let a = parse("$inventory.push(\"rope\")").unwrap();
        assert_eq!(a.variable, "$inventory");
        assert_eq!(a.value, AssignedValue::Text("\"rope\"".into()));
    }

    #[test]
    fn test_parse_skips_increments_and_clock() {
        assert_eq!(parse("$count++"), None);
        assert_eq!(parse("$count--"), None);
        assert_eq!(parse("Time.set(60)"), None);
    }

    #[test]
    fn test_coercion_and_translatability() {
        assert_eq!(parse("$a to 42").unwrap().value, AssignedValue::Number(42.0));
        assert_eq!(parse("$a to true").unwrap().value, AssignedValue::Bool(true));
        assert_eq!(parse("$a to null").unwrap().value, AssignedValue::Null);
        assert!(!AssignedValue::Number(1.0).is_translatable());
        assert!(!AssignedValue::Bool(false).is_translatable());
        assert!(!AssignedValue::Null.is_translatable());
        assert!(AssignedValue::Text("hi".into()).is_translatable());
    }

    #[test]
    fn test_parse_bare_variable() {
        let a = parse("$flag").unwrap();
        assert_eq!(a.variable, "$flag");
        assert_eq!(a.value, AssignedValue::Text("$flag".into()));
    }

    #[test]
    fn test_collect_variables_sorted_deduped() {
        let vars = collect_variables("<<set $b to $a>> $a _tmp");
        assert_eq!(vars, vec!["$a", "$b", "_tmp"]);
    }
}
