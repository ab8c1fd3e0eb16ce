//! Single-file compile step.
//!
//! A lightweight scanner over JavaScript/TypeScript source. It understands
//! strings, template literals, regex literals and comments well enough to
//! check delimiter balance, flag `debugger` statements, strip comments and
//! honour `// rome-ignore <category>` suppression comments. It is not a
//! parser.

use romec_core::{CompileResult, Diagnostic, Severity, SourceLocation, Suppression};

pub const UNTERMINATED_STRING: &str = "parse/unterminatedString";
pub const UNTERMINATED_COMMENT: &str = "parse/unterminatedComment";
pub const UNTERMINATED_REGEX: &str = "parse/unterminatedRegex";
pub const UNBALANCED_DELIMITER: &str = "parse/unbalancedDelimiter";
pub const UNCLOSED_DELIMITER: &str = "parse/unclosedDelimiter";
pub const NO_DEBUGGER: &str = "lint/noDebugger";

const SUPPRESSION_DIRECTIVE: &str = "rome-ignore";

/// Everything the scanner learned about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Source with comments removed and line structure intact.
    pub stripped: String,
    /// Final emitted code.
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
    pub suppressions: Vec<Suppression>,
    /// Locations of ES module `import`/`export` statements.
    pub module_syntax: Vec<SourceLocation>,
}

impl Transformed {
    pub fn into_result(self) -> CompileResult {
        CompileResult {
            compiled_code: self.code,
            diagnostics: self.diagnostics,
            suppressions: self.suppressions,
        }
    }
}

/// Compile one file. `file` labels diagnostic locations.
pub fn compile_source(file: &str, source: &str) -> CompileResult {
    transform_source(file, source).into_result()
}

/// Run the scanner and apply suppression comments.
pub fn transform_source(file: &str, source: &str) -> Transformed {
    let scan = Scanner::new(file, source).run();
    let directives = suppression_directives(source, &scan.line_comments);
    let (diagnostics, suppressions) = apply_suppressions(scan.diagnostics, &directives);
    let code = tidy(&scan.stripped);

    Transformed {
        stripped: scan.stripped,
        code,
        diagnostics,
        suppressions,
        module_syntax: scan.module_syntax,
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct ScanOutput {
    stripped: String,
    diagnostics: Vec<Diagnostic>,
    /// (line, text after `//`)
    line_comments: Vec<(u32, String)>,
    module_syntax: Vec<SourceLocation>,
}

struct Scanner<'a> {
    file: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    out: String,
    diagnostics: Vec<Diagnostic>,
    line_comments: Vec<(u32, String)>,
    delimiters: Vec<(char, SourceLocation)>,
    module_syntax: Vec<SourceLocation>,
    /// A `/` here starts a regex literal rather than a division.
    regex_allowed: bool,
    /// Last non-whitespace character outside comments.
    last_significant: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(file: &'a str, source: &str) -> Self {
        Self {
            file,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            out: String::with_capacity(source.len()),
            diagnostics: Vec::new(),
            line_comments: Vec::new(),
            delimiters: Vec::new(),
            module_syntax: Vec::new(),
            regex_allowed: true,
            last_significant: None,
        }
    }

    fn here(&self) -> SourceLocation {
        SourceLocation::new(self.file, self.line, self.column)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Advance and copy the character into the output.
    fn emit(&mut self) -> Option<char> {
        let c = self.bump()?;
        self.out.push(c);
        if !c.is_whitespace() {
            self.last_significant = Some(c);
        }
        Some(c)
    }

    fn next_significant(&self) -> Option<char> {
        self.chars[self.pos..]
            .iter()
            .copied()
            .find(|c| !c.is_whitespace())
    }

    fn report(&mut self, category: &str, message: String, location: SourceLocation) {
        self.diagnostics
            .push(Diagnostic::new(category, message).with_location(location));
    }

    fn run(mut self) -> ScanOutput {
        while let Some(c) = self.peek(0) {
            match c {
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment(),
                '/' if self.regex_allowed => {
                    self.regex();
                    self.regex_allowed = false;
                }
                '"' | '\'' => {
                    self.string(c);
                    self.regex_allowed = false;
                }
                '`' => {
                    self.template();
                    self.regex_allowed = false;
                }
                '(' | '[' | '{' => {
                    let at = self.here();
                    self.delimiters.push((c, at));
                    self.emit();
                    self.regex_allowed = true;
                }
                ')' | ']' | '}' => {
                    self.closer(c);
                    self.regex_allowed = c == '}';
                }
                c if is_ident_start(c) => {
                    let word = self.word();
                    self.regex_allowed = precedes_expression(&word);
                }
                c if c.is_whitespace() => {
                    self.emit();
                }
                c => {
                    self.emit();
                    // digits and member access end an operand; operators do not
                    self.regex_allowed = !(is_ident_continue(c) || c == '.');
                }
            }
        }

        for (open, at) in std::mem::take(&mut self.delimiters) {
            self.report(
                UNCLOSED_DELIMITER,
                format!("unclosed `{open}`, expected `{}`", closer_for(open)),
                at,
            );
        }

        ScanOutput {
            stripped: self.out,
            diagnostics: self.diagnostics,
            line_comments: self.line_comments,
            module_syntax: self.module_syntax,
        }
    }

    fn line_comment(&mut self) {
        let line = self.line;
        self.bump();
        self.bump();
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.line_comments.push((line, text));
    }

    fn block_comment(&mut self) {
        let start = self.here();
        self.bump();
        self.bump();
        loop {
            match self.peek(0) {
                None => {
                    let message = "unterminated block comment".to_string();
                    self.report(UNTERMINATED_COMMENT, message, start);
                    return;
                }
                Some('*') if self.peek(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    return;
                }
                Some('\n') => {
                    // keep line numbers stable in the stripped output
                    self.emit();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn string(&mut self, quote: char) {
        let start = self.here();
        self.emit();
        loop {
            match self.peek(0) {
                None | Some('\n') => {
                    let message = "unterminated string literal".to_string();
                    self.report(UNTERMINATED_STRING, message, start);
                    return;
                }
                Some('\\') => {
                    self.emit();
                    if self.peek(0).is_some() {
                        self.emit();
                    }
                }
                Some(c) if c == quote => {
                    self.emit();
                    return;
                }
                Some(_) => {
                    self.emit();
                }
            }
        }
    }

    fn template(&mut self) {
        let start = self.here();
        self.emit();
        loop {
            match self.peek(0) {
                None => {
                    let message = "unterminated template literal".to_string();
                    self.report(UNTERMINATED_STRING, message, start);
                    return;
                }
                Some('\\') => {
                    self.emit();
                    if self.peek(0).is_some() {
                        self.emit();
                    }
                }
                Some('`') => {
                    self.emit();
                    return;
                }
                Some(_) => {
                    self.emit();
                }
            }
        }
    }

    /// `/body/flags`; `/` inside a `[...]` class does not close the literal.
    fn regex(&mut self) {
        let start = self.here();
        self.emit();
        let mut in_class = false;
        loop {
            match self.peek(0) {
                None | Some('\n') => {
                    let message = "unterminated regular expression literal".to_string();
                    self.report(UNTERMINATED_REGEX, message, start);
                    return;
                }
                Some('\\') => {
                    self.emit();
                    if self.peek(0).is_some_and(|c| c != '\n') {
                        self.emit();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.emit();
                }
                Some(']') => {
                    in_class = false;
                    self.emit();
                }
                Some('/') if !in_class => {
                    self.emit();
                    while self.peek(0).is_some_and(is_ident_continue) {
                        self.emit();
                    }
                    return;
                }
                Some(_) => {
                    self.emit();
                }
            }
        }
    }

    fn closer(&mut self, close: char) {
        let at = self.here();
        match self.delimiters.pop() {
            None => self.report(UNBALANCED_DELIMITER, format!("unexpected `{close}`"), at),
            Some((open, opened_at)) if closer_for(open) != close => self.report(
                UNBALANCED_DELIMITER,
                format!(
                    "expected `{}` to close `{open}` opened at {}:{} but found `{close}`",
                    closer_for(open),
                    opened_at.line,
                    opened_at.column
                ),
                at,
            ),
            Some(_) => {}
        }
        self.emit();
    }

    fn word(&mut self) -> String {
        let at = self.here();
        let member = self.last_significant == Some('.');
        let mut word = String::new();
        while let Some(c) = self.peek(0) {
            if !is_ident_continue(c) {
                break;
            }
            word.push(c);
            self.emit();
        }
        if member {
            return word;
        }

        match word.as_str() {
            "debugger" => {
                self.diagnostics.push(
                    Diagnostic::new(NO_DEBUGGER, "unexpected `debugger` statement")
                        .with_severity(Severity::Warning)
                        .with_location(at),
                );
            }
            // `import(...)`, `import.meta` and `{ import: x }` are valid outside modules
            "import" if !matches!(self.next_significant(), Some('(' | '.' | ':')) => {
                self.module_syntax.push(at);
            }
            "export" if self.next_significant() != Some(':') => self.module_syntax.push(at),
            _ => {}
        }
        word
    }
}

/// Keywords after which an expression, and so a regex literal, may start.
fn precedes_expression(word: &str) -> bool {
    matches!(
        word,
        "return"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "throw"
            | "case"
            | "do"
            | "else"
            | "yield"
            | "await"
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

// ---------------------------------------------------------------------------
// Suppressions
// ---------------------------------------------------------------------------

/// A `rome-ignore` comment resolved to the line it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    categories: Vec<String>,
    target_line: u32,
}

fn suppression_directives(source: &str, comments: &[(u32, String)]) -> Vec<Directive> {
    let lines: Vec<&str> = source.lines().collect();

    comments
        .iter()
        .filter_map(|(line, text)| {
            let rest = text.trim_start().strip_prefix(SUPPRESSION_DIRECTIVE)?;
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let token = rest.split_whitespace().next()?;
            let categories: Vec<String> = token
                .trim_end_matches(':')
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if categories.is_empty() {
                return None;
            }

            // next line holding code, skipping blanks and other line comments
            let target_line = lines
                .iter()
                .enumerate()
                .skip(*line as usize)
                .find(|(_, l)| {
                    let t = l.trim();
                    !t.is_empty() && !t.starts_with("//")
                })
                .map(|(idx, _)| idx as u32 + 1)?;

            Some(Directive {
                categories,
                target_line,
            })
        })
        .collect()
}

/// `lint` covers `lint/noDebugger`; `lint/no` does not.
fn category_matches(directive: &str, category: &str) -> bool {
    category == directive
        || category
            .strip_prefix(directive)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

fn apply_suppressions(
    diagnostics: Vec<Diagnostic>,
    directives: &[Directive],
) -> (Vec<Diagnostic>, Vec<Suppression>) {
    let mut kept = Vec::new();
    let mut suppressions = Vec::new();

    for diag in diagnostics {
        let suppressed = diag.location.as_ref().is_some_and(|loc| {
            directives.iter().any(|d| {
                d.target_line == loc.line
                    && d.categories.iter().any(|c| category_matches(c, &diag.category))
            })
        });

        match (suppressed, diag.location) {
            (true, Some(location)) => suppressions.push(Suppression::new(diag.category, location)),
            (_, location) => kept.push(Diagnostic { location, ..diag }),
        }
    }

    (kept, suppressions)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Trim trailing whitespace, collapse blank runs, end with one newline.
fn tidy(stripped: &str) -> String {
    let mut out = String::with_capacity(stripped.len());
    let mut pending_blank = false;

    for line in stripped.lines().map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(result: &CompileResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.category.as_str()).collect()
    }

    #[test]
    fn test_clean_source_strips_comments() {
        let src = "// header\nvar a = 1; // trailing\n\n\n/* block */\nfoo(a);   \n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, "var a = 1;\n\nfoo(a);\n");
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let src = "const url = \"http://example.com\"; const s = '/* no */';\n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, src);
    }

    #[test]
    fn test_empty_source() {
        let result = compile_source("a.js", "");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, "");
    }

    #[test]
    fn test_unclosed_delimiter_located_at_opener() {
        let result = compile_source("a.js", "function f() {\n  return 1;\n");

        assert_eq!(categories(&result), vec![UNCLOSED_DELIMITER]);
        let loc = result.diagnostics[0].location.as_ref().unwrap();
        assert_eq!((loc.line, loc.column), (1, 14));
        assert_eq!(loc.file, "a.js");
    }

    #[test]
    fn test_unexpected_closer() {
        let result = compile_source("a.js", "foo());\n");
        assert_eq!(categories(&result), vec![UNBALANCED_DELIMITER]);
        assert!(result.diagnostics[0].message.contains("unexpected `)`"));
    }

    #[test]
    fn test_mismatched_closer() {
        let result = compile_source("a.js", "let x = [1, 2);\n");
        assert_eq!(categories(&result), vec![UNBALANCED_DELIMITER]);
        assert!(result.diagnostics[0].message.contains("expected `]`"));
    }

    #[test]
    fn test_brackets_in_strings_and_templates_ignored() {
        let src = "let a = \"(\"; let b = `}\n{`; let c = '[';\n";
        let result = compile_source("a.js", src);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let result = compile_source("a.js", "let s = \"oops;\nlet t = 1;\n");
        assert_eq!(categories(&result), vec![UNTERMINATED_STRING]);
        assert_eq!(result.diagnostics[0].location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_unterminated_template_and_comment() {
        let result = compile_source("a.js", "let s = `abc");
        assert_eq!(categories(&result), vec![UNTERMINATED_STRING]);

        let result = compile_source("a.js", "let s = 1; /* never ends");
        assert_eq!(categories(&result), vec![UNTERMINATED_COMMENT]);
    }

    #[test]
    fn test_debugger_statement_flagged() {
        let result = compile_source("a.js", "function f() {\n  debugger;\n  debuggerish();\n}\n");
        assert_eq!(categories(&result), vec![NO_DEBUGGER]);
        let loc = result.diagnostics[0].location.as_ref().unwrap();
        assert_eq!((loc.line, loc.column), (2, 3));
    }

    #[test]
    fn test_rome_ignore_suppresses_next_code_line() {
        let src = "// rome-ignore lint/noDebugger: investigating\n\ndebugger;\ndebugger;\n";
        let result = compile_source("a.js", src);

        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].location.as_ref().unwrap().line, 4);
        assert_eq!(
            result.suppressions,
            vec![Suppression::new(NO_DEBUGGER, SourceLocation::new("a.js", 3, 1))]
        );
    }

    #[test]
    fn test_rome_ignore_category_prefix() {
        let src = "// rome-ignore lint\ndebugger;\n";
        let result = compile_source("a.js", src);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.suppressions.len(), 1);

        let src = "// rome-ignore lint/no\ndebugger;\n";
        let result = compile_source("a.js", src);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.suppressions.is_empty());
    }

    #[test]
    fn test_rome_ignore_wrong_category_does_not_suppress() {
        let src = "// rome-ignore parse/unterminatedString\ndebugger;\n";
        let result = compile_source("a.js", src);
        assert_eq!(categories(&result), vec![NO_DEBUGGER]);
        assert!(result.suppressions.is_empty());
    }

    #[test]
    fn test_rome_ignore_requires_separator() {
        let src = "// rome-ignorelint\ndebugger;\n";
        let result = compile_source("a.js", src);
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_stripped_keeps_line_structure() {
        let src = "a();\n/* one\ntwo */ b();\n";
        let transformed = transform_source("a.js", src);
        assert_eq!(transformed.stripped.lines().count(), 3);
        assert!(transformed.stripped.lines().nth(2).unwrap().contains("b();"));
    }

    #[test]
    fn test_regex_with_slashes_is_not_a_comment() {
        let src = "const re = /https?:\\/\\//;\nnext();\n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, src);
    }

    #[test]
    fn test_quote_inside_regex_is_not_a_string() {
        let src = "const q = s.replace(/'/g, \"\");\n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, src);
    }

    #[test]
    fn test_bracket_inside_regex_class_is_not_a_delimiter() {
        let src = "const p = /[(]/;\nconst q = /[/]/g.test(x);\n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, src);
    }

    #[test]
    fn test_regex_after_keyword() {
        let result = compile_source("a.js", "function f(s) {\n  return /[)]/.test(s);\n}\n");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_division_is_not_a_regex() {
        let src = "const a = (b + c) / 2 / d;\nconst e = f[0] / g;\nconst h = 10 / 5;\n";
        let result = compile_source("a.js", src);

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.compiled_code, src);
    }

    #[test]
    fn test_unterminated_regex() {
        let result = compile_source("a.js", "const re = /abc;\nnext();\n");
        assert_eq!(categories(&result), vec![UNTERMINATED_REGEX]);
        assert_eq!(result.diagnostics[0].location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_debugger_is_a_warning() {
        let result = compile_source("a.js", "debugger;\n");
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_module_syntax_located() {
        let src = "import { a } from './a';\nconst m = import('./lazy');\nexport const b = a;\n";
        let transformed = transform_source("a.js", src);

        let lines: Vec<u32> = transformed.module_syntax.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 3]);
        assert!(transformed.diagnostics.is_empty());
    }

    #[test]
    fn test_commonjs_has_no_module_syntax() {
        let src = "const a = require('./a');\nmodule.exports = { import: a, x: loader.export };\n";
        let transformed = transform_source("a.js", src);
        assert!(transformed.module_syntax.is_empty());
    }

    #[test]
    fn test_category_matches() {
        assert!(category_matches("lint", "lint/noDebugger"));
        assert!(category_matches("lint/noDebugger", "lint/noDebugger"));
        assert!(!category_matches("lint/no", "lint/noDebugger"));
        assert!(!category_matches("parse", "lint/noDebugger"));
    }
}
