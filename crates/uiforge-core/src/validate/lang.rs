//! Per-language well-formedness scanners.
//!
//! Python gets a real AST parse; JSON a strict decode. The rest are
//! heuristics, not parsers — they check the properties that reliably
//! indicate truncated or mangled model output (unbalanced delimiters,
//! unterminated strings) while tolerating everything else.

/// Strict JSON decode.
pub fn scan_json(content: &str) -> Result<(), String> {
    serde_json::from_str::<serde_json::Value>(content)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// JavaScript/TypeScript delimiter scan.
///
/// Line comments, block comments, single-quoted, double-quoted, and
/// template-literal regions are opaque while counting `()[]{}`. Template
/// literals re-enter code state inside `${ … }` so braces there still count.
pub fn scan_js(content: &str) -> Result<(), String> {
    #[derive(PartialEq)]
    enum Mode {
        Code,
        LineComment,
        BlockComment,
        Single,
        Double,
        Template,
    }

    let mut stack: Vec<char> = Vec::new();
    // Template literals nest through ${ }; remember each enclosing template.
    let mut template_depths: Vec<usize> = Vec::new();
    let mut mode = Mode::Code;
    let mut chars = content.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            if mode == Mode::LineComment {
                mode = Mode::Code;
            }
            if mode == Mode::Single || mode == Mode::Double {
                // Unterminated ordinary string; treat the line break as the
                // end and keep scanning rather than cascade errors.
                mode = Mode::Code;
            }
            continue;
        }

        match mode {
            Mode::Code => match c {
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        mode = Mode::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        mode = Mode::BlockComment;
                    }
                    _ => {}
                },
                '\'' => mode = Mode::Single,
                '"' => mode = Mode::Double,
                '`' => {
                    template_depths.push(stack.len());
                    mode = Mode::Template;
                }
                '(' | '[' | '{' => stack.push(c),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some(open) if open == expected => {
                            // A `}` that closes a template's ${ … } resumes
                            // the literal.
                            if c == '}'
                                && template_depths.last() == Some(&stack.len())
                                && !template_depths.is_empty()
                            {
                                mode = Mode::Template;
                            }
                        }
                        Some(open) => {
                            return Err(format!(
                                "line {line}: mismatched '{c}' (open was '{open}')"
                            ));
                        }
                        None => return Err(format!("line {line}: unmatched '{c}'")),
                    }
                }
                _ => {}
            },
            Mode::LineComment => {}
            Mode::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    mode = Mode::Code;
                }
            }
            Mode::Single => match c {
                '\\' => {
                    chars.next();
                }
                '\'' => mode = Mode::Code,
                _ => {}
            },
            Mode::Double => match c {
                '\\' => {
                    chars.next();
                }
                '"' => mode = Mode::Code,
                _ => {}
            },
            Mode::Template => match c {
                '\\' => {
                    chars.next();
                }
                '`' => {
                    template_depths.pop();
                    mode = Mode::Code;
                }
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        stack.push('{');
                        mode = Mode::Code;
                    }
                }
                _ => {}
            },
        }
    }

    if mode == Mode::BlockComment {
        return Err("unterminated block comment".to_string());
    }
    if mode == Mode::Template {
        return Err("unterminated template literal".to_string());
    }
    if let Some(open) = stack.first() {
        return Err(format!("unclosed '{open}' at end of file"));
    }
    Ok(())
}

/// Python AST parse.
///
/// A full parse, not a heuristic: the file either parses as a module or it
/// does not. The parse error becomes one advisory issue; nothing is executed.
pub fn scan_python(content: &str) -> Result<(), String> {
    rustpython_parser::parse(content, rustpython_parser::Mode::Module, "<generated>")
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Void elements that never take a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Permissive HTML tag-nesting scan.
///
/// Tolerates void elements, self-closing syntax, comments, doctype, and
/// unclosed tags (HTML allows implicit closing); only a closing tag with no
/// matching open anywhere on the stack is an error. `<script>` and `<style>`
/// bodies are opaque.
pub fn scan_html(content: &str) -> Result<(), String> {
    let mut stack: Vec<String> = Vec::new();
    let bytes = content.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let rest = &content[i..];

        if rest.starts_with("<!--") {
            i += rest.find("-->").map_or(rest.len(), |p| p + 3);
            continue;
        }
        if rest.starts_with("<!") {
            // Doctype or other declaration.
            i += rest.find('>').map_or(rest.len(), |p| p + 1);
            continue;
        }

        let Some(end) = rest.find('>') else {
            // Dangling '<' near EOF; permissive scan lets it go.
            break;
        };
        let tag_body = &rest[1..end];
        i += end + 1;

        if let Some(name_part) = tag_body.strip_prefix('/') {
            let name = tag_name(name_part);
            if name.is_empty() {
                continue;
            }
            match stack.iter().rposition(|open| *open == name) {
                // Implicitly close anything opened since the match.
                Some(pos) => stack.truncate(pos),
                None => {
                    return Err(format!("closing tag </{name}> with no matching open tag"));
                }
            }
        } else {
            let name = tag_name(tag_body);
            if name.is_empty() {
                continue;
            }
            let self_closing = tag_body.trim_end().ends_with('/');
            if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                continue;
            }
            if name == "script" || name == "style" {
                // Opaque until the literal closing tag.
                let close = format!("</{name}");
                let rest_after = &content[i..];
                match find_ascii_ci(rest_after, &close) {
                    Some(p) => {
                        let after = &rest_after[p..];
                        i += p + after.find('>').map_or(close.len(), |q| q + 1);
                    }
                    None => break,
                }
                continue;
            }
            stack.push(name);
        }
    }

    Ok(())
}

/// Byte offset of `needle` in `haystack`, ASCII case-insensitive.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&p| h[p..p + n.len()].eq_ignore_ascii_case(n))
}

fn tag_name(tag_body: &str) -> String {
    tag_body
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

/// CSS brace-balance scan, ignoring strings and comments.
pub fn scan_css(content: &str) -> Result<(), String> {
    let mut depth = 0i64;
    let mut chars = content.chars().peekable();
    let mut in_string: Option<char> = None;
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if let Some(q) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                loop {
                    match chars.next() {
                        Some('*') if chars.peek() == Some(&'/') => {
                            chars.next();
                            break;
                        }
                        Some('\n') => line += 1,
                        Some(_) => {}
                        None => return Err("unterminated comment".to_string()),
                    }
                }
            }
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("line {line}: unmatched '}}'"));
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(format!("{depth} unclosed block(s) at end of file"));
    }
    Ok(())
}
