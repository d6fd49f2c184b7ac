//! Tree-sitter parsing helpers
//!
//! Parsers are not `Sync`, so each thread keeps its own Python parser and
//! reuses it across files.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = RefCell::new(new_python_parser());
}

fn new_python_parser() -> Option<Parser> {
    let mut parser = Parser::new();
    match parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        Ok(()) => Some(parser),
        Err(e) => {
            tracing::warn!("Python grammar unavailable: {}", e);
            None
        }
    }
}

/// Parse Python source. `None` only if the grammar could not be loaded.
pub fn parse_python(source: &str) -> Option<Tree> {
    PYTHON_PARSER.with(|cell| cell.borrow_mut().as_mut()?.parse(source, None))
}

/// First syntax problem found in a parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// `None` when the source is valid Python 3. The grammar is error tolerant,
/// so a clean tree is also checked for constructs the interpreter refuses.
pub fn python_syntax_error(source: &str) -> Option<SyntaxIssue> {
    let tree = parse_python(source)?;
    let root = tree.root_node();
    if root.has_error() {
        return Some(first_error(root).unwrap_or(SyntaxIssue {
            line: 1,
            message: "invalid syntax".to_string(),
        }));
    }
    legacy_construct(root, source.as_bytes()).or_else(|| tab_error(root, source))
}

fn first_error(node: Node) -> Option<SyntaxIssue> {
    if node.is_missing() {
        return Some(SyntaxIssue {
            line: node.start_position().row + 1,
            message: format!("missing '{}'", node.kind()),
        });
    }
    if node.is_error() {
        return Some(SyntaxIssue {
            line: node.start_position().row + 1,
            message: "invalid syntax".to_string(),
        });
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn issue(node: Node, message: &str) -> SyntaxIssue {
    SyntaxIssue {
        line: node.start_position().row + 1,
        message: message.to_string(),
    }
}

/// `0777` style integers. `0`, `00` and prefixed literals are fine.
fn is_legacy_octal(literal: &str) -> bool {
    let digits: Vec<char> = literal.chars().filter(|c| *c != '_').collect();
    digits.len() > 1
        && digits[0] == '0'
        && digits.iter().all(char::is_ascii_digit)
        && digits.iter().any(|c| *c != '0')
}

fn legacy_construct(node: Node, source: &[u8]) -> Option<SyntaxIssue> {
    match node.kind() {
        "print_statement" => return Some(issue(node, "Python 2 print statement")),
        "exec_statement" => return Some(issue(node, "Python 2 exec statement")),
        "integer" => {
            let literal = node.utf8_text(source).unwrap_or("");
            if is_legacy_octal(literal) {
                return Some(issue(
                    node,
                    "leading zeros in decimal integer literals are not permitted",
                ));
            }
        }
        "block" => {
            let mut cursor = node.walk();
            let first = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "comment");
            if let (Some(header), Some(first)) = (node.parent(), first) {
                let start = first.start_position();
                let head = header.start_position();
                if start.row > head.row && start.column <= head.column {
                    return Some(issue(first, "expected an indented block"));
                }
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| legacy_construct(child, source))
}

/// Clauses that open their own line, as opposed to comprehension clauses.
const CLAUSES: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
];

/// Rows that begin a statement or clause.
fn statement_rows(node: Node, rows: &mut Vec<usize>) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    let holds_statements = matches!(node.kind(), "module" | "block");
    for child in children {
        let starts_line = holds_statements || CLAUSES.contains(&child.kind());
        if starts_line && child.kind() != "comment" {
            rows.push(child.start_position().row);
        }
        statement_rows(child, rows);
    }
}

/// Indentation width with tabs to multiples of `tab_size`.
fn indent_width(line: &str, tab_size: usize) -> usize {
    let mut col = 0;
    for ch in line.chars() {
        match ch {
            ' ' => col += 1,
            '\t' => col = (col / tab_size + 1) * tab_size,
            '\x0c' => col = 0,
            _ => break,
        }
    }
    col
}

/// Indentation that compares differently with tab size 8 and tab size 1 is
/// ambiguous, as the tokenizer's `TabError` rule has it.
fn tab_error(root: Node, source: &str) -> Option<SyntaxIssue> {
    let mut rows = Vec::new();
    statement_rows(root, &mut rows);
    rows.sort_unstable();
    rows.dedup();

    let lines: Vec<&str> = source.lines().collect();
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    for row in rows {
        let Some(line) = lines.get(row) else {
            continue;
        };
        let col = indent_width(line, 8);
        let alt = indent_width(line, 1);
        let inconsistent = loop {
            let Some(&(top, top_alt)) = stack.last() else {
                break false;
            };
            if col == top {
                break alt != top_alt;
            }
            if col > top {
                if alt <= top_alt {
                    break true;
                }
                stack.push((col, alt));
                break false;
            }
            stack.pop();
            if stack.is_empty() {
                break true;
            }
        };
        if inconsistent {
            return Some(SyntaxIssue {
                line: row + 1,
                message: "inconsistent use of tabs and spaces in indentation".to_string(),
            });
        }
    }
    None
}

/// 1-based line of a node.
pub(crate) fn line_of(node: Node) -> u32 {
    (node.start_position().row as u32) + 1
}
