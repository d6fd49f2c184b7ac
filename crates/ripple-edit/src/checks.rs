//! Heuristic safety checks over proposed file content

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use ripple_core::{Language, from_key};
use ripple_indexer::languages::get_extractor;
use ripple_indexer::resolve::{python_candidates, resolve_script};
use ripple_indexer::{Extraction, python_syntax_error};

use crate::context::SafetyChecks;

/// Top-level standard library modules accepted without a project file.
pub const PYTHON_STDLIB: &[&str] = &[
    "__future__", "abc", "argparse", "array", "ast", "asyncio", "base64", "bisect", "builtins",
    "calendar", "collections", "concurrent", "configparser", "contextlib", "copy", "csv",
    "ctypes", "dataclasses", "datetime", "decimal", "difflib", "email", "enum", "errno",
    "fnmatch", "fractions", "functools", "gc", "getpass", "glob", "gzip", "hashlib", "heapq",
    "hmac", "html", "http", "importlib", "inspect", "io", "ipaddress", "itertools", "json",
    "logging", "math", "mimetypes", "multiprocessing", "numbers", "operator", "os", "pathlib",
    "pickle", "platform", "pprint", "queue", "random", "re", "secrets", "select", "shlex",
    "shutil", "signal", "socket", "sqlite3", "ssl", "stat", "statistics", "string", "struct",
    "subprocess", "sys", "tempfile", "textwrap", "threading", "time", "timeit", "traceback",
    "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "warnings", "weakref",
    "xml", "zipfile", "zlib",
];

static PY_WHILE_TRUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)while\s+(?:True|1)\s*:(.*)$").expect("while pattern"));
static PY_LOOP_EXIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:break|return|raise)\b").expect("exit pattern"));
static JS_ENDLESS_LOOP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwhile\s*\(\s*(?:true|1)\s*\)|\bfor\s*\(\s*;\s*;\s*\)").expect("loop pattern")
});
static JS_LOOP_EXIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:break|return|throw)\b").expect("exit pattern"));
static DYNAMIC_EXEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[^\w.])(?:eval|exec|__import__)\s*\(").expect("exec pattern")
});

/// Description of the first syntax problem, or `None` when the content
/// parses. Only Python and JSON are checked.
pub fn syntax_error(language: Option<Language>, content: &str) -> Option<String> {
    match language {
        Some(Language::Python) => python_syntax_error(content).map(|issue| issue.to_string()),
        Some(Language::Json) if !content.trim().is_empty() => {
            serde_json::from_str::<serde_json::Value>(content)
                .err()
                .map(|e| e.to_string())
        }
        _ => None,
    }
}

fn extract(language: Option<Language>, content: &str) -> Extraction {
    language
        .map(|l| get_extractor(l).extract(content))
        .unwrap_or_default()
}

/// Imports in `content` that point at nothing: not stdlib and no project
/// file for Python, relative specifiers with no target for JS/TS.
pub fn unresolved_imports(
    root: &Path,
    key: &str,
    language: Option<Language>,
    content: &str,
) -> Vec<String> {
    let on_disk = |k: &str| from_key(root, k).is_file();
    let imports = extract(language, content).imports;
    match language {
        Some(Language::Python) => imports
            .into_iter()
            .filter(|import| {
                let top = import.split('.').next().unwrap_or_default();
                let stdlib = !import.starts_with('.') && PYTHON_STDLIB.contains(&top);
                !stdlib && !python_candidates(key, import).iter().any(|c| on_disk(c.as_str()))
            })
            .collect(),
        Some(Language::JavaScript | Language::TypeScript) => imports
            .into_iter()
            .filter(|spec| spec.starts_with('.') && resolve_script(key, spec, on_disk).is_none())
            .collect(),
        _ => Vec::new(),
    }
}

fn public(names: impl Iterator<Item = String>) -> BTreeSet<String> {
    names.filter(|n| !n.starts_with('_')).collect()
}

/// Public function names present in `original` but gone from `proposed`.
pub fn removed_public_functions(
    language: Option<Language>,
    original: &str,
    proposed: &str,
) -> Vec<String> {
    let before = public(extract(language, original).functions.into_iter().map(|f| f.name));
    let after = public(extract(language, proposed).functions.into_iter().map(|f| f.name));
    before.difference(&after).cloned().collect()
}

pub fn removed_public_classes(
    language: Option<Language>,
    original: &str,
    proposed: &str,
) -> Vec<String> {
    let before = public(extract(language, original).classes.into_iter().map(|c| c.name));
    let after = public(extract(language, proposed).classes.into_iter().map(|c| c.name));
    before.difference(&after).cloned().collect()
}

pub fn removed_imports(language: Option<Language>, original: &str, proposed: &str) -> Vec<String> {
    let after: BTreeSet<String> = extract(language, proposed).imports.into_iter().collect();
    extract(language, original)
        .imports
        .into_iter()
        .filter(|i| !after.contains(i))
        .collect()
}

fn strip_py_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or(line)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// `while True:` or `while 1:` whose body never breaks, returns or raises.
fn python_unguarded_loop(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = PY_WHILE_TRUE.captures(line) else {
            continue;
        };
        let indent = caps.get(1).map_or(0, |m| m.as_str().len());
        let inline = caps.get(2).map_or("", |m| strip_py_comment(m.as_str()));
        if !inline.trim().is_empty() {
            if !PY_LOOP_EXIT.is_match(inline) {
                return true;
            }
            continue;
        }
        let exits = lines[i + 1..]
            .iter()
            .take_while(|l| l.trim().is_empty() || indent_of(l) > indent)
            .any(|l| PY_LOOP_EXIT.is_match(strip_py_comment(l)));
        if !exits {
            return true;
        }
    }
    false
}

/// Text of the block starting at `open` (a `{`), without the braces.
fn brace_block(content: &str, open: usize) -> &str {
    let mut depth = 0usize;
    for (offset, ch) in content[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &content[open + 1..open + offset];
                }
            }
            _ => {}
        }
    }
    &content[open + 1..]
}

/// `while (true)` or `for (;;)` without break, return or throw in the body.
fn script_unguarded_loop(content: &str) -> bool {
    for m in JS_ENDLESS_LOOP.find_iter(content) {
        let rest = &content[m.end()..];
        let trimmed = rest.trim_start();
        let body = if trimmed.starts_with(';') {
            // Tail of a `do { ... } while (true);` loop.
            if m.as_str().starts_with("while") {
                continue;
            }
            ""
        } else if trimmed.starts_with('{') {
            let open = m.end() + (rest.len() - trimmed.len());
            brace_block(content, open)
        } else {
            trimmed.split([';', '\n']).next().unwrap_or("")
        };
        if !JS_LOOP_EXIT.is_match(body) {
            return true;
        }
    }
    false
}

pub fn has_unguarded_loop(language: Option<Language>, content: &str) -> bool {
    match language {
        Some(Language::Python) => python_unguarded_loop(content),
        Some(Language::JavaScript | Language::TypeScript) => script_unguarded_loop(content),
        _ => false,
    }
}

/// Bare `eval(`, `exec(` or `__import__(` calls. Method calls such as
/// `re.exec(` do not count.
pub fn has_dynamic_execution(language: Option<Language>, content: &str) -> bool {
    match language {
        Some(Language::Python | Language::JavaScript | Language::TypeScript) => {
            DYNAMIC_EXEC.is_match(content)
        }
        _ => false,
    }
}

/// Run every check for an edit of `key` from `original` to `proposed`.
pub fn run_checks(root: &Path, key: &str, original: &str, proposed: &str) -> SafetyChecks {
    let language = Language::from_path(Path::new(key));
    let functions_preserved = removed_public_functions(language, original, proposed).is_empty();
    let classes_preserved = removed_public_classes(language, original, proposed).is_empty();
    SafetyChecks {
        syntax_valid: syntax_error(language, proposed).is_none(),
        imports_resolved: unresolved_imports(root, key, language, proposed).is_empty(),
        functions_preserved,
        classes_preserved,
        api_compatible: functions_preserved && classes_preserved,
        no_infinite_loops: !has_unguarded_loop(language, proposed),
        no_dynamic_execution: !has_dynamic_execution(language, proposed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PY: Option<Language> = Some(Language::Python);
    const JS: Option<Language> = Some(Language::JavaScript);

    #[test]
    fn python_loops() {
        assert!(has_unguarded_loop(PY, "while True:\n    work()\n"));
        assert!(has_unguarded_loop(PY, "def f():\n    while 1:\n        pass\n    return 1\n"));
        assert!(!has_unguarded_loop(PY, "while True:\n    if done():\n        break\n"));
        assert!(!has_unguarded_loop(PY, "while True:\n\n    raise StopIteration\n"));
        assert!(!has_unguarded_loop(PY, "while True: break\n"));
        assert!(has_unguarded_loop(PY, "while True:  # break later\n    spin()\n"));
        assert!(!has_unguarded_loop(PY, "while running:\n    step()\n"));
    }

    #[test]
    fn script_loops() {
        assert!(has_unguarded_loop(JS, "while (true) { tick(); }"));
        assert!(has_unguarded_loop(JS, "for (;;) { tick(); }"));
        assert!(!has_unguarded_loop(JS, "for (;;) { if (x) { break; } }"));
        assert!(!has_unguarded_loop(JS, "while (true) {\n  throw new Error('x');\n}"));
        assert!(!has_unguarded_loop(JS, "do { if (x) break; } while (true);"));
        assert!(!has_unguarded_loop(JS, "for (let i = 0; i < n; i++) {}"));
    }

    #[test]
    fn dynamic_execution_ignores_method_calls() {
        assert!(has_dynamic_execution(PY, "eval(data)\n"));
        assert!(has_dynamic_execution(PY, "x = __import__('os')\n"));
        assert!(has_dynamic_execution(JS, "const r = eval (src);"));
        assert!(!has_dynamic_execution(JS, "const m = re.exec(text);"));
        assert!(!has_dynamic_execution(PY, "evaluate(data)\n"));
        assert!(!has_dynamic_execution(Some(Language::Markdown), "eval(x)"));
    }

    #[test]
    fn syntax_by_language() {
        assert!(syntax_error(PY, "def f(:\n").is_some());
        assert!(syntax_error(PY, "").is_none());
        assert!(syntax_error(Some(Language::Json), "{\"a\": }").is_some());
        assert!(syntax_error(Some(Language::Json), "  ").is_none());
        assert!(syntax_error(JS, "function (").is_none());
    }

    #[test]
    fn python2_print_is_invalid() {
        assert!(syntax_error(PY, "print \"hello\"\n").is_some());
        assert!(syntax_error(PY, "import sys\nprint >>sys.stderr, \"x\"\n").is_some());
        assert!(syntax_error(PY, "print(\"hello\")\n").is_none());
    }

    #[test]
    fn python2_exec_is_invalid() {
        assert!(syntax_error(PY, "exec \"x = 1\"\n").is_some());
        assert!(syntax_error(PY, "exec(\"x = 1\")\n").is_none());
    }

    #[test]
    fn unindented_block_is_invalid() {
        let error = syntax_error(PY, "def f():\nreturn 1\n").unwrap();
        assert!(error.contains("indented block"));
        assert!(syntax_error(PY, "if x:\n    y = 1\nelse:\ny = 2\n").is_some());
        assert!(syntax_error(PY, "def f():\n# note\n    return 1\n").is_none());
        assert!(syntax_error(PY, "if x: y = 1\nelse: y = 2\n").is_none());
    }

    #[test]
    fn legacy_octal_is_invalid() {
        assert!(syntax_error(PY, "x = 0777\n").is_some());
        assert!(syntax_error(PY, "x = 0_7\n").is_some());
        for ok in ["x = 0\n", "x = 00\n", "x = 0o777\n", "x = 0x1F\n", "x = 0.5\n", "x = 10\n"] {
            assert!(syntax_error(PY, ok).is_none(), "{ok}");
        }
    }

    #[test]
    fn mixed_tabs_and_spaces_are_invalid() {
        let error = syntax_error(PY, "def f():\n\tx = 1\n        return x\n").unwrap();
        assert!(error.contains("tabs and spaces"));
        assert!(syntax_error(PY, "def f():\n\tx = 1\n\treturn x\n").is_none());
        assert!(syntax_error(PY, "def f():\n\tif x:\n\t\treturn 1\n\treturn 2\n").is_none());
        let comprehension = "def f(xs):\n    ys = [x\n\t  for x in xs]\n    return ys\n";
        assert!(syntax_error(PY, comprehension).is_none());
    }

    #[test]
    fn removed_names() {
        let before = "def keep():\n    pass\n\ndef gone():\n    pass\n\ndef _private():\n    pass\n\nclass Api:\n    pass\n";
        let after = "def keep():\n    pass\n";
        assert_eq!(removed_public_functions(PY, before, after), vec!["gone"]);
        assert_eq!(removed_public_classes(PY, before, after), vec!["Api"]);
        assert!(removed_public_functions(PY, after, before).is_empty());
    }
}
