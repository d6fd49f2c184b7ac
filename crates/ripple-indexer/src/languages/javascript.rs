//! JavaScript / TypeScript extractor using regular expressions

use once_cell::sync::Lazy;
use regex::Regex;
use ripple_core::{ClassInfo, FunctionInfo, MethodInfo, ParseMode};

use crate::extractor::{Extraction, LanguageExtractor};

pub struct JavaScriptExtractor;

const IDENT: &str = r"[A-Za-z_$][\w$]*";

/// Keywords that look like method calls at the start of a line.
const NON_METHODS: &[&str] = &["if", "while", "for", "switch", "catch", "with", "return", "function"];

static IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"\bimport\s+(?:type\s+)?[\w$*{}\s,]*?\s*from\s*['"]([^'"]+)['"]"#,
        r#"\bimport\s*['"]([^'"]+)['"]"#,
        r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"]([^'"]+)['"]"#,
        r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("import pattern"))
    .collect()
});

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(async\s+)?function\s*\*?\s*({IDENT})\s*\(([^)]*)\)"))
        .expect("function pattern")
});
static FUNCTION_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:const|let|var)\s+({IDENT})\s*=\s*(async\s+)?function\b\s*\*?\s*(?:{IDENT})?\s*\(([^)]*)\)"
    ))
    .expect("function expression pattern")
});
static ARROW_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:const|let|var)\s+({IDENT})\s*(?::[^=]+)?=\s*(async\s+)?(?:\(([^)]*)\)|({IDENT}))\s*(?::[^=]+)?=>"
    ))
    .expect("arrow pattern")
});
static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bclass\s+({IDENT})(?:\s*<[^>]*>)?(?:\s+extends\s+([\w$.]+))?[^{{]*\{{"
    ))
    .expect("class pattern")
});
static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^\s*(?:(?:public|private|protected|static|readonly|override|abstract)\s+)*(?:async\s+)?(?:get\s+|set\s+)?\*?\s*(#?{IDENT})\s*\(([^)]*)\)\s*(?::[^{{;]*)?\{{"
    ))
    .expect("method pattern")
});
static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bexport\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\s*\*?|class|const|let|var|interface|type|enum)\s+({IDENT})"
    ))
    .expect("export pattern")
});
static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}").expect("export list pattern"));
static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bexport\s+default\b").expect("export default pattern")
});
static MODULE_EXPORTS_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bmodule\.exports\s*=\s*\{([^}]*)\}").expect("module.exports pattern")
});
static MODULE_EXPORTS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bmodule\.exports\s*=\s*({IDENT})")).expect("module.exports pattern")
});
static NAMED_EXPORTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:module\.)?exports\.({IDENT})\s*=")).expect("exports pattern")
});

impl LanguageExtractor for JavaScriptExtractor {
    fn extract(&self, content: &str) -> Extraction {
        let mut out = Extraction {
            parse_mode: ParseMode::Pattern,
            ..Default::default()
        };
        extract_imports(content, &mut out);
        let lines = LineIndex::new(content);
        extract_functions(content, &lines, &mut out);
        extract_classes(content, &lines, &mut out);
        extract_exports(content, &mut out);
        out.has_docstring = content.contains("/**");
        out
    }
}

/// Byte offsets where each line starts.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// 1-based line of a byte offset.
    fn line_at(&self, offset: usize) -> u32 {
        self.starts.partition_point(|&start| start <= offset) as u32
    }
}

fn split_params(args: &str) -> Vec<String> {
    args.split(',')
        .map(|a| {
            a.split(['=', ':'])
                .next()
                .unwrap_or("")
                .trim()
                .trim_end_matches('?')
                .to_string()
        })
        .filter(|a| !a.is_empty())
        .collect()
}

fn extract_imports(content: &str, out: &mut Extraction) {
    let mut found: Vec<(usize, &str)> = IMPORT_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(content))
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str())))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    for (_, spec) in found {
        out.push_import(spec);
    }
}

fn extract_functions(content: &str, lines: &LineIndex, out: &mut Extraction) {
    let mut found: Vec<(usize, FunctionInfo)> = Vec::new();

    for caps in FUNCTION_DECL.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        found.push((
            whole,
            FunctionInfo {
                name: caps[2].to_string(),
                params: split_params(&caps[3]),
                line: lines.line_at(whole),
                is_async: caps.get(1).is_some(),
                decorators: Vec::new(),
            },
        ));
    }
    for caps in FUNCTION_EXPR.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        found.push((
            whole,
            FunctionInfo {
                name: caps[1].to_string(),
                params: split_params(&caps[3]),
                line: lines.line_at(whole),
                is_async: caps.get(2).is_some(),
                decorators: Vec::new(),
            },
        ));
    }
    for caps in ARROW_FN.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        let params = match (caps.get(3), caps.get(4)) {
            (Some(list), _) => split_params(list.as_str()),
            (None, Some(single)) => vec![single.as_str().to_string()],
            _ => Vec::new(),
        };
        found.push((
            whole,
            FunctionInfo {
                name: caps[1].to_string(),
                params,
                line: lines.line_at(whole),
                is_async: caps.get(2).is_some(),
                decorators: Vec::new(),
            },
        ));
    }

    found.sort_by_key(|(pos, _)| *pos);
    for (_, info) in found {
        let duplicate = out
            .functions
            .iter()
            .any(|f| f.name == info.name && f.line == info.line);
        if !duplicate {
            out.functions.push(info);
        }
    }
}

/// Byte offset of the `}` closing the block that starts right after `open`.
fn matching_brace(content: &str, open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in content[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn class_methods(body: &str) -> Vec<MethodInfo> {
    // Brace depth at each byte; only depth-0 matches are class members.
    let mut depth_at = Vec::with_capacity(body.len());
    let mut depth = 0i32;
    for b in body.bytes() {
        depth_at.push(depth);
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
    }

    METHOD
        .captures_iter(body)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            if depth_at.get(name.start()).copied().unwrap_or(1) != 0 {
                return None;
            }
            if NON_METHODS.contains(&name.as_str()) {
                return None;
            }
            Some(MethodInfo {
                name: name.as_str().to_string(),
                params: split_params(caps.get(2).map_or("", |m| m.as_str())),
            })
        })
        .collect()
}

fn extract_classes(content: &str, lines: &LineIndex, out: &mut Extraction) {
    for caps in CLASS_DECL.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let body_start = whole.end();
        let methods = matching_brace(content, body_start)
            .map(|end| class_methods(&content[body_start..end]))
            .unwrap_or_default();
        out.classes.push(ClassInfo {
            name: caps[1].to_string(),
            line: lines.line_at(whole.start()),
            methods,
            bases: caps
                .get(2)
                .map(|b| vec![b.as_str().to_string()])
                .unwrap_or_default(),
        });
    }
}

fn extract_exports(content: &str, out: &mut Extraction) {
    let mut found: Vec<(usize, String)> = Vec::new();

    for caps in EXPORT_DECL.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    for caps in EXPORT_LIST.captures_iter(content) {
        if let Some(list) = caps.get(1) {
            for item in list.as_str().split(',') {
                // `a as b` exports the name `b`.
                let name = item.rsplit(" as ").next().unwrap_or(item).trim();
                if !name.is_empty() {
                    found.push((list.start(), name.to_string()));
                }
            }
        }
    }
    for m in EXPORT_DEFAULT.find_iter(content) {
        found.push((m.start(), "default".to_string()));
    }
    for caps in MODULE_EXPORTS_OBJECT.captures_iter(content) {
        if let Some(list) = caps.get(1) {
            for item in list.as_str().split(',') {
                let name = item.split(':').next().unwrap_or("").trim();
                if !name.is_empty() {
                    found.push((list.start(), name.to_string()));
                }
            }
        }
    }
    for caps in MODULE_EXPORTS_NAME.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    for caps in NAMED_EXPORTS.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    for (_, name) in found {
        out.push_export(&name);
    }
}
