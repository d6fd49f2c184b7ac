//! Python language extractor using tree-sitter, with a line-based regex
//! fallback for sources the grammar cannot parse cleanly

use once_cell::sync::Lazy;
use regex::Regex;
use ripple_core::{ClassInfo, FunctionInfo, MethodInfo, ParseMode};
use tree_sitter::Node;

use crate::extractor::{Extraction, LanguageExtractor};
use crate::syntax::{line_of, parse_python};

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn extract(&self, content: &str) -> Extraction {
        let mut out = match parse_python(content) {
            Some(tree) if !tree.root_node().has_error() => {
                let mut out = Extraction {
                    parse_mode: ParseMode::Ast,
                    ..Default::default()
                };
                visit(tree.root_node(), content.as_bytes(), &mut out, false);
                out
            }
            _ => {
                tracing::debug!("Python parse failed, using regex fallback");
                extract_with_patterns(content)
            }
        };

        let public: Vec<String> = out
            .functions
            .iter()
            .map(|f| f.name.clone())
            .chain(out.classes.iter().map(|c| c.name.clone()))
            .filter(|name| !name.starts_with('_'))
            .collect();
        for name in public {
            out.push_export(&name);
        }
        out.has_docstring = content.contains("\"\"\"") || content.contains("'''");
        out
    }
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn visit(node: Node, source: &[u8], out: &mut Extraction, in_class_body: bool) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                out.push_import(imported_module(name, source));
            }
        }
        "import_from_statement" => extract_from_import(node, source, out),
        "function_definition" => {
            if !in_class_body {
                out.functions.push(function_info(node, source));
            }
            if let Some(body) = node.child_by_field_name("body") {
                visit(body, source, out, false);
            }
        }
        "class_definition" => {
            out.classes.push(class_info(node, source));
            if let Some(body) = node.child_by_field_name("body") {
                visit(body, source, out, true);
            }
        }
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            for child in children {
                visit(child, source, out, in_class_body);
            }
        }
    }
}

/// `a.b` from either `a.b` or `a.b as c`.
fn imported_module<'a>(node: Node, source: &'a [u8]) -> &'a str {
    if node.kind() == "aliased_import" {
        if let Some(name) = node.child_by_field_name("name") {
            return text(name, source);
        }
    }
    text(node, source)
}

fn extract_from_import(node: Node, source: &[u8], out: &mut Extraction) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };
    let module = text(module, source).trim();
    if !module.is_empty() && module.chars().all(|c| c == '.') {
        // `from . import x` refers to sibling module `x`.
        let mut cursor = node.walk();
        let names: Vec<&str> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| imported_module(n, source))
            .collect();
        if names.is_empty() {
            out.push_import(module);
        }
        for name in names {
            out.push_import(&format!("{module}{name}"));
        }
    } else {
        out.push_import(module);
    }
}

fn parameter_names(params: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|param| {
            let name = match param.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    text(param, source)
                }
                "default_parameter" | "typed_default_parameter" => {
                    param.child_by_field_name("name").map(|n| text(n, source))?
                }
                "typed_parameter" => {
                    let mut inner = param.walk();
                    let first = param.named_children(&mut inner).next()?;
                    text(first, source)
                }
                _ => return None,
            };
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn decorators_of(definition: Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = definition.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }
    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|d| {
            text(d, source)
                .trim_start_matches('@')
                .split('(')
                .next()
                .unwrap_or("")
                .trim()
                .to_string()
        })
        .filter(|d| !d.is_empty())
        .collect()
}

fn function_info(node: Node, source: &[u8]) -> FunctionInfo {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    let params = node
        .child_by_field_name("parameters")
        .map(|p| parameter_names(p, source))
        .unwrap_or_default();
    let is_async = node
        .child(0)
        .is_some_and(|first| first.kind() == "async");
    FunctionInfo {
        name,
        params,
        line: line_of(node),
        is_async,
        decorators: decorators_of(node, source),
    }
}

fn class_info(node: Node, source: &[u8]) -> ClassInfo {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();

    let mut bases = Vec::new();
    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if arg.kind() != "keyword_argument" {
                bases.push(text(arg, source).to_string());
            }
        }
    }

    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            let def = match stmt.kind() {
                "function_definition" => Some(stmt),
                "decorated_definition" => stmt
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };
            if let Some(def) = def {
                let info = function_info(def, source);
                methods.push(MethodInfo {
                    name: info.name,
                    params: info.params,
                });
            }
        }
    }

    ClassInfo {
        name,
        line: line_of(node),
        methods,
        bases,
    }
}

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*import\s+(.+)$").expect("import regex"));
static FROM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+(\.*[A-Za-z_][\w.]*|\.+)\s+import\s+(.+)$").expect("from regex")
});
static DEF_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(async\s+)?def\s+([A-Za-z_]\w*)\s*\(([^)]*)\)?").expect("def regex")
});
static CLASS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)\s*(?:\(([^)]*)\))?\s*:").expect("class regex")
});
static DECORATOR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@([A-Za-z_][\w.]*)").expect("decorator regex"));
static MODULE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w.]*$").expect("module regex"));

fn split_params(args: &str) -> Vec<String> {
    args.split(',')
        .map(|a| {
            a.split([':', '='])
                .next()
                .unwrap_or("")
                .trim()
                .to_string()
        })
        .filter(|a| !a.is_empty() && a != "/" && a != "*")
        .collect()
}

fn first_word(part: &str) -> &str {
    part.split_whitespace().next().unwrap_or("")
}

/// Best-effort extraction over individual lines. Methods are attributed to
/// the nearest enclosing `class` by indentation.
fn extract_with_patterns(content: &str) -> Extraction {
    let mut out = Extraction {
        parse_mode: ParseMode::Fallback,
        ..Default::default()
    };
    let mut pending_decorators: Vec<String> = Vec::new();
    // (indent, index into out.classes)
    let mut open_class: Option<(usize, usize)> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((class_indent, _)) = open_class {
            if indent <= class_indent && !trimmed.starts_with('@') {
                open_class = None;
            }
        }

        if let Some(caps) = DECORATOR_LINE.captures(line) {
            pending_decorators.push(caps[1].to_string());
            continue;
        }
        if let Some(caps) = IMPORT_LINE.captures(line) {
            for part in caps[1].split(',') {
                let module = first_word(part);
                if MODULE_NAME.is_match(module) {
                    out.push_import(module);
                }
            }
        } else if let Some(caps) = FROM_LINE.captures(line) {
            let module = &caps[1];
            if module.chars().all(|c| c == '.') {
                let names = caps[2].trim_matches(|c| c == '(' || c == ')' || c == '\\');
                for part in names.split(',') {
                    let name = first_word(part);
                    if MODULE_NAME.is_match(name) {
                        out.push_import(&format!("{module}{name}"));
                    }
                }
            } else {
                out.push_import(module);
            }
        } else if let Some(caps) = CLASS_LINE.captures(line) {
            let bases = caps
                .get(3)
                .map(|b| split_params(b.as_str()))
                .unwrap_or_default();
            out.classes.push(ClassInfo {
                name: caps[2].to_string(),
                line: line_no,
                methods: Vec::new(),
                bases,
            });
            open_class = Some((indent, out.classes.len() - 1));
        } else if let Some(caps) = DEF_LINE.captures(line) {
            let params = split_params(caps.get(4).map_or("", |m| m.as_str()));
            let name = caps[3].to_string();
            match open_class {
                Some((class_indent, class_idx)) if indent > class_indent => {
                    out.classes[class_idx].methods.push(MethodInfo { name, params });
                }
                _ => out.functions.push(FunctionInfo {
                    name,
                    params,
                    line: line_no,
                    is_async: caps.get(2).is_some(),
                    decorators: std::mem::take(&mut pending_decorators),
                }),
            }
        }
        pending_decorators.clear();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
import os
import pkg.sub as ps, json
from . import sibling, other as o
from ..parent import thing
from .mod import Name

@decorator
async def fetch(url: str, timeout=5, *args, **kwargs):
    """Fetch a url."""
    def inner():
        pass
    return inner

class Base(object, metaclass=Meta):
    def __init__(self, x):
        self.x = x

    @property
    def value(self):
        return self.x

class _Private(Base):
    pass

def _helper():
    pass
"#;

    #[test]
    fn extracts_from_syntax_tree() {
        let out = PythonExtractor.extract(SAMPLE);
        assert_eq!(out.parse_mode, ParseMode::Ast);
        assert_eq!(
            out.imports,
            vec!["os", "pkg.sub", "json", ".sibling", ".other", "..parent", ".mod"]
        );

        let names: Vec<&str> = out.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fetch", "inner", "_helper"]);
        let fetch = &out.functions[0];
        assert!(fetch.is_async);
        assert_eq!(fetch.decorators, vec!["decorator"]);
        assert_eq!(fetch.params, vec!["url", "timeout", "*args", "**kwargs"]);
        assert_eq!(fetch.line, 9);

        assert_eq!(out.classes.len(), 2);
        let base = &out.classes[0];
        assert_eq!(base.bases, vec!["object"]);
        let methods: Vec<&str> = base.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["__init__", "value"]);
        assert_eq!(base.methods[0].params, vec!["self", "x"]);
        assert_eq!(out.classes[1].bases, vec!["Base"]);

        assert_eq!(out.exports, vec!["fetch", "inner", "Base"]);
        assert!(out.has_docstring);
    }

    #[test]
    fn falls_back_on_syntax_error() {
        let broken = "import os\nfrom pkg import x\n\nclass A(B):\n    def m(self, y):\n        pass\n\ndef f(a, b:\n    return (\n";
        let out = PythonExtractor.extract(broken);
        assert_eq!(out.parse_mode, ParseMode::Fallback);
        assert_eq!(out.imports, vec!["os", "pkg"]);
        assert_eq!(out.classes.len(), 1);
        assert_eq!(out.classes[0].bases, vec!["B"]);
        assert_eq!(out.classes[0].methods[0].name, "m");
        assert_eq!(out.functions.len(), 1);
        assert_eq!(out.functions[0].name, "f");
        assert_eq!(out.functions[0].line, 8);
    }

    #[test]
    fn empty_source_is_valid() {
        let out = PythonExtractor.extract("");
        assert_eq!(out.parse_mode, ParseMode::Ast);
        assert!(out.imports.is_empty());
        assert!(out.functions.is_empty());
    }
}
