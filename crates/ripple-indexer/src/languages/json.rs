//! Package manifest dependency extractor

use ripple_core::ParseMode;
use serde_json::Value;

use crate::extractor::{Extraction, LanguageExtractor};

pub struct JsonExtractor;

const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

impl LanguageExtractor for JsonExtractor {
    fn extract(&self, content: &str) -> Extraction {
        let mut out = Extraction {
            parse_mode: ParseMode::Pattern,
            ..Default::default()
        };
        let Ok(Value::Object(doc)) = serde_json::from_str::<Value>(content) else {
            return out;
        };
        for section in DEPENDENCY_SECTIONS {
            if let Some(Value::Object(deps)) = doc.get(*section) {
                for name in deps.keys() {
                    out.push_import(name);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_json_dependencies() {
        let manifest = r#"{"name": "app", "dependencies": {"react": "^18"},
            "devDependencies": {"vitest": "1", "react": "18"}}"#;
        let out = JsonExtractor.extract(manifest);
        assert_eq!(out.imports, vec!["react", "vitest"]);
    }

    #[test]
    fn invalid_json_yields_nothing() {
        assert!(JsonExtractor.extract("{oops").imports.is_empty());
        assert!(JsonExtractor.extract("[1, 2]").imports.is_empty());
    }
}
