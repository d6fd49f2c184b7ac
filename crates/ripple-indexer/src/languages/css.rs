//! CSS `@import` extractor

use once_cell::sync::Lazy;
use regex::Regex;
use ripple_core::ParseMode;

use crate::extractor::{Extraction, LanguageExtractor};

pub struct CssExtractor;

static IMPORT_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@import\s+['"]([^'"]+)['"]"#).expect("css import pattern"));
static IMPORT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#).expect("css url pattern")
});

impl LanguageExtractor for CssExtractor {
    fn extract(&self, content: &str) -> Extraction {
        let mut found: Vec<(usize, &str)> = [&*IMPORT_STRING, &*IMPORT_URL]
            .into_iter()
            .flat_map(|re| re.captures_iter(content))
            .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str())))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        let mut out = Extraction {
            parse_mode: ParseMode::Pattern,
            ..Default::default()
        };
        for (_, spec) in found {
            out.push_import(spec);
        }
        out
    }
}
