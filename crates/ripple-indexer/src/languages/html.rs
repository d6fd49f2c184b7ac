//! HTML asset reference extractor

use once_cell::sync::Lazy;
use regex::Regex;
use ripple_core::ParseMode;

use crate::extractor::{Extraction, LanguageExtractor};

pub struct HtmlExtractor;

static REFERENCES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<link[^>]+href=["']([^"']+\.css(?:\?[^"']*)?)["']"#,
        r#"(?i)<script[^>]+src=["']([^"']+\.(?:m?js|ts)(?:\?[^"']*)?)["']"#,
        r#"(?i)<a[^>]+href=["']([^"']+\.html?(?:[?#][^"']*)?)["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("html pattern"))
    .collect()
});

impl LanguageExtractor for HtmlExtractor {
    fn extract(&self, content: &str) -> Extraction {
        let mut found: Vec<(usize, &str)> = REFERENCES
            .iter()
            .flat_map(|re| re.captures_iter(content))
            .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str())))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        let mut out = Extraction {
            parse_mode: ParseMode::Pattern,
            ..Default::default()
        };
        for (_, reference) in found {
            out.push_import(reference);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_stylesheets_scripts_and_pages() {
        let html = r#"<html><head>
<link rel="stylesheet" href="css/site.css">
<LINK href='https://cdn.example.com/lib.css' rel=stylesheet>
<script type="module" src="./js/app.js"></script>
</head><body><a class="nav" href="about.html#team">About</a></body></html>"#;
        let out = HtmlExtractor.extract(html);
        assert_eq!(
            out.imports,
            vec![
                "css/site.css",
                "https://cdn.example.com/lib.css",
                "./js/app.js",
                "about.html#team"
            ]
        );
    }
}
