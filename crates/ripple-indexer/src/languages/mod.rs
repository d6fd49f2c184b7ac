//! Language extractors for the supported file types

pub mod css;
pub mod generic;
pub mod html;
pub mod javascript;
pub mod json;
pub mod python;

use ripple_core::Language;

use crate::extractor::LanguageExtractor;

/// Get the extractor for a language
pub fn get_extractor(language: Language) -> Box<dyn LanguageExtractor> {
    match language {
        Language::Python => Box::new(python::PythonExtractor),
        Language::JavaScript | Language::TypeScript => Box::new(javascript::JavaScriptExtractor),
        Language::Css => Box::new(css::CssExtractor),
        Language::Html => Box::new(html::HtmlExtractor),
        Language::Json => Box::new(json::JsonExtractor),
        Language::Markdown | Language::Yaml | Language::Toml | Language::Ini => {
            Box::new(generic::GenericExtractor)
        }
    }
}
