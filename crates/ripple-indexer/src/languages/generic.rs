//! Extractor for languages with no import syntax worth tracking

use ripple_core::ParseMode;

use crate::extractor::{Extraction, LanguageExtractor};

pub struct GenericExtractor;

impl LanguageExtractor for GenericExtractor {
    fn extract(&self, _content: &str) -> Extraction {
        Extraction {
            parse_mode: ParseMode::Pattern,
            ..Default::default()
        }
    }
}
