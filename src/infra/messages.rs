//! Localized messages returned in place of raw backend errors.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    InternalServerError,
    NoRecordsUpdated,
    /// Takes the expected and the actual count.
    DeletedCountError,
}

lazy_static! {
    static ref CATALOGUE: HashMap<&'static str, HashMap<MessageKind, &'static str>> = {
        let mut en = HashMap::new();
        en.insert(
            MessageKind::InternalServerError,
            "Internal Server Error, Please contact System Administrator or try again",
        );
        en.insert(MessageKind::NoRecordsUpdated, "No records were updated");
        en.insert(
            MessageKind::DeletedCountError,
            "Deleted record count error, expected {0} but deleted {1}",
        );

        let mut catalogue = HashMap::new();
        catalogue.insert("en", en);
        catalogue
    };
}

/// Message lookup with a fallback language.
#[derive(Debug, Clone)]
pub struct Messages {
    fallback: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Messages {
    pub fn new(fallback: &str) -> Self {
        Self {
            fallback: fallback.to_string(),
        }
    }

    /// The template for `kind` in `lang`, then the fallback language, then English.
    fn template(&self, lang: &str, kind: MessageKind) -> &'static str {
        let primary = lang.split(['-', '_']).next().unwrap_or(lang).to_ascii_lowercase();
        [primary.as_str(), self.fallback.as_str(), "en"]
            .iter()
            .find_map(|l| CATALOGUE.get(*l).and_then(|m| m.get(&kind)))
            .copied()
            .unwrap_or("")
    }

    /// Renders `kind`, substituting `{0}`, `{1}`, ... with `args`.
    pub fn get(&self, lang: &str, kind: MessageKind, args: &[&dyn std::fmt::Display]) -> String {
        let mut message = self.template(lang, kind).to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), &arg.to_string());
        }
        message
    }

    pub fn internal_server_error(&self, lang: &str) -> String {
        self.get(lang, MessageKind::InternalServerError, &[])
    }

    pub fn no_records_updated(&self, lang: &str) -> String {
        self.get(lang, MessageKind::NoRecordsUpdated, &[])
    }

    pub fn deleted_count_error(&self, lang: &str, expected: u64, actual: u64) -> String {
        self.get(lang, MessageKind::DeletedCountError, &[&expected, &actual])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_count_substitution() {
        let m = Messages::default();
        assert_eq!(
            m.deleted_count_error("en", 1, 0),
            "Deleted record count error, expected 1 but deleted 0"
        );
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let m = Messages::new("de");
        assert_eq!(m.no_records_updated("fr-CA"), "No records were updated");
        assert_eq!(m.internal_server_error("en-US"), m.internal_server_error("zz"));
    }
}
