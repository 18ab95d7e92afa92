use serde::{Deserialize, Serialize};

use crate::language::LanguageId;

/// User defined replacement for a commonly misrecognized fragment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Substitution {
    /// Empty matches every recognition language.
    pub language: LanguageId,
    pub source: String,
    pub target: String,
}

pub fn correct(text: &str, language: &str, substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .filter(|x| !x.source.is_empty())
        .filter(|x| x.language.is_empty() || x.language == language)
        .fold(text.to_string(), |text, x| text.replace(&x.source, &x.target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substitution(language: &str, source: &str, target: &str) -> Substitution {
        Substitution {
            language: language.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    #[test]
    fn applies_matching_language_only() {
        let substitutions = vec![
            substitution("eng", "rn", "m"),
            substitution("rus", "m", "т"),
            substitution("", "|", "I"),
        ];

        assert_eq!(correct("| am rnodel", "eng", &substitutions), "I am model");
        assert_eq!(correct("rn", "deu", &substitutions), "rn");
    }

    #[test]
    fn empty_source_is_ignored() {
        let substitutions = vec![substitution("", "", "x")];
        assert_eq!(correct("text", "eng", &substitutions), "text");
    }
}
