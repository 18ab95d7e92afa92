use itertools::Itertools;

/// Language id as used in settings and processing items (ISO 639-2).
pub type LanguageId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageCode {
    pub id: &'static str,
    pub name: &'static str,
    pub iso639_1: &'static str,
    pub tesseract: &'static str,
}

const LANGUAGES: &[LanguageCode] = &[
    LanguageCode { id: "ara", name: "Arabic", iso639_1: "ar", tesseract: "ara" },
    LanguageCode { id: "bul", name: "Bulgarian", iso639_1: "bg", tesseract: "bul" },
    LanguageCode { id: "ces", name: "Czech", iso639_1: "cs", tesseract: "ces" },
    LanguageCode { id: "chi_sim", name: "Chinese (Simplified)", iso639_1: "zh-CN", tesseract: "chi_sim" },
    LanguageCode { id: "chi_tra", name: "Chinese (Traditional)", iso639_1: "zh-TW", tesseract: "chi_tra" },
    LanguageCode { id: "dan", name: "Danish", iso639_1: "da", tesseract: "dan" },
    LanguageCode { id: "deu", name: "German", iso639_1: "de", tesseract: "deu" },
    LanguageCode { id: "ell", name: "Greek", iso639_1: "el", tesseract: "ell" },
    LanguageCode { id: "eng", name: "English", iso639_1: "en", tesseract: "eng" },
    LanguageCode { id: "fin", name: "Finnish", iso639_1: "fi", tesseract: "fin" },
    LanguageCode { id: "fra", name: "French", iso639_1: "fr", tesseract: "fra" },
    LanguageCode { id: "heb", name: "Hebrew", iso639_1: "he", tesseract: "heb" },
    LanguageCode { id: "hin", name: "Hindi", iso639_1: "hi", tesseract: "hin" },
    LanguageCode { id: "hun", name: "Hungarian", iso639_1: "hu", tesseract: "hun" },
    LanguageCode { id: "ita", name: "Italian", iso639_1: "it", tesseract: "ita" },
    LanguageCode { id: "jpn", name: "Japanese", iso639_1: "ja", tesseract: "jpn" },
    LanguageCode { id: "kor", name: "Korean", iso639_1: "ko", tesseract: "kor" },
    LanguageCode { id: "nld", name: "Dutch", iso639_1: "nl", tesseract: "nld" },
    LanguageCode { id: "nor", name: "Norwegian", iso639_1: "no", tesseract: "nor" },
    LanguageCode { id: "pol", name: "Polish", iso639_1: "pl", tesseract: "pol" },
    LanguageCode { id: "por", name: "Portuguese", iso639_1: "pt", tesseract: "por" },
    LanguageCode { id: "ron", name: "Romanian", iso639_1: "ro", tesseract: "ron" },
    LanguageCode { id: "rus", name: "Russian", iso639_1: "ru", tesseract: "rus" },
    LanguageCode { id: "spa", name: "Spanish", iso639_1: "es", tesseract: "spa" },
    LanguageCode { id: "swe", name: "Swedish", iso639_1: "sv", tesseract: "swe" },
    LanguageCode { id: "tha", name: "Thai", iso639_1: "th", tesseract: "tha" },
    LanguageCode { id: "tur", name: "Turkish", iso639_1: "tr", tesseract: "tur" },
    LanguageCode { id: "ukr", name: "Ukrainian", iso639_1: "uk", tesseract: "ukr" },
    LanguageCode { id: "vie", name: "Vietnamese", iso639_1: "vi", tesseract: "vie" },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageCodes;

impl LanguageCodes {
    pub fn all(&self) -> &'static [LanguageCode] {
        LANGUAGES
    }

    pub fn find_by_id(&self, id: &str) -> Option<&'static LanguageCode> {
        LANGUAGES.iter().find(|x| x.id == id)
    }

    pub fn find_by_tesseract(&self, code: &str) -> Option<&'static LanguageCode> {
        LANGUAGES.iter().find(|x| x.tesseract == code)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&'static LanguageCode> {
        LANGUAGES.iter().find(|x| x.name.eq_ignore_ascii_case(name))
    }

    /// Languages known to the table that have Tesseract data installed.
    pub fn recognizable(&self, installed: &[String]) -> Vec<&'static LanguageCode> {
        installed
            .iter()
            .filter_map(|x| self.find_by_tesseract(x))
            .sorted_by_key(|x| x.name)
            .collect()
    }
}

/// Display name for a language id, falling back to the id itself.
pub fn language_name(id: &str) -> String {
    LanguageCodes
        .find_by_id(id)
        .map(|x| x.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_agree() {
        let codes = LanguageCodes;
        let eng = codes.find_by_id("eng").unwrap();
        assert_eq!(eng.iso639_1, "en");
        assert_eq!(codes.find_by_tesseract("eng"), Some(eng));
        assert_eq!(codes.find_by_name("english"), Some(eng));
        assert!(codes.find_by_id("xxx").is_none());
    }

    #[test]
    fn recognizable_skips_unknown_and_sorts() {
        let installed = vec!["rus".to_string(), "osd".to_string(), "eng".to_string()];
        let names: Vec<&str> = LanguageCodes
            .recognizable(&installed)
            .into_iter()
            .map(|x| x.name)
            .collect();
        assert_eq!(names, vec!["English", "Russian"]);
    }

    #[test]
    fn language_name_falls_back_to_id() {
        assert_eq!(language_name("jpn"), "Japanese");
        assert_eq!(language_name("klingon"), "klingon");
    }
}
