use regex::Regex;

const FRENCH_MARKERS: &[&str] = &[
    " le ", " la ", " de ", " je ", "vous", "avoir", "être", "pour", " s'",
];

/// Endpoint-free heuristic used when every detect endpoint has failed.
/// Mirrors the reference implementation's marker list and diacritic check.
pub fn heuristic_detect(text: &str) -> String {
    if text.chars().any(is_cjk) {
        return "zh".to_string();
    }
    let padded = format!(" {} ", text.to_lowercase());
    if FRENCH_MARKERS.iter().any(|m| padded.contains(m)) || has_latin_diacritics(&padded) {
        return "fr".to_string();
    }
    "en".to_string()
}

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

fn has_latin_diacritics(s: &str) -> bool {
    let re = Regex::new("[áéíóúñçàèùâêîôûëïüœ]").expect("static regex");
    re.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_chinese_by_ideograph() {
        assert_eq!(heuristic_detect("你好吗"), "zh");
    }

    #[test]
    fn detects_french_by_marker_word() {
        assert_eq!(heuristic_detect("je vous remercie pour votre aide"), "fr");
    }

    #[test]
    fn detects_french_by_diacritic() {
        assert_eq!(heuristic_detect("où êtes-vous"), "fr");
    }

    #[test]
    fn falls_back_to_english() {
        assert_eq!(heuristic_detect("hello there"), "en");
    }
}
