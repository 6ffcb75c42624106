use std::path::Path;

/// Folds the whitespace and quote variants common in PDF text layers to
/// plain ASCII, collapses whitespace runs, and trims. Applied to cell text
/// before year detection, metric extraction, and numeric parsing.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for ch in raw.chars() {
        let ch = match ch {
            '\u{2009}' | '\u{a0}' | '\u{202f}' => ' ',
            '\u{2019}' => '\'',
            c => c,
        };
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Guesses company name and default fiscal year from a report filename.
/// A stem like "acme_2023" or "2023-acme" splits into company "acme" and
/// year 2023; anything else is taken verbatim as the company.
pub fn infer_company_and_year(path: &Path) -> (String, Option<i32>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    for sep in ['_', '-', ' '] {
        if let Some((a, b)) = stem.split_once(sep) {
            if let Some(year) = bare_four_digit(a) {
                return (b.to_string(), Some(year));
            }
            if let Some(year) = bare_four_digit(b) {
                return (a.to_string(), Some(year));
            }
        }
    }
    (stem, None)
}

fn bare_four_digit(token: &str) -> Option<i32> {
    if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_text_folds_pdf_whitespace() {
        assert_eq!(normalize_text("  €\u{a0}1\u{2009}200  "), "€ 1 200");
        assert_eq!(normalize_text("FY\u{2019}24"), "FY'24");
        assert_eq!(normalize_text("a \t\n b"), "a b");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_infer_company_and_year_from_stem() {
        let (company, year) = infer_company_and_year(&PathBuf::from("reports/acme_2023.pdf"));
        assert_eq!(company, "acme");
        assert_eq!(year, Some(2023));

        let (company, year) = infer_company_and_year(&PathBuf::from("2024-globex.pdf"));
        assert_eq!(company, "globex");
        assert_eq!(year, Some(2024));

        let (company, year) = infer_company_and_year(&PathBuf::from("annual report.pdf"));
        assert_eq!(company, "annual report");
        assert_eq!(year, None);
    }

    #[test]
    fn test_infer_company_requires_bare_four_digits() {
        let (company, year) = infer_company_and_year(&PathBuf::from("acme_23.pdf"));
        assert_eq!(company, "acme_23");
        assert_eq!(year, None);
    }
}
