//! Helpers for the names of downloaded result archives
//!
//! Published archive names look like `Winter Champs 08Aug2025-001.zip`: an
//! optional date token (`DDMonYYYY`) and an optional trailing `-NNN` upload
//! code. Registration uses these to store a tentative date before the
//! results file itself has been decoded.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn date_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(0[1-9]|[12][0-9]|3[01])[A-Za-z]{3}(?P<year>[0-9]{4})")
            .expect("valid date token regex")
    })
}

fn trailing_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)-[0-9]{3}$").expect("valid trailing code regex"))
}

/// A `DDMonYYYY` token found in a file name, with its year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken {
    pub token: String,
    pub year: Option<i32>,
}

/// Find the first date token such as `08Aug2025` in a base name
pub fn extract_date_token(base_name: &str) -> Option<DateToken> {
    let caps = date_token_regex().captures(base_name)?;
    let token = caps.get(0)?.as_str().to_string();
    let year = caps.name("year").and_then(|m| m.as_str().parse().ok());
    Some(DateToken { token, year })
}

/// Strip the extension and a trailing `-NNN` code from a file name
pub fn base_name_without_ext_and_code(file_name: &str) -> String {
    let base = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => &file_name[..file_name.len() - ext.len() - 1],
        None => file_name,
    };

    trailing_code_regex()
        .captures(base)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| base.to_string())
}

/// Date token for the archive at `file_path`, looking only at its file name
pub fn date_token_for_path(file_path: &str) -> Option<DateToken> {
    let file_name = Path::new(file_path).file_name()?.to_str()?;
    extract_date_token(&base_name_without_ext_and_code(file_name))
}
