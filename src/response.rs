//! Answer formatting
//!
//! Turns an upstream completion into the text returned to the caller. Never
//! fails: a missing or blank completion becomes a localized apology that
//! points the user at the agency's contact details.

use crate::catalog::ContactBlock;
use crate::models::GenerateContentResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response language requested by the caller
///
/// Only selects the fallback and failure texts; the model itself is
/// instructed to mirror the user's language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sw,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sw => "sw",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "sw" => Ok(Language::Sw),
            other => Err(format!(
                "language must be \"en\" or \"sw\", got \"{}\"",
                other
            )),
        }
    }
}

/// Final answer text, tagged with the language it was requested in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    text: String,
    language: Language,
    is_fallback: bool,
}

impl Answer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// True when the completion was empty and the apology was substituted
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Extract the first candidate's text, or substitute the localized fallback
pub fn format_answer(
    response: &GenerateContentResponse,
    language: Language,
    contact: &ContactBlock,
) -> Answer {
    match response.first_candidate_text() {
        Some(text) => Answer {
            text,
            language,
            is_fallback: false,
        },
        None => Answer {
            text: fallback_message(language, contact),
            language,
            is_fallback: true,
        },
    }
}

/// Apology used when the model answered with nothing usable
pub fn fallback_message(language: Language, contact: &ContactBlock) -> String {
    match language {
        Language::En => format!(
            "I'm sorry, I don't have that information right now. Please contact us at {} or {} for further assistance.",
            contact.primary_phone(),
            contact.primary_email()
        ),
        Language::Sw => format!(
            "Samahani, sina taarifa hiyo kwa sasa. Tafadhali wasiliana nasi kupitia {} au {} kwa msaada zaidi.",
            contact.primary_phone(),
            contact.primary_email()
        ),
    }
}

/// Message for every 500 outcome; carries contact details, never the cause
pub fn generic_failure_message(language: Language, contact: &ContactBlock) -> String {
    match language {
        Language::En => format!(
            "Sorry, our assistant is temporarily unavailable. Please contact us at {} or {} and our team will be happy to help.",
            contact.primary_phone(),
            contact.primary_email()
        ),
        Language::Sw => format!(
            "Samahani, msaidizi wetu hapatikani kwa sasa. Tafadhali wasiliana nasi kupitia {} au {} na timu yetu itafurahi kukusaidia.",
            contact.primary_phone(),
            contact.primary_email()
        ),
    }
}
