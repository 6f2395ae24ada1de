//! Doctype classification
//!
//! Picks the document's compatibility mode from its DOCTYPE token, using
//! the quirks tables of the HTML tree construction algorithm.

use lumen_dom::QuirksMode;

/// The parts of a DOCTYPE that decide the mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeToken {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl DoctypeToken {
    pub fn new(name: &str, public_id: &str, system_id: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            name: non_empty(name),
            public_id: non_empty(public_id),
            system_id: non_empty(system_id),
        }
    }
}

/// Chooses a quirks mode for a parsed document
pub trait ClassifyDoctype {
    /// `None` when the document has no doctype at all
    fn classify(&self, doctype: Option<&DoctypeToken>) -> QuirksMode;
}

/// Classifier implementing the HTML standard table
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

const QUIRKS_PUBLIC_EXACT: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const QUIRKS_SYSTEM_EXACT: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

const QUIRKS_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// Quirks without a system identifier, limited quirks with one
const SYSTEM_DEPENDENT_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

const LIMITED_QUIRKS_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

fn starts_with_any(value: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| value.starts_with(p))
}

impl ClassifyDoctype for StandardClassifier {
    fn classify(&self, doctype: Option<&DoctypeToken>) -> QuirksMode {
        let Some(doctype) = doctype else {
            return QuirksMode::Quirks;
        };
        if doctype.name.as_deref().map(str::to_ascii_lowercase).as_deref() != Some("html") {
            return QuirksMode::Quirks;
        }

        let public = doctype.public_id.as_deref().map(str::to_ascii_lowercase);
        let system = doctype.system_id.as_deref().map(str::to_ascii_lowercase);

        if system.as_deref() == Some(QUIRKS_SYSTEM_EXACT) {
            return QuirksMode::Quirks;
        }
        if let Some(public) = public.as_deref() {
            if QUIRKS_PUBLIC_EXACT.contains(&public) || starts_with_any(public, QUIRKS_PUBLIC_PREFIXES) {
                return QuirksMode::Quirks;
            }
            if starts_with_any(public, SYSTEM_DEPENDENT_PREFIXES) {
                return if system.is_none() {
                    QuirksMode::Quirks
                } else {
                    QuirksMode::LimitedQuirks
                };
            }
            if starts_with_any(public, LIMITED_QUIRKS_PREFIXES) {
                return QuirksMode::LimitedQuirks;
            }
        }
        QuirksMode::NoQuirks
    }
}
