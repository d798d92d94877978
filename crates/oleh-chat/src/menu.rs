//! Canonical intent-selection menu.
//!
//! When the model writes its own rendition of the three-option menu, the
//! reply is replaced with the fixed rendering below.

/// Marker phrases, one per menu option.
const MENU_MARKERS: [&str; 3] = ["GENERAL INFORMATION", "DOCUMENT UNDERSTANDING", "FIRST STEPS"];

pub const CANONICAL_MENU: &str = "I can help you with a few things. Please choose one of the following options:\n\n\
**A) GENERAL INFORMATION:**\n(rights, benefits, Sal Klita, health care, etc.)\n\n\
**B) DOCUMENT UNDERSTANDING:**\n(confusing forms, bills, letters, etc.)\n\n\
**C) FIRST STEPS & APPOINTMENTS:**\n(Guiding for essential first steps in Israel, such as setting up a phone, bank account, and making your Ministry of Aliyah Appointment)";

/// True when `text` mentions every menu option, in any case.
pub fn looks_like_menu(text: &str) -> bool {
    let upper = text.to_uppercase();
    MENU_MARKERS.iter().all(|marker| upper.contains(marker))
}

/// Replace a model-written menu with the canonical one; other text is
/// returned unchanged.
pub fn normalize_menu(text: String) -> String {
    if looks_like_menu(&text) {
        CANONICAL_MENU.to_string()
    } else {
        text
    }
}
