//! Label canonicalization
//!
//! Maps free-form card labels onto the closed vocabulary of 52 card symbols
//! (rank + suit letter, e.g. `As`, `10h`, `Kc`). Two independent paths exist:
//! [`map_full_to_short`] for "<rank> of <suit>" phrases and
//! [`category_to_symbol`] for "<rank> <suit>" category names.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

// Rank words and their symbol prefix
const RANKS: &[(&str, &str)] = &[
    ("ace", "A"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("jack", "J"),
    ("queen", "Q"),
    ("king", "K"),
];

// Suit names and their symbol letter; the letter is also the file-name prefix
// used to repair "seven of seven"
const SUITS: &[(&str, char)] = &[
    ("clubs", 'c'),
    ("diamonds", 'd'),
    ("hearts", 'h'),
    ("spades", 's'),
];

// Known misspellings in the raw labels
const TYPO_FIXES: &[(&str, &str)] = &[("eigth", "eight")];

// Checked in order as substrings of the suit part of a category name.
// Some exports call clubs "trefoils".
const SUIT_SYNONYMS: &[(&str, char)] = &[
    ("diamonds", 'd'),
    ("diamond", 'd'),
    ("hearts", 'h'),
    ("heart", 'h'),
    ("spades", 's'),
    ("spade", 's'),
    ("clubs", 'c'),
    ("club", 'c'),
    ("trefoils", 'c'),
    ("trefoil", 'c'),
];

// Umbrella categories that name no particular card
const NON_CARD_CATEGORIES: &[&str] = &["poker-cards", "poker cards"];

const DEGENERATE_PHRASE: &str = "seven of seven";

static FULL_TO_SHORT: OnceLock<HashMap<String, String>> = OnceLock::new();
static CARD_SYMBOLS: OnceLock<HashSet<String>> = OnceLock::new();

/// "<rank> of <suit>" phrase to symbol, 52 entries.
pub fn full_to_short_table() -> &'static HashMap<String, String> {
    FULL_TO_SHORT.get_or_init(|| {
        RANKS
            .iter()
            .flat_map(|&(rank, prefix)| {
                SUITS.iter().map(move |&(suit, letter)| {
                    (format!("{rank} of {suit}"), format!("{prefix}{letter}"))
                })
            })
            .collect()
    })
}

/// The closed vocabulary of 52 card symbols.
pub fn card_symbols() -> &'static HashSet<String> {
    CARD_SYMBOLS.get_or_init(|| full_to_short_table().values().cloned().collect())
}

#[cfg(test)]
pub fn is_card_symbol(symbol: &str) -> bool {
    card_symbols().contains(symbol)
}

/// Trim, lowercase, fix known typos and collapse internal whitespace.
pub fn normalize_label(label: &str) -> String {
    let mut s = label.trim().to_lowercase();
    for (bad, good) in TYPO_FIXES {
        s = s.replace(bad, good);
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a "<rank> of <suit>" label to its card symbol.
///
/// `file_name` is only consulted for the degenerate "seven of seven" label,
/// whose suit is recovered from the first character of the file stem.
pub fn map_full_to_short(label: &str, file_name: &str) -> Option<&'static str> {
    let table = full_to_short_table();
    let norm = normalize_label(label);
    if let Some(symbol) = table.get(&norm) {
        return Some(symbol.as_str());
    }

    if norm == DEGENERATE_PHRASE {
        let suit = suit_from_file_name(file_name)?;
        let repaired = format!("seven of {suit}");
        return table.get(&repaired).map(String::as_str);
    }

    None
}

fn suit_from_file_name(file_name: &str) -> Option<&'static str> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let prefix = stem.chars().next()?.to_ascii_lowercase();
    SUITS
        .iter()
        .find(|&&(_, letter)| letter == prefix)
        .map(|&(suit, _)| suit)
}

/// Map a "<rank> <suit>" category name (underscores or spaces) to a symbol.
///
/// Letter ranks are uppercased, numeric ranks kept, rank words accepted.
/// Names that are not a rank + suit pair, such as the umbrella
/// "poker-cards" category, yield `None`.
pub fn category_to_symbol(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    if NON_CARD_CATEGORIES.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }

    let replaced = trimmed.replace('_', " ");
    let mut parts = replaced.split_whitespace();
    let rank = parts.next()?;
    let suit = parts.collect::<Vec<_>>().join(" ").to_lowercase();
    if suit.is_empty() {
        return None;
    }

    let letter = SUIT_SYNONYMS
        .iter()
        .find(|(synonym, _)| suit.contains(*synonym))
        .map(|&(_, letter)| letter)?;

    let prefix = rank_prefix(rank)?;
    card_symbols()
        .get(&format!("{prefix}{letter}"))
        .map(String::as_str)
}

fn rank_prefix(rank: &str) -> Option<String> {
    let upper = rank.to_uppercase();
    if matches!(upper.as_str(), "A" | "J" | "Q" | "K") {
        return Some(upper);
    }
    if let Ok(n) = rank.parse::<u8>() {
        return (2..=10).contains(&n).then(|| n.to_string());
    }
    let lower = rank.to_lowercase();
    RANKS
        .iter()
        .find(|&&(word, _)| word == lower)
        .map(|&(_, prefix)| prefix.to_string())
}

/// Phrase table first, category-name path second.
pub fn canonicalize_any(label: &str, file_name: &str) -> Option<&'static str> {
    map_full_to_short(label, file_name).or_else(|| category_to_symbol(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_has_52_distinct_symbols() {
        assert_eq!(full_to_short_table().len(), 52);
        assert_eq!(card_symbols().len(), 52);
        assert!(is_card_symbol("10h"));
        assert!(!is_card_symbol("1h"));
    }

    #[test]
    fn test_all_phrases_map_to_expected_symbols() {
        let ranks = [
            ("ace", "A"),
            ("two", "2"),
            ("three", "3"),
            ("four", "4"),
            ("five", "5"),
            ("six", "6"),
            ("seven", "7"),
            ("eight", "8"),
            ("nine", "9"),
            ("ten", "10"),
            ("jack", "J"),
            ("queen", "Q"),
            ("king", "K"),
        ];
        let suits = [("clubs", "c"), ("diamonds", "d"), ("hearts", "h"), ("spades", "s")];

        for (rank, r) in ranks {
            for (suit, s) in suits {
                let expected = format!("{r}{s}");
                let phrase = format!("{rank} of {suit}");
                assert_eq!(map_full_to_short(&phrase, "x.jpg"), Some(expected.as_str()));

                let shouty = format!("  {}   OF {} ", rank.to_uppercase(), suit);
                assert_eq!(map_full_to_short(&shouty, "x.jpg"), Some(expected.as_str()));
            }
        }
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Ace   of\tSpades "), "ace of spades");
        assert_eq!(normalize_label("Eigth of Hearts"), "eight of hearts");
        assert_eq!(map_full_to_short("eigth of clubs", "a.jpg"), Some("8c"));
    }

    #[test]
    fn test_seven_of_seven_repair() {
        assert_eq!(map_full_to_short("seven of seven", "c001.jpg"), Some("7c"));
        assert_eq!(map_full_to_short("seven of seven", "d_12.png"), Some("7d"));
        assert_eq!(map_full_to_short("Seven of Seven", "H3.jpg"), Some("7h"));
        assert_eq!(map_full_to_short("seven of seven", "dir/s9.jpg"), Some("7s"));
        assert_eq!(map_full_to_short("seven of seven", "x9.jpg"), None);
        assert_eq!(map_full_to_short("seven of seven", ""), None);
    }

    #[test]
    fn test_unknown_phrases_rejected() {
        assert_eq!(map_full_to_short("joker", "c1.jpg"), None);
        assert_eq!(map_full_to_short("eleven of hearts", "c1.jpg"), None);
        assert_eq!(map_full_to_short("eight of eight", "c1.jpg"), None);
    }

    #[test]
    fn test_category_to_symbol() {
        assert_eq!(category_to_symbol("A_spades"), Some("As"));
        assert_eq!(category_to_symbol("q hearts"), Some("Qh"));
        assert_eq!(category_to_symbol("10 Diamonds"), Some("10d"));
        assert_eq!(category_to_symbol("2_club"), Some("2c"));
        assert_eq!(category_to_symbol("K trefoils"), Some("Kc"));
        assert_eq!(category_to_symbol("jack spade"), Some("Js"));
    }

    #[test]
    fn test_category_to_symbol_rejects_non_cards() {
        assert_eq!(category_to_symbol("poker-cards"), None);
        assert_eq!(category_to_symbol("Poker Cards"), None);
        assert_eq!(category_to_symbol("joker"), None);
        assert_eq!(category_to_symbol("A stars"), None);
        assert_eq!(category_to_symbol("1 hearts"), None);
        assert_eq!(category_to_symbol("joker hearts"), None);
    }

    #[test]
    fn test_canonicalize_any() {
        assert_eq!(canonicalize_any("king of hearts", "h.jpg"), Some("Kh"));
        assert_eq!(canonicalize_any("K_hearts", "h.jpg"), Some("Kh"));
        assert_eq!(canonicalize_any("card", "h.jpg"), None);
    }
}
