//! Filtering over saved history.

use crate::model::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryQuery {
    /// Accent- and case-insensitive substring of the city name.
    City(String),
    /// Digits contained in the saved postal code.
    PostalCode(String),
    /// Substring of the creation date rendered as `dd/mm/yyyy`.
    Date(String),
}

/// Entries matching `query`, one per city (the first listed wins).
///
/// Entries without a temperature or city are never returned.
pub fn search<'a>(history: &'a [HistoryEntry], query: &HistoryQuery) -> Vec<&'a HistoryEntry> {
    let matches = history.iter().filter(|e| is_listable(e)).filter(|entry| match query {
        HistoryQuery::City(term) => fold(&entry.city).contains(&fold(term.trim())),
        HistoryQuery::PostalCode(term) => {
            let digits: String = term.chars().filter(char::is_ascii_digit).collect();
            entry.postal_code.as_deref().is_some_and(|code| code.contains(&digits))
        }
        HistoryQuery::Date(term) => entry.created_at.format("%d/%m/%Y").to_string().contains(term.trim()),
    });
    dedupe_by_city(matches)
}

/// Saved cities with a usable reading, one per city, in history order.
pub fn unique_cities(history: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    dedupe_by_city(history.iter().filter(|e| is_listable(e)))
}

fn is_listable(entry: &HistoryEntry) -> bool {
    entry.has_reading() && !entry.city.trim().is_empty()
}

fn dedupe_by_city<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> Vec<&'a HistoryEntry> {
    let mut seen = std::collections::HashSet::new();
    entries.filter(|e| seen.insert(fold(&e.city))).collect()
}

/// Lowercase and strip Latin diacritics so "São Paulo" matches "sao paulo".
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}
