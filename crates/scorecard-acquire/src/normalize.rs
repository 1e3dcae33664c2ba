// Title-to-slug normalization.
//
// The target site's URLs can mostly be derived from a title mechanically,
// but the export's titles carry edition qualifiers, truncations, and DLC
// names that need curated handling first. The rule cascade is strict:
// ignore list, then override map, then the mechanical rules.

use scorecard_model::Settings;

/// Map a raw purchase title to a URL slug, or `None` for titles confirmed
/// absent from the target catalog.
///
/// Deterministic and total: the same title and settings always produce the
/// same result. The mechanical rules, in order:
/// 1. drop each configured phrase (edition qualifiers, so DLC falls back
///    to the main game's page),
/// 2. strip configured punctuation,
/// 3. lowercase and trim,
/// 4. apply the ordered replacers (`" - "` before `" "` matters).
pub fn normalize(raw_title: &str, settings: &Settings) -> Option<String> {
    if settings.ignored.contains(raw_title) {
        return None;
    }
    if let Some(slug) = settings.overrides.get(raw_title) {
        return Some(slug.clone());
    }

    let mut name = raw_title.to_string();

    for phrase in &settings.remove_phrases {
        name = name.replace(phrase.as_str(), "");
    }
    for ch in &settings.remove_chars {
        name = name.replace(*ch, "");
    }

    name = name.to_lowercase().trim().to_string();

    for (find, replace) in &settings.replacers {
        name = name.replace(find.as_str(), replace.as_str());
    }

    Some(name)
}
