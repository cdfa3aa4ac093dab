//! Field normalization for loosely shaped tabular rows.
//!
//! Source files come from many places and rarely agree on column naming:
//! `Sp. Atk`, `SpAtk`, and `spAttack` all mean the same thing. A [`RawRow`]
//! stores every column under a canonical key (lowercase ASCII alphanumerics),
//! and [`normalize_row`] resolves each catalog field through a prioritized
//! alias list.
//!
//! Normalization is best-effort: malformed numbers fall back to defaults and
//! never reject a row. The only rows that do not produce a draft are those
//! without a usable name or primary type, since every stored entry must carry
//! both.

use crate::models::CatalogDraft;

/// Artwork URL used when a row has no image column.
pub const FALLBACK_IMAGE_TEMPLATE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/{id}.png";

/// Reference video used when a row has no video column.
pub const DEFAULT_YTB_URL: &str = "https://youtu.be/uBYORdr_TY8";

const NAME: &[&str] = &["name"];
const TYPE1: &[&str] = &["type1", "primarytype"];
const TYPE2: &[&str] = &["type2", "secondarytype"];
const TOTAL: &[&str] = &["total"];
const HP: &[&str] = &["hp"];
const ATTACK: &[&str] = &["attack"];
const DEFENSE: &[&str] = &["defense"];
const SP_ATTACK: &[&str] = &["spatk", "spattack", "specialattack"];
const SP_DEFENSE: &[&str] = &["spdef", "spdefense", "specialdefense"];
const SPEED: &[&str] = &["speed"];
const GENERATION: &[&str] = &["generation", "gen"];
const LEGENDARY: &[&str] = &["legendary", "islegendary"];
const IMAGE: &[&str] = &["image", "imageurl"];
const YTB_URL: &[&str] = &["ytburl", "youtubeurl"];
const INDEX: &[&str] = &["#", "id", "number"];

/// One source row, keyed by canonical column name.
///
/// Columns keep their file order so that when two headers collapse to the
/// same canonical key, the leftmost non-empty value wins.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(header, value)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = RawRow::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.fields.push((canonical_key(key), value.to_string()));
    }

    /// First non-empty (trimmed) value among `aliases`, in alias priority order.
    pub fn first(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.fields
                .iter()
                .filter(|(k, _)| k == alias)
                .map(|(_, v)| v.trim())
                .find(|v| !v.is_empty())
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Canonical column key: lowercase ASCII alphanumerics only.
///
/// Headers made entirely of punctuation (such as `#`) keep their trimmed
/// literal so they remain addressable.
pub fn canonical_key(header: &str) -> String {
    let key: String = header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if key.is_empty() {
        header.trim().to_string()
    } else {
        key
    }
}

/// Parse an integer prefix: optional sign followed by digits.
///
/// `"45"`, `" 45 "` and `"45.7"` all yield 45. Returns `None` when no digits
/// lead the value or the number does not fit in an `i64`.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn int_field(row: &RawRow, aliases: &[&str]) -> i64 {
    row.first(aliases).and_then(parse_leading_int).unwrap_or(0)
}

/// Normalize one raw row into a [`CatalogDraft`].
///
/// Returns `None` only when the row has no non-empty name or primary type.
pub fn normalize_row(row: &RawRow) -> Option<CatalogDraft> {
    let name = row.first(NAME)?.to_string();
    let type1 = row.first(TYPE1)?.to_string();
    let type2 = row.first(TYPE2).map(str::to_string);

    let generation = match int_field(row, GENERATION) {
        0 => 1,
        g => g,
    };

    let legendary = row
        .first(LEGENDARY)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let image = match row.first(IMAGE) {
        Some(url) => url.to_string(),
        None => FALLBACK_IMAGE_TEMPLATE.replace("{id}", row.first(INDEX).unwrap_or("1")),
    };

    let ytb_url = row.first(YTB_URL).unwrap_or(DEFAULT_YTB_URL).to_string();

    Some(CatalogDraft {
        name,
        type1,
        type2,
        total: int_field(row, TOTAL),
        hp: int_field(row, HP),
        attack: int_field(row, ATTACK),
        defense: int_field(row, DEFENSE),
        sp_attack: int_field(row, SP_ATTACK),
        sp_defense: int_field(row, SP_DEFENSE),
        speed: int_field(row, SPEED),
        generation,
        legendary,
        image,
        ytb_url,
    })
}
