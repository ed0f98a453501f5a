//! Slug normalization matching the site's routing.
//!
//! A slug is either an explicit `slug:` front matter value or the post's path
//! relative to the content root with the extension removed. Each piece is
//! stripped of punctuation, hyphenated and lowercased. A fixed set of symbols
//! is spelled out as words (`&` becomes `and`), letters from Latin, Greek,
//! Cyrillic and Georgian scripts are transliterated to ASCII, and anything
//! else (CJK, emoji, other punctuation) is dropped.

use std::path::{Component, Path};

/// Symbols that are written out as words instead of being dropped.
const SYMBOL_WORDS: &[(char, &str)] = &[
    ('$', "dollar"),
    ('%', "percent"),
    ('&', "and"),
    ('<', "less"),
    ('>', "greater"),
    ('|', "or"),
    ('¢', "cent"),
    ('£', "pound"),
    ('¤', "currency"),
    ('¥', "yen"),
    ('©', "c"),
    ('ª', "a"),
    ('®', "r"),
    ('º', "o"),
    ('€', "euro"),
    ('₢', "cruzeiro"),
    ('₣', "french franc"),
    ('₤', "lira"),
    ('₥', "mill"),
    ('₦', "naira"),
    ('₧', "peseta"),
    ('₨', "rupee"),
    ('₩', "won"),
    ('₪', "new shequel"),
    ('₫', "dong"),
    ('₭', "kip"),
    ('₮', "tugrik"),
    ('₯', "drachma"),
    ('₰', "penny"),
    ('₱', "peso"),
    ('₲', "guarani"),
    ('₳', "austral"),
    ('₴', "hryvnia"),
    ('₵', "cedi"),
    ('₸', "kazakhstani tenge"),
    ('₹', "indian rupee"),
    ('₽', "russian ruble"),
    ('₿', "bitcoin"),
    ('℠', "sm"),
    ('™', "tm"),
    ('∂', "d"),
    ('∆', "delta"),
    ('∑', "sum"),
    ('∞', "infinity"),
    ('♥', "love"),
    ('元', "yuan"),
    ('円', "yen"),
    ('﷼', "rial"),
];

fn symbol_word(ch: char) -> Option<&'static str> {
    SYMBOL_WORDS
        .iter()
        .find(|(symbol, _)| *symbol == ch)
        .map(|(_, word)| *word)
}

/// Letters from scripts that get an ASCII spelling. `×` and `÷` sit inside
/// the Latin-1 block but are operators, not letters.
fn is_transliterated(ch: char) -> bool {
    matches!(
        ch as u32,
        0x00C0..=0x00D6
            | 0x00D8..=0x00F6
            | 0x00F8..=0x024F
            | 0x0370..=0x03FF
            | 0x0400..=0x04FF
            | 0x10A0..=0x10FF
            | 0x1E00..=0x1EFF
    )
}

struct SlugBuilder {
    out: String,
    pending_separator: bool,
}

impl SlugBuilder {
    fn push_str(&mut self, piece: &str) {
        for ch in piece.chars() {
            self.push(ch);
        }
    }

    fn push(&mut self, ch: char) {
        if ch.is_ascii_alphanumeric() {
            if self.pending_separator && !self.out.is_empty() {
                self.out.push('-');
            }
            self.pending_separator = false;
            self.out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch.is_whitespace() {
            self.pending_separator = true;
        }
    }
}

/// Normalizes a single string into a URL-safe slug.
///
/// Whitespace and `-` separate words; any other character is spelled out,
/// transliterated or dropped. Separator runs collapse to one `-` and never
/// lead or trail. Applying it twice gives the same result as applying it once.
pub fn slugify(value: &str) -> String {
    let mut slug = SlugBuilder {
        out: String::with_capacity(value.len()),
        pending_separator: false,
    };

    for ch in value.chars() {
        if let Some(word) = symbol_word(ch) {
            slug.push_str(word);
        } else if ch.is_ascii() || ch.is_whitespace() {
            slug.push(ch);
        } else if is_transliterated(ch) {
            slug.push_str(deunicode::deunicode_char(ch).unwrap_or(""));
        }
    }

    slug.out
}

/// Derives a slug from a file path under `content_root`.
///
/// The final extension is removed and each directory segment is slugified on
/// its own, then rejoined with `/` whatever the host separator.
pub fn slug_from_path(content_root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(content_root).unwrap_or(file);
    let without_ext = relative.with_extension("");

    without_ext
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(slugify(&segment.to_string_lossy())),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves the slug for a post: the explicit override wins, otherwise the path.
pub fn resolve_slug(content_root: &Path, file: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(slug) if !slug.is_empty() => slugify(slug),
        _ => slug_from_path(content_root, file),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_slug, slug_from_path, slugify};
    use std::path::Path;

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(slugify("My Post!"), "my-post");
        assert_eq!(slugify("Hello, World: Part 2"), "hello-world-part-2");
        assert_eq!(slugify("snake_case_name"), "snakecasename");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("  a -- b\t\tc  "), "a-b-c");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn transliterates_unicode() {
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("Åland Ørsted"), "aland-orsted");
    }

    #[test]
    fn spells_out_symbols() {
        assert_eq!(slugify("Q&A"), "qanda");
        assert_eq!(slugify("Tips & Tricks"), "tips-and-tricks");
        assert_eq!(slugify("100% Rust"), "100percent-rust");
        assert_eq!(slugify("I ♥ Rust"), "i-love-rust");
        assert_eq!(slugify("Price in €"), "price-in-euro");
        assert_eq!(slugify("a < b | c > d"), "a-less-b-or-c-greater-d");
    }

    #[test]
    fn drops_unmapped_scripts_and_emoji() {
        assert_eq!(slugify("你好"), "");
        assert_eq!(slugify("Hello 世界"), "hello");
        assert_eq!(slugify("🚀 Launch"), "launch");
        assert_eq!(slugify("2 × 3"), "2-3");
    }

    #[test]
    fn transliterates_cyrillic_and_extended_latin() {
        assert_eq!(slugify("Привет"), "privet");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn is_idempotent() {
        for input in ["My Post!", "Crème Brûlée", "already-a-slug", " x  y ", "Blog/Nested Path", "Q&A ♥ 你好"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn derives_nested_path_slug() {
        let root = Path::new("src/contents");
        let file = root.join("blog").join("My Post!.md");
        assert_eq!(slug_from_path(root, &file), "blog/my-post");
    }

    #[test]
    fn only_final_extension_is_removed() {
        let root = Path::new("content");
        let file = root.join("Release v1.2.md");
        assert_eq!(slug_from_path(root, &file), "release-v12");
    }

    #[test]
    fn explicit_slug_overrides_path() {
        let root = Path::new("content");
        let file = root.join("blog").join("ignored.md");
        assert_eq!(resolve_slug(root, &file, Some("Custom Slug")), "custom-slug");
        assert_eq!(resolve_slug(root, &file, Some("nested/slug")), "nestedslug");
        assert_eq!(resolve_slug(root, &file, Some("")), "blog/ignored");
        assert_eq!(resolve_slug(root, &file, None), "blog/ignored");
    }
}
