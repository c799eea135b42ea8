//! Transliteration of field and table names to plain Latin identifiers.

use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_]+").expect("Hardcode regex pattern"));

/// Stateless text transliteration service.
pub trait Transliterate: Send + Sync {
    fn transliterate(&self, text: &str) -> String;
}

/// Russian Cyrillic to Latin, following the BGN/PCGN romanization reduced to ASCII.
///
/// `е` is written `ye` at the start of a word and after vowels, `й`, `ъ` and `ь`;
/// the hard and soft signs themselves are dropped.
#[derive(Copy, Clone, Debug, Default)]
pub struct RussianLatin;

impl RussianLatin {
    fn latin(character: char, previous: Option<char>) -> Option<&'static str> {
        let lower = character.to_lowercase().next().unwrap_or(character);
        let latin = match lower {
            'а' => "a",
            'б' => "b",
            'в' => "v",
            'г' => "g",
            'д' => "d",
            'е' if Self::iotates(previous) => "ye",
            'е' => "e",
            'ё' if Self::iotates(previous) => "yo",
            'ё' => "e",
            'ж' => "zh",
            'з' => "z",
            'и' => "i",
            'й' => "y",
            'к' => "k",
            'л' => "l",
            'м' => "m",
            'н' => "n",
            'о' => "o",
            'п' => "p",
            'р' => "r",
            'с' => "s",
            'т' => "t",
            'у' => "u",
            'ф' => "f",
            'х' => "kh",
            'ц' => "ts",
            'ч' => "ch",
            'ш' => "sh",
            'щ' => "shch",
            'ъ' | 'ь' => "",
            'ы' => "y",
            'э' => "e",
            'ю' => "yu",
            'я' => "ya",
            _ => return None,
        };
        Some(latin)
    }

    /// `е`/`ё` take a leading `y` at word start and after vowels, `й`, `ъ`, `ь`.
    fn iotates(previous: Option<char>) -> bool {
        match previous.map(|it| it.to_lowercase().next().unwrap_or(it)) {
            None => true,
            Some(character) => !character.is_alphabetic()
                || "аеёиоуыэюяйъь".contains(character),
        }
    }
}

impl Transliterate for RussianLatin {
    fn transliterate(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut previous: Option<char> = None;
        let mut characters = text.chars().peekable();
        while let Some(character) = characters.next() {
            match Self::latin(character, previous) {
                Some(latin) if character.is_uppercase() => {
                    // Digraphs stay title case inside mixed-case words and upper case in upper-case words
                    let next_is_upper = characters.peek().map(|it| it.is_uppercase()).unwrap_or(false);
                    let previous_is_upper = previous.map(|it| it.is_uppercase()).unwrap_or(false);
                    let mut letters = latin.chars();
                    if let Some(first) = letters.next() {
                        result.extend(first.to_uppercase());
                        if next_is_upper || previous_is_upper {
                            result.extend(letters.flat_map(char::to_uppercase));
                        } else {
                            result.extend(letters);
                        }
                    }
                }
                Some(latin) => result.push_str(latin),
                None => result.push(character),
            }
            previous = Some(character);
        }
        result
    }
}

/// Trims a name and collapses every run of non-word characters to one underscore.
pub fn sanitize(name: &str) -> String {
    NON_WORD.replace_all(name.trim(), "_").into_owned()
}

/// Builds a field name from header text: transliterate, trim, collapse non-word runs.
pub fn field_name(transliterator: &dyn Transliterate, text: &str) -> String {
    sanitize(&transliterator.transliterate(text))
}
