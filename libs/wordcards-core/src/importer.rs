//! Dictionary file import.
//!
//! Uploads are dispatched on the file extension. XML card lists are parsed
//! here; tabular formats are recognized but rejected until a parser exists
//! for them. The expected XML shape is a root element with an optional
//! `title` attribute containing `card` elements, each holding a `word`
//! element, `translations` elements with a nested `word`, and `example`
//! elements. Missing fields stay empty, repeated fields keep the last value.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ImportError, Result};
use crate::types::{ParsedDictionary, WordEntry};

/// Title given to dictionaries uploaded without one.
pub const DEFAULT_TITLE: &str = "Untitled";

type ParseFn = fn(&[u8]) -> Result<ParsedDictionary>;

/// Parse an uploaded dictionary file.
///
/// The parser is chosen from the filename's extension; unknown extensions
/// fail with [`ImportError::UnsupportedFormat`] before any content is read.
pub fn import(bytes: &[u8], filename: &str) -> Result<ParsedDictionary> {
    let extension = extension_of(filename);
    match parser_for(&extension) {
        Some(parse) => parse(bytes),
        None => Err(ImportError::UnsupportedFormat { extension }),
    }
}

fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn parser_for(extension: &str) -> Option<ParseFn> {
    match extension {
        "xml" => Some(parse_xml),
        "csv" => Some(parse_csv),
        _ => None,
    }
}

/// Tabular uploads are recognized but have no parser yet, so they fail the
/// same way an unknown extension does.
fn parse_csv(_bytes: &[u8]) -> Result<ParsedDictionary> {
    Err(ImportError::UnsupportedFormat {
        extension: "csv".to_string(),
    })
}

/// Accumulates one card's fields. A fresh draft is created for every card
/// element, so values never leak from a previous card.
#[derive(Default)]
struct CardDraft {
    body: String,
    translations: String,
    example: String,
}

impl CardDraft {
    fn into_entry(self) -> WordEntry {
        WordEntry {
            slug: slug::slugify(&self.body),
            body: self.body,
            translations: self.translations,
            example: self.example,
        }
    }
}

/// Which card field the current text content belongs to.
#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Body,
    Translations,
    Example,
}

fn parse_xml(bytes: &[u8]) -> Result<ParsedDictionary> {
    let text = std::str::from_utf8(bytes).map_err(|_| ImportError::Malformed {
        reason: "content is not valid UTF-8".to_string(),
    })?;

    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = true;

    let mut title: Option<String> = None;
    let mut root_seen = false;
    let mut words: Vec<WordEntry> = Vec::new();

    let mut depth = 0usize;
    let mut card: Option<CardDraft> = None;
    let mut card_depth = 0usize;
    let mut in_translations = false;
    let mut target = TextTarget::None;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(ImportError::Malformed {
                    reason: e.to_string(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.name();
                let name = name.as_ref();

                if depth == 1 {
                    if !root_seen {
                        root_seen = true;
                        title = root_title(&e)?;
                    }
                } else if card.is_none() {
                    // cards may sit at any depth below the root
                    if name == b"card" {
                        card = Some(CardDraft::default());
                        card_depth = depth;
                        in_translations = false;
                        target = TextTarget::None;
                    }
                } else if let Some(draft) = card.as_mut() {
                    if in_translations {
                        if name == b"word" {
                            // repeated fields keep only the last value
                            draft.translations.clear();
                            target = TextTarget::Translations;
                        }
                    } else if depth == card_depth + 1 {
                        match name {
                            b"word" => {
                                draft.body.clear();
                                target = TextTarget::Body;
                            }
                            b"translations" => {
                                in_translations = true;
                                target = TextTarget::None;
                            }
                            b"example" => {
                                draft.example.clear();
                                target = TextTarget::Example;
                            }
                            _ => target = TextTarget::None,
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();

                if card.is_some() && depth == card_depth && name == b"card" {
                    if let Some(draft) = card.take() {
                        words.push(draft.into_entry());
                    }
                    in_translations = false;
                } else if in_translations && name == b"translations" {
                    in_translations = false;
                }
                if target != TextTarget::None && matches!(name, b"word" | b"example") {
                    target = TextTarget::None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ImportError::Malformed {
                    reason: e.to_string(),
                })?;
                if let Some(draft) = card.as_mut() {
                    match target {
                        TextTarget::Body => draft.body.push_str(&text),
                        TextTarget::Translations => draft.translations.push_str(&text),
                        TextTarget::Example => draft.example.push_str(&text),
                        TextTarget::None => {}
                    }
                }
            }
            Ok(_) => {}
        }
    }

    if !root_seen || depth != 0 {
        return Err(ImportError::Malformed {
            reason: "document is not well-formed".to_string(),
        });
    }
    if words.is_empty() {
        return Err(ImportError::Malformed {
            reason: "dictionary contains no cards".to_string(),
        });
    }

    let title = match title {
        Some(t) if !t.is_empty() => t,
        _ => DEFAULT_TITLE.to_string(),
    };

    Ok(ParsedDictionary {
        slug: slug::slugify(&title),
        title,
        words,
    })
}

fn root_title(root: &BytesStart) -> Result<Option<String>> {
    let attr = root
        .try_get_attribute("title")
        .map_err(|e| ImportError::Malformed {
            reason: e.to_string(),
        })?;
    match attr {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|e| ImportError::Malformed {
                reason: e.to_string(),
            })?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(body: &str, translations: &str, example: &str) -> String {
        format!(
            "<card><word>{}</word><translations><word>{}</word></translations><example>{}</example></card>",
            body, translations, example
        )
    }

    fn dictionary(title: Option<&str>, cards: &str) -> String {
        match title {
            Some(t) => format!("<dictionary title=\"{}\">{}</dictionary>", t, cards),
            None => format!("<dictionary>{}</dictionary>", cards),
        }
    }

    fn import_xml(content: &str) -> Result<ParsedDictionary> {
        import(content.as_bytes(), "upload.xml")
    }

    #[test]
    fn test_parse_full_dictionary() {
        let cards = [
            card("hello", "привет, здравствуйте", "hello there!"),
            card("world", "мир", ""),
        ]
        .concat();
        let parsed = import_xml(&dictionary(Some("Test 2022.07.13"), &cards)).unwrap();

        assert_eq!(parsed.title, "Test 2022.07.13");
        assert_eq!(parsed.slug, "test-2022-07-13");
        assert_eq!(
            parsed.words,
            vec![
                WordEntry {
                    body: "hello".to_string(),
                    slug: "hello".to_string(),
                    translations: "привет, здравствуйте".to_string(),
                    example: "hello there!".to_string(),
                },
                WordEntry {
                    body: "world".to_string(),
                    slug: "world".to_string(),
                    translations: "мир".to_string(),
                    example: "".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_many_cards() {
        let cards: String = (1..=25)
            .map(|i| card(&format!("word{}", i), &format!("слово{}", i), ""))
            .collect();
        let parsed = import_xml(&dictionary(Some("Big"), &cards)).unwrap();

        assert_eq!(parsed.words.len(), 25);
        assert_eq!(parsed.words[0].body, "word1");
        assert_eq!(parsed.words[24].body, "word25");
    }

    #[test]
    fn test_missing_title_uses_default() {
        let parsed = import_xml(&dictionary(None, &card("a", "b", ""))).unwrap();
        assert_eq!(parsed.title, DEFAULT_TITLE);
        assert_eq!(parsed.slug, "untitled");
    }

    #[test]
    fn test_empty_title_uses_default() {
        let parsed = import_xml(&dictionary(Some(""), &card("a", "b", ""))).unwrap();
        assert_eq!(parsed.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_cyrillic_title_transliterated_in_slug() {
        let parsed = import_xml(&dictionary(Some("Без имени"), &card("привет", "hi", ""))).unwrap();
        assert_eq!(parsed.slug, "bez-imeni");
        assert_eq!(parsed.words[0].slug, "privet");
    }

    #[test]
    fn test_zero_cards_rejected() {
        let err = import_xml("<dictionary title=\"empty\"></dictionary>").unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn test_mismatched_tags_rejected() {
        let err = import_xml("<dictionary><card></dictionary>").unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn test_plain_text_rejected() {
        let err = import_xml("definitely not xml").unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = import(&[0xff, 0xfe, 0x00, 0x01], "upload.xml").unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn test_csv_is_unsupported() {
        let err = import(b"word,translation\n", "upload.csv").unwrap_err();
        match err {
            ImportError::UnsupportedFormat { extension } => assert_eq!(extension, "csv"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = import(b"%PDF-1.4", "words.pdf").unwrap_err();
        match err {
            ImportError::UnsupportedFormat { extension } => assert_eq!(extension, "pdf"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let content = dictionary(Some("t"), &card("a", "b", ""));
        assert!(import(content.as_bytes(), "WORDS.XML").is_ok());
    }

    #[test]
    fn test_missing_fields_stay_empty_per_card() {
        // the second and third cards must not inherit values from the first
        let cards = format!(
            "{}<card><word>solo</word></card><card></card>",
            card("full", "полный", "a full example")
        );
        let parsed = import_xml(&dictionary(Some("t"), &cards)).unwrap();

        assert_eq!(parsed.words.len(), 3);
        assert_eq!(parsed.words[1].body, "solo");
        assert_eq!(parsed.words[1].translations, "");
        assert_eq!(parsed.words[1].example, "");
        assert_eq!(parsed.words[2].body, "");
        assert_eq!(parsed.words[2].translations, "");
        assert_eq!(parsed.words[2].example, "");
    }

    #[test]
    fn test_self_closing_fields() {
        let content =
            dictionary(Some("t"), "<card><word>x</word><translations/><example/></card>");
        let parsed = import_xml(&content).unwrap();
        assert_eq!(parsed.words[0].body, "x");
        assert_eq!(parsed.words[0].translations, "");
    }

    #[test]
    fn test_last_translations_block_wins() {
        let content = dictionary(
            Some("t"),
            "<card><word>x</word>\
             <translations><word>first</word></translations>\
             <translations><word>second</word></translations></card>",
        );
        let parsed = import_xml(&content).unwrap();
        assert_eq!(parsed.words[0].translations, "second");
    }

    #[test]
    fn test_last_example_wins() {
        let content = dictionary(
            Some("t"),
            "<card><word>x</word><example>one</example><example>two</example></card>",
        );
        let parsed = import_xml(&content).unwrap();
        assert_eq!(parsed.words[0].example, "two");
    }

    #[test]
    fn test_cards_nested_below_root_are_found() {
        let content = format!(
            "<dictionary title=\"t\"><theme>{}</theme></dictionary>",
            card("deep", "глубокий", "")
        );
        let parsed = import_xml(&content).unwrap();
        assert_eq!(parsed.words.len(), 1);
        assert_eq!(parsed.words[0].body, "deep");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let content = dictionary(
            Some("R&amp;D"),
            "<card><word>R&amp;D</word><translations><word>&lt;наука&gt;</word></translations></card>",
        );
        let parsed = import_xml(&content).unwrap();
        assert_eq!(parsed.title, "R&D");
        assert_eq!(parsed.words[0].body, "R&D");
        assert_eq!(parsed.words[0].translations, "<наука>");
    }
}
