//! Name normalization for shared lookup rows.

/// Upper-cases the first letter of every word and lower-cases the rest.
///
/// A word starts after any character that is neither alphanumeric nor an apostrophe,
/// so `"smart-phones"` becomes `"Smart-Phones"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;

    for c in input.trim().chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = !(c.is_alphanumeric() || c == '\'');
    }

    out
}

/// URL-safe slug: lower-case ASCII alphanumerics joined by single dashes.
///
/// Accented Latin letters are folded to their ASCII base; any other character
/// that is not a separator is dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    let mut buf = [0u8; 4];

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            let lowered = c.to_ascii_lowercase().encode_utf8(&mut buf);
            push_word(&mut slug, &mut pending_dash, lowered);
        } else if let Some(folded) = fold_latin(c) {
            push_word(&mut slug, &mut pending_dash, folded);
        } else if c == '@' {
            pending_dash = true;
            push_word(&mut slug, &mut pending_dash, "at");
            pending_dash = true;
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

fn push_word(slug: &mut String, pending_dash: &mut bool, word: &str) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push_str(word);
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à'..='å' | 'À'..='Å' | 'ā' | 'Ā' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' | 'č' | 'Č' => "c",
        'è'..='ë' | 'È'..='Ë' | 'ē' | 'Ē' | 'ę' | 'Ę' => "e",
        'ì'..='ï' | 'Ì'..='Ï' => "i",
        'ł' | 'Ł' => "l",
        'ñ' | 'Ñ' | 'ń' | 'Ń' => "n",
        'ò'..='ö' | 'ø' | 'Ò'..='Ö' | 'Ø' | 'ő' | 'Ő' => "o",
        'œ' | 'Œ' => "oe",
        'ś' | 'Ś' | 'š' | 'Š' => "s",
        'ß' => "ss",
        'ù'..='ü' | 'Ù'..='Ü' | 'ű' | 'Ű' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ź' | 'ż' | 'ž' | 'Ź' | 'Ż' | 'Ž' => "z",
        _ => return None,
    };
    Some(folded)
}
