//! Mac-Roman text decoding (§6) for `STR `/`STR#`/`TEXT` resources, plus a
//! parallel RTF-escape table for `styl`-driven rich text output.
//!
//! The first 128 code points match ASCII. Both CR (`0x0D`) and LF (`0x0A`)
//! decode to `\n`: classic Mac OS used CR as its line ending, but callers
//! that already hold LF-delimited text (or that round-trip through a
//! `TEXT` resource written by a tool using either convention) should not
//! see two distinct newline characters come out.

const HIGH_TABLE: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è', 'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û',
    'ü', '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø', '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω',
    'æ', 'ø', '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', ' ', 'À', 'Ã', 'Õ', 'Œ', 'œ', '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹',
    '›', 'ﬁ', 'ﬂ', '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô', '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙',
    '˚', '¸', '˝', '˛', 'ˇ',
];

/// Decode a Mac-Roman byte string to UTF-8.
pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| match byte {
            0x0D | 0x0A => '\n',
            0x00..=0x7F => byte as char,
            high => HIGH_TABLE[(high - 0x80) as usize],
        })
        .collect()
}

/// Encode UTF-8 text back to Mac-Roman, substituting `?` for any character
/// outside the repertoire. `\n` is emitted as CR (`0x0D`), matching classic
/// Mac OS text files.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\n' => 0x0D,
            ch if (ch as u32) < 0x80 => ch as u8,
            ch => HIGH_TABLE.iter().position(|&candidate| candidate == ch).map(|index| 0x80 + index as u8).unwrap_or(b'?'),
        })
        .collect()
}

/// Escape a Mac-Roman-decoded string for embedding in an RTF `\ansicpg`
/// control-word stream: backslash, brace, and non-ASCII characters become
/// `\'xx` hex escapes, everything else passes through.
pub fn to_rtf_escaped(text: &str) -> String {
    let mut out = String::new();

    for ch in text.chars() {
        match ch {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\par\n"),
            ch if ch.is_ascii() => out.push(ch),
            ch => {
                let mut buffer = [0u8; 4];
                for byte in ch.encode_utf8(&mut buffer).as_bytes() {
                    out.push_str(&format!("\\'{byte:02x}"));
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        assert_eq!(decode(b"Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_cr_and_lf_both_decode_to_newline() {
        assert_eq!(decode(b"a\rb\nc"), "a\nb\nc");
    }

    #[test]
    fn test_high_byte_decode() {
        // 0x80 => 'Ä'
        assert_eq!(decode(&[0x80]), "Ä");
    }

    #[test]
    fn test_rtf_escapes_braces_and_backslash() {
        assert_eq!(to_rtf_escaped("a{b}\\c"), "a\\{b\\}\\\\c");
    }
}
