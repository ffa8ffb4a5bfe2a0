//! Charsets supported for subjects and bodies

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Longest encoded word allowed by RFC 2047
const MAX_ENCODED_WORD_LEN: usize = 75;

/// Errors that can occur when encoding text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CharsetError {
    /// The charset name is not recognised
    #[error("unsupported charset \"{0}\"")]
    Unsupported(String),

    /// A character has no representation in the charset
    #[error("character {character:?} cannot be encoded as {charset}")]
    Unmappable {
        /// The offending character
        character: char,

        /// Canonical name of the charset
        charset: &'static str,
    },
}

/// A charset that subjects and bodies can be encoded with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8
    Utf8,

    /// 7-bit ASCII
    UsAscii,

    /// Latin-1
    Iso8859_1,
}

impl Charset {
    /// The canonical name written in `Content-Type` and encoded words
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Encodes `text` into bytes of this charset.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, CharsetError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::UsAscii => self.encode_single_byte(text, 0x7f),
            Self::Iso8859_1 => self.encode_single_byte(text, 0xff),
        }
    }

    fn encode_single_byte(&self, text: &str, max: u32) -> Result<Vec<u8>, CharsetError> {
        text.chars()
            .map(|character| {
                u8::try_from(u32::from(character))
                    .ok()
                    .filter(|byte| u32::from(*byte) <= max)
                    .ok_or(CharsetError::Unmappable {
                        character,
                        charset: self.name(),
                    })
            })
            .collect()
    }

    /// Encodes a header value as RFC 2047 `B` encoded words.
    ///
    /// Printable ASCII text is returned unchanged. Otherwise the text is split
    /// on character boundaries into words no longer than 75 characters,
    /// separated by a single space.
    pub fn encode_words(&self, text: &str) -> Result<String, CharsetError> {
        if is_plain(text) {
            return Ok(text.to_string());
        }

        let overhead = "=?".len() + self.name().len() + "?B?".len() + "?=".len();
        let max_bytes = (MAX_ENCODED_WORD_LEN - overhead) / 4 * 3;

        let mut words = Vec::new();
        let mut chunk = Vec::new();
        let mut buf = [0u8; 4];

        for character in text.chars() {
            let encoded = self.encode(character.encode_utf8(&mut buf))?;

            if !chunk.is_empty() && chunk.len() + encoded.len() > max_bytes {
                words.push(self.encoded_word(&chunk));
                chunk.clear();
            }

            chunk.extend(encoded);
        }

        if !chunk.is_empty() {
            words.push(self.encoded_word(&chunk));
        }

        Ok(words.join(" "))
    }

    fn encoded_word(&self, bytes: &[u8]) -> String {
        format!("=?{}?B?{}?=", self.name(), STANDARD.encode(bytes))
    }
}

fn is_plain(text: &str) -> bool {
    !text.contains("=?") && text.chars().all(|c| c == ' ' || c.is_ascii_graphic())
}

impl FromStr for Charset {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "us-ascii" | "ascii" => Ok(Self::UsAscii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" => Ok(Self::Iso8859_1),
            _ => Err(CharsetError::Unsupported(s.to_string())),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_parse_aliases() -> TestResult {
        assert_eq!("UTF-8".parse::<Charset>()?, Charset::Utf8);
        assert_eq!("utf8".parse::<Charset>()?, Charset::Utf8);
        assert_eq!("ascii".parse::<Charset>()?, Charset::UsAscii);
        assert_eq!("Latin1".parse::<Charset>()?, Charset::Iso8859_1);
        assert_eq!("iso-8859-1".parse::<Charset>()?, Charset::Iso8859_1);

        Ok(())
    }

    #[test]
    fn test_parse_unsupported() {
        assert_eq!(
            "EBCDIC".parse::<Charset>(),
            Err(CharsetError::Unsupported("EBCDIC".to_string()))
        );
    }

    #[test]
    fn test_encode_latin1() -> TestResult {
        assert_eq!(Charset::Iso8859_1.encode("Olá")?, vec![0x4f, 0x6c, 0xe1]);

        Ok(())
    }

    #[test]
    fn test_unmappable_character() {
        assert_eq!(
            Charset::UsAscii.encode("Olá"),
            Err(CharsetError::Unmappable {
                character: 'á',
                charset: "US-ASCII"
            })
        );
        assert!(Charset::Iso8859_1.encode("€").is_err());
    }

    #[test]
    fn test_plain_subject_is_not_encoded() -> TestResult {
        assert_eq!(Charset::Utf8.encode_words("Hello world")?, "Hello world");

        Ok(())
    }

    #[test]
    fn test_encoded_words() -> TestResult {
        assert_eq!(Charset::Iso8859_1.encode_words("Olá")?, "=?ISO-8859-1?B?T2zh?=");
        assert_eq!(Charset::Utf8.encode_words("Olá")?, "=?UTF-8?B?T2zDoQ==?=");

        Ok(())
    }

    #[test]
    fn test_long_subject_is_split_on_character_boundaries() -> TestResult {
        let subject = "ü".repeat(40);
        let encoded = Charset::Utf8.encode_words(&subject)?;

        let words: Vec<&str> = encoded.split(' ').collect();

        assert!(words.len() > 1);
        assert!(words.iter().all(|word| word.len() <= MAX_ENCODED_WORD_LEN));

        let decoded = words
            .iter()
            .map(|word| -> Result<String, Box<dyn std::error::Error>> {
                let payload = word
                    .strip_prefix("=?UTF-8?B?")
                    .and_then(|w| w.strip_suffix("?="))
                    .ok_or("malformed encoded word")?;
                let bytes = STANDARD.decode(payload)?;
                Ok(String::from_utf8(bytes)?)
            })
            .collect::<Result<String, Box<dyn std::error::Error>>>()?;

        assert_eq!(decoded, subject);

        Ok(())
    }
}
