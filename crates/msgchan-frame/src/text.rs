use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Text encoding assumed for message bodies.
///
/// `Binary` is accepted as a configuration value but has no text mapping:
/// encoding any body with it is a contract error and decoding a non-empty
/// body with it is a framing error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextCodec {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Binary,
}

impl TextCodec {
    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
            Self::Binary => "binary",
        }
    }

    /// Encode `text` into `dst`.
    pub fn encode_into(self, text: &str, dst: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Utf8 => dst.extend_from_slice(text.as_bytes()),
            Self::Ascii => {
                if !text.is_ascii() {
                    return Err(FrameError::contract("text is not representable in ascii"));
                }
                dst.extend_from_slice(text.as_bytes());
            }
            Self::Latin1 => {
                dst.reserve(text.len());
                for ch in text.chars() {
                    let code = u32::from(ch);
                    if code > 0xFF {
                        return Err(FrameError::contract(
                            "text is not representable in latin-1",
                        ));
                    }
                    dst.push(code as u8);
                }
            }
            Self::Binary => {
                return Err(FrameError::contract(
                    "binary codec has no text mapping",
                ))
            }
        }
        Ok(())
    }

    /// Decode a frame body into text.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| FrameError::malformed("invalid text in body")),
            Self::Ascii => {
                if !bytes.is_ascii() {
                    return Err(FrameError::malformed("invalid text in body"));
                }
                // ASCII is a subset of UTF-8.
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Binary => Err(FrameError::malformed(
                "binary codec cannot decode a text body",
            )),
        }
    }
}

impl FromStr for TextCodec {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "binary" => Ok(Self::Binary),
            other => Err(FrameError::contract(format!("unknown text codec {other:?}"))),
        }
    }
}

impl fmt::Display for TextCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
