use alloc::borrow::Cow;
use alloc::borrow::ToOwned;
use alloc::string::String;
use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use common_types::ProofError;

/// JSON Pointer.
///
/// See: <https://datatracker.ietf.org/doc/html/rfc6901>
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct JsonPointer(str);

impl JsonPointer {
    pub fn new(s: &str) -> Result<&Self, ProofError> {
        Self::validate(s)?;
        // Safety: validated above.
        Ok(unsafe { Self::new_unchecked(s) })
    }

    /// # Safety
    ///
    /// The input string *must* be a valid JSON pointer.
    pub unsafe fn new_unchecked(s: &str) -> &Self {
        core::mem::transmute(s)
    }

    fn validate(s: &str) -> Result<(), ProofError> {
        let escapes_ok = || {
            let mut chars = s.chars();
            core::iter::from_fn(move || {
                Some(chars.next()? != '~' || matches!(chars.next(), Some('0' | '1')))
            })
            .all(core::convert::identity)
        };
        if s.is_empty() || s.starts_with('/') && escapes_ok() {
            Ok(())
        } else {
            Err(ProofError::MalformedInput(format!(
                "invalid JSON pointer {s:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty pointer refers to the whole document.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> JsonPointerIter {
        let mut tokens = self.0.split('/');
        // leading empty segment before the first '/'
        tokens.next();
        JsonPointerIter(tokens)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'a> IntoIterator for &'a JsonPointer {
    type Item = &'a ReferenceToken;
    type IntoIter = JsonPointerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct JsonPointerIter<'a>(core::str::Split<'a, char>);

impl<'a> Iterator for JsonPointerIter<'a> {
    type Item = &'a ReferenceToken;

    fn next(&mut self) -> Option<Self::Item> {
        // Safety: segments of a validated pointer are valid reference tokens.
        self.0
            .next()
            .map(|s| unsafe { ReferenceToken::new_unchecked(s) })
    }
}

/// Owned JSON pointer. Mandatory and selective pointers travel in this form, including inside
/// base proofs, where they serialize as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPointerBuf(String);

impl JsonPointerBuf {
    pub fn new(value: String) -> Result<Self, ProofError> {
        JsonPointer::validate(&value)?;
        Ok(Self(value))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for JsonPointerBuf {
    type Target = JsonPointer;

    fn deref(&self) -> &Self::Target {
        // Safety: validated on construction.
        unsafe { JsonPointer::new_unchecked(&self.0) }
    }
}

impl FromStr for JsonPointerBuf {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for JsonPointerBuf {
    type Error = ProofError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for JsonPointerBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for JsonPointerBuf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for JsonPointerBuf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JsonPointerBuf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Parses a list of pointer strings.
pub fn parse_pointers<I, S>(pointers: I) -> Result<alloc::vec::Vec<JsonPointerBuf>, ProofError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    pointers
        .into_iter()
        .map(|p| JsonPointerBuf::new(p.into()))
        .collect()
}

#[derive(Debug)]
#[repr(transparent)]
pub struct ReferenceToken(str);

impl ReferenceToken {
    /// # Safety
    ///
    /// The input string *must* be a valid JSON pointer reference token.
    pub unsafe fn new_unchecked(s: &str) -> &Self {
        core::mem::transmute(s)
    }

    pub fn is_escaped(&self) -> bool {
        self.0.contains('~')
    }

    pub fn to_str(&self) -> Cow<str> {
        if self.is_escaped() {
            Cow::Owned(self.0.replace("~1", "/").replace("~0", "~"))
        } else {
            Cow::Borrowed(&self.0)
        }
    }

    /// Array indexes must be written in their plain decimal form: no sign, no leading zeros and
    /// no `-`.
    pub fn as_array_index(&self) -> Option<usize> {
        common_types::strict_uint(&self.0)
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
