//! Target string parsing

use crate::action::Action;
use crate::key::InstanceKey;
use crate::module::ModuleInstance;
use crate::target::ActionTarget;

/// Errors parsing an address string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrParseError {
    /// Nothing to parse
    #[error("address is empty")]
    Empty,

    /// Input ended before the address was complete
    #[error("address ends unexpectedly; expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for
        expected: &'static str,
    },

    /// Character not valid at this position
    #[error("unexpected character '{found}' at offset {offset}; expected {expected}")]
    UnexpectedChar {
        /// Offending character
        found: char,
        /// Byte offset into the input
        offset: usize,
        /// What the parser was looking for
        expected: &'static str,
    },

    /// Traversal segment that cannot start an action address
    #[error("unexpected segment '{0}'; expected \"module\" or \"action\"")]
    UnexpectedSegment(String),

    /// Integer key out of range
    #[error("invalid instance index: {0}")]
    InvalidIndex(String),

    /// Characters left over after a complete address
    #[error("unexpected trailing input: {0}")]
    TrailingInput(String),
}

struct Cursor<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), AddrParseError> {
        match self.bump() {
            Some(ch) if ch == want => Ok(()),
            Some(found) => Err(AddrParseError::UnexpectedChar {
                found,
                offset: self.offset - found.len_utf8(),
                expected,
            }),
            None => Err(AddrParseError::UnexpectedEnd { expected }),
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<&'a str, AddrParseError> {
        let start = self.offset;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
            Some(found) => {
                return Err(AddrParseError::UnexpectedChar {
                    found,
                    offset: start,
                    expected,
                })
            }
            None => return Err(AddrParseError::UnexpectedEnd { expected }),
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.bump();
            } else {
                break;
            }
        }
        let input = self.input;
        Ok(&input[start..self.offset])
    }

    fn optional_key(&mut self) -> Result<InstanceKey, AddrParseError> {
        if self.peek() != Some('[') {
            return Ok(InstanceKey::NoKey);
        }
        self.bump();
        let key = match self.peek() {
            Some('"') => InstanceKey::Str(self.quoted()?),
            Some(ch) if ch.is_ascii_digit() || ch == '-' => InstanceKey::Int(self.integer()?),
            Some(found) => {
                return Err(AddrParseError::UnexpectedChar {
                    found,
                    offset: self.offset,
                    expected: "an integer or quoted string key",
                })
            }
            None => {
                return Err(AddrParseError::UnexpectedEnd {
                    expected: "an instance key",
                })
            }
        };
        self.expect(']', "']'")?;
        Ok(key)
    }

    fn quoted(&mut self) -> Result<String, AddrParseError> {
        self.expect('"', "'\"'")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some(ch) => out.push(ch),
                    None => {
                        return Err(AddrParseError::UnexpectedEnd {
                            expected: "an escaped character",
                        })
                    }
                },
                Some(ch) => out.push(ch),
                None => {
                    return Err(AddrParseError::UnexpectedEnd {
                        expected: "closing '\"'",
                    })
                }
            }
        }
    }

    fn integer(&mut self) -> Result<i64, AddrParseError> {
        let start = self.offset;
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.input[start..self.offset];
        text.parse()
            .map_err(|_| AddrParseError::InvalidIndex(text.to_string()))
    }
}

pub(crate) fn parse_target(input: &str) -> Result<ActionTarget, AddrParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AddrParseError::Empty);
    }

    let mut cursor = Cursor::new(input);
    let mut module = ModuleInstance::root();

    loop {
        let segment = cursor.ident("\"module\" or \"action\"")?;
        cursor.expect('.', "'.'")?;
        match segment {
            "module" => {
                let name = cursor.ident("a module name")?;
                let key = cursor.optional_key()?;
                module = module.child(name, key);
                cursor.expect('.', "'.'")?;
            }
            "action" => {
                let type_name = cursor.ident("an action type")?;
                cursor.expect('.', "'.'")?;
                let name = cursor.ident("an action name")?;
                let has_key = cursor.peek() == Some('[');
                let key = cursor.optional_key()?;
                if !cursor.at_end() {
                    return Err(AddrParseError::TrailingInput(
                        input[cursor.offset..].to_string(),
                    ));
                }
                let action = Action::new(type_name, name).absolute(&module);
                return Ok(if has_key {
                    ActionTarget::Instance(action.instance(key))
                } else {
                    ActionTarget::Action(action)
                });
            }
            other => return Err(AddrParseError::UnexpectedSegment(other.to_string())),
        }
    }
}
