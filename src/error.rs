use std::collections::HashSet;
use std::fmt;

/// The type of error that can occur when building a grammar graph or
/// resolving generated symbols against a word list.
#[derive(Debug, PartialEq)]
pub struct Error(pub(crate) ErrorRepr);

impl std::error::Error for Error {}

#[derive(Debug, PartialEq)]
pub(crate) enum ErrorRepr {
    EmptyGrammar,
    MissingDelimiter(String),
    EmptyExpression(String),
    BadProbability(String),
    MissingOperand(String),
    BranchRoot(String),
    DuplicateSymbols(HashSet<String>),
    Words(String),
    EmptyWordList(String),
    MissingWords(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ErrorRepr::EmptyGrammar => write!(f, "no grammar rules supplied"),
            ErrorRepr::MissingDelimiter(l) => write!(f, "rule line without `=`: {:?}", l),
            ErrorRepr::EmptyExpression(s) => write!(f, "rule `{}` has an empty expression", s),
            ErrorRepr::BadProbability(t) => write!(f, "not a probability in [0, 1]: {:?}", t),
            ErrorRepr::MissingOperand(op) => write!(f, "missing operand after `{}`", op),
            ErrorRepr::BranchRoot(s) => {
                write!(f, "start rule `{}` must not be a bare `|` or `[` expression", s)
            }
            ErrorRepr::DuplicateSymbols(e) => write!(f, "duplicate rule definitions: {:?}", e),
            ErrorRepr::Words(e) => write!(f, "malformed word list: {}", e),
            ErrorRepr::EmptyWordList(s) => write!(f, "no word candidates for symbol `{}`", s),
            ErrorRepr::MissingWords(s) => write!(f, "word list has no entry for symbol `{}`", s),
        }
    }
}
