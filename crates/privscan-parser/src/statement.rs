use crate::errors::{ParseError, Result};
use crate::Rule;
use pest::iterators::Pair;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    Name(String),
    Number(i64),
    Str(String),
    /// `name:size`, with `None` for `name:?`.
    Location { name: String, size: Option<u64> },
    List(Vec<FactValue>),
    /// A bare `?`.
    Unknown,
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Name(name) => write!(f, "{}", name),
            FactValue::Number(value) => write!(f, "{}", value),
            FactValue::Str(text) => write!(f, "\"{}\"", text),
            FactValue::Location { name, size: Some(size) } => write!(f, "{}:{}", name, size),
            FactValue::Location { name, size: None } => write!(f, "{}:?", name),
            FactValue::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FactValue::Unknown => write!(f, "?"),
        }
    }
}

impl FactValue {
    fn from_pair(pair: Pair<'_, Rule>, line: usize) -> Result<Self> {
        match pair.as_rule() {
            Rule::name => Ok(FactValue::Name(pair.as_str().to_string())),
            Rule::number => pair
                .as_str()
                .parse()
                .map(FactValue::Number)
                .map_err(|_| ParseError::semantic(line, format!("number out of range: {}", pair.as_str()))),
            Rule::string => Ok(FactValue::Str(
                pair.into_inner()
                    .next()
                    .map(|text| text.as_str().to_string())
                    .unwrap_or_default(),
            )),
            Rule::location => {
                let mut inner = pair.into_inner();
                let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
                let extent = inner.next().map(|p| p.as_str()).unwrap_or("?");
                let size = match extent {
                    "?" => None,
                    digits => Some(digits.parse().map_err(|_| {
                        ParseError::semantic(line, format!("size out of range: {}", digits))
                    })?),
                };
                Ok(FactValue::Location { name, size })
            }
            Rule::list => pair
                .into_inner()
                .map(|item| FactValue::from_pair(item, line))
                .collect::<Result<Vec<_>>>()
                .map(FactValue::List),
            Rule::unknown => Ok(FactValue::Unknown),
            rule => Err(ParseError::semantic(line, format!("unexpected {:?}", rule))),
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            FactValue::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FactValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// A single value is read as a list of one.
    pub fn items(&self) -> &[FactValue] {
        match self {
            FactValue::List(items) => items,
            single => std::slice::from_ref(single),
        }
    }
}

/// One line of a facts file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub keyword: String,
    pub line: usize,
    pub positional: Vec<FactValue>,
    pub attrs: Vec<(String, FactValue)>,
}

impl Statement {
    pub(crate) fn from_pair(pair: Pair<'_, Rule>) -> Result<Self> {
        let line = pair.as_span().start_pos().line_col().0;
        let mut inner = pair.into_inner();
        let keyword = inner
            .next()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();
        let mut positional = Vec::new();
        let mut attrs = Vec::new();
        for item in inner {
            if item.as_rule() == Rule::attr {
                let mut parts = item.into_inner();
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    return Err(ParseError::semantic(line, "malformed attribute"));
                };
                attrs.push((key.as_str().to_string(), FactValue::from_pair(value, line)?));
            } else {
                positional.push(FactValue::from_pair(item, line)?);
            }
        }
        Ok(Self {
            keyword,
            line,
            positional,
            attrs,
        })
    }

    pub fn attr(&self, key: &str) -> Option<&FactValue> {
        self.attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn positional(&self, index: usize) -> Option<&FactValue> {
        self.positional.get(index)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.positional.iter().any(|value| value.as_name() == Some(flag))
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::semantic(self.line, message)
    }
}
