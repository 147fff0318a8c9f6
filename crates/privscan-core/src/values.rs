use crate::block::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Automatic object allocated in `block`.
    Alloca { block: BlockId },
    Global,
    Argument,
    /// Pointer obtained by reading `location`.
    Load { location: MemoryLocation },
    CallResult,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    pub name: String,
    pub kind: ValueKind,
    pub source: Option<SourceLocation>,
}

impl Value {
    pub fn new(id: ValueId, name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            source: None,
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    /// Automatic or global object, i.e. storage whose lifetime the loop does not control.
    pub fn is_object(&self) -> bool {
        matches!(self.kind, ValueKind::Alloca { .. } | ValueKind::Global)
    }

    pub fn loaded_from(&self) -> Option<&MemoryLocation> {
        match &self.kind {
            ValueKind::Load { location } => Some(location),
            _ => None,
        }
    }
}

/// A pointer plus the number of bytes accessed through it. `size == None` means the extent is
/// not statically known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryLocation {
    pub ptr: ValueId,
    pub size: Option<u64>,
}

impl MemoryLocation {
    pub fn new(ptr: ValueId, size: Option<u64>) -> Self {
        Self { ptr, size }
    }

    pub fn sized(ptr: ValueId, size: u64) -> Self {
        Self {
            ptr,
            size: Some(size),
        }
    }

    pub fn unknown_size(ptr: ValueId) -> Self {
        Self { ptr, size: None }
    }

    /// Whether this location spans at least the bytes of `other`. Both must start at the same
    /// pointer; an unknown size covers everything.
    pub fn covers(&self, other: &MemoryLocation) -> bool {
        if self.ptr != other.ptr {
            return false;
        }
        match (self.size, other.size) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => mine >= theirs,
        }
    }
}

impl std::fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.size {
            Some(size) => write!(f, "{}:{}", self.ptr, size),
            None => write!(f, "{}:?", self.ptr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Parses `file:line:column`. The file part may itself contain colons.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.rsplitn(3, ':');
        let column = parts.next()?.parse().ok()?;
        let line = parts.next()?.parse().ok()?;
        let file = parts.next()?;
        Some(Self::new(file, line, column))
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_cover() {
        let whole = MemoryLocation::sized(ValueId(0), 16);
        let part = MemoryLocation::sized(ValueId(0), 4);
        let other = MemoryLocation::sized(ValueId(1), 4);

        assert!(whole.covers(&part));
        assert!(!part.covers(&whole));
        assert!(!whole.covers(&other));
        assert!(MemoryLocation::unknown_size(ValueId(0)).covers(&whole));
        assert!(!whole.covers(&MemoryLocation::unknown_size(ValueId(0))));
    }

    #[test]
    fn test_source_location_parse() {
        let loc = SourceLocation::parse("dir/test.c:12:5").unwrap();
        assert_eq!(loc.file, "dir/test.c");
        assert_eq!(loc.line, 12);
        assert_eq!(loc.column, 5);
        assert_eq!(loc.to_string(), "dir/test.c:12:5");

        assert!(SourceLocation::parse("test.c").is_none());
    }
}
