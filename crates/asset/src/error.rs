//! Error types for OBJ loading and mesh validation.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which attribute table a face reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexKind::Position => "position",
            IndexKind::TexCoord => "texcoord",
            IndexKind::Normal => "normal",
        })
    }
}

/// Fatal OBJ loading failures. Any of these aborts the parse; no partial mesh.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("Failed to open OBJ file: {}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read OBJ file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read OBJ stream")]
    Stream(#[source] io::Error),
    /// `line` is 1-based.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("OBJ {kind} index {raw} out of range (len={len}) on line {line}")]
    IndexOutOfRange {
        line: usize,
        kind: IndexKind,
        raw: i64,
        len: usize,
    },
}

impl ObjError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ObjError::Parse {
            line,
            message: message.into(),
        }
    }

    /// 1-based source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ObjError::Parse { line, .. } | ObjError::IndexOutOfRange { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Broken [`crate::Mesh`] invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("Index count {0} is not a multiple of 3")]
    NotTriangleList(usize),
    #[error("Index {index} at position {at} exceeds vertex count {vertex_count}")]
    IndexOutOfBounds {
        at: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Channel '{channel}' has {len} entries, expected {expected}")]
    ChannelLength {
        channel: &'static str,
        len: usize,
        expected: usize,
    },
}
