use glue_key_path::KeyPathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlueError {
    #[error(transparent)]
    Path(#[from] KeyPathError),
    #[error("mutation nested {depth} levels deep inside listener callbacks")]
    ReentrancyLimit { depth: usize },
}

impl GlueError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, GlueError::Path(KeyPathError::InvalidSyntax { .. }))
    }

    pub fn is_missing_node(&self) -> bool {
        matches!(self, GlueError::Path(KeyPathError::MissingIntermediateNode { .. }))
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, GlueError::Path(KeyPathError::TypeMismatch { .. }))
    }
}
