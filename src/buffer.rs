//! Storage behind an array descriptor.

use crate::trace::VarId;

/// Where the elements of an array live.
///
/// A traced array has no memory at all, only the variable id it was declared
/// under. An executing array either owns its elements or borrows a caller
/// buffer; dropping a borrowed view never frees the caller's memory.
#[derive(Debug)]
pub(crate) enum Storage<'a, T> {
    /// Symbolic placeholder in a traced DAG
    Symbolic(VarId),
    /// Elements allocated and freed by the array
    Owned(Vec<T>),
    /// Caller-owned elements
    Borrowed(&'a mut [T]),
}

impl<T> Storage<'_, T> {
    pub(crate) fn var_id(&self) -> Option<VarId> {
        match self {
            Storage::Symbolic(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn as_slice(&self) -> Option<&[T]> {
        match self {
            Storage::Symbolic(_) => None,
            Storage::Owned(data) => Some(data),
            Storage::Borrowed(data) => Some(data),
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        match self {
            Storage::Symbolic(_) => None,
            Storage::Owned(data) => Some(data),
            Storage::Borrowed(data) => Some(data),
        }
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }
}
