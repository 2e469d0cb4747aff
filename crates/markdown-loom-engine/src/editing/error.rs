use crate::ast::NodeId;

/// Why an edit did not apply. Both variants leave the document unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The edit does not apply here: an unknown id, or a structural
    /// prerequisite is missing (outdenting a top-level paragraph, say).
    #[error("precondition failed: {0}")]
    Precondition(&'static str),
    /// The tree is not in a shape the operation can have produced.
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

pub type EditResult<T> = Result<T, EditError>;

/// Turns a missing lookup into a precondition failure.
pub trait OrPrecondition<T> {
    fn or_precondition(self, what: &'static str) -> EditResult<T>;
}

impl<T> OrPrecondition<T> for Option<T> {
    fn or_precondition(self, what: &'static str) -> EditResult<T> {
        self.ok_or(EditError::Precondition(what))
    }
}

/// A splice the arena refused: the tree is not what the caller assumed.
pub fn splice_failed(op: &str, id: NodeId) -> EditError {
    EditError::Invariant(format!("{op}: arena rejected splice at block {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_is_a_precondition() {
        let none: Option<u8> = None;
        assert_eq!(none.or_precondition("x"), Err(EditError::Precondition("x")));
        assert_eq!(Some(3).or_precondition("x"), Ok(3));
    }

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(
            EditError::Precondition("unknown inline").to_string(),
            "precondition failed: unknown inline"
        );
        assert!(splice_failed("indent", NodeId(5)).to_string().contains("indent"));
    }
}
