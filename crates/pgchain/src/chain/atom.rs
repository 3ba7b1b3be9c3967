use crate::param::Param;

/// One fragment of statement text plus the arguments for its `?` markers,
/// left to right.
#[derive(Clone, Debug)]
pub(super) struct Atom {
    pub(super) text: String,
    pub(super) args: Vec<Param>,
}

impl Atom {
    pub(super) fn new(text: impl Into<String>, args: impl IntoIterator<Item = Param>) -> Self {
        Self {
            text: text.into(),
            args: args.into_iter().collect(),
        }
    }
}
