pub(crate) mod narration;
pub(crate) mod probe;
