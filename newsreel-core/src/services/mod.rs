pub(crate) mod article;
pub(crate) mod http;
pub(crate) mod summarize;
pub(crate) mod translate;
