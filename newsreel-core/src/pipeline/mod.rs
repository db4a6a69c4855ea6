pub(crate) mod news;
pub(crate) mod post;
pub(crate) mod video;
