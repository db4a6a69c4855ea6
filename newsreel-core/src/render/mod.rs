pub(crate) mod bitmap_font;
pub(crate) mod blur;
pub(crate) mod canvas;
pub(crate) mod caption;
pub(crate) mod composite;
pub(crate) mod frames;
pub(crate) mod glyphs;
pub(crate) mod schedule;
