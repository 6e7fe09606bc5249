pub mod applier;
pub mod css_matcher;
pub mod inline_css;
pub mod owned_css;
pub mod resolver;
pub mod splitter;
