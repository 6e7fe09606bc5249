//! Moves the rules of `<style>` blocks into `style` attributes of the elements
//! they select, for HTML that has to survive mail clients ignoring `<style>`.
//!
//! Rules that cannot be inlined (pseudo-class selectors, CSS that does not
//! parse) are written back into a single `<style>` element in `<head>`.

pub mod dom;
pub mod error;
pub mod inline_generate;
pub mod parser;
pub mod style;

pub use error::{InlineError, InlineResult};
pub use inline_generate::{css_inline, InlineOptions};
