//! Token-keyed inverted index built on two tiers of [`skiptree::SkipTree`]:
//! a shared tree for rarely-occurring tokens and one dedicated tree per
//! token once it grows past [`RARE_THRESHOLD`].

mod index;
mod rare_row;
#[cfg(test)]
mod tests;
mod token_row;

pub use index::{InvertedIndex, RARE_THRESHOLD};
pub use rare_row::{RareRow, RareToCommonCursor};
pub use token_row::TokenRow;
