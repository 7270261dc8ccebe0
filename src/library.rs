//! Local track catalog: the `Track` model and a directory scanner that reads
//! tags with `lofty`.

mod display;
mod model;
mod scan;

pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
