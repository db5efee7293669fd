//! The publication controller: estimate pages, real layout on demand, and
//! correction as lazily estimated content gets measured

mod controller;
mod correction;
mod prepare;

#[cfg(test)]
mod tests;

pub use controller::PublicationController;
pub use hit_test::ElementHit;
