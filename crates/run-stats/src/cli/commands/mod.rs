pub mod check;
pub mod consolidate;
pub mod report;

pub use check::run as check;
pub use consolidate::run as consolidate;
pub use report::run as report;
