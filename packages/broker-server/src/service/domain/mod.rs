//! Concrete services mounted behind the router.

pub mod cat;

pub use cat::CatService;
