mod data_types;
mod fetcher;

pub mod prelude {
    pub use super::fetcher::*;
}
