//! # Loaders
//!
//! Turn script text, files and plugin sources into commands and plugins.
//! Every loader reports through a [`LoaderResult`]; no failure escapes
//! `load`.

mod error;
mod file;
mod raw;
mod result;

pub use error::{ErrorDetail, LoaderError};
pub use file::FileLoader;
pub use raw::RawLoader;
pub use result::LoaderResult;

use crate::registry::Registry;

/// A source of commands and plugins
pub trait Loader: Sized {
    type Input;

    fn new(registry: &Registry) -> Self;

    /// Load `input`. Concrete loaders must override this; the provided body
    /// only marks the contract.
    fn load(self, input: Self::Input) -> LoaderResult {
        let _ = input;
        unimplemented!("{} does not implement load", std::any::type_name::<Self>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AbstractLoader;

    impl Loader for AbstractLoader {
        type Input = ();

        fn new(_registry: &Registry) -> Self {
            AbstractLoader
        }
    }

    #[test]
    #[should_panic(expected = "does not implement load")]
    fn test_base_loader_requires_load() {
        let registry = Registry::new();
        AbstractLoader::new(&registry).load(());
    }
}
