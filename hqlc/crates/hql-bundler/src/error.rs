//! Bundler error type (spec.md section 4.8 "Failure semantics" and
//! section 7): a transpile error is always fatal, a resolve failure is
//! fatal only for a mandatory import, cache write failures never reach
//! this type at all (they are logged at `debug` and swallowed).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("cannot read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{0} has {1} error(s), first: {2}")]
    Transpile(PathBuf, usize, String),

    #[error("cannot resolve import {specifier:?} from {importer}")]
    UnresolvedImport { specifier: String, importer: PathBuf },

    #[error("identifier collision in {0}: {1:?} and {2:?} both sanitize to the same name")]
    IdentifierCollision(PathBuf, String, String),
}

pub type Result<T> = std::result::Result<T, BundleError>;
