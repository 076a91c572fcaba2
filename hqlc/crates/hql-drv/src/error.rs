//! Driver error type, combining `faxc-drv`'s `CompileError` shape (one
//! variant per pipeline failure site) with the pack's `thiserror`
//! convention (`Luvion1-Fax/faxt/src/error.rs`) rather than the teacher's
//! hand-rolled `Display` impl.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("cannot read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{0}: {1} diagnostic error(s)")]
    CompilationFailed(PathBuf, usize),

    #[error(transparent)]
    Bundle(#[from] hql_bundler::BundleError),

    #[error(transparent)]
    CodeGen(#[from] hql_gen::CodeGenError),

    #[error("--target {0:?} is not supported by this build; only `js` emission is implemented")]
    UnsupportedTarget(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
