pub mod apply;
pub mod cli;
pub mod consistency;
pub mod convert;
pub mod files;
pub mod parse;
pub mod prompt;
pub mod reconcile;
pub mod snapshot;

/// Artisan version as provided by environment variables at build time.
pub const ARTISAN_VERSION: &str = match option_env!("ARTISAN_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Requested operation completed successfully.
    Done,
    /// The ring does not match its rules, reported by `apply --check`.
    ChangesPending,
}
