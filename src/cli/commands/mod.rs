//! One module per subcommand; each exposes an `execute` function.

pub mod completions;
pub mod delete;
pub mod generate;
pub mod init;
pub mod list;
pub mod note;
pub mod show;
