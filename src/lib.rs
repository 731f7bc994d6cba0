pub mod builtin;
pub mod config;
pub mod error;
pub mod instruction;
pub mod session;
pub mod text_processing;
pub mod user;
mod utils;

pub use config::Config;
pub use error::{ShellError, SyntaxError};
pub use instruction::{Command, Pipeline, Redirect};
pub use session::{Session, Status};
