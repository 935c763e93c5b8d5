pub mod init;
pub mod run;
pub mod validate;

pub use init::{init, InitArgs};
pub use run::{run, RunArgs};
pub use validate::{validate_definitions, ValidateArgs};
