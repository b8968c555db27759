mod args;
mod commands;
mod repl;
pub(crate) mod theme;

pub use args::CliArgs;
pub use repl::{
    AppState, Output, analyze_once, ask_once, attach_files, print_outputs, prompt_for, run_repl,
};
pub use theme::{Palette, Tone};
