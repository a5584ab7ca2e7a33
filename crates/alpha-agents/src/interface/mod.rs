//! Console output for analysis runs

pub mod formatter;

pub use formatter::{
    banner, format_collaboration, format_debate, format_error, format_selection, format_transcript,
};
