//! System `ffmpeg` integration: argument construction and a bounded subprocess runner.

pub mod command;
pub mod runner;

pub use command::{ConcatJob, FfmpegCommand, StillInput, build_concat_command};
pub use runner::{EncoderOpts, ProcessOutput, run_ffmpeg, validate_ffmpeg};
