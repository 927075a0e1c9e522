// Command-line argument definitions via clap derive.
//
// Each subcommand has its own args struct listing every option and its
// default. Boolean options take an explicit value (`-v false`).

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::{ModelUpload, Page};

/// Scailable CLI: manage models, devices and assignments on the Scailable platform.
#[derive(Debug, Parser)]
#[command(name = "sclbl", version, arg_required_else_help = true)]
pub struct Cli {
    /// Show platform diagnostics. Repeat for more log output (up to 3).
    /// `SCLBL_DEBUG=1` counts as one.
    #[arg(long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Exit with 1 when an operation fails and 64 on usage errors
    /// instead of always exiting 0.
    #[arg(long, global = true, env = "SCLBL_STRICT_EXIT")]
    pub strict_exit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload an ONNX model to the toolchain.
    Upload(UploadArgs),
    /// Replace an existing model, identified by its cfid.
    Update(UpdateArgs),
    /// List your models.
    #[command(name = "list-models", alias = "models")]
    ListModels(ListArgs),
    /// List your registered devices.
    #[command(name = "list-devices", alias = "devices")]
    ListDevices(ListArgs),
    /// List your model-to-device assignments.
    #[command(name = "list-assignments", alias = "assignments")]
    ListAssignments(ListArgs),
    /// Assign a model to a device.
    Assign(AssignArgs),
    /// Delete a model, device or assignment.
    Delete(DeleteArgs),
    /// Remove your stored user credentials.
    Reset(ResetArgs),
}

/// Model file and metadata shared by `upload` and `update`.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Path of the input ONNX file.
    #[arg(short, long)]
    pub file: PathBuf,

    /// Name of the model.
    #[arg(short, long)]
    pub name: String,

    /// Model documentation.
    #[arg(short, long, default_value = "...")]
    pub docs: String,

    /// Example model input string.
    #[arg(short, long, default_value = "...")]
    pub example: String,

    /// Send a confirmation e-mail once the model is converted.
    #[arg(short = 'm', long, default_value_t = true, action = ArgAction::Set,
          value_parser = BoolishValueParser::new())]
    pub email: bool,
}

impl ModelArgs {
    pub fn to_upload(&self) -> ModelUpload {
        ModelUpload {
            file: self.file.clone(),
            name: self.name.clone(),
            docs: self.docs.clone(),
            example: self.example.clone(),
            email: self.email,
        }
    }
}

/// Only gates printing; the platform call happens either way.
#[derive(Debug, Clone, Copy, Args)]
pub struct VerboseArg {
    /// Print user feedback.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set,
          value_parser = BoolishValueParser::new())]
    pub verbose: bool,
}

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub verbose: VerboseArg,
}

#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    /// The compute function id (cfid) of the model to update.
    #[arg(short = 'i', long)]
    pub cfid: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub verbose: VerboseArg,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ListArgs {
    /// Offset for the query.
    #[arg(short, long, default_value_t = 0)]
    pub offset: u32,

    /// Maximum number of records to return.
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,

    #[command(flatten)]
    pub verbose: VerboseArg,
}

impl ListArgs {
    pub fn page(&self) -> Page {
        Page {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AssignArgs {
    /// Model id (cfid).
    #[arg(short, long)]
    pub cfid: String,

    /// Device id (did).
    #[arg(short, long)]
    pub did: String,

    /// Device registration id (rid).
    #[arg(short, long)]
    pub rid: String,

    #[command(flatten)]
    pub verbose: VerboseArg,
}

/// The first non-empty id in the order cfid, did, aid is deleted.
#[derive(Debug, Clone, Default, Args)]
pub struct DeleteArgs {
    /// Model id (cfid).
    #[arg(short, long)]
    pub cfid: Option<String>,

    /// Device id (did).
    #[arg(short, long)]
    pub did: Option<String>,

    /// Assignment id (aid).
    #[arg(short, long)]
    pub aid: Option<String>,

    #[command(flatten)]
    pub verbose: VerboseArg,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ResetArgs {
    #[command(flatten)]
    pub verbose: VerboseArg,
}

impl Default for VerboseArg {
    fn default() -> Self {
        VerboseArg { verbose: true }
    }
}
