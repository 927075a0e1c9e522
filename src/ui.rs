// UI layer: routes each parsed subcommand to one platform call and prints
// the result.
//
// Handlers never propagate platform errors. A failed call is logged at debug
// level and reported with a fixed message; the returned `Outcome` lets the
// binary decide on the exit code.

use std::io::{self, Write};
use tracing::{debug, info};

use crate::api::{Assignment, Device, Model, Platform};
use crate::cli::{
    AssignArgs, Command, DeleteArgs, ListArgs, ResetArgs, UpdateArgs, UploadArgs,
};
use crate::config::Settings;
use crate::table::{Column, Table};

pub const MODEL_NAME_WIDTH: usize = 30;
pub const DEVICE_NAME_WIDTH: usize = 30;
pub const ASSIGNMENT_NAME_WIDTH: usize = 23;

pub const DELETE_USAGE: &str =
    "Delete failed: please provide a model id (cfid), device id (did), or assignment id (aid).";
pub const ASSIGN_USAGE: &str =
    "Assign failed: please provide a model id (cfid), device id (did) and registration id (rid).";

/// How a command ended, independent of what was printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
    Usage,
}

impl Outcome {
    /// Exit status. Without `strict` every command exits 0.
    pub fn exit_code(self, strict: bool) -> i32 {
        match (self, strict) {
            (_, false) | (Outcome::Done, true) => 0,
            (Outcome::Failed, true) => 1,
            (Outcome::Usage, true) => 64,
        }
    }
}

/// A subcommand: its name and what it does with the platform.
pub trait Handler {
    const NAME: &'static str;

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write;
}

/// Point the platform at the configured services and silence its own output
/// unless debugging. Applying the same settings again changes nothing.
pub fn init<P: Platform + ?Sized>(platform: &mut P, settings: &Settings) {
    let endpoints = settings.endpoints();
    info!(
        profile = %settings.profile,
        user_manager = %endpoints.user_manager,
        toolchain = %endpoints.toolchain,
        task_manager = %endpoints.task_manager,
        "initialising platform client"
    );
    platform.configure(&endpoints);
    platform.set_silent(!settings.debug);
}

pub struct Dispatcher<P: Platform> {
    platform: P,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(mut platform: P, settings: &Settings) -> Self {
        init(&mut platform, settings);
        Dispatcher { platform }
    }

    pub fn dispatch<W: Write>(&mut self, command: &Command, out: &mut W) -> io::Result<Outcome> {
        let platform = &mut self.platform;
        match command {
            Command::Upload(args) => run_named(args, platform, out),
            Command::Update(args) => run_named(args, platform, out),
            Command::ListModels(args) => run_named(&ModelList(*args), platform, out),
            Command::ListDevices(args) => run_named(&DeviceList(*args), platform, out),
            Command::ListAssignments(args) => run_named(&AssignmentList(*args), platform, out),
            Command::Assign(args) => run_named(args, platform, out),
            Command::Delete(args) => run_named(args, platform, out),
            Command::Reset(args) => run_named(args, platform, out),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn into_inner(self) -> P {
        self.platform
    }
}

fn run_named<H, P, W>(handler: &H, platform: &mut P, out: &mut W) -> io::Result<Outcome>
where
    H: Handler,
    P: Platform + ?Sized,
    W: Write,
{
    debug!(command = H::NAME, "dispatching");
    let outcome = handler.run(platform, out)?;
    debug!(command = H::NAME, ?outcome, "finished");
    Ok(outcome)
}

fn say<W: Write>(out: &mut W, verbose: bool, msg: &str) -> io::Result<()> {
    if verbose {
        writeln!(out, "{msg}")?;
    }
    Ok(())
}

/// Print `ok` or `failed` for a platform call that returns nothing useful.
fn report<W: Write>(
    out: &mut W,
    verbose: bool,
    command: &str,
    result: anyhow::Result<()>,
    ok: &str,
    failed: &str,
) -> io::Result<Outcome> {
    match result {
        Ok(()) => {
            say(out, verbose, ok)?;
            Ok(Outcome::Done)
        }
        Err(e) => {
            debug!(command, "platform call failed: {e:#}");
            say(out, verbose, failed)?;
            Ok(Outcome::Failed)
        }
    }
}

impl Handler for UploadArgs {
    const NAME: &'static str = "upload";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = platform.upload_model(&self.model.to_upload());
        report(
            out,
            self.verbose.verbose,
            Self::NAME,
            result,
            "Your model is uploaded to the Scailable toolchain.",
            "We were unable to upload your model.",
        )
    }
}

impl Handler for UpdateArgs {
    const NAME: &'static str = "update";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = platform.update_model(&self.cfid, &self.model.to_upload());
        report(
            out,
            self.verbose.verbose,
            Self::NAME,
            result,
            "Your model has been updated.",
            "We were unable to update your model.",
        )
    }
}

/// Fixed layout and messages of one list command.
pub struct ListView {
    pub columns: &'static [Column],
    pub empty: &'static str,
    pub failed: &'static str,
}

pub const MODEL_VIEW: ListView = ListView {
    columns: &[
        Column::fixed("Model name:", MODEL_NAME_WIDTH),
        Column::free("CFID:"),
    ],
    empty: "You have not yet registered any models.",
    failed: "Unable to retrieve your models.",
};

pub const DEVICE_VIEW: ListView = ListView {
    columns: &[
        Column::fixed("Device name:", DEVICE_NAME_WIDTH),
        Column::free("DID:"),
        Column::free("RID:"),
    ],
    empty: "You have not yet registered any devices.",
    failed: "Unable to retrieve your devices.",
};

pub const ASSIGNMENT_VIEW: ListView = ListView {
    columns: &[
        Column::fixed("Model name:", ASSIGNMENT_NAME_WIDTH),
        Column::fixed("Device name:", ASSIGNMENT_NAME_WIDTH),
        Column::free("AID:"),
    ],
    empty: "You have not yet assigned any models.",
    failed: "Unable to retrieve your assignments.",
};

impl ListView {
    /// Print one row per record in the order given, the "nothing yet"
    /// message for an empty list, or the failure message.
    fn render<T, W: Write>(
        &self,
        out: &mut W,
        args: &ListArgs,
        command: &str,
        result: anyhow::Result<Vec<T>>,
        row: impl Fn(&T) -> Vec<String>,
    ) -> io::Result<Outcome> {
        let verbose = args.verbose.verbose;
        let records = match result {
            Ok(records) => records,
            Err(e) => {
                debug!(command, "platform call failed: {e:#}");
                say(out, verbose, self.failed)?;
                return Ok(Outcome::Failed);
            }
        };
        if records.is_empty() {
            say(out, verbose, self.empty)?;
            return Ok(Outcome::Done);
        }
        let mut table = Table::new(self.columns);
        for record in &records {
            table.push_row(row(record));
        }
        table.write_to(out)?;
        Ok(Outcome::Done)
    }
}

pub struct ModelList(pub ListArgs);

impl Handler for ModelList {
    const NAME: &'static str = "list-models";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = platform.models(self.0.page());
        MODEL_VIEW.render(out, &self.0, Self::NAME, result, |m: &Model| {
            vec![m.name.clone(), m.cfid.clone()]
        })
    }
}

pub struct DeviceList(pub ListArgs);

impl Handler for DeviceList {
    const NAME: &'static str = "list-devices";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = platform.devices(self.0.page());
        DEVICE_VIEW.render(out, &self.0, Self::NAME, result, |d: &Device| {
            vec![d.name.clone(), d.did.clone(), d.rid.clone()]
        })
    }
}

pub struct AssignmentList(pub ListArgs);

impl Handler for AssignmentList {
    const NAME: &'static str = "list-assignments";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = platform.assignments(self.0.page());
        ASSIGNMENT_VIEW.render(out, &self.0, Self::NAME, result, |a: &Assignment| {
            vec![a.model_name.clone(), a.device_name.clone(), a.aid.clone()]
        })
    }
}

impl Handler for AssignArgs {
    const NAME: &'static str = "assign";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        if self.cfid.is_empty() || self.did.is_empty() || self.rid.is_empty() {
            say(out, self.verbose.verbose, ASSIGN_USAGE)?;
            return Ok(Outcome::Usage);
        }
        let result = platform.assign(&self.cfid, &self.did, &self.rid);
        report(
            out,
            self.verbose.verbose,
            Self::NAME,
            result,
            "Your model has been assigned to the device.",
            "We were unable to assign your model.",
        )
    }
}

/// Which record a `delete` acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Model(&'a str),
    Device(&'a str),
    Assignment(&'a str),
}

impl DeleteArgs {
    /// First non-empty id, checked model, device, assignment.
    pub fn target(&self) -> Option<Target<'_>> {
        non_empty(&self.cfid)
            .map(Target::Model)
            .or_else(|| non_empty(&self.did).map(Target::Device))
            .or_else(|| non_empty(&self.aid).map(Target::Assignment))
    }
}

fn non_empty(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|s| !s.is_empty())
}

impl Handler for DeleteArgs {
    const NAME: &'static str = "delete";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let verbose = self.verbose.verbose;
        let Some(target) = self.target() else {
            say(out, verbose, DELETE_USAGE)?;
            return Ok(Outcome::Usage);
        };
        let (kind, id, result) = match target {
            Target::Model(id) => ("Model", id, platform.delete_model(id)),
            Target::Device(id) => ("Device", id, platform.delete_device(id)),
            Target::Assignment(id) => ("Assignment", id, platform.delete_assignment(id)),
        };
        report(
            out,
            verbose,
            Self::NAME,
            result,
            &format!("{kind} {id} was successfully deleted."),
            &format!("We were unable to delete {} {id}.", kind.to_lowercase()),
        )
    }
}

impl Handler for ResetArgs {
    const NAME: &'static str = "reset";

    fn run<P, W>(&self, platform: &mut P, out: &mut W) -> io::Result<Outcome>
    where
        P: Platform + ?Sized,
        W: Write,
    {
        let result = match platform.remove_credentials() {
            Ok(true) => Ok(()),
            Ok(false) => Err(anyhow::anyhow!("no stored credentials found")),
            Err(e) => Err(e),
        };
        report(
            out,
            self.verbose.verbose,
            Self::NAME,
            result,
            "Your user details have been removed.",
            "Unable to remove your user details.",
        )
    }
}
