#![forbid(unsafe_code)]

//! Prints the notification stream of a [`BatchVec`] next to a plain
//! [`ObservableVec`] fed the same items one at a time.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use batchvec::{
    BatchConfig, BatchError, BatchVec, EmptyRemoval, ObservableVec, PropertyNotifications,
    SubscriptionSet,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const BATCH_LABEL: &str = "Batch collection";
const PLAIN_LABEL: &str = "Observable collection";

#[derive(Debug, Parser)]
#[command(
    name = "batchvec-demo",
    version,
    about = "Compare batch and per-item collection change notifications"
)]
struct Args {
    /// Number of items added in the range step.
    #[arg(long, default_value_t = 10)]
    range_size: usize,

    /// Items containing this character are removed in the final step.
    #[arg(long, default_value_t = '1')]
    remove_char: char,

    /// Report Count/Items property changes from every batch operation.
    #[arg(long)]
    uniform_property_notifications: bool,

    /// Emit nothing when the removal step matches no item.
    #[arg(long)]
    suppress_empty_remove: bool,

    /// Notification policy file (TOML, or JSON with a `.json` extension).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log batch spans and every notification to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Collection-changed notifications seen per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Totals {
    batch: usize,
    plain: usize,
}

fn resolve_config(args: &Args) -> Result<BatchConfig, BatchError> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };
    if args.uniform_property_notifications {
        config = config.with_property_notifications(PropertyNotifications::Uniform);
    }
    if args.suppress_empty_remove {
        config = config.with_empty_removal(EmptyRemoval::Suppress);
    }
    tracing::debug!(?config, "resolved notification policy");
    Ok(config)
}

fn flush(out: &mut impl Write, transcript: &RefCell<Vec<String>>) -> io::Result<()> {
    for line in transcript.borrow_mut().drain(..) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn run(args: &Args, out: &mut impl Write) -> Result<Totals, DemoError> {
    let config = resolve_config(args)?;
    let batch = BatchVec::with_config(config);
    let plain = ObservableVec::new();

    let transcript = Rc::new(RefCell::new(Vec::new()));
    let mut subs = SubscriptionSet::new();

    let reader = batch.clone();
    let t = Rc::clone(&transcript);
    subs.hold(batch.subscribe(move |change| {
        t.borrow_mut().push(format!(
            "{BATCH_LABEL} changed ({}) - has now {} items.",
            change.action(),
            reader.len()
        ));
    }));
    let reader = plain.clone();
    let t = Rc::clone(&transcript);
    subs.hold(plain.subscribe(move |change| {
        t.borrow_mut().push(format!(
            "{PLAIN_LABEL} changed ({}) - has now {} items.",
            change.action(),
            reader.len()
        ));
    }));

    let mut next_id = 0usize;
    let mut fresh = move || {
        next_id += 1;
        format!("item-{next_id:03}")
    };
    let mut totals = Totals { batch: 0, plain: 0 };
    let mut tally = |transcript: &RefCell<Vec<String>>| {
        for line in transcript.borrow().iter() {
            if line.starts_with(BATCH_LABEL) {
                totals.batch += 1;
            } else if line.starts_with(PLAIN_LABEL) {
                totals.plain += 1;
            }
        }
    };

    writeln!(out, "Adding single item")?;
    let item = fresh();
    batch.add_range([item.clone()]);
    plain.push(item);
    tally(&transcript);
    flush(out, &transcript)?;

    writeln!(out, "\nAdding range")?;
    let range: Vec<String> = (0..args.range_size).map(|_| fresh()).collect();
    batch.add_range(range.clone());
    for item in range {
        plain.push(item);
    }
    tally(&transcript);
    flush(out, &transcript)?;

    writeln!(out, "\nReplacing all elements")?;
    batch.replace([fresh(), fresh()]);
    tally(&transcript);
    flush(out, &transcript)?;

    writeln!(out, "\nReplacing single element")?;
    if let Some(first) = batch.first() {
        batch.replace_element(fresh(), &first)?;
    }
    tally(&transcript);
    flush(out, &transcript)?;

    writeln!(out, "\nRemoving with evaluation function")?;
    let removed = batch.remove_all(|item| item.contains(args.remove_char));
    tracing::info!(removed, remaining = batch.len(), "removal step done");
    tally(&transcript);
    flush(out, &transcript)?;

    writeln!(
        out,
        "\nNotifications: batch={} observable={}",
        totals.batch, totals.plain
    )?;
    Ok(totals)
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "batchvec=trace,batchvec_demo=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let stdout = io::stdout();
    match run(&args, &mut stdout.lock()) {
        Ok(totals) => {
            tracing::debug!(?totals, "demo finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "demo failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
