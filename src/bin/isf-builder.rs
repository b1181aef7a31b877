use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use isf_builder::pipeline::{self, PipelineOptions};
use isf_builder::{CancelToken, Distro, KernelFilter, SymbolStore};

fn usage() -> &'static str {
    "Usage:\n  isf-builder build <ubuntu|debian|fedora|amazon|cbl-mariner> <kernel|all> [branch] [--jobs N]\n  isf-builder list [os]\n\nOptions:\n  --jobs N    worker pool size (default 1)\n  -v          verbose debug logging"
}

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let verbose = take_flag(&mut args, "-v") || take_flag(&mut args, "--verbose");
    let jobs = take_option(&mut args, "--jobs")?
        .map(|raw| {
            raw.parse::<usize>()
                .with_context(|| format!("invalid --jobs value '{raw}'"))
        })
        .transpose()?
        .unwrap_or(1);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    )
    .init();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["build", distro, kernel] => build(distro, kernel, None, jobs),
        ["build", distro, kernel, branch] => build(distro, kernel, Some(branch), jobs),
        ["list"] => list(None),
        ["list", os] => list(Some(os)),
        _ => bail!(usage()),
    }
}

fn build(distro_name: &str, kernel: &str, branch: Option<&str>, jobs: usize) -> Result<()> {
    let distro = Distro::parse(distro_name)?;
    let branch = branch.unwrap_or_else(|| distro.default_branch());
    let filter = KernelFilter::parse(kernel);

    let cancel = CancelToken::new();
    pipeline::cancel_on_sigint(&cancel);

    let catalog = distro
        .resolve(branch, &filter)
        .with_context(|| format!("resolving {distro_name} catalog for branch '{branch}'"))?;
    println!("Found {} symbol sets", catalog.len());

    let options = PipelineOptions {
        base_dir: PathBuf::from("."),
        jobs,
    };
    let report = pipeline::run(distro, &catalog, &options, &cancel)
        .with_context(|| format!("processing {distro_name} catalog"))?;

    println!("{}", report.summary());
    if report.cancelled {
        bail!("run cancelled before completing the catalog");
    }
    Ok(())
}

fn list(os: Option<&str>) -> Result<()> {
    let store = SymbolStore::open(&PathBuf::from("."));
    let mut artifacts = store.list();
    if let Some(os) = os {
        artifacts.retain(|a| a.os == os);
    }

    if artifacts.is_empty() {
        println!("No symbol files found under {}", store.root().display());
        return Ok(());
    }
    for artifact in artifacts {
        println!("{}  {}  {}", artifact.os, artifact.kernel, artifact.path.display());
    }
    Ok(())
}

/// Remove a bare flag from the argument list, reporting whether it was present.
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    }
}

/// Remove a `--name value` option from the argument list.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(index) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        bail!("{name} requires a value\n\n{}", usage());
    }
    args.remove(index);
    Ok(Some(args.remove(index)))
}
