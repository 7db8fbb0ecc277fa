//! Writes the service's OpenAPI document, or checks a committed copy.
//!
//! ```text
//! generate_openapi                     print to stdout
//! generate_openapi --output api.json   write api.json
//! generate_openapi --check api.json    exit with an error if api.json is stale
//! ```

use std::{env, fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use boiler_monitor_service::api;

enum Mode {
    Print,
    Write(PathBuf),
    Check(PathBuf),
}

impl Mode {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mode = match (args.next().as_deref(), args.next()) {
            (None, _) => Mode::Print,
            (Some("--output"), Some(path)) => Mode::Write(path.into()),
            (Some("--check"), Some(path)) => Mode::Check(path.into()),
            (Some(flag @ ("--output" | "--check")), None) => bail!("{flag} needs a path"),
            (Some(flag), _) => bail!("unexpected argument {flag:?}; see --output / --check"),
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument {extra:?}");
        }
        Ok(mode)
    }
}

fn main() -> Result<()> {
    let mut json = api::openapi()
        .to_pretty_json()
        .context("Failed to serialise OpenAPI document")?;
    json.push('\n');

    match Mode::from_args(env::args().skip(1))? {
        Mode::Print => print!("{json}"),
        Mode::Write(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        Mode::Check(path) => {
            let on_disk = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if on_disk != json {
                bail!(
                    "{} is out of date; regenerate it with --output",
                    path.display()
                );
            }
            eprintln!("{} is up to date", path.display());
        }
    }
    Ok(())
}
