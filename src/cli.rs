use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: formfill [--config <path>] [--form <name|path>] [--list-forms]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    /// Display name, file stem, or path; prompts interactively when absent.
    pub form: Option<String>,
    pub list_forms: bool,
}

pub fn args_from_env() -> Result<CliArgs> {
    parse_args(env::args().skip(1))
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut form = None;
    let mut list_forms = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--form" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --form"))?;
                form = Some(value);
            }
            "--list-forms" => list_forms = true,
            other => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./formfill.jsonc")),
        form,
        list_forms,
    })
}
