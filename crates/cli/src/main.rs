use affixlist_core::{Affix, Diagnostic};
use affixlist_data::{
    list_affixes, load_lister_options, load_render_context, similar_affixes_report, Listing,
    ListingStats, ListerOptions, NameMode,
};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: affixlist [options] [--] FILE...

  -z, --omit-zero           say nothing about zero-weight affixes
  -Z, --no-omit-zero        note zero-weight affixes (default)
  -l, --list-zero           describe zero-weight affixes in full
  -L, --no-list-zero        only note zero-weight affixes (default)
  -f, --file-names          name the source file of effects without a template
  -F, --no-file-names       leave source files out (default)
  -n, --name-mode MODE      all, unnamed or named
  -d, --data-dir DIR        template and rule files (default: data)
  -c, --config FILE         JSON lister options, applied before flags
  -o, --output FILE         write the listing to FILE instead of stdout
  -e, --output-errors FILE  also write every diagnostic and read failure to FILE
      --output-affix-groups FILE
                            write the similar-affixes report to FILE
      --json                write the listing as JSON
  -h, --help                show this help

Directories given as FILE are searched for .dat files.";

/// Flags seen on the command line. Option flags stay `None` unless given, so
/// they can be laid over a config file.
#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    omit_zero_weight: Option<bool>,
    list_zero_weight: Option<bool>,
    add_file_name: Option<bool>,
    name_mode: Option<NameMode>,
    data_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    errors_output: Option<PathBuf>,
    groups_output: Option<PathBuf>,
    json: bool,
    help: bool,
    files: Vec<PathBuf>,
}

impl CliOptions {
    fn lister_options(&self, base: ListerOptions) -> ListerOptions {
        let mut options = base;
        if let Some(value) = self.omit_zero_weight {
            options.omit_zero_weight = value;
        }
        if let Some(value) = self.list_zero_weight {
            options.list_zero_weight = value;
        }
        if let Some(value) = self.add_file_name {
            options.add_file_name = value;
        }
        if let Some(mode) = self.name_mode {
            options.name_mode = mode;
        }
        if self.groups_output.is_some() {
            options.similar_report = true;
        }
        options
    }
}

fn parse_cli_options(args: &[String]) -> anyhow::Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "-z" | "--omit-zero" => options.omit_zero_weight = Some(true),
            "-Z" | "--no-omit-zero" => options.omit_zero_weight = Some(false),
            "-l" | "--list-zero" => options.list_zero_weight = Some(true),
            "-L" | "--no-list-zero" => options.list_zero_weight = Some(false),
            "-f" | "--file-names" => options.add_file_name = Some(true),
            "-F" | "--no-file-names" => options.add_file_name = Some(false),
            "--json" => options.json = true,
            "-h" | "--help" => options.help = true,
            "-n" | "--name-mode" => {
                let value = flag_value(args, idx)?;
                options.name_mode = Some(value.parse().map_err(anyhow::Error::msg)?);
                idx += 1;
            }
            "-d" | "--data-dir" => {
                options.data_dir = Some(PathBuf::from(flag_value(args, idx)?));
                idx += 1;
            }
            "-c" | "--config" => {
                options.config = Some(PathBuf::from(flag_value(args, idx)?));
                idx += 1;
            }
            "-o" | "--output" => {
                options.output = Some(PathBuf::from(flag_value(args, idx)?));
                idx += 1;
            }
            "-e" | "--output-errors" => {
                options.errors_output = Some(PathBuf::from(flag_value(args, idx)?));
                idx += 1;
            }
            "--output-affix-groups" => {
                options.groups_output = Some(PathBuf::from(flag_value(args, idx)?));
                idx += 1;
            }
            "--" => {
                options
                    .files
                    .extend(args[idx + 1..].iter().map(PathBuf::from));
                break;
            }
            _ if arg.starts_with('-') && arg.len() > 1 => bail!("unknown option {}", arg),
            _ => options.files.push(PathBuf::from(arg)),
        }
        idx += 1;
    }
    Ok(options)
}

fn flag_value(args: &[String], idx: usize) -> anyhow::Result<&str> {
    match args.get(idx + 1) {
        Some(value) => Ok(value.as_str()),
        None => bail!("{} needs a value", args[idx]),
    }
}

/// Expands directories into the `.dat` files directly inside them, sorted.
fn collect_files(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(input).with_context(|| format!("read {}", input.display()))? {
            let path = entry
                .with_context(|| format!("read {}", input.display()))?
                .path();
            let is_dat = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dat"));
            if is_dat && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    affix: &'a Affix,
    text: Option<&'a str>,
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
struct JsonListing<'a> {
    affixes: Vec<JsonEntry<'a>>,
    stats: &'a ListingStats,
    warnings: &'a [String],
}

fn listing_json(listing: &Listing) -> anyhow::Result<String> {
    let document = JsonListing {
        affixes: listing
            .entries
            .iter()
            .map(|entry| JsonEntry {
                affix: &entry.affix,
                text: entry.text.as_deref(),
                diagnostics: entry.diagnostics.iter().map(ToString::to_string).collect(),
            })
            .collect(),
        stats: &listing.stats,
        warnings: &listing.warnings,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// One line per problem: template checks first, then unreadable files, then
/// diagnostics of each listed affix prefixed by its source.
fn error_report(sanity: &[Diagnostic], listing: &Listing) -> String {
    let mut out = String::new();
    for diagnostic in sanity {
        out.push_str(&format!("{}\n", diagnostic));
    }
    for warning in &listing.warnings {
        out.push_str(&format!("{}\n", warning));
    }
    for entry in &listing.entries {
        for diagnostic in &entry.diagnostics {
            out.push_str(&format!("{}: {}\n", entry.affix.source_name, diagnostic));
        }
    }
    out
}

fn write_output(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("write stdout")?;
            stdout.flush().context("write stdout")?;
        }
    }
    Ok(())
}

fn run(cli: &CliOptions) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => load_lister_options(path)?,
        None => ListerOptions::default(),
    };
    let options = cli.lister_options(base);
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"));
    let ctx = load_render_context(&data_dir, options.render_options())?;

    let sanity = ctx.sanity_check();
    for diagnostic in &sanity {
        tracing::warn!("{}", diagnostic);
    }

    let files = collect_files(&cli.files)?;
    if files.is_empty() {
        bail!("no affix files given\n\n{}", USAGE);
    }
    let listing = list_affixes(&files, &ctx, &options);

    let mut text = if cli.json {
        listing_json(&listing)?
    } else {
        listing.render()
    };

    if options.similar_report {
        let report = similar_affixes_report(&listing.set, &ctx);
        match &cli.groups_output {
            Some(path) => write_output(Some(path), &report)?,
            // Without a report file the report follows the plain listing.
            None if !cli.json => {
                text.push('\n');
                text.push_str(&report);
            }
            None => tracing::warn!("similar-affixes report needs --output-affix-groups with --json"),
        }
    }
    write_output(cli.output.as_deref(), &text)?;
    if let Some(path) = &cli.errors_output {
        write_output(Some(path), &error_report(&sanity, &listing))?;
    }

    eprintln!("{}", listing.stats);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_cli_options(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("affixlist: {:#}\n\n{}", err, USAGE);
            std::process::exit(2);
        }
    };
    if cli.help {
        println!("{}", USAGE);
        return;
    }
    if let Err(err) = run(&cli) {
        eprintln!("affixlist: {:#}", err);
        std::process::exit(1);
    }
}
