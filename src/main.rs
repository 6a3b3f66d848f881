use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use xldiff::cli::{build_options, Args, BatchArgs, Command, CompareCommand, SqlArgs, SummaryArgs};
use xldiff::diff::{plan_xldiff, run_sql, run_summary, run_xldiff, Counters, SqlRequest};
use xldiff::logging::init_logging;
use xldiff::summary::SummaryOptions;
use xldiff::utils::summary_output_path;
use xldiff::{run_batch, BatchSettings};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Compare(cmd) => compare(cmd),
        Command::Summary(cmd) => summary(cmd),
        Command::Sql(cmd) => sql(cmd),
        Command::Batch(cmd) => batch(cmd),
    }
}

/// Output must not overwrite one of the inputs.
fn check_output(output: &Path, inputs: &[&Path]) -> Result<()> {
    if let Ok(out_abs) = output.canonicalize() {
        for input in inputs {
            if let Ok(in_abs) = input.canonicalize() {
                if out_abs == in_abs {
                    anyhow::bail!("output {:?} cannot be the same file as input {:?}.", output, input);
                }
            }
        }
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            anyhow::bail!("output directory {:?} does not exist.", parent);
        }
    }
    Ok(())
}

fn compare(cmd: CompareCommand) -> Result<()> {
    let opts = build_options(&cmd.compare).context("Invalid comparison options")?;

    let left = cmd.left.canonicalize().context("Invalid left input")?;
    let right = cmd.right.canonicalize().context("Invalid right input")?;
    check_output(&cmd.output, &[left.as_path(), right.as_path()])?;

    if cmd.dry_run {
        println!("== DRY RUN ==");
        let plan = plan_xldiff(&left, &right, &opts)?;
        for p in &plan {
            println!(
                "{:<31} {} ({}x{})  vs  {} ({}x{})",
                p.output_name,
                p.left_name,
                p.left_extent.0,
                p.left_extent.1,
                p.right_name,
                p.right_extent.0,
                p.right_extent.1
            );
        }
        println!("Sheet pairs (would be compared): {}", plan.len());
        println!("Compare type:                    {}", opts.compare_mode);
        println!("Sheet matching:                  {}", opts.sheet_matching);
        return Ok(());
    }

    let counters = run_xldiff(&left, &right, &cmd.output, &opts)?;
    print_counters(&counters, Some(cmd.output.as_path()));
    Ok(())
}

fn summary(cmd: SummaryArgs) -> Result<()> {
    let input = cmd.input.canonicalize().context("Invalid input workbook")?;
    let output = cmd.output.unwrap_or_else(|| summary_output_path(&input));
    check_output(&output, &[input.as_path()])?;

    if !cmd.threshold.is_finite() || cmd.threshold < 0.0 {
        anyhow::bail!("threshold must be a non-negative number.");
    }
    let opts = SummaryOptions {
        threshold: cmd.threshold,
        has_header: !cmd.no_header,
        ..SummaryOptions::default()
    };

    let counters = run_summary(&input, &output, &opts)?;
    print_counters(&counters, Some(output.as_path()));
    Ok(())
}

fn sql(cmd: SqlArgs) -> Result<()> {
    let opts = build_options(&cmd.compare).context("Invalid comparison options")?;
    check_output(&cmd.output, &[])?;

    let request = SqlRequest::new(
        &cmd.left,
        &cmd.right,
        &cmd.query,
        cmd.query_right.as_deref(),
        cmd.left_file,
        cmd.right_file,
        !cmd.sequential,
    );
    let counters = run_sql(&request, &cmd.output, &opts)?;
    print_counters(&counters, Some(cmd.output.as_path()));
    Ok(())
}

fn batch(cmd: BatchArgs) -> Result<()> {
    let file = cmd.file.canonicalize().context("Invalid batch file")?;
    let settings = BatchSettings {
        has_header: !cmd.no_header,
        parallel: !cmd.sequential,
        compare_only: cmd.compare_only,
    };
    let counters = run_batch(&file, &settings)?;
    print_counters(&counters, None);
    Ok(())
}

fn print_counters(counters: &Counters, output: Option<&Path>) {
    println!("== xldiff: Summary ==");
    println!("Sheets compared:      {}", counters.sheets_compared);
    println!("Rows compared:        {}", counters.rows_compared);
    println!("Cells compared:       {}", counters.cells_compared);
    println!("Cells different:      {}", counters.cells_different);
    println!("Summary entries:      {}", counters.summary_entries);
    if let Some(output) = output {
        println!("Output at:            {:?}", output);
    }
}
