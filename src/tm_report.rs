use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::tm_error::Result;
use crate::tm_simulator::SimResult;

/// Report path for `trace`: its extension replaced by the algorithm's
pub fn report_path(trace: &Path, extension: &str) -> PathBuf {
    trace.with_extension(extension)
}

pub fn save_report(result: &SimResult, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_report(result, &mut out)?;
    out.flush()?;
    info!("report written to {}", path.display());
    Ok(())
}

/// Run header followed by the aggregate statistics.
///
/// Holds no wall-clock data, so equal seeds give byte-identical reports.
pub fn write_report<W: Write>(result: &SimResult, out: &mut W) -> Result<()> {
    write_header(result, out)?;
    write_statistics(result, out)
}

fn write_header<W: Write>(result: &SimResult, out: &mut W) -> Result<()> {
    let p = &result.params;
    write!(out, "\n----------- TRACE PARAMETERS ---------")?;
    write!(out, "\n>Number of Peers:        {}", p.num_users)?;
    write!(out, "\n>Number of Files:        {}", p.num_files)?;
    write!(out, "\n>Number of Transactions: {}", p.num_trans)?;
    write!(out, "\n>Max. User Connections:  {}", p.band_max)?;
    write!(out, "\n>Bandwidth Period:       {}", p.band_per)?;
    write!(out, "\n>Warm-up Transactions:   {}", p.warmup)?;
    write!(out, "\n>Zipf Constant:          {:.6}", p.zipf)?;
    write!(out, "\n>Pre-Trusted Users:      {}", p.pre_trusted)?;
    write!(out, "\n>Good Behaving Users:    {}", p.usr_good)?;
    write!(out, "\n>Purely Malicious Users: {}", p.usr_pure)?;
    write!(out, "\n>Feedback Skewing Users: {}", p.usr_feed)?;
    write!(out, "\n>Maligned Providers:     {}", p.usr_prov)?;
    write!(out, "\n>Disguised Malignants:   {}", p.usr_disg)?;
    write!(out, "\n>Sybil Attackers:        {}", p.usr_sybl)?;
    write!(out, "\n>Smart Trans Gen?:       {}", p.smart_gen)?;
    write!(out, "\n>Generator Rand Seed:    {}", p.generator_seed)?;
    write!(out, "\n>Simulator Rand Seed:    {}\n\n", result.seed)?;
    write!(out, "---------- SIMULATOR SPECIFIC --------")?;
    write!(out, "\n>Simulator used:         {}", result.algorithm)?;
    write!(out, "\n>Malicious strategy:     {}\n\n", result.strategy.name())?;
    Ok(())
}

fn write_statistics<W: Write>(result: &SimResult, out: &mut W) -> Result<()> {
    let stats = &result.stats;
    let attempted = result.attempted();
    let incomplete = stats.incomplete();
    let completed = stats.completed(attempted);

    writeln!(out, "-------- TRANSACTION OVERVIEW --------")?;
    writeln!(out, ">Transacts Attempted:    {}", attempted)?;
    writeln!(out, ">Transacts Completed:    {}", completed)?;
    writeln!(out, ">Transacts Incomplete:   {}\n", incomplete)?;

    writeln!(out, "-------- INCOMPLETE TRANS SUM --------")?;
    writeln!(out, ">Transacts Incomplete:   {}", incomplete)?;
    writeln!(out, ">Reception Declined:     {}", stats.recv_blocked)?;
    writeln!(out, ">No Eligible Senders:    {}\n", stats.send_blocked)?;

    writeln!(out, "--------- COMPLETE TRANS SUM ---------")?;
    writeln!(out, ">Transacts Completed:    {}", completed)?;
    writeln!(out, ">Valid Transactions:     {}", stats.valid(attempted))?;
    writeln!(out, ">Invalid Transactions:   {}\n", stats.invalid_trans)?;

    writeln!(out, "--------- FEEDBACK OVERVIEW ----------")?;
    writeln!(out, ">Feedbacks Committed:    {}", completed)?;
    writeln!(out, ">Truthful Feedbacks:     {}", stats.feedback_truthful)?;
    writeln!(out, ">Dishonest Feedbacks:    {}", stats.feedback_lies)?;
    writeln!(out, ">Sybil-User Feedbacks:   {}\n", stats.feedback_sybil)?;

    writeln!(out, "--------- EVALUATION METRIC ----------")?;
    writeln!(out, ">Good User Transacts:    {}", stats.good_total())?;
    writeln!(out, ">Good User Successes:    {}", stats.good_successes)?;
    writeln!(out, ">Good User Failures:     {}", stats.good_failures)?;
    Ok(())
}
