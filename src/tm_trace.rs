use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::str::FromStr;

use log::info;

use crate::tm_context::SimParams;
use crate::tm_error::{Result, SimError};
use crate::tm_interface::{Behavior, FileId, PeerId, TransactionRequest, TRACE_HEADER_LINES};
use crate::tm_network::{Network, Peer};

/// Static description of one peer as listed in a trace
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSpec {
    pub cleanup: f64,
    pub honesty: f64,
    pub behavior: Behavior,
    pub pre_trusted: bool,
}

/// One file copy of the initial library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryEntry {
    pub owner: PeerId,
    pub file: FileId,
    pub valid: bool,
}

/// A fully parsed workload
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub params: SimParams,
    pub peers: Vec<PeerSpec>,
    pub library: Vec<LibraryEntry>,
    /// Warm-up requests followed by measured requests
    pub requests: Vec<TransactionRequest>,
}

impl Trace {
    /// Fresh network with the trace's peers and initial library
    pub fn build_network(&self) -> Network {
        let peers = self
            .peers
            .iter()
            .map(|spec| {
                Peer::new(
                    spec.behavior,
                    spec.cleanup,
                    spec.honesty,
                    spec.pre_trusted,
                    self.params.band_max,
                    self.params.band_per,
                )
            })
            .collect();

        let mut network = Network::new(peers, self.params.num_files);
        for entry in &self.library {
            network.add_file(entry.owner, entry.file, entry.valid);
        }
        network
    }
}

// ============================================================================
// Reading
// ============================================================================

pub fn load_trace(path: &Path) -> Result<Trace> {
    let file = File::open(path)?;
    let trace = read_trace(BufReader::new(file))?;
    info!(
        "trace {} parsed: {} peers, {} files ({} copies), {} requests",
        path.display(),
        trace.peers.len(),
        trace.params.num_files,
        trace.library.len(),
        trace.requests.len()
    );
    Ok(trace)
}

pub fn read_trace<R: BufRead>(reader: R) -> Result<Trace> {
    let mut lines = TraceLines {
        lines: reader.lines(),
        line_no: 0,
    };

    let params = read_header(&mut lines)?;
    params.validate()?;
    lines.expect_blank("blank line after header")?;

    let mut peers = Vec::with_capacity(params.num_users);
    for _ in 0..params.num_users {
        let line = lines.next_line("peer line")?;
        peers.push(parse_peer(&line, lines.line_no)?);
    }
    params.check_population(peers.iter().map(|p| p.behavior))?;
    lines.expect_blank("blank line after peers")?;

    let mut library = Vec::new();
    loop {
        let line = lines.next_line("blank line after library")?;
        if line.trim().is_empty() {
            break;
        }
        let fields = tuple_fields(&line, 3, lines.line_no)?;
        let owner = parse_index(fields[0], params.num_users, "owner", lines.line_no)?;
        let file = parse_index(fields[1], params.num_files, "file", lines.line_no)?;
        let valid = parse_bool(fields[2], lines.line_no)?;
        library.push(LibraryEntry { owner, file, valid });
    }

    let total = params.total_requests();
    let mut requests = Vec::with_capacity(total);
    for _ in 0..total {
        let line = lines.next_line("transaction request")?;
        let fields = tuple_fields(&line, 2, lines.line_no)?;
        let receiver = parse_index(fields[0], params.num_users, "receiver", lines.line_no)?;
        let file = parse_index(fields[1], params.num_files, "file", lines.line_no)?;
        requests.push(TransactionRequest { receiver, file });
    }

    Ok(Trace {
        params,
        peers,
        library,
        requests,
    })
}

struct TraceLines<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TraceLines<R> {
    fn next_line(&mut self, expected: &'static str) -> Result<String> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(line?)
            }
            None => Err(SimError::UnexpectedEof(expected)),
        }
    }

    fn expect_blank(&mut self, expected: &'static str) -> Result<()> {
        let line = self.next_line(expected)?;
        if !line.trim().is_empty() {
            return Err(SimError::malformed(self.line_no, format!("expected {}", expected)));
        }
        Ok(())
    }
}

fn read_header<R: BufRead>(lines: &mut TraceLines<R>) -> Result<SimParams> {
    let mut values = Vec::with_capacity(TRACE_HEADER_LINES);
    for _ in 0..TRACE_HEADER_LINES {
        let line = lines.next_line("header line")?;
        // only the leading value matters, the rest is a description
        let value = line
            .split_whitespace()
            .next()
            .ok_or_else(|| SimError::malformed(lines.line_no, "empty header line"))?
            .to_string();
        values.push((value, lines.line_no));
    }

    let num = |i: usize| -> Result<usize> { parse_number(&values[i].0, values[i].1) };

    Ok(SimParams {
        num_users: num(0)?,
        num_files: num(1)?,
        num_trans: num(2)?,
        band_max: num(3)?,
        band_per: parse_number(&values[4].0, values[4].1)?,
        warmup: num(5)?,
        zipf: parse_number(&values[6].0, values[6].1)?,
        pre_trusted: num(7)?,
        usr_good: num(8)?,
        usr_pure: num(9)?,
        usr_feed: num(10)?,
        usr_prov: num(11)?,
        usr_disg: num(12)?,
        usr_sybl: num(13)?,
        smart_gen: parse_bool(&values[14].0, values[14].1)?,
        generator_seed: parse_number(&values[15].0, values[15].1)?,
    })
}

fn parse_peer(line: &str, line_no: usize) -> Result<PeerSpec> {
    let fields = tuple_fields(line, 4, line_no)?;
    let cleanup: f64 = parse_number(fields[0], line_no)?;
    let honesty: f64 = parse_number(fields[1], line_no)?;
    if !(0.0..=1.0).contains(&cleanup) || !(0.0..=1.0).contains(&honesty) {
        return Err(SimError::malformed(line_no, "probabilities must lie in [0, 1]"));
    }

    let code: u8 = parse_number(fields[2], line_no)?;
    let behavior = Behavior::from_code(code)
        .ok_or_else(|| SimError::malformed(line_no, format!("unknown behavior code {}", code)))?;

    Ok(PeerSpec {
        cleanup,
        honesty,
        behavior,
        pre_trusted: parse_bool(fields[3], line_no)?,
    })
}

/// Split `(a,b,...)` into exactly `arity` trimmed fields
fn tuple_fields(line: &str, arity: usize, line_no: usize) -> Result<Vec<&str>> {
    let inner = line
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| SimError::malformed(line_no, "expected a parenthesised tuple"))?;

    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    if fields.len() != arity {
        return Err(SimError::malformed(
            line_no,
            format!("expected {} fields, found {}", arity, fields.len()),
        ));
    }
    Ok(fields)
}

fn parse_number<T: FromStr>(value: &str, line_no: usize) -> Result<T> {
    value
        .parse()
        .map_err(|_| SimError::malformed(line_no, format!("invalid number '{}'", value)))
}

fn parse_bool(value: &str, line_no: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SimError::malformed(line_no, format!("invalid boolean '{}'", value))),
    }
}

fn parse_index(value: &str, bound: usize, what: &str, line_no: usize) -> Result<usize> {
    let index: usize = parse_number(value, line_no)?;
    if index >= bound {
        return Err(SimError::malformed(
            line_no,
            format!("{} {} out of range (limit {})", what, index, bound),
        ));
    }
    Ok(index)
}

// ============================================================================
// Writing
// ============================================================================

pub fn save_trace(trace: &Trace, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_trace(trace, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn write_trace<W: Write>(trace: &Trace, out: &mut W) -> Result<()> {
    let p = &trace.params;
    writeln!(out, "{} Users", p.num_users)?;
    writeln!(out, "{} Files", p.num_files)?;
    writeln!(out, "{} Transactions", p.num_trans)?;
    writeln!(out, "{} Maximum Connections", p.band_max)?;
    writeln!(out, "{} Cycle Length per Upload-Download", p.band_per)?;
    writeln!(out, "{} Warm-up Transactions", p.warmup)?;
    writeln!(out, "{:.6} Zipf constant", p.zipf)?;
    writeln!(out, "{} Pre-Trusted Users", p.pre_trusted)?;
    writeln!(out, "{} Well-Behaved (Good) Users", p.usr_good)?;
    writeln!(out, "{} Purely Malicious Users", p.usr_pure)?;
    writeln!(out, "{} Feedback Skewing Users", p.usr_feed)?;
    writeln!(out, "{} Malignant Providing Users", p.usr_prov)?;
    writeln!(out, "{} Disguised Malicious Users", p.usr_disg)?;
    writeln!(out, "{} Sybil Attack Users", p.usr_sybl)?;
    writeln!(out, "{} Intelligent Trans. Generation", p.smart_gen)?;
    writeln!(out, "{} Trace Generation Seed", p.generator_seed)?;
    writeln!(out)?;

    for peer in &trace.peers {
        writeln!(
            out,
            "({:.6},{:.6},{},{})",
            peer.cleanup,
            peer.honesty,
            peer.behavior.code(),
            peer.pre_trusted
        )?;
    }
    writeln!(out)?;

    for entry in &trace.library {
        writeln!(out, "({},{},{})", entry.owner, entry.file, entry.valid)?;
    }
    writeln!(out)?;

    for request in &trace.requests {
        writeln!(out, "({},{})", request.receiver, request.file)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
3 Users
2 Files
2 Transactions
2 Maximum Connections
3 Cycle Length per Upload-Download
1 Warm-up Transactions
0.400000 Zipf constant
1 Pre-Trusted Users
1 Well-Behaved (Good) Users
1 Purely Malicious Users
0 Feedback Skewing Users
0 Malignant Providing Users
0 Disguised Malicous Users
1 Sybil Attack Users
true Intelligent Trans. Generation
1234 Trace Generation Seed

(0.900000,1.000000,0,true)
(0.100000,0.000000,1,false)
(0.100000,0.000000,5,false)

(1,0,false)
(2,1,true)

(0,0)
(0,1)
(1,1)
";

    #[test]
    fn test_read_sample() {
        let trace = read_trace(SAMPLE.as_bytes()).unwrap();

        assert_eq!(trace.params.num_users, 3);
        assert_eq!(trace.params.band_per, 3);
        assert_eq!(trace.params.zipf, 0.4);
        assert!(trace.params.smart_gen);
        assert_eq!(trace.params.generator_seed, 1234);

        assert_eq!(trace.peers[0].behavior, Behavior::Good);
        assert!(trace.peers[0].pre_trusted);
        assert_eq!(trace.peers[2].behavior, Behavior::Sybil);
        assert_eq!(trace.library.len(), 2);
        assert_eq!(trace.requests.len(), 3);
        assert_eq!(trace.requests[2], TransactionRequest { receiver: 1, file: 1 });

        let network = trace.build_network();
        assert!(network.has_file(1, 0));
        assert_eq!(network.file_copy_valid(1, 2), Some(true));
    }

    #[test]
    fn test_write_then_read() {
        let trace = read_trace(SAMPLE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_trace(&trace, &mut buffer).unwrap();
        let again = read_trace(buffer.as_slice()).unwrap();
        assert_eq!(again, trace);
    }

    #[test]
    fn test_unknown_behavior_code() {
        let bad = SAMPLE.replace("(0.100000,0.000000,5,false)", "(0.100000,0.000000,9,false)");
        match read_trace(bad.as_bytes()) {
            Err(SimError::MalformedLine { line, .. }) => assert_eq!(line, 20),
            other => panic!("expected malformed line, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_request() {
        let bad = SAMPLE.replace("(1,1)\n", "(7,1)\n");
        assert!(matches!(read_trace(bad.as_bytes()), Err(SimError::MalformedLine { .. })));
    }

    #[test]
    fn test_truncated_trace() {
        let cut = SAMPLE.replace("(1,1)\n", "");
        assert!(matches!(read_trace(cut.as_bytes()), Err(SimError::UnexpectedEof(_))));
    }

    #[test]
    fn test_population_mismatch() {
        let bad = SAMPLE.replace("1 Sybil Attack Users", "0 Sybil Attack Users");
        assert!(matches!(read_trace(bad.as_bytes()), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_excess_pre_trusted_rejected() {
        let bad = SAMPLE.replace("1 Pre-Trusted Users", "2 Pre-Trusted Users");
        assert!(matches!(read_trace(bad.as_bytes()), Err(SimError::InvalidConfig(_))));
    }
}
