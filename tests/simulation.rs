use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tm_rust::tm_trace::{LibraryEntry, PeerSpec};
use tm_rust::{
    load_trace, report_path, save_report, save_trace, Algorithm, Behavior, MaliciousStrategy,
    SimError, SimParams, SimResult, Simulator, Trace, TransactionRequest,
};

// ============================================================================
// Synthetic workloads
// ============================================================================

/// Population of 12 good peers (3 pre-trusted), 6 purely malicious peers and
/// 2 sybils. Every file has one valid copy on a good peer and one invalid
/// copy on a malicious peer.
fn mixed_trace(seed: u64) -> Trace {
    let params = SimParams {
        num_users: 20,
        num_files: 30,
        num_trans: 400,
        band_max: 3,
        band_per: 2,
        warmup: 200,
        zipf: 0.4,
        pre_trusted: 3,
        usr_good: 12,
        usr_pure: 6,
        usr_sybl: 2,
        generator_seed: seed,
        ..Default::default()
    };

    let mut peers = Vec::new();
    for i in 0..12 {
        peers.push(PeerSpec {
            cleanup: 1.0,
            honesty: 1.0,
            behavior: Behavior::Good,
            pre_trusted: i < 3,
        });
    }
    for _ in 0..6 {
        peers.push(PeerSpec {
            cleanup: 0.0,
            honesty: 0.0,
            behavior: Behavior::PurelyMalicious,
            pre_trusted: false,
        });
    }
    for _ in 0..2 {
        peers.push(PeerSpec {
            cleanup: 0.0,
            honesty: 0.0,
            behavior: Behavior::Sybil,
            pre_trusted: false,
        });
    }

    let mut library = Vec::new();
    for file in 0..params.num_files {
        library.push(LibraryEntry {
            owner: file % 12,
            file,
            valid: true,
        });
        library.push(LibraryEntry {
            owner: 12 + file % 8,
            file,
            valid: false,
        });
    }

    let requests = random_requests(&params, seed);
    Trace {
        params,
        peers,
        library,
        requests,
    }
}

fn random_requests(params: &SimParams, seed: u64) -> Vec<TransactionRequest> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..params.total_requests())
        .map(|_| TransactionRequest {
            receiver: rng.gen_range(0..params.num_users),
            file: rng.gen_range(0..params.num_files),
        })
        .collect()
}

fn replay(trace: &Trace, algorithm: Algorithm, strategy: MaliciousStrategy, seed: u64) -> SimResult {
    Simulator::new(
        trace.params.clone(),
        trace.build_network(),
        algorithm,
        strategy,
        Some(seed),
    )
    .run(&trace.requests)
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_every_algorithm_and_strategy_completes() {
    let trace = mixed_trace(11);
    let total = trace.params.total_requests() as u64;

    for algorithm in Algorithm::ALL {
        for strategy in MaliciousStrategy::ALL {
            let result = replay(&trace, algorithm, strategy, 5);
            let attempted = result.attempted();

            assert_eq!(attempted, 400);
            assert_eq!(result.extension, algorithm.short_name());
            assert_eq!(result.strategy, strategy);
            assert!(result.stats.incomplete() <= attempted);
            assert!(result.stats.valid(attempted) <= result.stats.completed(attempted));
            assert!(result.final_cycle >= total);

            let rate = result.stats.good_success_rate();
            assert!((0.0..=1.0).contains(&rate), "{} / {:?}", result.algorithm, strategy);
        }
    }
}

#[test]
fn test_same_seed_gives_identical_reports() {
    let trace = mixed_trace(3);
    let dir = tempfile::tempdir().unwrap();

    let first = replay(&trace, Algorithm::EigenTrust, MaliciousStrategy::Collective, 99);
    let second = replay(&trace, Algorithm::EigenTrust, MaliciousStrategy::Collective, 99);
    assert_eq!(first.stats, second.stats);
    assert_eq!(first.final_cycle, second.final_cycle);

    let a = dir.path().join("a.eigen");
    let b = dir.path().join("b.eigen");
    save_report(&first, &a).unwrap();
    save_report(&second, &b).unwrap();

    let bytes = fs::read(&a).unwrap();
    assert_eq!(bytes, fs::read(&b).unwrap());

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains(">Simulator Rand Seed:    99\n"));
    assert!(text.contains(">Simulator used:         EigenTrust\n"));
    assert!(text.contains(">Malicious strategy:     Collective\n"));
}

#[test]
fn test_eigentrust_steers_good_peers_to_valid_sources() {
    let trace = mixed_trace(21);

    let blind = replay(&trace, Algorithm::None, MaliciousStrategy::Naive, 8);
    let eigen = replay(&trace, Algorithm::EigenTrust, MaliciousStrategy::Naive, 8);

    assert!(blind.stats.good_total() > 0);
    assert!(
        eigen.stats.good_success_rate() > blind.stats.good_success_rate(),
        "eigen {:.3} vs none {:.3}",
        eigen.stats.good_success_rate(),
        blind.stats.good_success_rate()
    );
}

#[test]
fn test_sybil_only_sources_produce_no_feedback() {
    let mut trace = mixed_trace(4);
    // good peers discard invalid files, so sybils stay the only sources
    trace.params.usr_good = 18;
    trace.params.usr_pure = 0;
    for peer in trace.peers[12..18].iter_mut() {
        peer.behavior = Behavior::Good;
        peer.cleanup = 1.0;
        peer.honesty = 1.0;
    }
    trace.library = (0..trace.params.num_files)
        .map(|file| LibraryEntry {
            owner: 18 + file % 2,
            file,
            valid: false,
        })
        .collect();

    for algorithm in [Algorithm::EigenTrust, Algorithm::TnaSl, Algorithm::PeerTrust] {
        let result = replay(&trace, algorithm, MaliciousStrategy::Isolated, 2);
        assert_eq!(result.stats.feedback_truthful, 0);
        assert_eq!(result.stats.feedback_lies, 0);
        assert!(result.stats.feedback_sybil > 0);
        assert_eq!(result.stats.good_successes, 0);
        assert!(result.stats.good_failures <= result.stats.invalid_trans);
    }
}

#[test]
fn test_clean_network_never_fails_good_peers() {
    let mut trace = mixed_trace(6);
    trace.params.usr_good = 20;
    trace.params.usr_pure = 0;
    trace.params.usr_sybl = 0;
    for peer in trace.peers.iter_mut() {
        peer.behavior = Behavior::Good;
        peer.honesty = 1.0;
    }
    trace.library.retain(|entry| entry.valid);

    for algorithm in Algorithm::ALL {
        let result = replay(&trace, algorithm, MaliciousStrategy::Naive, 1);
        assert_eq!(result.stats.invalid_trans, 0);
        assert_eq!(result.stats.good_failures, 0);
        assert_eq!(result.stats.feedback_lies, 0);
        assert_eq!(result.stats.feedback_sybil, 0);
    }
}

#[test]
fn test_trace_file_round_trip() {
    let trace = mixed_trace(17);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.trace");

    save_trace(&trace, &path).unwrap();
    let loaded = load_trace(&path).unwrap();
    assert_eq!(loaded, trace);

    // a reloaded trace replays exactly like the in-memory one
    let in_memory = replay(&trace, Algorithm::TnaSl, MaliciousStrategy::Naive, 4);
    let reloaded = replay(&loaded, Algorithm::TnaSl, MaliciousStrategy::Naive, 4);
    assert_eq!(in_memory.stats, reloaded.stats);

    let report = report_path(&path, reloaded.extension);
    save_report(&reloaded, &report).unwrap();
    assert_eq!(report.file_name().unwrap(), "mixed.tnasl");
    assert!(report.exists());
}

#[test]
fn test_missing_trace_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.trace");
    assert!(matches!(load_trace(&missing), Err(SimError::Io(_))));
}

#[test]
fn test_short_trace_is_rejected() {
    let mut trace = mixed_trace(2);
    trace.requests.truncate(10);
    let simulator = Simulator::new(
        trace.params.clone(),
        trace.build_network(),
        Algorithm::None,
        MaliciousStrategy::Naive,
        Some(1),
    );
    assert!(matches!(
        simulator.run(&trace.requests),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn test_bundled_sample_trace_replays() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("traces/sample.trace");
    let trace = load_trace(&path).unwrap();
    assert_eq!(trace.params.num_users, 8);
    assert_eq!(trace.requests.len(), 18);

    let result = replay(&trace, Algorithm::EigenTrustIncremental, MaliciousStrategy::Collective, 42);
    assert_eq!(result.attempted(), 12);
    assert_eq!(result.algorithm, "EigenTrust-Incremental");
}
