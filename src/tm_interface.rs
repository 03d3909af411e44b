// all peers and files are dense indices into the network tables
pub type PeerId = usize;
pub type FileId = usize;

// discrete simulation time; one transaction slot per cycle
pub type Cycle = u64;

/// Number of header lines at the top of a trace file
pub const TRACE_HEADER_LINES: usize = 16;

/// Progress is logged every this many transactions
pub const PROGRESS_INTERVAL: usize = 500;

// ============================================================================
// Peer Behavior
// ============================================================================

/// Behavior model a peer conforms to for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Shares valid files, always reports truthful feedback
    Good,
    /// Shares invalid files and lies in feedback
    PurelyMalicious,
    /// Keeps files clean but lies in feedback
    FeedbackMalicious,
    /// Shares invalid files but reports truthful feedback
    MaliciousProvider,
    /// Behaves well just often enough to blend in
    DisguisedMalicious,
    /// Identity whose transactions never produce feedback
    Sybil,
    Unknown,
}

impl Behavior {
    /// Integer code used by the trace format (0-6)
    pub fn code(&self) -> u8 {
        match self {
            Behavior::Good => 0,
            Behavior::PurelyMalicious => 1,
            Behavior::FeedbackMalicious => 2,
            Behavior::MaliciousProvider => 3,
            Behavior::DisguisedMalicious => 4,
            Behavior::Sybil => 5,
            Behavior::Unknown => 6,
        }
    }

    /// Inverse of [`Behavior::code`]. Codes above 6 are not part of the format.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Behavior::Good),
            1 => Some(Behavior::PurelyMalicious),
            2 => Some(Behavior::FeedbackMalicious),
            3 => Some(Behavior::MaliciousProvider),
            4 => Some(Behavior::DisguisedMalicious),
            5 => Some(Behavior::Sybil),
            6 => Some(Behavior::Unknown),
            _ => None,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Behavior::Good)
    }

    pub fn is_sybil(&self) -> bool {
        matches!(self, Behavior::Sybil)
    }
}

// ============================================================================
// Feedback Histories
// ============================================================================

/// Which of the two parallel feedback histories of a relation is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackHistory {
    /// Publicly broadcast feedback, possibly dishonest
    #[default]
    Global,
    /// Ground truth of every interaction
    Honest,
}

/// Per-source selection of the feedback history a trust algorithm observes.
///
/// Entry `i` decides which history the relation row of peer `i` (peer i's view
/// of everybody else) exposes. The public view exposes `Global` everywhere;
/// colluding peers are modelled by handing the trust algorithm a view in which
/// their rows expose `Honest` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    rows: Vec<FeedbackHistory>,
}

impl FeedbackView {
    /// View where every row exposes globally broadcast feedback
    pub fn public(num_peers: usize) -> Self {
        Self {
            rows: vec![FeedbackHistory::Global; num_peers],
        }
    }

    /// Copy of this view with the rows of `sources` switched to honest feedback
    pub fn with_honest(&self, sources: &[PeerId]) -> Self {
        let mut rows = self.rows.clone();
        for &source in sources {
            rows[source] = FeedbackHistory::Honest;
        }
        Self { rows }
    }

    /// History exposed by the relation row of `source`
    pub fn history(&self, source: PeerId) -> FeedbackHistory {
        self.rows[source]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// A request read from the trace: `receiver` wants `file`.
/// Sender and validity are decided at simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRequest {
    pub receiver: PeerId,
    pub file: FileId,
}

/// A file transfer that has been granted bandwidth and waits in the delay
/// queue until `commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub commit: Cycle,
    pub sender: PeerId,
    pub receiver: PeerId,
    pub file: FileId,
    pub valid: bool,
}

impl Transaction {
    /// Marker transaction telling a trust algorithm that the relation
    /// `receiver -> sender` changed its visible history and derived state
    /// must be rebuilt. It never carries a file.
    pub fn view_change(sender: PeerId, receiver: PeerId) -> Self {
        Self {
            commit: 0,
            sender,
            receiver,
            file: 0,
            valid: false,
        }
    }
}
