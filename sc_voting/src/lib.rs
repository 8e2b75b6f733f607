pub mod local_voting;
pub mod sc_voting;

use std::collections::HashMap;

use alloy::hex::FromHexError;
use serde::{Deserialize, Serialize};

pub type CandidateId = String;

/// A nominee as reported by the voting contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: CandidateId,
    pub metadata: Option<HashMap<String, String>>,
    pub votes: u128,
}

impl Candidate {
    pub fn new(candidate_id: impl Into<CandidateId>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            metadata: None,
            votes: 0,
        }
    }
}

/// Client-side view of the deployed voting contract.
///
/// `view_candidates` is a read-only query; `add_candidate` and `vote` are
/// mutating calls that settle on-chain and may fail. Implementations are
/// bound to the account that signs the calls.
pub trait VotingService {
    fn view_candidates(
        &self,
        account_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, VotingError>> + Send;
    fn add_candidate(
        &self,
        candidate_id: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> impl std::future::Future<Output = Result<(), VotingError>> + Send;
    fn vote(
        &self,
        candidate_id: &str,
    ) -> impl std::future::Future<Output = Result<(), VotingError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum VotingError {
    #[error("candidate {0} already exists")]
    CandidateAlreadyExists(CandidateId),
    #[error("candidate {0} does not exist")]
    UnknownCandidate(CandidateId),
    #[error("you can only vote once")]
    AlreadyVoted,
    #[error("{0}")]
    ContractRejected(String),
    #[error("contract returned invalid data: {0}")]
    InvalidContractData(String),
    #[error("Alloy contract error: {0}")]
    AlloyError(#[from] alloy::contract::Error),
    #[error("Transaction was not included: {0}")]
    PendingTransactionError(#[from] alloy::providers::PendingTransactionError),
    #[error("Unable to parse the address: {0}")]
    AlloyFromHexError(#[from] FromHexError),
    #[error("Unknown error: {0}")]
    Other(anyhow::Error),
}
