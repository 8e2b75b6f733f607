use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Candidate, CandidateId, VotingError, VotingService};

/// Shared in-process voting book.
///
/// Candidates are kept in nomination order; each account may vote once.
#[derive(Debug, Default)]
struct VotingBook {
    candidates: Vec<Candidate>,
    // map of spent votes [account_id, candidate_id]
    votes: HashMap<String, CandidateId>,
}

/// In-process implementation of the voting contract, used for development
/// sessions without a deployed contract and for tests. Handles created with
/// [`LocalVotingService::for_account`] share one book, so several accounts
/// can act against the same candidate set.
#[derive(Clone, Debug)]
pub struct LocalVotingService {
    book: Arc<RwLock<VotingBook>>,
    account_id: String,
}

impl LocalVotingService {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            book: Arc::new(RwLock::new(VotingBook::default())),
            account_id: account_id.into(),
        }
    }

    /// Another handle to the same book, signing as a different account.
    pub fn for_account(&self, account_id: impl Into<String>) -> Self {
        Self {
            book: Arc::clone(&self.book),
            account_id: account_id.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl VotingService for LocalVotingService {
    async fn view_candidates(&self, _account_id: &str) -> Result<Vec<Candidate>, VotingError> {
        Ok(self.book.read().await.candidates.clone())
    }

    async fn add_candidate(
        &self,
        candidate_id: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<(), VotingError> {
        let mut book = self.book.write().await;
        if book
            .candidates
            .iter()
            .any(|c| c.candidate_id == candidate_id)
        {
            return Err(VotingError::CandidateAlreadyExists(candidate_id.to_string()));
        }
        book.candidates.push(Candidate {
            candidate_id: candidate_id.to_string(),
            metadata,
            votes: 0,
        });
        Ok(())
    }

    async fn vote(&self, candidate_id: &str) -> Result<(), VotingError> {
        let mut book = self.book.write().await;
        if book.votes.contains_key(&self.account_id) {
            return Err(VotingError::AlreadyVoted);
        }
        let candidate = book
            .candidates
            .iter_mut()
            .find(|c| c.candidate_id == candidate_id)
            .ok_or_else(|| VotingError::UnknownCandidate(candidate_id.to_string()))?;
        candidate.votes += 1;
        let voter = self.account_id.clone();
        book.votes.insert(voter, candidate_id.to_string());
        Ok(())
    }
}
