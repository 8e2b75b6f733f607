use std::collections::HashMap;
use std::str::FromStr;

use alloy::{
    network::Network, primitives::Address, providers::Provider, sol, transports::Transport,
};

use crate::{VotingError, VotingService};

sol! {
    #[sol(rpc)]
    contract VotingRegistry {
        struct Candidate {
            string candidateId;
            uint256 votes;
        }

        function addCandidate(string candidateId) external;
        function vote(string candidateId) external;
        function viewCandidates(address voter) external view returns (Candidate[] memory);
    }
}

/// Voting contract client over a wallet-carrying provider.
pub struct ScVotingService<T, P, N> {
    instance: VotingRegistry::VotingRegistryInstance<T, P, N>,
    address: String,
}

impl<T, P, N> ScVotingService<T, P, N>
where
    T: Transport + Clone,
    P: Provider<T, N>,
    N: Network,
{
    pub fn new(provider: P, address: Address) -> Self {
        Self {
            instance: VotingRegistry::new(address, provider),
            address: address.to_string(),
        }
    }

    pub fn contract_address(&self) -> String {
        self.address.clone()
    }
}

impl<T: Transport + Clone, P: Provider<T, N>, N: Network> VotingService
    for ScVotingService<T, P, N>
{
    async fn view_candidates(&self, account_id: &str) -> Result<Vec<crate::Candidate>, VotingError> {
        let voter = Address::from_str(account_id)?;
        let res = self.instance.viewCandidates(voter).call().await?;
        res._0
            .into_iter()
            .map(|c| {
                let votes = u128::try_from(c.votes).map_err(|_| {
                    VotingError::InvalidContractData(format!(
                        "vote count for {} exceeds u128",
                        c.candidateId
                    ))
                })?;
                Ok(crate::Candidate {
                    candidate_id: c.candidateId,
                    // The deployed registry does not carry candidate metadata.
                    metadata: None,
                    votes,
                })
            })
            .collect()
    }

    async fn add_candidate(
        &self,
        candidate_id: &str,
        _metadata: Option<HashMap<String, String>>,
    ) -> Result<(), VotingError> {
        let call = self.instance.addCandidate(candidate_id.to_string());
        call.send().await?.watch().await?;
        Ok(())
    }

    async fn vote(&self, candidate_id: &str) -> Result<(), VotingError> {
        let call = self.instance.vote(candidate_id.to_string());
        call.send().await?.watch().await?;
        Ok(())
    }
}
