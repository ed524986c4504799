//! Current Identity Use Case

use std::sync::Arc;

use crate::domain::entities::Identity;
use crate::domain::repository::AccountRepository;
use crate::error::{VerificationError, VerificationResult};

pub struct CurrentIdentityUseCase<A>
where
    A: AccountRepository,
{
    account_repo: Arc<A>,
}

impl<A> CurrentIdentityUseCase<A>
where
    A: AccountRepository,
{
    pub fn new(account_repo: Arc<A>) -> Self {
        Self { account_repo }
    }

    pub async fn execute(&self, session_token: Option<&str>) -> VerificationResult<Identity> {
        let Some(token) = session_token else {
            return Err(VerificationError::Unauthenticated);
        };

        self.account_repo
            .find_by_session(token)
            .await?
            .ok_or(VerificationError::Unauthenticated)
    }
}
