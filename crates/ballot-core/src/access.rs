use crate::error::BallotError;
use crate::identity::Identity;
use crate::voters::VoterRegistry;

/// Caller authorization checks. Pure predicates, no side effects.
#[derive(Debug, Clone)]
pub struct AccessGate {
    administrator: Identity,
}

impl AccessGate {
    pub fn new(administrator: Identity) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    pub fn require_admin(&self, caller: &Identity) -> Result<(), BallotError> {
        if caller != &self.administrator {
            return Err(BallotError::not_owner());
        }
        Ok(())
    }

    pub fn require_registered_voter(
        &self,
        caller: &Identity,
        voters: &VoterRegistry,
    ) -> Result<(), BallotError> {
        if !voters.is_registered(caller) {
            return Err(BallotError::not_voter());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_administrator_passes_admin_check() {
        let gate = AccessGate::new(Identity::new("owner"));
        assert!(gate.require_admin(&Identity::new("owner")).is_ok());
        assert_eq!(
            gate.require_admin(&Identity::new("voter1")).unwrap_err(),
            BallotError::Unauthorized("Ownable: caller is not the owner".into())
        );
    }

    #[test]
    fn administrator_is_not_implicitly_a_voter() {
        let gate = AccessGate::new(Identity::new("owner"));
        let mut voters = VoterRegistry::new();
        voters.register(Identity::new("voter1")).unwrap();

        assert!(gate
            .require_registered_voter(&Identity::new("voter1"), &voters)
            .is_ok());
        assert_eq!(
            gate.require_registered_voter(&Identity::new("owner"), &voters)
                .unwrap_err()
                .message(),
            "You're not a voter"
        );
    }
}
