/// Supplies the stable id scores are filed under
pub trait IdentityProvider {
    fn player_id(&self) -> Option<String>;
}

/// An id chosen up front (CLI flag or config file); surrounding blanks are dropped
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(pub Option<String>);

impl IdentityProvider for FixedIdentity {
    fn player_id(&self) -> Option<String> {
        self.0
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
    }
}

/// `FCTAP_PLAYER`, falling back to the login name in `USER`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvIdentity;

impl EnvIdentity {
    pub const VAR: &'static str = "FCTAP_PLAYER";

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        [Self::VAR, "USER"]
            .iter()
            .filter_map(|var| lookup(var))
            .map(|id| id.trim().to_string())
            .find(|id| !id.is_empty())
    }
}

impl IdentityProvider for EnvIdentity {
    fn player_id(&self) -> Option<String> {
        Self::resolve(|var| std::env::var(var).ok())
    }
}

/// First provider that yields an id wins
pub struct ChainedIdentity(pub Vec<Box<dyn IdentityProvider>>);

impl IdentityProvider for ChainedIdentity {
    fn player_id(&self) -> Option<String> {
        self.0.iter().find_map(|provider| provider.player_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn fixed_identity() {
        assert_eq!(
            FixedIdentity(Some("ada".into())).player_id().as_deref(),
            Some("ada")
        );
        assert_eq!(FixedIdentity(None).player_id(), None);
    }

    #[test]
    fn env_prefers_explicit_player_var() {
        let env: HashMap<&str, &str> = [("FCTAP_PLAYER", "tapper"), ("USER", "root")].into();
        let id = EnvIdentity::resolve(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(id.as_deref(), Some("tapper"));
    }

    #[test]
    fn env_skips_blank_values() {
        let env: HashMap<&str, &str> = [("FCTAP_PLAYER", "  "), ("USER", "root")].into();
        let id = EnvIdentity::resolve(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(id.as_deref(), Some("root"));

        let empty: HashMap<&str, &str> = HashMap::new();
        assert_eq!(EnvIdentity::resolve(|k| empty.get(k).map(|v| v.to_string())), None);
    }

    #[test]
    fn fixed_identity_is_trimmed() {
        assert_eq!(
            FixedIdentity(Some("  ada ".into())).player_id().as_deref(),
            Some("ada")
        );
        assert_eq!(FixedIdentity(Some("   ".into())).player_id(), None);
    }

    #[test]
    fn blank_fixed_id_falls_through_the_chain() {
        let chain = ChainedIdentity(vec![
            Box::new(FixedIdentity(Some(" ".into()))),
            Box::new(FixedIdentity(Some("bob".into()))),
        ]);
        assert_eq!(chain.player_id().as_deref(), Some("bob"));
    }

    #[test]
    fn chain_falls_through_to_next_provider() {
        let chain = ChainedIdentity(vec![
            Box::new(FixedIdentity(None)),
            Box::new(FixedIdentity(Some("bob".into()))),
        ]);
        assert_eq!(chain.player_id().as_deref(), Some("bob"));
    }
}
