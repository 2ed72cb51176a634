//! # Provisioner
//!
//! Creates one component: substitutes constructor references from the
//! resolution table, issues a single `create` and waits for it to confirm.

use crate::domain::{resolve_constructor, ComponentSpec, DeployError, ProvisionRecord, ResolutionTable};
use crate::ports::outbound::ExecutionPrimitive;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Creates components through an [`ExecutionPrimitive`].
pub struct Provisioner<E> {
    primitive: Arc<E>,
}

impl<E: ExecutionPrimitive> Provisioner<E> {
    /// Creates a provisioner over a shared primitive.
    pub fn new(primitive: Arc<E>) -> Self {
        Self { primitive }
    }

    /// Provisions `spec`.
    ///
    /// Does not mutate `resolved`. No external call is issued when a
    /// constructor reference is unresolved.
    ///
    /// # Errors
    ///
    /// - `UnresolvedDependency` if a referenced component has no address.
    /// - `ProvisioningFailed` if the external system does not confirm.
    #[instrument(skip_all, fields(component = %spec.id, kind = %spec.kind))]
    pub async fn provision(
        &self,
        spec: &ComponentSpec,
        resolved: &ResolutionTable,
    ) -> Result<ProvisionRecord, DeployError> {
        let args = resolve_constructor(spec, resolved)?;
        debug!(args = ?args, "Resolved constructor arguments");

        info!("Deploying {}...", spec.display());
        let (address, confirmation) =
            self.primitive
                .create(&spec.kind, &args)
                .await
                .map_err(|err| {
                    warn!(error = %err, "Creation failed");
                    DeployError::ProvisioningFailed {
                        component: spec.id.clone(),
                        cause: err.into(),
                    }
                })?;

        info!(
            %address,
            block = confirmation.block_number,
            "{} deployed",
            spec.display()
        );
        Ok(ProvisionRecord {
            component: spec.id.clone(),
            kind: spec.kind.clone(),
            address,
            confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Fault, InMemoryChain};
    use crate::domain::{Address, Argument, FailureCause, Value};

    fn setup() -> (Arc<InMemoryChain>, Provisioner<InMemoryChain>) {
        let chain = Arc::new(InMemoryChain::new(Address::new([0xde; 20])));
        (Arc::clone(&chain), Provisioner::new(chain))
    }

    #[tokio::test]
    async fn test_provision_substitutes_references() {
        let (chain, provisioner) = setup();
        let mut resolved = ResolutionTable::new();
        let registry = Address::new([0x01; 20]);
        resolved.insert("registry".into(), registry).unwrap();

        let spec = ComponentSpec::new("ledger", "StableCoin")
            .param("symbol", Argument::String("OSC".into()))
            .param("whitelist", Argument::reference("registry"));
        let record = provisioner.provision(&spec, &resolved).await.unwrap();

        assert_eq!(record.component, "ledger".into());
        assert_eq!(chain.component_kind(&record.address).as_deref(), Some("StableCoin"));
        assert!(!resolved.contains(&"ledger".into()));

        let calls = chain.calls();
        assert!(matches!(
            &calls[0],
            crate::adapters::RecordedCall::Create { args, .. }
                if args == &vec![Value::String("OSC".into()), Value::Address(registry)]
        ));
    }

    #[tokio::test]
    async fn test_unresolved_reference_issues_no_call() {
        let (chain, provisioner) = setup();
        let spec = ComponentSpec::new("ledger", "StableCoin")
            .param("whitelist", Argument::reference("registry"));

        let err = provisioner
            .provision(&spec, &ResolutionTable::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DeployError::UnresolvedDependency {
                referenced: "registry".into(),
                needed_by: "ledger".into(),
            }
        );
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_maps_to_provisioning_failed() {
        let (chain, provisioner) = setup();
        chain.inject(Fault::on_create("StableCoin").reject("out of gas"));

        let err = provisioner
            .provision(&ComponentSpec::new("ledger", "StableCoin"), &ResolutionTable::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DeployError::ProvisioningFailed {
                component: "ledger".into(),
                cause: FailureCause::Rejected {
                    reason: "out of gas".into()
                },
            }
        );
    }
}
