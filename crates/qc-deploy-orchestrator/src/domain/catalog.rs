//! # Component Catalog
//!
//! Typed interfaces of the component kinds this tool knows how to deploy.
//! The components themselves are black boxes; the catalog only records the
//! constructor and operation signatures so pre-flight validation can catch
//! mistyped plans before anything is created.
//!
//! Kinds missing from the catalog are accepted unchecked.

use super::entities::{ComponentSpec, ConfigurationStep, PlanPosition};
use super::errors::PlanError;
use super::value_objects::Argument;
use std::collections::HashMap;
use std::fmt;

/// Kind name of the access-control registry.
pub const WHITELIST: &str = "Whitelist";
/// Kind name of the rate-limiting policy engine.
pub const TRANSFER_LIMITER: &str = "TransferLimiter";
/// Kind name of the token ledger.
pub const STABLE_COIN: &str = "StableCoin";

/// ABI-level parameter type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// 20-byte address.
    Address,
    /// 256-bit unsigned integer.
    Uint,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Struct encoded as a tuple.
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Type of the `LimitConfig` struct.
    #[must_use]
    pub fn limits() -> Self {
        Self::Tuple(vec![Self::Uint, Self::Uint, Self::Uint, Self::Uint])
    }

    /// Type an argument resolves to. References resolve to addresses.
    #[must_use]
    pub fn of(arg: &Argument) -> Self {
        match arg {
            Argument::Ref(_) | Argument::Address(_) => Self::Address,
            Argument::Uint(_) => Self::Uint,
            Argument::Bool(_) => Self::Bool,
            Argument::String(_) => Self::String,
            Argument::Limits(_) => Self::limits(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Uint => f.write_str("uint256"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Constructor and operation signatures of one component kind.
#[derive(Clone, Debug, Default)]
pub struct ComponentInterface {
    /// Constructor parameter types, in order.
    pub constructor: Vec<ParamType>,
    /// Operation name to parameter types.
    pub operations: HashMap<String, Vec<ParamType>>,
}

impl ComponentInterface {
    /// Interface with the given constructor and no operations.
    #[must_use]
    pub fn with_constructor(constructor: Vec<ParamType>) -> Self {
        Self {
            constructor,
            operations: HashMap::new(),
        }
    }

    /// Adds an operation signature.
    #[must_use]
    pub fn operation(mut self, name: &str, params: Vec<ParamType>) -> Self {
        self.operations.insert(name.to_string(), params);
        self
    }
}

/// Registry of known component interfaces keyed by kind.
#[derive(Clone, Debug, Default)]
pub struct ComponentCatalog {
    interfaces: HashMap<String, ComponentInterface>,
}

impl ComponentCatalog {
    /// Catalog that knows no kinds (every plan passes type checks).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog of the registry, limiter and ledger components.
    #[must_use]
    pub fn standard() -> Self {
        use ParamType::{Address, Bool, String, Uint};

        Self::empty()
            .register(
                WHITELIST,
                ComponentInterface::with_constructor(vec![Bool])
                    .operation("authorizeContract", vec![Address])
                    .operation("addToWhitelist", vec![Address])
                    .operation("removeFromWhitelist", vec![Address])
                    .operation("setWhitelistingEnabled", vec![Bool]),
            )
            .register(
                TRANSFER_LIMITER,
                ComponentInterface::with_constructor(vec![])
                    .operation("setAllDefaultLimits", vec![Address, ParamType::limits()])
                    .operation("setExemption", vec![Address, Address, Bool])
                    .operation("authorizeContract", vec![Address]),
            )
            .register(
                STABLE_COIN,
                ComponentInterface::with_constructor(vec![String, String, Uint, Address, Address]),
            )
    }

    /// Adds or replaces the interface of `kind`.
    #[must_use]
    pub fn register(mut self, kind: &str, interface: ComponentInterface) -> Self {
        self.interfaces.insert(kind.to_string(), interface);
        self
    }

    /// Interface of `kind`, if known.
    #[must_use]
    pub fn interface(&self, kind: &str) -> Option<&ComponentInterface> {
        self.interfaces.get(kind)
    }

    /// Checks a component's constructor arguments against its kind.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` or `TypeMismatch` for known kinds.
    pub fn check_constructor(
        &self,
        spec: &ComponentSpec,
        position: PlanPosition,
    ) -> Result<(), PlanError> {
        let Some(interface) = self.interface(&spec.kind) else {
            return Ok(());
        };
        let args: Vec<&Argument> = spec.constructor_params.iter().map(|p| &p.value).collect();
        check_signature(
            &format!("{}(constructor)", spec.kind),
            &interface.constructor,
            &args,
            position,
        )
    }

    /// Checks a step against the interface of its target's kind.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation`, `ArityMismatch` or `TypeMismatch` for
    /// known kinds.
    pub fn check_step(
        &self,
        target_kind: &str,
        step: &ConfigurationStep,
        position: PlanPosition,
    ) -> Result<(), PlanError> {
        let Some(interface) = self.interface(target_kind) else {
            return Ok(());
        };
        let params = interface.operations.get(&step.operation).ok_or_else(|| {
            PlanError::UnknownOperation {
                position,
                kind: target_kind.to_string(),
                operation: step.operation.clone(),
            }
        })?;
        let args: Vec<&Argument> = step.args.iter().collect();
        check_signature(
            &format!("{target_kind}.{}", step.operation),
            params,
            &args,
            position,
        )
    }
}

fn check_signature(
    signature: &str,
    params: &[ParamType],
    args: &[&Argument],
    position: PlanPosition,
) -> Result<(), PlanError> {
    if params.len() != args.len() {
        return Err(PlanError::ArityMismatch {
            position,
            signature: signature.to_string(),
            expected: params.len(),
            actual: args.len(),
        });
    }
    for (index, (expected, arg)) in params.iter().zip(args).enumerate() {
        let actual = ParamType::of(arg);
        if &actual != expected {
            return Err(PlanError::TypeMismatch {
                position,
                signature: signature.to_string(),
                index,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}
