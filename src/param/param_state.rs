use bumpalo::collections::Vec as BumpVec;
use log::debug;

use super::LOGGING_TARGET;
use crate::analyzer::{BindError, ParamRefHook, ParseState};
use crate::memory::MemoryContext;
use crate::types::LogicalType;

/// The highest parameter number accepted by default, the most a protocol
/// Bind message can carry.
pub const DEFAULT_MAX_PARAMS: usize = u16::MAX as usize;

/// Parameter types of a statement whose parameters are discovered while it
/// is analyzed. The type array lives in the given memory context and grows
/// as higher-numbered parameters are referenced.
pub struct ParamState<'ctx> {
    /// array of parameter types, `num_params` entries
    param_types: BumpVec<'ctx, LogicalType>,
    memory_context: &'ctx MemoryContext,
    max_params: usize,
}

impl<'ctx> ParamState<'ctx> {
    pub fn new(memory_context: &'ctx MemoryContext) -> Self {
        Self::with_types(memory_context, &[])
    }

    /// Start from declared types; undeclared parameters may still be added.
    pub fn with_types(memory_context: &'ctx MemoryContext, types: &[LogicalType]) -> Self {
        let mut param_types = BumpVec::with_capacity_in(types.len(), memory_context.arena());
        param_types.extend_from_slice(types);
        Self {
            param_types,
            memory_context,
            max_params: DEFAULT_MAX_PARAMS,
        }
    }

    pub fn with_max_params(mut self, max_params: usize) -> Self {
        self.max_params = max_params;
        self
    }

    pub fn param_types(&self) -> &[LogicalType] {
        &self.param_types
    }

    pub fn num_params(&self) -> usize {
        self.param_types.len()
    }

    pub fn memory_context(&self) -> &'ctx MemoryContext {
        self.memory_context
    }
}

impl std::fmt::Debug for ParamState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamState")
            .field("param_types", &self.param_types())
            .field("memory_context", &self.memory_context.name())
            .finish()
    }
}

/// Install hooks on `pstate` that record the type of every parameter the
/// statement uses into `state`.
pub fn variable_param_setup<'a, 'ctx: 'a>(
    pstate: &mut ParseState<'a>,
    state: &'a mut ParamState<'ctx>,
) {
    pstate.set_param_hook(Box::new(VariableParamHook { state }));
}

/// Install hooks on `pstate` for a statement whose parameter types are all
/// given up front.
pub fn fixed_param_setup<'a>(pstate: &mut ParseState<'a>, param_types: &'a [LogicalType]) {
    pstate.set_param_hook(Box::new(FixedParamHook { param_types }));
}

struct VariableParamHook<'a, 'ctx> {
    state: &'a mut ParamState<'ctx>,
}

impl ParamRefHook for VariableParamHook<'_, '_> {
    fn param_ref(&mut self, paramno: usize) -> Result<LogicalType, BindError> {
        if paramno == 0 || paramno > self.state.max_params {
            return Err(BindError::NoSuchParameter(paramno));
        }
        let param_types = &mut self.state.param_types;
        if paramno > param_types.len() {
            // slots of skipped parameters stay Invalid
            param_types.resize(paramno, LogicalType::Invalid);
        }
        let slot = &mut param_types[paramno - 1];
        if *slot == LogicalType::Invalid {
            *slot = LogicalType::Unknown;
        }
        Ok(*slot)
    }

    fn coerce_param(
        &mut self,
        paramno: usize,
        target: LogicalType,
    ) -> Result<LogicalType, BindError> {
        if paramno == 0 || paramno > self.state.param_types.len() {
            return Err(BindError::NoSuchParameter(paramno));
        }
        let slot = &mut self.state.param_types[paramno - 1];
        match *slot {
            LogicalType::Invalid | LogicalType::Unknown => {
                debug!(
                    target: LOGGING_TARGET,
                    "parameter ${} resolved to {}", paramno, target
                );
                *slot = target;
                Ok(target)
            }
            ty if ty == target => Ok(ty),
            previous => Err(BindError::InconsistentParameterTypes {
                paramno,
                previous,
                current: target,
            }),
        }
    }

    fn check_params(&self) -> Result<(), BindError> {
        check_resolved(self.state.param_types())
    }
}

struct FixedParamHook<'a> {
    param_types: &'a [LogicalType],
}

impl ParamRefHook for FixedParamHook<'_> {
    fn param_ref(&mut self, paramno: usize) -> Result<LogicalType, BindError> {
        if paramno == 0 || paramno > self.param_types.len() {
            return Err(BindError::NoSuchParameter(paramno));
        }
        Ok(self.param_types[paramno - 1])
    }

    fn coerce_param(
        &mut self,
        paramno: usize,
        target: LogicalType,
    ) -> Result<LogicalType, BindError> {
        let declared = self.param_ref(paramno)?;
        if declared == target {
            Ok(declared)
        } else {
            Err(BindError::InconsistentParameterTypes {
                paramno,
                previous: declared,
                current: target,
            })
        }
    }

    fn check_params(&self) -> Result<(), BindError> {
        check_resolved(self.param_types)
    }
}

fn check_resolved(param_types: &[LogicalType]) -> Result<(), BindError> {
    match param_types.iter().position(|ty| !ty.is_resolved()) {
        Some(idx) => Err(BindError::UndeterminedParameterType(idx + 1)),
        None => Ok(()),
    }
}
