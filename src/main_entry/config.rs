use derive_builder::Builder;

use crate::param::DEFAULT_MAX_PARAMS;

#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Infer the types of undeclared `PREPARE` parameters. When disabled
    /// every parameter must be declared.
    #[builder(default = "true")]
    pub(crate) variable_params: bool,
    /// The highest parameter number a statement may use.
    #[builder(default = "DEFAULT_MAX_PARAMS")]
    pub(crate) max_params: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            variable_params: true,
            max_params: DEFAULT_MAX_PARAMS,
        }
    }
}

impl SessionConfig {
    pub fn variable_params(&self) -> bool {
        self.variable_params
    }

    pub fn max_params(&self) -> usize {
        self.max_params
    }
}
