// ABOUTME: Sandbox provider capability boundary for Runbox
// ABOUTME: Defines the provider trait, execution outcome types, and API key resolution

pub mod credentials;
pub mod provider;

pub use credentials::ApiKey;
pub use provider::{
    CommandOutput, Execution, FileContent, ProviderError, ResultValue, SandboxHandle,
    SandboxProvider,
};
