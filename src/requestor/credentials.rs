use std::env;

use async_trait::async_trait;

use crate::requestor::{
    error::{RequestError, RequestErrorKind, invalid_request},
    types::{CredentialRef, EndpointConfig, ResolvedCredential},
};

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(
        &self,
        reference: &CredentialRef,
        endpoint: &EndpointConfig,
    ) -> Result<ResolvedCredential, RequestError>;
}

#[derive(Default)]
pub struct EnvCredentialProvider;

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(
        &self,
        reference: &CredentialRef,
        endpoint: &EndpointConfig,
    ) -> Result<ResolvedCredential, RequestError> {
        match reference {
            CredentialRef::Env { var } => {
                let token = env::var(var)
                    .ok()
                    .filter(|token| !token.trim().is_empty())
                    .ok_or_else(|| {
                        RequestError::new(
                            RequestErrorKind::Authentication,
                            format!("missing credential environment variable {}", var),
                        )
                        .with_endpoint(endpoint.url.clone())
                    })?;

                Ok(ResolvedCredential {
                    auth_header: Some(format!("Bearer {}", token)),
                })
            }
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(invalid_request("inline credential token cannot be empty"));
                }
                Ok(ResolvedCredential {
                    auth_header: Some(format!("Bearer {}", token)),
                })
            }
            CredentialRef::None => Ok(ResolvedCredential::none()),
        }
    }
}
