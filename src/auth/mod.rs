//! OAuth2 token resolution and injection for the integration connector.

pub mod flow;
pub mod gcp;
pub mod injection;
pub mod token;

pub use flow::OAuthFlowConfig;
pub use gcp::{AdcAuthorizer, GcpAuthorizer, StaticTokenAuthorizer};
pub use injection::{ACCESS_TOKEN_FIELD, DYNAMIC_AUTH_PARAM, DynamicTokenInjector, auth_envelope};
pub use token::{
    LocalTokenMinter, TokenCache, TokenMinter, TokenResolution, TokenResolver, TokenSource,
};
