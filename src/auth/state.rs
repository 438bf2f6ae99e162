//! Authentication state traits and macro.

use axum::http::request::Parts;

use super::authorize::Authorizer;
use super::hooks::AuthorizeHooks;

/// Trait for router state types that can gate requests.
pub trait HasAuthorizer: Clone + Send + Sync + 'static {
    type Hooks: AuthorizeHooks<Parts>;

    fn authorizer(&self) -> &Authorizer;
    fn authorize_hooks(&self) -> &Self::Hooks;
}

/// Implement [`HasAuthorizer`] for a state struct with the standard fields.
///
/// The struct must have these fields:
/// - `authorizer: Authorizer`
/// - `hooks: <a type implementing AuthorizeHooks<Parts>>`
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// pub struct MyState {
///     pub authorizer: Authorizer,
///     pub hooks: MyHooks,
/// }
///
/// keygate::impl_has_authorizer!(MyState, MyHooks);
/// ```
#[macro_export]
macro_rules! impl_has_authorizer {
    ($state_type:ty, $hooks_type:ty) => {
        impl $crate::auth::HasAuthorizer for $state_type {
            type Hooks = $hooks_type;

            fn authorizer(&self) -> &$crate::auth::Authorizer {
                &self.authorizer
            }
            fn authorize_hooks(&self) -> &Self::Hooks {
                &self.hooks
            }
        }
    };
}
