// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boilerplate macros shared by the model and the engine.

/// `Display` for a field-less or tuple enum, one string per variant.
///
/// ```ignore
/// crate::simple_display! {
///     HealthStatus {
///         Healthy => "healthy",
///         Unhealthy => "unhealthy",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $( $variant:ident $(( $($rest:tt)* ))? => $text:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $( Self::$variant $(( $($rest)* ))? => $text, )+
                };
                f.write_str(text)
            }
        }
    };
}

/// Chainable setters for option structs, expanded inside their `impl`.
///
/// `set` fields take the value as is; `option` fields are `Option<T>` and
/// take anything convertible into `T`.
///
/// ```ignore
/// impl InstanceConfig {
///     ns_core::setters! {
///         set { command: Vec<String> }
///         option { network: String }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(set { $( $field:ident : $ty:ty ),* $(,)? })?
        $(option { $( $opt:ident : $opt_ty:ty ),* $(,)? })?
    ) => {
        $($(
            pub fn $field(mut self, value: $ty) -> Self {
                self.$field = value;
                self
            }
        )*)?
        $($(
            pub fn $opt(mut self, value: impl Into<$opt_ty>) -> Self {
                self.$opt = Some(value.into());
                self
            }
        )*)?
    };
}
